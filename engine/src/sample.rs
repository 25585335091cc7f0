//! Static reference data for the URL-length comparison chart.
//!
//! These are hand-picked illustrative values, not a labelled corpus, and they
//! never feed into a prediction. Swap them for real dataset statistics here
//! without touching extraction or classification.

use serde::Serialize;

pub const PHISHING_URL_LENGTHS: [usize; 4] = [60, 75, 80, 95];
pub const SAFE_URL_LENGTHS: [usize; 4] = [25, 30, 40, 55];

pub const MAX_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LengthBin {
    /// Inclusive lower bound.
    pub start: usize,
    /// Exclusive upper bound.
    pub end: usize,
    pub phishing: usize,
    pub safe: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LengthHistogram {
    pub step: usize,
    pub bins: Vec<LengthBin>,
}

impl LengthHistogram {
    pub fn max_count(&self) -> usize {
        self.bins
            .iter()
            .map(|b| b.phishing.max(b.safe))
            .max()
            .unwrap_or(0)
    }
}

/// Histogram of the bundled sample lengths.
pub fn reference_length_histogram() -> LengthHistogram {
    length_histogram(&PHISHING_URL_LENGTHS, &SAFE_URL_LENGTHS, MAX_BINS)
}

/// Bin both series on a shared grid of at most `max_bins` "nice" steps.
pub fn length_histogram(phishing: &[usize], safe: &[usize], max_bins: usize) -> LengthHistogram {
    let all = || phishing.iter().chain(safe.iter()).copied();
    let (Some(min), Some(max)) = (all().min(), all().max()) else {
        return LengthHistogram { step: 1, bins: Vec::new() };
    };

    let step = nice_step(min, max, max_bins.max(1));
    let first = min / step;
    let count = max / step - first + 1;

    let mut bins: Vec<LengthBin> = (0..count)
        .map(|i| LengthBin {
            start: (first + i) * step,
            end: (first + i + 1) * step,
            phishing: 0,
            safe: 0,
        })
        .collect();

    for v in phishing {
        bins[v / step - first].phishing += 1;
    }
    for v in safe {
        bins[v / step - first].safe += 1;
    }

    LengthHistogram { step, bins }
}

/// Smallest 1/2/5 x 10^k step that covers `[min, max]` in at most `max_bins` bins.
fn nice_step(min: usize, max: usize, max_bins: usize) -> usize {
    let mut magnitude = 1usize;
    loop {
        for m in [1, 2, 5] {
            let step = m * magnitude;
            if max / step - min / step + 1 <= max_bins {
                return step;
            }
        }
        magnitude = magnitude.saturating_mul(10);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_histogram() {
        let hist = reference_length_histogram();
        assert_eq!(hist.step, 5);
        assert_eq!(hist.bins.len(), 15);
        assert_eq!(hist.bins[0].start, 25);
        assert_eq!(hist.bins.last().unwrap().end, 100);

        let phishing: usize = hist.bins.iter().map(|b| b.phishing).sum();
        let safe: usize = hist.bins.iter().map(|b| b.safe).sum();
        assert_eq!(phishing, PHISHING_URL_LENGTHS.len());
        assert_eq!(safe, SAFE_URL_LENGTHS.len());
        assert_eq!(hist.max_count(), 1);
    }

    #[test]
    fn test_step_grows_with_range() {
        let hist = length_histogram(&[1000], &[3], 20);
        assert_eq!(hist.step, 100);
        assert!(hist.bins.len() <= 20);
        assert_eq!(hist.bins[0].safe, 1);
        assert_eq!(hist.bins.last().unwrap().phishing, 1);
    }

    #[test]
    fn test_single_value() {
        let hist = length_histogram(&[42, 42], &[], 20);
        assert_eq!(hist.step, 1);
        assert_eq!(hist.bins, vec![LengthBin { start: 42, end: 43, phishing: 2, safe: 0 }]);
    }

    #[test]
    fn test_empty_series() {
        let hist = length_histogram(&[], &[], 20);
        assert!(hist.bins.is_empty());
        assert_eq!(hist.max_count(), 0);
    }
}
