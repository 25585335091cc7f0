use crate::{
    classifier::Classifier,
    error::{inference_error, validation_error, AppError},
    features::extract_features,
    sample::reference_length_histogram,
    types::{Detection, FeatureImportance},
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Pre-filled value of the URL input; submitting it unchanged is not a query.
pub const PLACEHOLDER_URL: &str = "https://";

/// Runs one submission through extraction and the loaded classifier.
pub struct Detector {
    classifier: Arc<dyn Classifier>,
}

impl Detector {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn model_kind(&self) -> &'static str {
        self.classifier.kind()
    }

    pub fn detect(&self, input: &str) -> Result<Detection, AppError> {
        let url = validate_input(input)?;

        let features = extract_features(url);
        debug!("Extracted features for {}: {:?}", url, features);

        let label = self.classifier.predict(&features)?;
        let probabilities = self.classifier.predict_proba(&features)?;
        if (probabilities.safe + probabilities.phishing - 1.0).abs() > 1e-6 {
            return Err(inference_error(format!(
                "class probabilities do not sum to 1: {:?}",
                probabilities
            )));
        }

        let importances = self.classifier.feature_importances().map(|mut imp| {
            imp.sort_by(|a, b| b.1.total_cmp(&a.1));
            imp.into_iter()
                .map(|(feature, importance)| FeatureImportance { feature, importance })
                .collect()
        });

        let confidence = format!("{:.2}%", probabilities.of(label) * 100.0);
        info!("Detection for {}: {} ({})", url, label.as_str(), confidence);

        Ok(Detection {
            decision_id: Uuid::new_v4(),
            url: url.to_string(),
            verdict: label,
            label: label.code(),
            probabilities,
            confidence,
            features,
            importances,
            length_reference: reference_length_histogram(),
        })
    }
}

/// Trimmed URL, or an error for empty and placeholder-only input.
pub fn validate_input(input: &str) -> Result<&str, AppError> {
    let url = input.trim();
    if url.is_empty() || url == PLACEHOLDER_URL {
        return Err(validation_error("Please enter a URL."));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{testing::FixedClassifier, Label};
    use crate::features::FeatureName;

    fn detector(classifier: FixedClassifier) -> (Detector, Arc<FixedClassifier>) {
        let classifier = Arc::new(classifier);
        (Detector::new(classifier.clone()), classifier)
    }

    #[test]
    fn test_placeholder_and_empty_never_classify() {
        let (detector, classifier) = detector(FixedClassifier::new(0.9));
        for input in ["", "   ", "https://", "  https://  "] {
            let err = detector.detect(input).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
        assert_eq!(classifier.calls(), 0);
    }

    #[test]
    fn test_phishing_reports_phishing_probability() {
        let (detector, _) = detector(FixedClassifier::new(0.97314));
        let d = detector.detect(" http://192.168.1.1/login ").unwrap();
        assert_eq!(d.verdict, Label::Phishing);
        assert_eq!(d.label, 1);
        assert_eq!(d.confidence, "97.31%");
        assert_eq!(d.url, "http://192.168.1.1/login");
        assert!(d.features.ip_in_url);
    }

    #[test]
    fn test_safe_reports_safe_probability() {
        let (detector, _) = detector(FixedClassifier::new(0.125));
        let d = detector.detect("https://example.com").unwrap();
        assert_eq!(d.verdict, Label::Safe);
        assert_eq!(d.label, 0);
        assert_eq!(d.confidence, "87.50%");
        assert!((d.probabilities.safe + d.probabilities.phishing - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_importances_sorted_descending() {
        let mut classifier = FixedClassifier::new(0.2);
        classifier.importances = Some(vec![
            (FeatureName::UrlLength, 0.1),
            (FeatureName::AtSign, 0.5),
            (FeatureName::NumDots, 0.3),
        ]);
        let (detector, _) = detector(classifier);
        let imp = detector.detect("https://example.com").unwrap().importances.unwrap();
        let order: Vec<_> = imp.iter().map(|i| i.feature).collect();
        assert_eq!(order, vec![FeatureName::AtSign, FeatureName::NumDots, FeatureName::UrlLength]);
    }

    #[test]
    fn test_missing_importances_tolerated() {
        let (detector, _) = detector(FixedClassifier::new(0.2));
        let d = detector.detect("https://example.com").unwrap();
        assert!(d.importances.is_none());
        assert!(!d.length_reference.bins.is_empty());
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let (detector, classifier) = detector(FixedClassifier::failing());
        let err = detector.detect("https://example.com").unwrap_err();
        assert!(matches!(err, AppError::ModelInference(_)));
        assert_eq!(classifier.calls(), 1);
    }
}
