//! Server-rendered single page: input form, verdict and the two charts.

use crate::classifier::Label;
use crate::engine::PLACEHOLDER_URL;
use crate::sample::LengthHistogram;
use crate::types::{Detection, FeatureImportance};
use std::fmt::Write;

pub enum Outcome {
    Detected(Detection),
    /// The submission was not a usable URL.
    Warning(String),
    /// Extraction or classification failed; the page stays usable.
    Failed(String),
}

const CHART_WIDTH: f64 = 600.0;
const SAFE_COLOR: &str = "#2e7d32";
const PHISHING_COLOR: &str = "#c62828";
const BAR_COLOR: &str = "#1565c0";

pub fn render(input: Option<&str>, outcome: Option<&Outcome>) -> String {
    let value = input.unwrap_or(PLACEHOLDER_URL);
    let mut html = String::with_capacity(8 * 1024);

    html.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Phishing Website Detector</title>
<style>
body { font-family: sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; }
.warning { background: #fff8e1; border-left: 4px solid #f9a825; padding: .75rem; }
.error { background: #ffebee; border-left: 4px solid #c62828; padding: .75rem; }
.success { background: #e8f5e9; border-left: 4px solid #2e7d32; padding: .75rem; }
.info { background: #e3f2fd; border-left: 4px solid #1565c0; padding: .75rem; }
table { border-collapse: collapse; } td, th { padding: .2rem .6rem; border-bottom: 1px solid #ddd; text-align: left; }
input[type=text] { width: 100%; padding: .5rem; box-sizing: border-box; }
button { margin-top: .5rem; padding: .5rem 1.2rem; background: #c62828; color: #fff; border: 0; }
</style>
</head>
<body>
<h1>&#x1F3A3; Phishing Website Detector</h1>
<h3>Enter a URL to check whether it is a phishing website.</h3>
<details>
<summary>How to use</summary>
<ol>
<li>Paste the suspicious website <b>URL</b> into the field below.</li>
<li>Click <b>Detect</b>.</li>
<li>The verdict comes from a machine-learning model and may not be fully accurate. Always stay careful.</li>
</ol>
</details>
<form method="post" action="/">
<label for="url">URL</label>
"#,
    );
    let _ = writeln!(
        html,
        r#"<input type="text" id="url" name="url" value="{}">"#,
        escape(value)
    );
    html.push_str("<button type=\"submit\">Detect</button>\n</form>\n");

    match outcome {
        Some(Outcome::Detected(detection)) => render_detection(&mut html, detection),
        Some(Outcome::Warning(msg)) => {
            let _ = writeln!(html, r#"<p class="warning">{}</p>"#, escape(msg));
        }
        Some(Outcome::Failed(msg)) => {
            let _ = writeln!(html, r#"<p class="error">An error occurred: {}</p>"#, escape(msg));
            html.push_str(
                "<p class=\"info\">Check that you entered a correctly formatted URL and try again.</p>\n",
            );
        }
        None => {}
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_detection(html: &mut String, d: &Detection) {
    match d.verdict {
        Label::Phishing => {
            html.push_str(
                "<p class=\"error\">&#x26A0;&#xFE0F; <b>Danger!</b> This URL is likely a <b>phishing website</b>.</p>\n",
            );
        }
        Label::Safe => {
            html.push_str(
                "<p class=\"success\">&#x2705; <b>Safe!</b> This URL was detected as a <b>safe site</b>.</p>\n",
            );
        }
    }
    let _ = writeln!(html, "<p>Probability: <b>{}</b></p>", escape(&d.confidence));

    html.push_str("<hr>\n<h2>Model analysis</h2>\n");
    html.push_str("<p>The main features the model used to analyse this URL.</p>\n");

    html.push_str("<table>\n<tr><th>Feature</th><th>Value</th></tr>\n");
    for (name, value) in d.features.entries() {
        let _ = writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", name, value);
    }
    html.push_str("</table>\n");

    if let Some(importances) = &d.importances {
        html.push_str("<h4>Feature importance</h4>\n");
        html.push_str(&importance_chart(importances));
        html.push_str("<p>Taller bars mark features the model relied on more.</p>\n");
    }

    html.push_str("<h4>URL length distribution</h4>\n");
    html.push_str(&length_chart(&d.length_reference));
    html.push_str(
        "<p class=\"info\">Reference only: sample data, not derived from the URL above. \
         Phishing URLs tend to be longer.</p>\n",
    );
}

/// Horizontal bars, one per feature, in the order given.
pub fn importance_chart(importances: &[FeatureImportance]) -> String {
    let label_width = 170.0;
    let row = 22.0;
    let max = importances
        .iter()
        .map(|i| i.importance)
        .fold(0.0_f64, f64::max);
    let height = row * importances.len() as f64 + 10.0;
    let span = CHART_WIDTH - label_width - 60.0;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg class="importance-chart" width="{CHART_WIDTH}" height="{height}" xmlns="http://www.w3.org/2000/svg">"#
    );
    for (i, imp) in importances.iter().enumerate() {
        let y = i as f64 * row + 5.0;
        let w = if max > 0.0 { imp.importance / max * span } else { 0.0 };
        let _ = writeln!(
            svg,
            r#"<text x="0" y="{:.1}" font-size="12">{}</text><rect x="{label_width}" y="{y:.1}" width="{w:.1}" height="{:.1}" fill="{BAR_COLOR}"/><text x="{:.1}" y="{:.1}" font-size="11">{:.3}</text>"#,
            y + 14.0,
            imp.feature,
            row - 6.0,
            label_width + w + 4.0,
            y + 14.0,
            imp.importance
        );
    }
    svg.push_str("</svg>\n");
    svg
}

/// Side-by-side phishing/safe bars per length bin.
pub fn length_chart(hist: &LengthHistogram) -> String {
    let height = 300.0;
    let top = 20.0;
    let bottom = 40.0;
    let plot = height - top - bottom;
    let max = hist.max_count().max(1) as f64;
    let slot = if hist.bins.is_empty() {
        0.0
    } else {
        (CHART_WIDTH - 40.0) / hist.bins.len() as f64
    };
    let bar = slot * 0.4;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg class="length-chart" width="{CHART_WIDTH}" height="{height}" xmlns="http://www.w3.org/2000/svg">"#
    );
    for (i, bin) in hist.bins.iter().enumerate() {
        let x = 40.0 + i as f64 * slot;
        for (offset, count, color) in [
            (0.0, bin.phishing, PHISHING_COLOR),
            (bar, bin.safe, SAFE_COLOR),
        ] {
            let h = count as f64 / max * plot;
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{bar:.1}" height="{h:.1}" fill="{color}" opacity="0.7"/>"#,
                x + offset,
                top + plot - h,
            );
        }
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{:.1}" font-size="10">{}</text>"#,
            height - bottom + 14.0,
            bin.start
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="40" y="{:.1}" font-size="12">URL length</text><text x="0" y="12" font-size="12">Count</text>"#,
        height - 6.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="12" font-size="12" fill="{PHISHING_COLOR}">&#x25A0; phishing</text><text x="{:.1}" y="12" font-size="12" fill="{SAFE_COLOR}">&#x25A0; safe</text>"#,
        CHART_WIDTH - 150.0,
        CHART_WIDTH - 70.0
    );
    svg.push_str("</svg>\n");
    svg
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
