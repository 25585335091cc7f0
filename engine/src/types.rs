use crate::classifier::{Label, Probabilities};
use crate::features::{FeatureName, FeatureRecord};
use crate::sample::LengthHistogram;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of both the HTML form post and the JSON API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: FeatureName,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub decision_id: Uuid,
    pub url: String,
    pub verdict: Label,
    /// 0 = safe, 1 = phishing.
    pub label: u8,
    pub probabilities: Probabilities,
    /// Probability of the reported verdict, e.g. `"97.31%"`.
    pub confidence: String,
    pub features: FeatureRecord,
    /// Sorted by importance, highest first. Absent when the model has none.
    pub importances: Option<Vec<FeatureImportance>>,
    /// General reference data; independent of `url`.
    pub length_reference: LengthHistogram,
}
