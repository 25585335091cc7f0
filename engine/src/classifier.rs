//! Pre-trained phishing classifiers loaded from a JSON model artifact.
//!
//! Two artifact kinds are understood:
//! - `forest`: an ensemble of decision trees, optionally carrying per-feature
//!   importances
//! - `logistic`: a linear model squashed through a sigmoid, no importances
//!
//! The artifact names the column order it was trained with; rows handed to
//! the model are laid out in that order.

use crate::error::{inference_error, AppError};
use crate::features::{FeatureName, FeatureRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Safe,
    Phishing,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Safe => "safe",
            Label::Phishing => "phishing",
        }
    }

    /// Class index as the model was trained: 0 = safe, 1 = phishing.
    pub fn code(&self) -> u8 {
        match self {
            Label::Safe => 0,
            Label::Phishing => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probabilities {
    pub safe: f64,
    pub phishing: f64,
}

impl Probabilities {
    pub fn from_phishing(phishing: f64) -> Result<Self, AppError> {
        if !phishing.is_finite() || !(0.0..=1.0).contains(&phishing) {
            return Err(inference_error(format!("probability out of range: {phishing}")));
        }
        Ok(Self {
            safe: 1.0 - phishing,
            phishing,
        })
    }

    /// Argmax over the two classes; a tie goes to safe.
    pub fn label(&self) -> Label {
        if self.phishing > self.safe {
            Label::Phishing
        } else {
            Label::Safe
        }
    }

    pub fn of(&self, label: Label) -> f64 {
        match label {
            Label::Safe => self.safe,
            Label::Phishing => self.phishing,
        }
    }
}

/// A binary phishing classifier over [`FeatureRecord`]s.
pub trait Classifier: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Column order agreed at load time.
    fn feature_order(&self) -> &[FeatureName];

    fn predict_proba(&self, record: &FeatureRecord) -> Result<Probabilities, AppError>;

    fn predict(&self, record: &FeatureRecord) -> Result<Label, AppError> {
        Ok(self.predict_proba(record)?.label())
    }

    /// Relative importance per feature, when the model carries them.
    fn feature_importances(&self) -> Option<Vec<(FeatureName, f64)>> {
        None
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelArtifact {
    Forest(ForestArtifact),
    Logistic(LogisticArtifact),
}

#[derive(Debug, Deserialize)]
struct ForestArtifact {
    feature_order: Vec<FeatureName>,
    trees: Vec<DecisionTree>,
    #[serde(default)]
    feature_importances: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct LogisticArtifact {
    feature_order: Vec<FeatureName>,
    intercept: f64,
    weights: Vec<f64>,
}

impl ModelArtifact {
    fn into_classifier(self) -> Result<Box<dyn Classifier>, String> {
        match self {
            ModelArtifact::Forest(a) => Ok(Box::new(ForestModel::new(
                a.feature_order,
                a.trees,
                a.feature_importances,
            )?)),
            ModelArtifact::Logistic(a) => Ok(Box::new(LogisticModel::new(
                a.feature_order,
                a.intercept,
                a.weights,
            )?)),
        }
    }
}

/// Load and validate the model artifact at `path`.
pub fn load_model(path: &Path) -> Result<Box<dyn Classifier>, AppError> {
    let shown = path.display().to_string();
    if !path.is_file() {
        return Err(AppError::ModelNotFound(shown));
    }

    let data = fs::read_to_string(path).map_err(|e| AppError::ModelLoad {
        path: shown.clone(),
        reason: e.to_string(),
    })?;
    let model = from_json(&data).map_err(|reason| AppError::ModelLoad {
        path: shown.clone(),
        reason,
    })?;

    info!(
        "Loaded {} model from {} (importances: {})",
        model.kind(),
        shown,
        model.feature_importances().is_some()
    );
    debug!("Model column order: {:?}", model.feature_order());
    Ok(model)
}

pub fn from_json(data: &str) -> Result<Box<dyn Classifier>, String> {
    let artifact: ModelArtifact = serde_json::from_str(data).map_err(|e| e.to_string())?;
    artifact.into_classifier()
}

fn validate_order(order: &[FeatureName]) -> Result<(), String> {
    let unique: HashSet<_> = order.iter().collect();
    if order.len() != FeatureName::ALL.len() || unique.len() != order.len() {
        return Err(format!(
            "feature_order must list each of the {} features exactly once, got {:?}",
            FeatureName::ALL.len(),
            order
        ));
    }
    Ok(())
}

fn validate_aligned(what: &str, values: &[f64], order: &[FeatureName]) -> Result<(), String> {
    if values.len() != order.len() {
        return Err(format!(
            "{what} has {} entries, expected {}",
            values.len(),
            order.len()
        ));
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(format!("{what} contains a non-finite value: {v}"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class weights `[safe, phishing]`.
        value: [f64; 2],
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= width {
                        return Err(format!("node {i} splits on column {feature} of {width}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has a non-finite threshold"));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {i} points outside the tree"));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) || value[0] + value[1] <= 0.0 {
                        return Err(format!("leaf {i} has invalid class weights {value:?}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Phishing fraction at the leaf `row` lands in.
    fn phishing_fraction(&self, row: &[f64]) -> Result<f64, AppError> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).ok_or_else(|| {
                        inference_error(format!("column {feature} missing from a row of {}", row.len()))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => {
                    let total = value[0] + value[1];
                    if !(total > 0.0) {
                        return Err(inference_error("leaf with no class weight"));
                    }
                    return Ok(value[1] / total);
                }
                None => return Err(inference_error(format!("node {idx} does not exist"))),
            }
        }
        Err(inference_error("tree traversal did not terminate"))
    }
}

pub struct ForestModel {
    feature_order: Vec<FeatureName>,
    trees: Vec<DecisionTree>,
    importances: Option<Vec<f64>>,
}

impl ForestModel {
    pub fn new(
        feature_order: Vec<FeatureName>,
        trees: Vec<DecisionTree>,
        importances: Option<Vec<f64>>,
    ) -> Result<Self, String> {
        validate_order(&feature_order)?;
        if trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(feature_order.len())
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        if let Some(imp) = &importances {
            validate_aligned("feature_importances", imp, &feature_order)?;
            if imp.iter().any(|v| *v < 0.0) {
                return Err("feature_importances must be non-negative".to_string());
            }
        }
        Ok(Self {
            feature_order,
            trees,
            importances,
        })
    }
}

impl Classifier for ForestModel {
    fn kind(&self) -> &'static str {
        "forest"
    }

    fn feature_order(&self) -> &[FeatureName] {
        &self.feature_order
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<Probabilities, AppError> {
        let row = record.to_row(&self.feature_order);
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.phishing_fraction(&row)?;
        }
        let phishing = sum / self.trees.len() as f64;
        debug!("forest of {} trees: p_phishing={:.4}", self.trees.len(), phishing);
        Probabilities::from_phishing(phishing)
    }

    fn feature_importances(&self) -> Option<Vec<(FeatureName, f64)>> {
        self.importances.as_ref().map(|imp| {
            self.feature_order
                .iter()
                .copied()
                .zip(imp.iter().copied())
                .collect()
        })
    }
}

pub struct LogisticModel {
    feature_order: Vec<FeatureName>,
    intercept: f64,
    weights: Vec<f64>,
}

impl LogisticModel {
    pub fn new(feature_order: Vec<FeatureName>, intercept: f64, weights: Vec<f64>) -> Result<Self, String> {
        validate_order(&feature_order)?;
        validate_aligned("weights", &weights, &feature_order)?;
        if !intercept.is_finite() {
            return Err("intercept must be finite".to_string());
        }
        Ok(Self {
            feature_order,
            intercept,
            weights,
        })
    }
}

impl Classifier for LogisticModel {
    fn kind(&self) -> &'static str {
        "logistic"
    }

    fn feature_order(&self) -> &[FeatureName] {
        &self.feature_order
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<Probabilities, AppError> {
        let row = record.to_row(&self.feature_order);
        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(&row)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Probabilities::from_phishing(sigmoid(z))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
