//! Random forest classifier stored as JSON.
//!
//! Document layout:
//!
//! ```json
//! {
//!   "model_type": "RandomForestClassifier",
//!   "classes": ["2", "3", "4"],
//!   "n_features": 26,
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 0, "threshold": 30.5, "left": 1, "right": 2 },
//!         { "value": [4.0, 1.0, 0.0] },
//!         { "value": [0.0, 2.0, 3.0] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Splits send a row left when `x[feature] <= threshold`. Node 0 is the root
//! and children always have a larger index than their parent.

use crate::models::aggregator::VoteAggregator;
use crate::models::{ClassOutput, ClassProbability, ModelError, Predictor};
use serde::Deserialize;

fn default_model_type() -> String {
    "RandomForestClassifier".to_string()
}

/// A tree node
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Tree {
    /// Leaf values reached by `features`
    fn leaf(&self, features: &[f32]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if f64::from(features[*feature]) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Tree ensemble classifier
#[derive(Debug, Clone, Deserialize)]
pub struct ForestModel {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    pub classes: Vec<String>,
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

impl ForestModel {
    /// Parse and validate a forest document
    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        let model: ForestModel = serde_json::from_value(value)
            .map_err(|e| ModelError::InvalidModel(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    /// Check structural invariants so that traversal can never go out of
    /// bounds or loop.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::InvalidModel("no classes".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::InvalidModel("no trees".to_string()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelError::InvalidModel(format!("tree {} is empty", t)));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.n_features {
                            return Err(ModelError::InvalidModel(format!(
                                "tree {} node {} splits on feature {} of {}",
                                t, i, feature, self.n_features
                            )));
                        }
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(ModelError::InvalidModel(format!(
                                    "tree {} node {} has invalid child {}",
                                    t, i, child
                                )));
                            }
                        }
                    }
                    Node::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(ModelError::InvalidModel(format!(
                                "tree {} node {} has {} values for {} classes",
                                t,
                                i,
                                value.len(),
                                self.classes.len()
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Averaged class distribution for one row
    pub fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut aggregator = VoteAggregator::new(self.classes.len());
        for tree in &self.trees {
            aggregator.add_weighted(tree.leaf(features), tree.weight);
        }
        Ok(aggregator.distribution())
    }
}

impl Predictor for ForestModel {
    fn predict(&self, features: &[f32]) -> Result<ClassOutput, ModelError> {
        let proba = self.predict_proba(features)?;
        let best = VoteAggregator::argmax(&proba)
            .ok_or_else(|| ModelError::Inference("empty class distribution".to_string()))?;

        let probabilities = self
            .classes
            .iter()
            .zip(&proba)
            .map(|(label, &probability)| ClassProbability {
                label: Some(label.clone()),
                probability,
            })
            .collect();

        Ok(ClassOutput {
            label: self.classes[best].clone(),
            probabilities,
        })
    }
}
