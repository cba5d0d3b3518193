use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ModelError, ModelLoadError};

/// One cell of a feature frame. Categorical columns may arrive as text.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    fn as_f64(&self) -> Result<f64, ModelError> {
        match self {
            FeatureValue::Number(v) => Ok(*v),
            FeatureValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ModelError::NonNumeric(s.clone())),
        }
    }
}

/// Named columns plus rows, the tabular input a trained model expects.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FeatureValue>>,
}

/// An opaque trained regression model.
///
/// Implementations must be immutable after construction: one instance is
/// shared read-only across every in-flight request.
pub trait Regressor: Send + Sync {
    /// One prediction per row of `frame`.
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, ModelError>;
}

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest: average of all trees.
    Mean,
    /// Gradient boosting: base score plus the sum of all trees.
    Sum,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                // sklearn routes `x <= threshold` to the left child
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if x[*feature] <= *threshold { *left } else { *right },
            }
        }
    }

    // Children must point strictly forward, which also rules out cycles.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {idx} splits on unknown feature {feature}"));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A regression tree ensemble serialized as JSON.
///
/// ```json
/// {
///   "feature_names": ["PULocationID", "hour", "day_of_week", "day_of_month", "month"],
///   "aggregation": "mean",
///   "trees": [{ "nodes": [{ "feature": 1, "threshold": 6.5, "left": 1, "right": 2 },
///                         { "value": 40.0 }, { "value": 180.0 }] }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn from_json(json: &str) -> Result<Self, ModelLoadError> {
        let model: TreeEnsemble = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelLoadError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.feature_names.is_empty() {
            return Err(ModelLoadError::Invalid("no feature names".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ModelLoadError::Invalid("ensemble has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len())
                .map_err(|e| ModelLoadError::Invalid(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    /// Maps each trained feature to its column position in `frame`.
    fn column_positions(&self, frame: &FeatureFrame) -> Result<Vec<usize>, ModelError> {
        self.feature_names
            .iter()
            .map(|name| {
                frame
                    .columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| ModelError::MissingColumn(name.clone()))
            })
            .collect()
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, ModelError> {
        let positions = self.column_positions(frame)?;

        frame
            .rows
            .iter()
            .map(|row| {
                if row.len() != frame.columns.len() {
                    return Err(ModelError::RowShape {
                        expected: frame.columns.len(),
                        got: row.len(),
                    });
                }
                let x = positions
                    .iter()
                    .map(|&p| row[p].as_f64())
                    .collect::<Result<Vec<_>, _>>()?;

                let total: f64 = self.trees.iter().map(|t| t.evaluate(&x)).sum();
                Ok(match self.aggregation {
                    Aggregation::Mean => total / self.trees.len() as f64,
                    Aggregation::Sum => self.base_score + total,
                })
            })
            .collect()
    }
}
