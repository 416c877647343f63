//! Random forest adapter: implements the classifier ports over exported
//! scikit-learn `RandomForestClassifier` models.
//!
//! Each tree is stored as the flattened `tree_` arrays of the fitted
//! estimator. Prediction follows scikit-learn:
//!
//! - a sample goes left when `x[feature] <= threshold`
//! - per-tree class probabilities are the normalized leaf `value` row
//! - forest probabilities are the mean over trees
//! - the label is `classes[argmax]`, first maximum wins
//!
//! Label and probabilities always come from the same evaluation.

use serde::{Deserialize, Serialize};

use crate::domain::{BinaryPrediction, FeatureError, NormalizedRecord};
use crate::ports::{ensure_layout, BinaryClassifier, StageClassifier};

/// Marker used by scikit-learn for "no child".
const LEAF: i64 = -1;

/// One fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights, `n_nodes x n_classes`.
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    /// Single-node tree predicting `weights`.
    #[must_use]
    pub fn leaf(weights: Vec<f64>) -> Self {
        Self {
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![weights],
        }
    }

    /// Depth-one tree: `left` when `x[feature] <= threshold`, else `right`.
    #[must_use]
    pub fn stump(feature: usize, threshold: f64, left: Vec<f64>, right: Vec<f64>) -> Self {
        let root_weights = left.iter().zip(&right).map(|(l, r)| l + r).collect();
        Self {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![root_weights, left, right],
        }
    }

    fn n_nodes(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == LEAF
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree arrays have different lengths".into());
        }

        for node in 0..n {
            let row = &self.value[node];
            if row.len() != n_classes {
                return Err(format!(
                    "node {node} has {} class weights, expected {n_classes}",
                    row.len()
                ));
            }
            if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(format!("node {node} has invalid class weights"));
            }

            if self.is_leaf(node) {
                if row.iter().sum::<f64>() <= 0.0 {
                    return Err(format!("leaf {node} has zero total weight"));
                }
                continue;
            }

            // Children always follow their parent in scikit-learn's layout;
            // requiring it here also rules out cycles.
            for child in [self.children_left[node], self.children_right[node]] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has invalid child index {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(format!("node {node} splits on invalid feature {feature}"));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has non-finite threshold"));
            }
        }

        Ok(())
    }

    /// Leaf reached by `x`.
    fn apply(&self, x: &[f64]) -> usize {
        let mut node = 0;
        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }

    /// Add this tree's normalized class probabilities for `x` into `acc`.
    fn accumulate_proba(&self, x: &[f64], acc: &mut [f64]) {
        let row = &self.value[self.apply(x)];
        let total: f64 = row.iter().sum();
        for (slot, weight) in acc.iter_mut().zip(row) {
            *slot += weight / total;
        }
    }
}

/// A fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Ordered feature names (`feature_names_in_`).
    pub feature_names: Vec<String>,

    /// Class labels (`classes_`), in probability column order.
    pub classes: Vec<i64>,

    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Structural checks applied when the artifact is loaded.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_names.is_empty() {
            return Err("forest has no features".into());
        }
        if self.classes.is_empty() {
            return Err("forest has no classes".into());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len(), self.classes.len())
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    /// Mean class probabilities over all trees, in `classes` order.
    #[must_use]
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            tree.accumulate_proba(x, &mut proba);
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        proba
    }

    /// Evaluate once: index of the winning class and the full probability
    /// vector.
    fn evaluate(
        &self,
        context: &str,
        record: &NormalizedRecord,
    ) -> Result<(usize, Vec<f64>), FeatureError> {
        ensure_layout(context, &self.feature_names, record)?;

        let proba = self.predict_proba(record.values());
        let winner = argmax(&proba);
        Ok((winner, proba))
    }
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Random forest used as the diabetes detection model.
///
/// Only forests whose classes are exactly `[0, 1]` qualify.
#[derive(Debug, Clone)]
pub struct BinaryForest {
    forest: RandomForest,
}

impl BinaryForest {
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

impl TryFrom<RandomForest> for BinaryForest {
    type Error = String;

    fn try_from(forest: RandomForest) -> Result<Self, Self::Error> {
        forest.validate()?;
        if forest.classes != [0, 1] {
            return Err(format!(
                "binary classifier must have classes [0, 1], got {:?}",
                forest.classes
            ));
        }
        Ok(Self { forest })
    }
}

impl BinaryClassifier for BinaryForest {
    fn feature_names(&self) -> &[String] {
        &self.forest.feature_names
    }

    fn predict(&self, record: &NormalizedRecord) -> Result<BinaryPrediction, FeatureError> {
        let (winner, proba) = self.forest.evaluate("primary classifier", record)?;
        let label = u8::from(self.forest.classes[winner] == 1);
        Ok(BinaryPrediction::new(label, proba[1]))
    }
}

/// Random forest used as the diabetes type model.
#[derive(Debug, Clone)]
pub struct StageForest {
    forest: RandomForest,
}

impl StageForest {
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

impl TryFrom<RandomForest> for StageForest {
    type Error = String;

    fn try_from(forest: RandomForest) -> Result<Self, Self::Error> {
        forest.validate()?;
        Ok(Self { forest })
    }
}

impl StageClassifier for StageForest {
    fn feature_names(&self) -> &[String] {
        &self.forest.feature_names
    }

    fn predict_stage(&self, record: &NormalizedRecord) -> Result<i64, FeatureError> {
        let (winner, _) = self.forest.evaluate("secondary classifier", record)?;
        Ok(self.forest.classes[winner])
    }
}
