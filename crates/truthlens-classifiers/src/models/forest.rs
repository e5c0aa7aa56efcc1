//! Random forest over flat-array decision trees
//!
//! Trees use the scikit-learn `tree_` layout: parallel arrays indexed by
//! node id, `children_left == -1` marks a leaf, and a sample goes left when
//! `x[feature] <= threshold`. Leaf `value` rows hold per-class weights in
//! the forest's class order.

use super::{ClassSet, FeatureRow};
use serde::Deserialize;
use truthlens_core::{Error, Result};

const LEAF: i64 = -1;

/// One fitted decision tree
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == LEAF
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<()> {
        let n = self.node_count();
        if n == 0 {
            return Err(Error::artifact("decision tree has no nodes"));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(Error::artifact(format!(
                "decision tree arrays disagree on node count ({} nodes)",
                n
            )));
        }

        for node in 0..n {
            if self.is_leaf(node) {
                let row = &self.value[node];
                if row.len() != n_classes {
                    return Err(Error::artifact(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        row.len(),
                        n_classes
                    )));
                }
                if row.iter().any(|v| !v.is_finite() || *v < 0.0) || row.iter().sum::<f64>() <= 0.0
                {
                    return Err(Error::artifact(format!(
                        "leaf {} has invalid class weights",
                        node
                    )));
                }
                continue;
            }

            // Children always come after their parent, so traversal terminates
            for child in [self.children_left[node], self.children_right[node]] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(Error::artifact(format!(
                        "node {} has invalid child {}",
                        node, child
                    )));
                }
            }

            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(Error::artifact(format!(
                    "node {} splits on feature {} outside 0..{}",
                    node, feature, n_features
                )));
            }
        }

        Ok(())
    }

    fn leaf_for<F: FeatureRow + ?Sized>(&self, x: &F) -> usize {
        let mut node = 0;
        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if x.value(feature) <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }

    /// Normalized class distribution at the leaf reached by `x`
    pub fn predict_proba<F: FeatureRow + ?Sized>(&self, x: &F) -> Vec<f64> {
        let row = &self.value[self.leaf_for(x)];
        let total: f64 = row.iter().sum();
        row.iter().map(|v| v / total).collect()
    }
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub classes: ClassSet,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.classes.len() < 2 {
            return Err(Error::artifact("random forest needs at least two classes"));
        }
        if self.trees.is_empty() {
            return Err(Error::artifact("random forest has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| Error::artifact(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Mean of the per-tree leaf distributions
    pub fn predict_proba<F: FeatureRow + ?Sized>(&self, x: &F) -> Vec<f64> {
        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.predict_proba(x)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.into_iter().map(|v| v / n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbabilisticModel;
    use crate::vectorizer::SparseVector;

    /// Two stumps over a 3-feature space
    const FOREST: &str = r#"{
        "kind": "random_forest",
        "n_features": 3,
        "classes": {"encoding": "encoded", "classes": [0, 1]},
        "trees": [
            {"children_left": [1, -1, -1], "children_right": [2, -1, -1],
             "feature": [0, -2, -2], "threshold": [0.5, -2.0, -2.0],
             "value": [[5, 5], [1, 3], [4, 0]]},
            {"children_left": [1, -1, -1], "children_right": [2, -1, -1],
             "feature": [2, -2, -2], "threshold": [0.1, -2.0, -2.0],
             "value": [[5, 5], [0.0, 1.0], [0.5, 0.5]]}
        ]
    }"#;

    #[test]
    fn test_forest_averages_trees() {
        let model = ProbabilisticModel::from_json(FOREST).unwrap();
        assert_eq!(model.kind(), "random_forest");

        // tree 1 goes left: [0.25, 0.75]; tree 2 goes left: [0.0, 1.0]
        let p = model.predict_proba(&[0.2, 9.0, 0.0][..]).unwrap();
        assert!((p[0] - 0.125).abs() < 1e-12);
        assert!((p[1] - 0.875).abs() < 1e-12);

        // tree 1 goes right: [1.0, 0.0]; tree 2 goes right: [0.5, 0.5]
        let x = SparseVector::from_pairs(3, vec![(0, 0.9), (2, 0.7)]);
        let p = model.predict_proba(&x).unwrap();
        assert!((p[0] - 0.75).abs() < 1e-12);
        assert!((p[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let model = ProbabilisticModel::from_json(FOREST).unwrap();
        let p = model.predict_proba(&[0.5, 0.0, 0.1][..]).unwrap();
        assert!((p[1] - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_cyclic_tree() {
        let json = r#"{
            "kind": "random_forest", "n_features": 1,
            "classes": {"encoding": "raw", "classes": ["fake", "real"]},
            "trees": [{"children_left": [0, -1], "children_right": [1, -1],
                       "feature": [0, -2], "threshold": [0.0, -2.0],
                       "value": [[1, 1], [1, 1]]}]
        }"#;
        assert!(ProbabilisticModel::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_bad_leaf_width() {
        let json = r#"{
            "kind": "random_forest", "n_features": 1,
            "classes": {"encoding": "encoded", "classes": [0, 1]},
            "trees": [{"children_left": [-1], "children_right": [-1],
                       "feature": [-2], "threshold": [-2.0],
                       "value": [[1, 1, 1]]}]
        }"#;
        assert!(ProbabilisticModel::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let json = r#"{
            "kind": "random_forest", "n_features": 1,
            "classes": {"encoding": "encoded", "classes": [0, 1]},
            "trees": [{"children_left": [1, -1, -1], "children_right": [2, -1, -1],
                       "feature": [3, -2, -2], "threshold": [0.5, -2.0, -2.0],
                       "value": [[1, 1], [1, 0], [0, 1]]}]
        }"#;
        assert!(ProbabilisticModel::from_json(json).is_err());
    }
}
