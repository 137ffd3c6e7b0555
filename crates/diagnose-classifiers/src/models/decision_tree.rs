//! Gini decision tree backed by `linfa-trees`.
//!
//! The tree is grown on a (possibly repeated) subset of rows and a subset of
//! columns. Class labels are passed to `linfa` as indices into `classes`, so
//! every tree of a forest votes in the same label space.
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_trees::{DecisionTree as LinfaTree, DecisionTreeParams, SplitQuality};
use ndarray::{Array1 as NdArray1, Array2 as NdArray2};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::{check_input, encode_labels, ClassifierModel};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DecisionTree {
    params: TreeParams,
    classes: Vec<i32>,
    n_features: Option<usize>,
    /// Input columns the tree was grown on, ascending.
    features: Vec<usize>,
    tree: Option<LinfaTree<f64, usize>>,
}

impl DecisionTree {
    pub fn new(params: TreeParams) -> Self {
        DecisionTree {
            params,
            classes: Vec::new(),
            n_features: None,
            features: Vec::new(),
            tree: None,
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    pub fn features(&self) -> &[usize] {
        &self.features
    }

    /// Depth of the fitted tree, 0 for a single leaf.
    pub fn depth(&self) -> usize {
        self.tree.as_ref().map_or(0, |tree| tree.max_depth())
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.as_ref().map_or(0, |tree| tree.num_leaves())
    }

    fn learner(&self) -> DecisionTreeParams<f64, usize> {
        LinfaTree::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(self.params.max_depth)
            .min_weight_split(self.params.min_samples_split as f32)
    }

    /// Grow the tree on `samples` (rows, repeats allowed) restricted to `features`.
    ///
    /// `y` holds class indices into `classes`.
    pub(crate) fn fit_samples(
        &mut self,
        x: &Array2<f32>,
        y: &[usize],
        classes: &[i32],
        samples: &[usize],
        features: Vec<usize>,
    ) -> Result<(), ClassifierError> {
        let records = NdArray2::from_shape_fn((samples.len(), features.len()), |(i, j)| {
            f64::from(x[(samples[i], features[j])])
        });
        let targets: NdArray1<usize> = samples.iter().map(|&s| y[s]).collect();
        let dataset = DatasetBase::new(records, targets);

        let tree = self
            .learner()
            .fit(&dataset)
            .map_err(|e: linfa::Error| ClassifierError::InvalidParameter(e.to_string()))?;

        self.tree = Some(tree);
        self.classes = classes.to_vec();
        self.n_features = Some(x.ncols());
        self.features = features;
        Ok(())
    }

    /// Class index voted for by every row. Input must already be validated.
    pub(crate) fn vote(&self, x: &Array2<f32>) -> Result<Vec<usize>, ClassifierError> {
        let tree = self.tree.as_ref().ok_or(ClassifierError::NotFitted)?;
        let records = NdArray2::from_shape_fn((x.nrows(), self.features.len()), |(i, j)| {
            f64::from(x[(i, self.features[j])])
        });
        let predicted: NdArray1<usize> = tree.predict(&records);
        Ok(predicted.to_vec())
    }
}

impl ClassifierModel for DecisionTree {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<i32>) -> Result<(), ClassifierError> {
        let (classes, encoded) = encode_labels(x, y)?;
        let samples: Vec<usize> = (0..x.nrows()).collect();
        let features = (0..x.ncols()).collect();
        self.fit_samples(x, &encoded, &classes, &samples, features)
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f64>, ClassifierError> {
        check_input(x, self.n_features)?;
        let n_classes = self.classes.len();
        let mut out = vec![0.0f64; x.nrows() * n_classes];
        for (row, class) in self.vote(x)?.into_iter().enumerate() {
            out[row * n_classes + class] = 1.0;
        }
        Array2::from_shape_vec((x.nrows(), n_classes), out)
            .map_err(|e| ClassifierError::InvalidParameter(e.to_string()))
    }

    fn classes(&self) -> &[i32] {
        &self.classes
    }

    fn n_features_in(&self) -> Option<usize> {
        self.n_features
    }

    fn name(&self) -> &str {
        "decision_tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f32>, Array1<i32>) {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![
                1.0, 5.0, //
                2.0, 5.0, //
                3.0, 5.0, //
                10.0, 5.0, //
                11.0, 5.0, //
                12.0, 5.0,
            ],
        )
        .unwrap();
        let y = Array1::from_vec(vec![0, 0, 0, 1, 1, 1]);
        (x, y)
    }

    #[test]
    fn learns_single_threshold() {
        let (x, y) = separable();
        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict(&x).unwrap(), y.to_vec());

        let unseen = Array2::from_shape_vec((2, 2), vec![6.0, 5.0, 7.0, 5.0]).unwrap();
        assert_eq!(tree.predict(&unseen).unwrap(), vec![0, 1]);
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let y = Array1::from_vec(vec![0, 1, 0, 1]);
        let params = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let mut tree = DecisionTree::new(params);
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 1);
        assert!(tree.leaf_count() <= 2);
    }

    #[test]
    fn min_samples_split_makes_leaf() {
        let (x, y) = separable();
        let params = TreeParams {
            min_samples_split: 10,
            ..TreeParams::default()
        };
        let mut tree = DecisionTree::new(params);
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.leaf_count(), 1);
        let predictions = tree.predict(&x).unwrap();
        assert!(predictions.iter().all(|&p| p == predictions[0]));
    }

    #[test]
    fn probabilities_are_one_hot() {
        let (x, y) = separable();
        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();
        let proba = tree.predict_proba(&x).unwrap();
        assert_eq!(proba.row_slice(0), &[1.0, 0.0]);
        assert_eq!(proba.row_slice(5), &[0.0, 1.0]);
    }

    #[test]
    fn column_subset_is_used_for_prediction() {
        let (x, y) = separable();
        let (classes, encoded) = encode_labels(&x, &y).unwrap();
        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit_samples(&x, &encoded, &classes, &[0, 1, 4, 5], vec![0])
            .unwrap();

        assert_eq!(tree.features(), &[0]);
        assert_eq!(tree.n_features_in(), Some(2));
        assert_eq!(tree.vote(&x).unwrap(), vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn unfitted_tree_refuses_to_predict() {
        let (x, _) = separable();
        let tree = DecisionTree::new(TreeParams::default());
        assert_eq!(tree.predict(&x), Err(ClassifierError::NotFitted));
    }
}
