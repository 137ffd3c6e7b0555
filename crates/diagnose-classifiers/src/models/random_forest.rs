use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::ClassifierError;
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::{check_input, encode_labels, ClassifierModel};
use crate::models::decision_tree::{DecisionTree, TreeParams};

/// Bagged ensemble of Gini decision trees.
///
/// Every tree sees a bootstrap sample of the training rows and a random
/// subset of `floor(sqrt(n_features))` columns. Trees are grown in parallel,
/// each from its own generator derived from `random_state`, so a given seed
/// always yields the same forest. Probabilities are the fraction of trees
/// voting for each class.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    random_state: u64,
    classes: Vec<i32>,
    n_features: Option<usize>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams, random_state: u64) -> Self {
        RandomForest {
            params,
            random_state,
            classes: Vec::new(),
            n_features: None,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn random_state(&self) -> u64 {
        self.random_state
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn tree_seed(&self, tree_idx: usize) -> u64 {
        self.random_state
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(tree_idx as u64)
    }
}

fn max_features_for(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

impl ClassifierModel for RandomForest {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<i32>) -> Result<(), ClassifierError> {
        self.params.validate()?;
        let (classes, encoded) = encode_labels(x, y)?;

        let n_samples = x.nrows();
        let n_columns = x.ncols();
        let n_subspace = max_features_for(n_columns);
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
        };

        log::trace!(
            "Fitting random forest ({}) on {} samples x {} features",
            self.params,
            n_samples,
            n_columns
        );

        let trees = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(self.tree_seed(tree_idx));
                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let mut features = index::sample(&mut rng, n_columns, n_subspace).into_vec();
                features.sort_unstable();

                let mut tree = DecisionTree::new(tree_params);
                tree.fit_samples(x, &encoded, &classes, &bootstrap, features)?;
                Ok(tree)
            })
            .collect::<Result<Vec<DecisionTree>, ClassifierError>>()?;

        self.trees = trees;
        self.classes = classes;
        self.n_features = Some(x.ncols());
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f64>, ClassifierError> {
        if !self.is_fitted() {
            return Err(ClassifierError::NotFitted);
        }
        check_input(x, self.n_features)?;

        let n_classes = self.classes.len();
        let weight = 1.0 / self.trees.len() as f64;
        let mut out = vec![0.0f64; x.nrows() * n_classes];
        for tree in &self.trees {
            for (row, class) in tree.vote(x)?.into_iter().enumerate() {
                out[row * n_classes + class] += weight;
            }
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
        "random_forest"
    }
}
