use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Hyper-parameters of a random forest.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ForestParams {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, min_samples_split: usize) -> Self {
        Self {
            n_estimators,
            max_depth,
            min_samples_split,
        }
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.n_estimators == 0 {
            return Err(ClassifierError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ClassifierError::InvalidParameter(
                "max_depth must be at least 1 or unset".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ClassifierError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = match self.max_depth {
            Some(d) => d.to_string(),
            None => "None".to_string(),
        };
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}",
            self.n_estimators, depth, self.min_samples_split
        )
    }
}

/// Candidate values for each forest hyper-parameter.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchSpace {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100, 200],
            max_depth: vec![Some(3), Some(5), None],
            min_samples_split: vec![2, 5, 10],
        }
    }
}

impl SearchSpace {
    /// Every combination of the candidate values.
    ///
    /// Parameters are enumerated in name order (`max_depth`, `min_samples_split`,
    /// `n_estimators`) with the last one varying fastest.
    pub fn grid(&self) -> Vec<ForestParams> {
        let mut grid = Vec::with_capacity(self.len());
        for &max_depth in &self.max_depth {
            for &min_samples_split in &self.min_samples_split {
                for &n_estimators in &self.n_estimators {
                    grid.push(ForestParams {
                        n_estimators,
                        max_depth,
                        min_samples_split,
                    });
                }
            }
        }
        grid
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len() * self.max_depth.len() * self.min_samples_split.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Settings for the randomized hyper-parameter search.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub space: SearchSpace,
    /// Number of grid points sampled.
    pub n_iter: usize,
    /// Number of cross-validation folds.
    pub cv: usize,
    pub random_state: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            space: SearchSpace::default(),
            n_iter: 5,
            cv: 3,
            random_state: 42,
        }
    }
}
