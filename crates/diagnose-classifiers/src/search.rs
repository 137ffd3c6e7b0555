//! Randomized hyper-parameter search with stratified cross-validation.
use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ForestParams, SearchConfig};
use crate::data_handling::{stratified_kfold, Fold};
use crate::math::{Array1, Array2};
use crate::metrics::{mean, std_dev};
use crate::models::{ClassifierModel, RandomForest};

/// Cross-validation scores of one sampled parameter set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateResult {
    pub params: ForestParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best candidate refitted on the whole training set.
    pub best_model: RandomForest,
    pub best_params: ForestParams,
    pub best_score: f64,
    /// Every evaluated candidate, in sampling order.
    pub candidates: Vec<CandidateResult>,
}

pub struct RandomizedSearch {
    config: SearchConfig,
}

impl RandomizedSearch {
    pub fn new(config: SearchConfig) -> Self {
        RandomizedSearch { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Draw `n_iter` distinct grid points with the seeded generator.
    pub fn sample_candidates(&self) -> Result<Vec<ForestParams>> {
        if self.config.n_iter == 0 {
            bail!("n_iter must be at least 1");
        }
        let mut grid = self.config.space.grid();
        if grid.is_empty() {
            bail!("Search space is empty: every parameter needs at least one candidate value");
        }
        for params in &grid {
            params
                .validate()
                .with_context(|| format!("Invalid search candidate ({})", params))?;
        }
        if self.config.n_iter > grid.len() {
            log::warn!(
                "n_iter={} exceeds the {} available parameter combinations; evaluating all of them",
                self.config.n_iter,
                grid.len()
            );
        }

        let mut rng = StdRng::seed_from_u64(self.config.random_state);
        grid.shuffle(&mut rng);
        grid.truncate(self.config.n_iter);
        Ok(grid)
    }

    /// Evaluate the sampled candidates and refit the best one on all rows.
    pub fn fit(&self, x: &Array2<f32>, y: &Array1<i32>) -> Result<SearchOutcome> {
        let candidates = self.sample_candidates()?;
        let folds = stratified_kfold(y, self.config.cv)?;

        log::info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len()
        );

        let results = candidates
            .par_iter()
            .map(|params| self.cross_validate(*params, x, y, &folds))
            .collect::<Result<Vec<_>>>()?;

        for result in &results {
            log::debug!(
                "[CV] {}: mean accuracy {:.4} (+/- {:.4})",
                result.params,
                result.mean_score,
                result.std_score
            );
        }

        let best = best_candidate(&results).context("No candidate was evaluated")?;
        let best_params = best.params;
        let best_score = best.mean_score;

        let mut best_model = RandomForest::new(best_params, self.config.random_state);
        best_model
            .fit(x, y)
            .context("Failed to refit the best candidate")?;

        log::info!(
            "Best parameters: {} (mean CV accuracy {:.4})",
            best_params,
            best_score
        );

        Ok(SearchOutcome {
            best_model,
            best_params,
            best_score,
            candidates: results,
        })
    }

    fn cross_validate(
        &self,
        params: ForestParams,
        x: &Array2<f32>,
        y: &Array1<i32>,
        folds: &[Fold],
    ) -> Result<CandidateResult> {
        let mut fold_scores = Vec::with_capacity(folds.len());
        for (fold_idx, fold) in folds.iter().enumerate() {
            let mut model = RandomForest::new(params, self.config.random_state);
            model
                .fit(&x.select_rows(&fold.train), &y.select(&fold.train))
                .with_context(|| format!("Fold {} failed for {}", fold_idx + 1, params))?;
            let score = model.score(&x.select_rows(&fold.test), &y.select(&fold.test))?;
            fold_scores.push(score);
        }
        Ok(CandidateResult {
            params,
            mean_score: mean(&fold_scores),
            std_score: std_dev(&fold_scores),
            fold_scores,
        })
    }
}

/// Highest mean score; the earliest candidate wins ties.
fn best_candidate(results: &[CandidateResult]) -> Option<&CandidateResult> {
    let mut best: Option<&CandidateResult> = None;
    for result in results {
        if best.map_or(true, |b| result.mean_score > b.mean_score) {
            best = Some(result);
        }
    }
    best
}
