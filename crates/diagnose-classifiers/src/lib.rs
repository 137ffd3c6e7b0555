//! diagnose-classifiers: random-forest training and inference for tabular diagnosis data.
//!
//! This crate provides a CSV dataset reader with the preprocessing the
//! training pipeline relies on, a bagged random forest over `linfa-trees`
//! decision trees, a randomized hyper-parameter search scored by stratified
//! cross-validation, a JSON model artifact for the prediction service, and a
//! small file-based experiment tracker.
pub mod artifact;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod search;
pub mod tracking;
