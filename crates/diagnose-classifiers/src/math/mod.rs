//! Small dense containers used throughout the crate.
//!
//! `Array2` holds a row-major sample matrix (rows are samples, columns are
//! features) and `Array1` holds per-sample values such as labels. Only the
//! operations the training and inference paths need are provided.
pub mod matrix;
pub mod vector;

pub use matrix::{Array2, ShapeError};
pub use vector::Array1;
