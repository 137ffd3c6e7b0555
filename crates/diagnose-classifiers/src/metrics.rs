//! Evaluation metrics.
use crate::error::ClassifierError;

/// Fraction of predictions equal to the true label.
pub fn accuracy_score(y_true: &[i32], y_pred: &[i32]) -> Result<f64, ClassifierError> {
    if y_true.len() != y_pred.len() {
        return Err(ClassifierError::PredictionCountMismatch {
            labels: y_true.len(),
            predictions: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ClassifierError::InvalidParameter(
            "accuracy requires at least one sample".to_string(),
        ));
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
