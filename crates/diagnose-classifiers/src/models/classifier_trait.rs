use crate::error::ClassifierError;
use crate::math::{Array1, Array2};
use crate::metrics::accuracy_score;

/// Contract shared by the classifiers in this crate.
///
/// Labels are arbitrary integers; `classes()` lists them in ascending order and
/// the columns of `predict_proba` follow that order.
pub trait ClassifierModel {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<i32>) -> Result<(), ClassifierError>;

    /// Class-membership probabilities, one row per sample.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Array2<f64>, ClassifierError>;

    /// Labels seen during `fit`, ascending. Empty before fitting.
    fn classes(&self) -> &[i32];

    /// Number of features the model was fitted on.
    fn n_features_in(&self) -> Option<usize>;

    /// Most probable class per sample. Ties resolve to the smaller label.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<i32>, ClassifierError> {
        let proba = self.predict_proba(x)?;
        let classes = self.classes();
        Ok(proba
            .rows()
            .map(|row| classes[argmax(row)])
            .collect())
    }

    /// Mean accuracy on the given samples.
    fn score(&self, x: &Array2<f32>, y: &Array1<i32>) -> Result<f64, ClassifierError> {
        let predictions = self.predict(x)?;
        accuracy_score(y.as_slice(), &predictions)
    }

    fn name(&self) -> &str {
        "classifier"
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = idx;
        }
    }
    best
}

/// Checks shared by every `predict_proba` implementation.
pub(crate) fn check_input(x: &Array2<f32>, n_features: Option<usize>) -> Result<(), ClassifierError> {
    let expected = n_features.ok_or(ClassifierError::NotFitted)?;
    if x.ncols() != expected {
        return Err(ClassifierError::FeatureCountMismatch {
            expected,
            got: x.ncols(),
        });
    }
    for row in x.rows() {
        if let Some(idx) = row.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteFeature(idx));
        }
    }
    Ok(())
}

/// Validates a training set and maps labels to class indices.
pub(crate) fn encode_labels(
    x: &Array2<f32>,
    y: &Array1<i32>,
) -> Result<(Vec<i32>, Vec<usize>), ClassifierError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ClassifierError::LabelCountMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    if let Some(idx) = x.as_slice().iter().position(|v| !v.is_finite()) {
        return Err(ClassifierError::NonFiniteFeature(idx % x.ncols()));
    }
    let classes = y.unique_sorted();
    let encoded = y
        .iter()
        .map(|label| classes.binary_search(label).unwrap_or_default())
        .collect();
    Ok((classes, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.2, 0.3, 0.5]), 2);
    }

    #[test]
    fn encode_labels_sorts_classes() {
        let x = Array2::from_shape_vec((3, 1), vec![0.0, 1.0, 2.0]).unwrap();
        let y = Array1::from_vec(vec![7, -1, 7]);
        let (classes, encoded) = encode_labels(&x, &y).unwrap();
        assert_eq!(classes, vec![-1, 7]);
        assert_eq!(encoded, vec![1, 0, 1]);
    }

    #[test]
    fn check_input_flags_wrong_width() {
        let x = Array2::from_shape_vec((1, 2), vec![0.0, 1.0]).unwrap();
        assert_eq!(
            check_input(&x, Some(3)),
            Err(ClassifierError::FeatureCountMismatch { expected: 3, got: 2 })
        );
        assert_eq!(check_input(&x, None), Err(ClassifierError::NotFitted));
    }
}
