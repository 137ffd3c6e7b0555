use std::error::Error;
use std::fmt;

/// Model-level failures raised while fitting or predicting.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    NotFitted,
    EmptyTrainingSet,
    LabelCountMismatch { rows: usize, labels: usize },
    PredictionCountMismatch { labels: usize, predictions: usize },
    FeatureCountMismatch { expected: usize, got: usize },
    NonFiniteFeature(usize), // Index of the offending feature
    InvalidParameter(String),
}

impl ClassifierError {
    /// True when the error was caused by the caller's input rather than the model state.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ClassifierError::FeatureCountMismatch { .. } | ClassifierError::NonFiniteFeature(_)
        )
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassifierError::NotFitted => write!(f, "Model has not been fitted"),
            ClassifierError::EmptyTrainingSet => write!(f, "Cannot fit on an empty training set"),
            ClassifierError::LabelCountMismatch { rows, labels } => write!(
                f,
                "Feature matrix has {} rows but {} labels were given",
                rows, labels
            ),
            ClassifierError::PredictionCountMismatch {
                labels,
                predictions,
            } => write!(
                f,
                "{} true labels but {} predictions were given",
                labels, predictions
            ),
            ClassifierError::FeatureCountMismatch { expected, got } => write!(
                f,
                "expected {} features, but received {}",
                expected, got
            ),
            ClassifierError::NonFiniteFeature(idx) => {
                write!(f, "feature at position {} is not a finite number", idx)
            }
            ClassifierError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl Error for ClassifierError {}
