//! Command-line front end for diagnose: model training, the prediction
//! service and its smoke test.
pub mod serve;
pub mod smoke;
pub mod train;
pub mod util;
