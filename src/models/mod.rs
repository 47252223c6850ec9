/// ML модели и операции сервиса

pub mod anonymizer;
pub mod linear;
pub mod logistic;
pub mod metrics;
pub mod utility;

pub use anonymizer::{AnonymizationReport, Anonymizer};
pub use linear::{BaselineRegressor, PrivateLinearRegression};
pub use logistic::{BaselineClassifier, PrivateLogisticRegression};
pub use utility::UtilityEvaluator;
