/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod split;
pub mod table;

pub use feature_engineering::{ClassEncoding, FeatureEngineer};
pub use normalization::{DataNormalizer, Scaling};
pub use split::{train_test_split, SplitIndices};
pub use table::{Dataset, TableLimits};
