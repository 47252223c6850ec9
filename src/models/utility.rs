//! Utility evaluation: baseline versus private model on one train/test split

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::ServiceError;
use crate::models::linear::{BaselineRegressor, PrivateLinearRegression};
use crate::models::logistic::{BaselineClassifier, PrivateLogisticRegression};
use crate::models::metrics::{accuracy, r2_score};
use crate::preprocessing::{
    train_test_split, DataNormalizer, Dataset, FeatureEngineer, Scaling, SplitIndices, TableLimits,
};
use crate::types::{AccuracyOutput, ModelAlgorithm, ModelEvaluationRequest};

pub struct UtilityEvaluator {
    request: ModelEvaluationRequest,
}

impl UtilityEvaluator {
    pub fn new(request: ModelEvaluationRequest) -> Self {
        Self { request }
    }

    pub fn evaluate_file(&self, input: &Path, limits: TableLimits) -> Result<AccuracyOutput, ServiceError> {
        let dataset = Dataset::from_path(input, limits)?;
        tracing::info!(
            "Loaded {} rows x {} columns, inputs={:?}, output={}",
            dataset.n_rows(),
            dataset.n_columns(),
            self.request.input_columns,
            self.request.output_column
        );
        self.evaluate(&dataset)
    }

    /// Checks columns, splits, then fits and scores both models on the same
    /// partition. The first failure aborts.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<AccuracyOutput, ServiceError> {
        self.validate_columns(dataset)?;

        let mut split_rng = match self.request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let split = train_test_split(dataset.n_rows(), self.request.split.test_fraction, &mut split_rng)?;

        tracing::info!(
            "Evaluating {:?} on {} train / {} test rows, epsilon {}",
            self.request.algorithm,
            split.train.len(),
            split.test.len(),
            self.request.model_epsilon
        );

        match self.request.algorithm {
            ModelAlgorithm::Classification => self.evaluate_classification(dataset, &split),
            ModelAlgorithm::Regression => self.evaluate_regression(dataset, &split),
        }
    }

    fn validate_columns(&self, dataset: &Dataset) -> Result<(), ServiceError> {
        let output_ok = dataset.has_column(&self.request.output_column);
        let inputs_ok = !self.request.input_columns.is_empty()
            && self.request.input_columns.iter().all(|c| dataset.has_column(c));

        if output_ok && inputs_ok {
            Ok(())
        } else {
            Err(ServiceError::InvalidColumns)
        }
    }

    fn standardized_features(
        &self,
        dataset: &Dataset,
        split: &SplitIndices,
    ) -> Result<(ndarray::Array2<f64>, ndarray::Array2<f64>), ServiceError> {
        let columns = &self.request.input_columns;
        let x_train = FeatureEngineer::extract_features(dataset, columns, &split.train)?;
        let x_test = FeatureEngineer::extract_features(dataset, columns, &split.test)?;

        let mut normalizer = DataNormalizer::new(Scaling::Standard);
        let x_train = normalizer.fit_transform(&x_train)?;
        let x_test = normalizer.transform(&x_test)?;
        Ok((x_train, x_test))
    }

    fn evaluate_classification(
        &self,
        dataset: &Dataset,
        split: &SplitIndices,
    ) -> Result<AccuracyOutput, ServiceError> {
        let output = &self.request.output_column;
        let encoding = FeatureEngineer::class_encoding(dataset, output)?;
        tracing::debug!("Label column '{}' has {} classes", output, encoding.n_classes());
        let y_train = FeatureEngineer::extract_class_labels(dataset, output, &split.train, &encoding)?;
        let y_test = FeatureEngineer::extract_class_labels(dataset, output, &split.test, &encoding)?;
        let (x_train, x_test) = self.standardized_features(dataset, split)?;

        let baseline = BaselineClassifier::fit(&x_train, &y_train)?;
        let accuracy1 = accuracy(&baseline.predict(&x_test), &y_test);

        let private = PrivateLogisticRegression::new(self.request.model_epsilon)?.fit(
            &x_train,
            &y_train,
            &mut rand::thread_rng(),
        )?;
        let accuracy2 = accuracy(&private.predict(&x_test), &y_test);

        Ok(AccuracyOutput {
            accuracy1,
            accuracy2,
        })
    }

    fn evaluate_regression(
        &self,
        dataset: &Dataset,
        split: &SplitIndices,
    ) -> Result<AccuracyOutput, ServiceError> {
        let output = &self.request.output_column;
        let columns = &self.request.input_columns;
        let y_train = FeatureEngineer::extract_numeric_target(dataset, output, &split.train)?;
        let y_test = FeatureEngineer::extract_numeric_target(dataset, output, &split.test)?;
        let x_train = FeatureEngineer::extract_features(dataset, columns, &split.train)?;
        let x_test = FeatureEngineer::extract_features(dataset, columns, &split.test)?;

        let baseline = BaselineRegressor::fit(&x_train, &y_train)?;
        let accuracy1 = r2_score(&baseline.predict(&x_test), &y_test);

        let private = PrivateLinearRegression::new(self.request.model_epsilon)?.fit(
            &x_train,
            &y_train,
            &mut rand::thread_rng(),
        )?;
        let accuracy2 = r2_score(&private.predict(&x_test)?, &y_test);

        Ok(AccuracyOutput {
            accuracy1,
            accuracy2,
        })
    }
}
