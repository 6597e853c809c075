//! Feature preprocessing
//!
//! One composite transformation with two independent branches:
//! median-impute + standard-scale for numeric columns, most-frequent-impute
//! + one-hot encode for categorical columns. Fit once on training data,
//! applied unchanged everywhere else.

mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use encoder::{ExpandsFeatureNames, OneHotEncoder};
pub use imputer::{FillValue, ImputeStrategy, Imputer};
pub use pipeline::FeaturePreprocessor;
pub use scaler::StandardScaler;
