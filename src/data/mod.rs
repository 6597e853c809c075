//! Data handling: loading, exploratory summary, cleaning and splitting

mod loader;
mod prepare;
mod summary;

pub use loader::load_dataset;
pub use prepare::{
    clean, train_test_split, PreparedData, TrainTestSplit, BINARY_COLUMNS, CHARGES_COLUMN,
    ID_COLUMN, TARGET_COLUMN,
};
pub use summary::{summarize, EdaReport};
