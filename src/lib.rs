//! lgbm-pmml: convert LightGBM models into PMML tree ensembles.
//!
//! This crate reads the text dump written by LightGBM's `save_model()` and
//! re-expresses the boosted trees as a typed PMML document: a data
//! dictionary, a mining schema and a segmented mining model whose link
//! function matches the training objective.
//!
//! # Example
//!
//! ```ignore
//! use lgbm_pmml::{ConvertOptions, LgbModel};
//!
//! let model = LgbModel::from_file("model.txt")?;
//! let options = ConvertOptions::builder().num_iteration(100).build()?;
//! let pmml = model.encode_pmml(&options)?;
//! println!("{}", serde_json::to_string_pretty(&pmml)?);
//! ```

pub mod compat;
pub mod config;
pub mod pmml;
pub mod schema;
pub mod testing;
pub mod transform;
pub mod utils;

pub use compat::lightgbm::{ConversionError, LgbModel, ObjectiveFunction, ParseError};
pub use config::{ConfigError, ConvertOptions};
pub use pmml::Pmml;
pub use schema::{Feature, Label, Schema};
pub use transform::{compact_model, CompactionError};
