//! LightGBM text model loading and conversion.
//!
//! This module parses the text format written by `Booster.save_model()` and
//! converts the parsed model into a PMML tree ensemble.
//!
//! # Format Overview
//!
//! A dump is a sequence of blank-line separated sections:
//! - A `tree` header with the version, objective and feature descriptors
//! - `Tree=0`, `Tree=1`, ... holding each tree's parallel node arrays
//! - Optional trailing sections: feature importances, training parameters
//!   and the `pandas_categorical` category lists
//!
//! # Example
//!
//! ```ignore
//! use lgbm_pmml::compat::lightgbm::LgbModel;
//! use lgbm_pmml::ConvertOptions;
//!
//! let model = LgbModel::from_file("model.txt")?;
//! let pmml = model.encode_pmml(&ConvertOptions::default())?;
//! ```

mod convert;
mod model;
mod objective;
mod pandas;
mod text;
mod tree;

pub use convert::{encode_tree_model, ConversionError};
pub use model::{LgbHeader, LgbModel, ALGORITHM_NAME, DEFAULT_TARGET_NAME, SUPPORTED_VERSIONS};
pub use objective::{class_trees, standardize, ObjectiveFunction, ObjectiveKind, RAW_SCORE_FIELD};
pub use pandas::{parse_pandas_categorical, Category, CategoryList, PANDAS_CATEGORICAL_PREFIX};
pub use text::{sections, FeatureInfo, ParseError, Section, SectionReader};
pub use tree::{bitset_members, find_in_bitset, DecisionType, LgbTree, MissingType};
