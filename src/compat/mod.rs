//! External format compatibility loaders.
//!
//! This module provides loaders for models trained in external frameworks
//! and converts them to PMML documents.

pub mod lightgbm;

pub use lightgbm::{ConversionError, LgbModel, ParseError};
