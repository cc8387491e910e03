//! Conversion options with builder pattern.
//!
//! [`ConvertOptions`] controls how a loaded model is turned into a document.
//! It uses the `bon` crate for builder generation with validation, and
//! derives `Deserialize` so options can also come from a config file.
//!
//! # Example
//!
//! ```
//! use lgbm_pmml::ConvertOptions;
//!
//! // All defaults: compacted trees, NaN treated as missing
//! let options = ConvertOptions::builder().build().unwrap();
//!
//! // First 50 iterations, named classes
//! let options = ConvertOptions::builder()
//!     .num_iteration(50)
//!     .target_name("species".to_owned())
//!     .target_categories(vec!["setosa".into(), "versicolor".into(), "virginica".into()])
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;
use serde::Deserialize;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during option validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A tree limit of zero would produce an empty ensemble.
    InvalidNumIteration,
    /// Target categories were given but empty.
    EmptyTargetCategories,
    /// Target categories must be unique.
    DuplicateTargetCategory(String),
    /// The target name is empty.
    EmptyTargetName,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumIteration => write!(f, "num_iteration must be at least 1"),
            Self::EmptyTargetCategories => write!(f, "target_categories must not be empty"),
            Self::DuplicateTargetCategory(value) => {
                write!(f, "target category {:?} is listed more than once", value)
            }
            Self::EmptyTargetName => write!(f, "target_name must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// ConvertOptions
// =============================================================================

/// Options for converting a LightGBM model.
#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct ConvertOptions {
    /// Rewrite binary default-child trees into compact multi-way trees.
    /// Default: true.
    #[builder(default = true)]
    pub compact: bool,

    /// Declare `NaN` as a missing value of floating-point fields. Default: true.
    #[builder(default = true)]
    pub nan_as_missing: bool,

    /// Keep only the first N boosting iterations. `None` keeps all trees.
    pub num_iteration: Option<usize>,

    /// Name of the target field. `None` uses `_target`.
    pub target_name: Option<String>,

    /// Class labels of a classifier, in class index order.
    pub target_categories: Option<Vec<String>>,

    /// Number of threads for tree decoding; 0 = auto, 1 = sequential.
    #[builder(default)]
    pub n_threads: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            compact: true,
            nan_as_missing: true,
            num_iteration: None,
            target_name: None,
            target_categories: None,
            n_threads: 0,
        }
    }
}

/// Custom finishing function that validates the options.
impl<S: convert_options_builder::IsComplete> ConvertOptionsBuilder<S> {
    /// Build and validate the options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `num_iteration` is zero, or the target
    /// name or categories are empty or duplicated.
    pub fn build(self) -> Result<ConvertOptions, ConfigError> {
        let options = self.__build_internal();
        options.validate()?;
        Ok(options)
    }
}

impl ConvertOptions {
    /// Validate the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_iteration == Some(0) {
            return Err(ConfigError::InvalidNumIteration);
        }
        if self.target_name.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::EmptyTargetName);
        }
        if let Some(categories) = &self.target_categories {
            if categories.is_empty() {
                return Err(ConfigError::EmptyTargetCategories);
            }
            for (i, value) in categories.iter().enumerate() {
                if categories[..i].contains(value) {
                    return Err(ConfigError::DuplicateTargetCategory(value.clone()));
                }
            }
        }
        Ok(())
    }
}
