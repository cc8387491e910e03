//! Feature and label descriptions shared by the decoder and the document
//! builder.
//!
//! A [`Schema`] holds one slot per LightGBM feature index. Slots of
//! features dropped during training are `None`.

use std::collections::HashMap;

use crate::pmml::{DataType, Interval, OpType};
use crate::utils::format_value;

/// How a feature is split on, and the domain it is declared over.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// Numeric feature compared against thresholds.
    Continuous {
        name: String,
        data_type: DataType,
        interval: Option<Interval>,
    },
    /// 0/1 indicator split at 0.5; `value` is the "on" value.
    Binary { name: String, value: String },
    /// Integer categories used as-is (the dump's own category indices).
    DirectCategorical { name: String, categories: Vec<u32> },
    /// Category index `i` stands for `labels[i]`.
    Categorical {
        name: String,
        data_type: DataType,
        labels: Vec<String>,
    },
}

impl Feature {
    pub fn name(&self) -> &str {
        match self {
            Feature::Continuous { name, .. }
            | Feature::Binary { name, .. }
            | Feature::DirectCategorical { name, .. }
            | Feature::Categorical { name, .. } => name,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Feature::Continuous { data_type, .. } | Feature::Categorical { data_type, .. } => *data_type,
            Feature::Binary { .. } | Feature::DirectCategorical { .. } => DataType::Integer,
        }
    }

    pub fn op_type(&self) -> OpType {
        match self {
            Feature::Continuous { .. } => OpType::Continuous,
            _ => OpType::Categorical,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(
            self,
            Feature::DirectCategorical { .. } | Feature::Categorical { .. }
        )
    }

    /// Category indices a bitset split may select, ascending.
    pub fn category_indices(&self) -> Vec<u32> {
        match self {
            Feature::DirectCategorical { categories, .. } => categories.clone(),
            Feature::Categorical { labels, .. } => (0..labels.len() as u32).collect(),
            _ => Vec::new(),
        }
    }

    /// Document value of a category index, if it belongs to the domain.
    pub fn category_label(&self, category: u32) -> Option<String> {
        match self {
            Feature::DirectCategorical { categories, .. } => categories
                .binary_search(&category)
                .ok()
                .map(|_| category.to_string()),
            Feature::Categorical { labels, .. } => labels.get(category as usize).cloned(),
            _ => None,
        }
    }

    /// Valid values declared on the feature's data field.
    pub fn valid_values(&self) -> Vec<String> {
        match self {
            Feature::Continuous { .. } => Vec::new(),
            Feature::Binary { .. } => vec!["0".to_owned(), "1".to_owned()],
            Feature::DirectCategorical { categories, .. } => {
                categories.iter().map(u32::to_string).collect()
            }
            Feature::Categorical { labels, .. } => labels.clone(),
        }
    }

    /// Reinterpret the feature as a plain numeric input of the same type.
    pub fn into_continuous(self) -> Feature {
        let data_type = self.data_type();
        match self {
            Feature::Continuous { .. } => self,
            Feature::Binary { name, .. }
            | Feature::DirectCategorical { name, .. }
            | Feature::Categorical { name, .. } => Feature::Continuous {
                name,
                data_type,
                interval: None,
            },
        }
    }
}

/// Target of a model; unnamed labels describe intermediate segments.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Continuous {
        name: Option<String>,
        data_type: DataType,
    },
    Categorical {
        name: Option<String>,
        data_type: DataType,
        values: Vec<String>,
    },
}

impl Label {
    pub fn name(&self) -> Option<&str> {
        match self {
            Label::Continuous { name, .. } | Label::Categorical { name, .. } => name.as_deref(),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Label::Continuous { data_type, .. } | Label::Categorical { data_type, .. } => *data_type,
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Label::Continuous { .. } => &[],
            Label::Categorical { values, .. } => values,
        }
    }

    /// Anonymous double-valued label of a raw-score segment.
    pub fn anonymous_regressor() -> Self {
        Label::Continuous {
            name: None,
            data_type: DataType::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    label: Label,
    features: Vec<Option<Feature>>,
    importances: HashMap<String, f64>,
}

impl Schema {
    pub fn new(label: Label, features: Vec<Option<Feature>>) -> Self {
        Schema {
            label,
            features,
            importances: HashMap::new(),
        }
    }

    pub fn with_importances(mut self, importances: HashMap<String, f64>) -> Self {
        self.importances = importances;
        self
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn features(&self) -> &[Option<Feature>] {
        &self.features
    }

    pub fn into_features(self) -> Vec<Option<Feature>> {
        self.features
    }

    /// Feature at a LightGBM feature index; `None` if dropped or out of range.
    pub fn feature(&self, index: usize) -> Option<&Feature> {
        self.features.get(index).and_then(Option::as_ref)
    }

    pub fn active_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().flatten()
    }

    pub fn importance(&self, name: &str) -> Option<f64> {
        self.importances.get(name).copied()
    }
}

/// Labels `"0".."n-1"` used when a classifier's categories are not given.
pub fn default_categories(n: usize) -> Vec<String> {
    (0..n).map(|i| format_value(i as f64)).collect()
}
