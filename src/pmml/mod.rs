//! Typed PMML document model.
//!
//! Only the subset of PMML 4.4 that tree ensembles need: the data
//! dictionary, mining schemas, tree / regression / mining models, and
//! output fields. Types derive `Serialize` so documents can be snapshotted
//! as JSON; XML marshalling is left to the caller.

mod builder;
mod mining;
mod tree;

use serde::Serialize;

use crate::schema::Label;

pub use builder::DocumentBuilder;
pub use mining::{
    create_binary_logistic_classification, create_classification, create_regression, MiningModel,
    Model, MultipleModelMethod, NormalizationMethod, NumericPredictor, RegressionModel,
    RegressionTable, Segment, Segmentation,
};
pub use tree::{
    MissingValueStrategy, NoTrueChildStrategy, Node, Predicate, SimpleOperator, SimplePredicate,
    SimpleSetPredicate, SplitCharacteristic, TreeModel,
};

pub const PMML_VERSION: &str = "4.4";

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pmml {
    pub version: String,
    pub header: Header,
    pub data_dictionary: Vec<DataField>,
    pub model: Model,
}

impl Pmml {
    pub fn data_field(&self, name: &str) -> Option<&DataField> {
        self.data_dictionary.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub application_name: String,
    pub application_version: String,
}

// =============================================================================
// Data dictionary
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Integer,
    Float,
    Double,
    Boolean,
}

impl DataType {
    pub fn is_floating(self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Continuous,
    Categorical,
}

/// Closed interval; an absent margin is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub left_margin: Option<f64>,
    pub right_margin: Option<f64>,
}

impl Interval {
    /// Interval with infinite bounds dropped; `None` when both are infinite.
    pub fn from_bounds(lo: f64, hi: f64) -> Option<Self> {
        let left_margin = lo.is_finite().then_some(lo);
        let right_margin = hi.is_finite().then_some(hi);
        if left_margin.is_none() && right_margin.is_none() {
            return None;
        }
        Some(Interval {
            left_margin,
            right_margin,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    pub name: String,
    pub op_type: OpType,
    pub data_type: DataType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intervals: Vec<Interval>,
}

// =============================================================================
// Mining schema
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MiningFunction {
    Regression,
    Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UsageType {
    Active,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InvalidValueTreatment {
    AsIs,
    AsMissing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningField {
    pub name: String,
    pub usage_type: UsageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_value_treatment: Option<InvalidValueTreatment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
}

impl MiningField {
    pub fn active(name: impl Into<String>) -> Self {
        MiningField {
            name: name.into(),
            usage_type: UsageType::Active,
            invalid_value_treatment: None,
            importance: None,
        }
    }

    pub fn target(name: impl Into<String>) -> Self {
        MiningField {
            usage_type: UsageType::Target,
            ..MiningField::active(name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MiningSchema {
    pub fields: Vec<MiningField>,
}

impl MiningSchema {
    /// Schema holding only the label's target field (none for anonymous labels).
    pub fn for_label(label: &Label) -> Self {
        MiningSchema {
            fields: label.name().map(MiningField::target).into_iter().collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&MiningField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

// =============================================================================
// Output
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultFeature {
    PredictedValue,
    Probability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputField {
    pub name: String,
    pub op_type: OpType,
    pub data_type: DataType,
    pub result_feature: ResultFeature,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub is_final_result: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Output {
    pub fields: Vec<OutputField>,
}

impl Output {
    /// Intermediate (non-final) raw score of an ensemble.
    pub fn predicted_value(name: impl Into<String>) -> Self {
        Output {
            fields: vec![OutputField {
                name: name.into(),
                op_type: OpType::Continuous,
                data_type: DataType::Double,
                result_feature: ResultFeature::PredictedValue,
                value: None,
                is_final_result: false,
            }],
        }
    }

    /// One `probability(<value>)` field per class.
    pub fn probabilities(values: &[String]) -> Self {
        Output {
            fields: values
                .iter()
                .map(|value| OutputField {
                    name: format!("probability({value})"),
                    op_type: OpType::Continuous,
                    data_type: DataType::Double,
                    result_feature: ResultFeature::Probability,
                    value: Some(value.clone()),
                    is_final_result: true,
                })
                .collect(),
        }
    }
}
