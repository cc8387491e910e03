//! Ensemble models and the model-chain helpers that attach a link function
//! to a raw-score ensemble.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{MiningFunction, MiningSchema, Output, Predicate, TreeModel};
use crate::schema::Label;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Model {
    MiningModel(MiningModel),
    TreeModel(TreeModel),
    RegressionModel(RegressionModel),
}

impl Model {
    pub fn mining_schema(&self) -> &MiningSchema {
        match self {
            Model::MiningModel(model) => &model.mining_schema,
            Model::TreeModel(model) => &model.mining_schema,
            Model::RegressionModel(model) => &model.mining_schema,
        }
    }

    pub fn mining_schema_mut(&mut self) -> &mut MiningSchema {
        match self {
            Model::MiningModel(model) => &mut model.mining_schema,
            Model::TreeModel(model) => &mut model.mining_schema,
            Model::RegressionModel(model) => &mut model.mining_schema,
        }
    }

    pub fn mining_function(&self) -> MiningFunction {
        match self {
            Model::MiningModel(model) => model.mining_function,
            Model::TreeModel(model) => model.mining_function,
            Model::RegressionModel(model) => model.mining_function,
        }
    }

    /// Every field name referenced by predicates or predictors in this model
    /// and its nested models.
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, fields: &mut BTreeSet<String>) {
        match self {
            Model::MiningModel(model) => {
                for segment in &model.segmentation.segments {
                    segment.model.collect_fields(fields);
                }
            }
            Model::TreeModel(model) => {
                let mut stack = vec![&model.node];
                while let Some(node) = stack.pop() {
                    if let Some(field) = node.predicate.field() {
                        fields.insert(field.to_owned());
                    }
                    stack.extend(node.nodes.iter());
                }
            }
            Model::RegressionModel(model) => {
                for table in &model.regression_tables {
                    fields.extend(table.numeric_predictors.iter().map(|p| p.name.clone()));
                }
            }
        }
    }

    /// All tree models in document order.
    pub fn tree_models(&self) -> Vec<&TreeModel> {
        match self {
            Model::TreeModel(model) => vec![model],
            Model::MiningModel(model) => model
                .segmentation
                .segments
                .iter()
                .flat_map(|segment| segment.model.tree_models())
                .collect(),
            Model::RegressionModel(_) => Vec::new(),
        }
    }
}

// =============================================================================
// Mining model
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MultipleModelMethod {
    Sum,
    Average,
    ModelChain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub id: String,
    pub predicate: Predicate,
    pub model: Model,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segmentation {
    pub multiple_model_method: MultipleModelMethod,
    pub segments: Vec<Segment>,
}

impl Segmentation {
    /// Segments numbered from 1, each selected unconditionally.
    pub fn new(method: MultipleModelMethod, models: impl IntoIterator<Item = Model>) -> Self {
        Segmentation {
            multiple_model_method: method,
            segments: models
                .into_iter()
                .enumerate()
                .map(|(i, model)| Segment {
                    id: (i + 1).to_string(),
                    predicate: Predicate::True,
                    model,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningModel {
    pub mining_function: MiningFunction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm_name: Option<String>,
    pub mining_schema: MiningSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
    pub segmentation: Segmentation,
}

impl MiningModel {
    pub fn new(mining_function: MiningFunction, label: &Label, segmentation: Segmentation) -> Self {
        MiningModel {
            mining_function,
            algorithm_name: None,
            mining_schema: MiningSchema::for_label(label),
            output: None,
            segmentation,
        }
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }
}

// =============================================================================
// Regression model
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NormalizationMethod {
    None,
    Exp,
    Logit,
    Softmax,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericPredictor {
    pub name: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionTable {
    pub intercept: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub numeric_predictors: Vec<NumericPredictor>,
}

impl RegressionTable {
    fn over(field: &str, coefficient: f64, intercept: f64) -> Self {
        RegressionTable {
            intercept,
            target_category: None,
            numeric_predictors: vec![NumericPredictor {
                name: field.to_owned(),
                coefficient,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionModel {
    pub mining_function: MiningFunction,
    pub mining_schema: MiningSchema,
    pub normalization_method: NormalizationMethod,
    pub regression_tables: Vec<RegressionTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
}

// =============================================================================
// Model chains
// =============================================================================

/// Chain `model` (which must expose `field` as an output) into a regression
/// model applying `normalization` to it.
pub fn create_regression(
    model: Model,
    field: &str,
    normalization: NormalizationMethod,
    label: &Label,
) -> MiningModel {
    let regression = RegressionModel {
        mining_function: MiningFunction::Regression,
        mining_schema: MiningSchema::for_label(label),
        normalization_method: normalization,
        regression_tables: vec![RegressionTable::over(field, 1.0, 0.0)],
        output: None,
    };
    MiningModel::new(
        MiningFunction::Regression,
        label,
        Segmentation::new(
            MultipleModelMethod::ModelChain,
            [model, Model::RegressionModel(regression)],
        ),
    )
}

/// Chain a raw-score model into a two-class logistic regression.
///
/// The positive class scores `coefficient * field + intercept`, the
/// negative class is the reference category.
pub fn create_binary_logistic_classification(
    model: Model,
    field: &str,
    coefficient: f64,
    intercept: f64,
    (negative, positive): (&str, &str),
    label: &Label,
) -> MiningModel {
    let mut active = RegressionTable::over(field, coefficient, intercept);
    active.target_category = Some(positive.to_owned());
    let passive = RegressionTable {
        intercept: 0.0,
        target_category: Some(negative.to_owned()),
        numeric_predictors: Vec::new(),
    };
    let regression = RegressionModel {
        mining_function: MiningFunction::Classification,
        mining_schema: MiningSchema::for_label(label),
        normalization_method: NormalizationMethod::Logit,
        regression_tables: vec![active, passive],
        output: Some(Output::probabilities(&[negative.to_owned(), positive.to_owned()])),
    };
    MiningModel::new(
        MiningFunction::Classification,
        label,
        Segmentation::new(
            MultipleModelMethod::ModelChain,
            [model, Model::RegressionModel(regression)],
        ),
    )
}

/// Chain one raw-score model per class into a normalized classification.
///
/// `models` pairs each class value with the model and its output field.
pub fn create_classification(
    models: Vec<(String, String, Model)>,
    normalization: NormalizationMethod,
    label: &Label,
) -> MiningModel {
    let values: Vec<String> = models.iter().map(|(value, _, _)| value.clone()).collect();
    let tables = models
        .iter()
        .map(|(value, field, _)| {
            let mut table = RegressionTable::over(field, 1.0, 0.0);
            table.target_category = Some(value.clone());
            table
        })
        .collect();
    let regression = RegressionModel {
        mining_function: MiningFunction::Classification,
        mining_schema: MiningSchema::for_label(label),
        normalization_method: normalization,
        regression_tables: tables,
        output: Some(Output::probabilities(&values)),
    };
    let segments = models
        .into_iter()
        .map(|(_, _, model)| model)
        .chain(std::iter::once(Model::RegressionModel(regression)));
    MiningModel::new(
        MiningFunction::Classification,
        label,
        Segmentation::new(MultipleModelMethod::ModelChain, segments),
    )
}
