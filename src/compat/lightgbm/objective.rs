//! Objective functions: how a list of decoded trees becomes a model.
//!
//! LightGBM accepts many spellings for the same loss. The dump stores the
//! name the user typed, so names are first standardized through
//! [`OBJECTIVE_ALIASES`] and then dispatched to one of five strategies.

use tracing::debug;

use super::convert::{encode_tree_model, ConversionError};
use super::text::{ParseError, Section};
use super::tree::LgbTree;
use crate::pmml::{
    create_binary_logistic_classification, create_classification, create_regression, DataType,
    MiningFunction, MiningModel, Model, MultipleModelMethod, NormalizationMethod, Output,
    Segmentation,
};
use crate::schema::{default_categories, Label, Schema};
use crate::utils::Parallelism;

/// Name of the intermediate raw-score output of chained ensembles.
pub const RAW_SCORE_FIELD: &str = "lgbmValue";

/// Alternative objective spellings and their canonical names.
pub const OBJECTIVE_ALIASES: &[(&str, &str)] = &[
    ("regression_l2", "regression"),
    ("mean_squared_error", "regression"),
    ("mse", "regression"),
    ("l2", "regression"),
    ("l2_root", "regression"),
    ("root_mean_squared_error", "regression"),
    ("rmse", "regression"),
    ("mean_absolute_error", "regression_l1"),
    ("l1", "regression_l1"),
    ("mae", "regression_l1"),
    ("softmax", "multiclass"),
    ("multiclass_ova", "multiclassova"),
    ("ova", "multiclassova"),
    ("ovr", "multiclassova"),
    ("xentropy", "cross_entropy"),
    ("xentlambda", "cross_entropy_lambda"),
    ("mean_absolute_percentage_error", "mape"),
    ("none", "custom"),
    ("null", "custom"),
    ("na", "custom"),
];

/// Canonical, lower-case objective name.
pub fn standardize(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    OBJECTIVE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| (*canonical).to_owned())
        .unwrap_or(name)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectiveKind {
    /// Identity link, continuous target
    Regression,
    /// Log link: the raw score is exponentiated
    PoissonRegression,
    /// Ranking scores, identity link
    Lambdarank,
    /// Two classes, logistic link with the given steepness
    BinomialLogisticRegression { sigmoid: f64 },
    /// One tree per class per iteration, softmax link
    MultinomialLogisticRegression { num_class: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveFunction {
    name: String,
    average_output: bool,
    kind: ObjectiveKind,
}

impl ObjectiveFunction {
    pub fn new(name: impl Into<String>, kind: ObjectiveKind, average_output: bool) -> Self {
        ObjectiveFunction {
            name: name.into(),
            average_output,
            kind,
        }
    }

    /// Parse an objective string such as `binary sigmoid:1` or
    /// `multiclass num_class:3`.
    ///
    /// Returns `Ok(None)` for custom objectives, which carry no link
    /// function; the caller has to supply one before encoding.
    pub fn parse(objective: &str, average_output: bool) -> Result<Option<Self>, ParseError> {
        let mut tokens = objective.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| ParseError::invalid("objective", "empty objective"))?;
        let config = Section::from_tokens(tokens, ':');
        let name = standardize(name);

        let kind = match name.as_str() {
            "regression" | "regression_l1" | "huber" | "fair" | "quantile" => ObjectiveKind::Regression,
            "poisson" | "gamma" | "tweedie" => ObjectiveKind::PoissonRegression,
            "lambdarank" => ObjectiveKind::Lambdarank,
            "binary" => ObjectiveKind::BinomialLogisticRegression {
                sigmoid: config.get_double("sigmoid")?,
            },
            "cross_entropy" => ObjectiveKind::BinomialLogisticRegression { sigmoid: 1.0 },
            "multiclass" => {
                let num_class = config.get_int("num_class")?;
                let num_class = usize::try_from(num_class)
                    .ok()
                    .filter(|&n| n >= 2)
                    .ok_or_else(|| ParseError::invalid("num_class", format!("{num_class} classes")))?;
                ObjectiveKind::MultinomialLogisticRegression { num_class }
            }
            "custom" => return Ok(None),
            _ => return Err(ParseError::UnknownObjective(name)),
        };
        Ok(Some(ObjectiveFunction::new(name, kind, average_output)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    pub fn average_output(&self) -> bool {
        self.average_output
    }

    /// Number of target categories, or `None` for regression-type objectives.
    pub fn num_class(&self) -> Option<usize> {
        match self.kind {
            ObjectiveKind::BinomialLogisticRegression { .. } => Some(2),
            ObjectiveKind::MultinomialLogisticRegression { num_class } => Some(num_class),
            _ => None,
        }
    }

    /// Build the model's target.
    ///
    /// Classifiers default to the categories `"0".."n-1"`; supplied
    /// categories must match the class count.
    pub fn encode_label(
        &self,
        name: &str,
        target_categories: Option<&[String]>,
    ) -> Result<Label, ConversionError> {
        let Some(num_class) = self.num_class() else {
            if target_categories.is_some_and(|categories| !categories.is_empty()) {
                return Err(ConversionError::UnexpectedTargetCategories);
            }
            return Ok(Label::Continuous {
                name: Some(name.to_owned()),
                data_type: DataType::Double,
            });
        };

        let (data_type, values) = match target_categories {
            Some(categories) => {
                if categories.len() != num_class {
                    return Err(ConversionError::TargetCategoryMismatch {
                        expected: num_class,
                        actual: categories.len(),
                    });
                }
                (DataType::String, categories.to_vec())
            }
            None => (DataType::Integer, default_categories(num_class)),
        };
        Ok(Label::Categorical {
            name: Some(name.to_owned()),
            data_type,
            values,
        })
    }

    /// Assemble the ensemble for `trees`.
    ///
    /// `num_iteration` keeps only the first N trees (the first N iterations
    /// per class for multinomial models).
    pub fn encode_model(
        &self,
        trees: &[LgbTree],
        num_iteration: Option<usize>,
        schema: &Schema,
        parallelism: Parallelism,
    ) -> Result<Model, ConversionError> {
        let label = schema.label();
        let trees: Vec<(usize, &LgbTree)> = trees.iter().enumerate().collect();
        let model = match self.kind {
            ObjectiveKind::Regression | ObjectiveKind::Lambdarank => {
                self.mining_model(trees, num_iteration, label, schema, parallelism)?
            }
            ObjectiveKind::PoissonRegression => {
                let segment_label = Label::anonymous_regressor();
                let ensemble = self
                    .mining_model(trees, num_iteration, &segment_label, schema, parallelism)?
                    .with_output(Output::predicted_value(RAW_SCORE_FIELD));
                create_regression(
                    Model::MiningModel(ensemble),
                    RAW_SCORE_FIELD,
                    NormalizationMethod::Exp,
                    label,
                )
            }
            ObjectiveKind::BinomialLogisticRegression { sigmoid } => {
                let segment_label = Label::anonymous_regressor();
                let ensemble = self
                    .mining_model(trees, num_iteration, &segment_label, schema, parallelism)?
                    .with_output(Output::predicted_value(RAW_SCORE_FIELD));
                let values = label.values();
                let [negative, positive] = values else {
                    return Err(ConversionError::TargetCategoryMismatch {
                        expected: 2,
                        actual: values.len(),
                    });
                };
                create_binary_logistic_classification(
                    Model::MiningModel(ensemble),
                    RAW_SCORE_FIELD,
                    sigmoid,
                    0.0,
                    (negative.as_str(), positive.as_str()),
                    label,
                )
            }
            ObjectiveKind::MultinomialLogisticRegression { num_class } => {
                if trees.len() % num_class != 0 {
                    return Err(ConversionError::TreeCountNotDivisible {
                        trees: trees.len(),
                        num_class,
                    });
                }
                let values = label.values();
                if values.len() != num_class {
                    return Err(ConversionError::TargetCategoryMismatch {
                        expected: num_class,
                        actual: values.len(),
                    });
                }
                let segment_label = Label::anonymous_regressor();
                let models = values
                    .iter()
                    .enumerate()
                    .map(|(class, value)| {
                        let class_trees = class_trees(&trees, class, num_class).collect();
                        let field = format!("{RAW_SCORE_FIELD}({value})");
                        let ensemble = self
                            .mining_model(class_trees, num_iteration, &segment_label, schema, parallelism)?
                            .with_output(Output::predicted_value(field.clone()));
                        Ok((value.clone(), field, Model::MiningModel(ensemble)))
                    })
                    .collect::<Result<Vec<_>, ConversionError>>()?;
                create_classification(models, NormalizationMethod::Softmax, label)
            }
        };
        Ok(Model::MiningModel(model))
    }

    /// Sum (or average) of one tree model per tree.
    fn mining_model(
        &self,
        trees: Vec<(usize, &LgbTree)>,
        num_iteration: Option<usize>,
        label: &Label,
        schema: &Schema,
        parallelism: Parallelism,
    ) -> Result<MiningModel, ConversionError> {
        let trees = match num_iteration {
            Some(limit) if limit > trees.len() => {
                return Err(ConversionError::TreeLimitExceeded {
                    limit,
                    available: trees.len(),
                })
            }
            Some(limit) => trees.into_iter().take(limit).collect(),
            None => trees,
        };
        debug!(objective = %self.name, trees = trees.len(), "encoding ensemble");

        let models = parallelism.maybe_par_try_map(trees, |(index, tree)| {
            encode_tree_model(tree, index, schema).map(Model::TreeModel)
        })?;
        let method = if self.average_output {
            MultipleModelMethod::Average
        } else {
            MultipleModelMethod::Sum
        };
        Ok(MiningModel::new(
            MiningFunction::Regression,
            label,
            Segmentation::new(method, models),
        ))
    }
}

/// Trees of one class in a multiclass dump, which interleaves classes
/// within every iteration.
pub fn class_trees<T: Copy>(trees: &[T], class: usize, num_class: usize) -> impl Iterator<Item = T> + '_ {
    trees.iter().skip(class).step_by(num_class).copied()
}
