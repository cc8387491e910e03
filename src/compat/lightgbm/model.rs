//! A loaded LightGBM model and its conversion entry points.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::iter::Peekable;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use super::convert::ConversionError;
use super::objective::ObjectiveFunction;
use super::pandas::{parse_pandas_categorical, CategoryList, PANDAS_CATEGORICAL_PREFIX};
use super::text::{sections, FeatureInfo, ParseError, Section, SectionReader};
use super::tree::LgbTree;
use crate::config::ConvertOptions;
use crate::pmml::{DataType, DocumentBuilder, Interval, Model, Pmml};
use crate::schema::{Feature, Schema};
use crate::transform::compact_model;
use crate::utils::Parallelism;

/// Dump format versions this crate understands.
pub const SUPPORTED_VERSIONS: &[&str] = &["v2", "v3", "v4"];

/// Target name used when none is configured.
pub const DEFAULT_TARGET_NAME: &str = "_target";

pub const ALGORITHM_NAME: &str = "LightGBM";

// =============================================================================
// Model header
// =============================================================================

/// Parsed LightGBM model header.
#[derive(Debug, Clone, PartialEq)]
pub struct LgbHeader {
    /// Model format version (e.g., "v4"), when the dump declares one
    pub version: Option<String>,
    pub num_class: usize,
    pub num_tree_per_iteration: usize,
    pub label_index: i32,
    /// Maximum feature index used (0-based)
    pub max_feature_idx: usize,
    pub average_output: bool,
    /// Raw objective line, e.g. `"binary sigmoid:1"`; `None` for custom objectives
    pub objective: Option<String>,
    pub feature_names: Vec<String>,
    pub feature_infos: Vec<FeatureInfo>,
}

impl LgbHeader {
    fn from_section(section: &Section) -> Result<Self, ParseError> {
        if section.id() != "tree" {
            return Err(ParseError::UnexpectedSection {
                expected: "tree".to_owned(),
                found: section.id().to_owned(),
            });
        }

        let version = match section.get("version") {
            Some(_) => Some(section.get_string("version")?),
            None => None,
        };
        if let Some(version) = version.as_deref().filter(|v| !SUPPORTED_VERSIONS.contains(v)) {
            return Err(ParseError::UnsupportedVersion(version.to_owned()));
        }

        let max_feature_idx = section.get_int("max_feature_idx")?;
        let max_feature_idx = usize::try_from(max_feature_idx)
            .map_err(|_| ParseError::invalid("max_feature_idx", max_feature_idx.to_string()))?;
        let num_features = max_feature_idx + 1;

        let feature_names = section.get_string_array("feature_names", Some(num_features))?;
        let feature_infos = section
            .get_string_array("feature_infos", Some(num_features))?
            .iter()
            .map(|info| FeatureInfo::parse(info).map_err(|message| ParseError::invalid("feature_infos", message)))
            .collect::<Result<Vec<_>, _>>()?;

        let optional_count = |key: &str, default: usize| -> Result<usize, ParseError> {
            if !section.contains_key(key) {
                return Ok(default);
            }
            let value = section.get_int(key)?;
            usize::try_from(value).map_err(|_| ParseError::invalid(key, value.to_string()))
        };
        let num_class = optional_count("num_class", 1)?;

        Ok(LgbHeader {
            version,
            num_class,
            num_tree_per_iteration: optional_count("num_tree_per_iteration", num_class)?,
            label_index: match section.get("label_index") {
                Some(_) => section.get_int("label_index")?,
                None => 0,
            },
            max_feature_idx,
            average_output: section.contains_key("average_output"),
            objective: match section.get("objective") {
                Some(_) => Some(section.get_string("objective")?),
                None => None,
            },
            feature_names,
            feature_infos,
        })
    }
}

// =============================================================================
// Full model
// =============================================================================

/// A parsed LightGBM model.
#[derive(Debug, Clone, PartialEq)]
pub struct LgbModel {
    pub header: LgbHeader,
    /// All trees in the model, in boosting order
    pub trees: Vec<LgbTree>,
    /// `None` for custom objectives, see [`LgbModel::set_objective`]
    pub objective: Option<ObjectiveFunction>,
    /// Importance per feature name; features without splits are absent
    pub feature_importances: HashMap<String, f64>,
    /// The `parameters:` block, when the dump carries one.
    ///
    /// Not used by the conversion; kept so callers can inspect the training
    /// configuration.
    pub parameters: Option<Section>,
    /// Category labels of the training data frame's categorical columns
    pub pandas_categorical: Vec<CategoryList>,
}

impl LgbModel {
    /// Load a model from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, ParseError> {
        Self::load(SectionReader::new(reader.lines()))
    }

    /// Parse a model from a string.
    pub fn from_string(content: &str) -> Result<Self, ParseError> {
        Self::load(sections(content))
    }

    /// Build a model from a stream of sections.
    ///
    /// The header must come first, followed by `Tree=0`, `Tree=1`, ...; the
    /// first gap in the tree numbering ends the trees. Trailing sections
    /// may appear in any order.
    pub fn load(sections: impl Iterator<Item = Result<Section, ParseError>>) -> Result<Self, ParseError> {
        let mut sections = sections.peekable();

        let header = match sections.next() {
            Some(section) => LgbHeader::from_section(&section?)?,
            None => return Err(ParseError::UnexpectedEnd("model header".to_owned())),
        };
        let objective = match &header.objective {
            Some(objective) => ObjectiveFunction::parse(objective, header.average_output)?,
            None => None,
        };

        if let Some(num_class) = objective.as_ref().and_then(ObjectiveFunction::num_class) {
            check_class_count(&header, num_class)?;
        }

        let mut trees = Vec::new();
        loop {
            let id = format!("Tree={}", trees.len());
            let Some(section) = next_if(&mut sections, |s| s.id() == id)? else {
                break;
            };
            trees.push(LgbTree::from_section(&section, trees.len())?);
        }

        let mut feature_importances = HashMap::new();
        let mut parameters = None;
        let mut pandas_categorical = Vec::new();
        for section in sections {
            let section = section?;
            match section.id() {
                "end of trees" => {}
                "feature importances:" | "feature_importances:" => {
                    feature_importances = parse_importances(&section, &header.feature_names)?;
                }
                "parameters:" => parameters = Some(section),
                id if id.starts_with(PANDAS_CATEGORICAL_PREFIX) => {
                    pandas_categorical = parse_pandas_categorical(id)?;
                }
                id => debug!(section = id, "skipping section"),
            }
        }

        let categorical_features = header.feature_infos.iter().filter(|info| info.is_values()).count();
        if !pandas_categorical.is_empty() && pandas_categorical.len() != categorical_features {
            return Err(ParseError::PandasCategoricalMismatch {
                expected: categorical_features,
                actual: pandas_categorical.len(),
            });
        }

        debug!(
            version = header.version.as_deref().unwrap_or("unversioned"),
            trees = trees.len(),
            features = header.feature_names.len(),
            objective = objective.as_ref().map(ObjectiveFunction::name).unwrap_or("custom"),
            "loaded LightGBM model"
        );

        Ok(LgbModel {
            header,
            trees,
            objective,
            feature_importances,
            parameters,
            pandas_categorical,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.header.max_feature_idx + 1
    }

    pub fn objective(&self) -> Option<&ObjectiveFunction> {
        self.objective.as_ref()
    }

    /// Replace the objective, e.g. to give a custom-objective model a link
    /// function.
    pub fn set_objective(&mut self, objective: Option<ObjectiveFunction>) {
        self.objective = objective;
    }

    // =========================================================================
    // Feature classification
    // =========================================================================

    /// Whether a feature is a 0/1 indicator.
    ///
    /// `Some(false)` unless the header declares the range `[0:1]`; otherwise
    /// `Some(false)` as soon as one tree splits on it differently, `None`
    /// when no tree splits on it.
    pub fn is_binary(&self, feature: usize) -> Option<bool> {
        if !self.header.feature_infos[feature].is_binary_interval() {
            return Some(false);
        }
        self.tree_signal(|tree| tree.is_binary(feature))
    }

    /// Whether a feature is categorical, by the same rules as
    /// [`is_binary`](Self::is_binary) applied to a category-list descriptor.
    pub fn is_categorical(&self, feature: usize) -> Option<bool> {
        if !self.header.feature_infos[feature].is_values() {
            return Some(false);
        }
        self.tree_signal(|tree| tree.is_categorical(feature))
    }

    fn tree_signal(&self, signal: impl Fn(&LgbTree) -> Option<bool>) -> Option<bool> {
        let mut result = None;
        for tree in &self.trees {
            match signal(tree) {
                Some(false) => return Some(false),
                Some(true) => result = Some(true),
                None => {}
            }
        }
        result
    }

    /// Build the schema from the header and the trees' split patterns.
    pub fn encode_schema(
        &self,
        target_name: Option<&str>,
        target_categories: Option<&[String]>,
    ) -> Result<Schema, ConversionError> {
        let objective = self.objective.as_ref().ok_or(ConversionError::MissingObjective)?;
        let label = objective.encode_label(target_name.unwrap_or(DEFAULT_TARGET_NAME), target_categories)?;

        let mut category_lists = self.pandas_categorical.iter();
        let mut features = Vec::with_capacity(self.num_features());
        for (index, (name, info)) in self
            .header
            .feature_names
            .iter()
            .zip(&self.header.feature_infos)
            .enumerate()
        {
            // Every category-list descriptor consumes one pandas list, even if
            // the trees end up treating the feature as continuous.
            let category_list = if info.is_values() { category_lists.next() } else { None };
            features.push(self.encode_feature(index, name, info, category_list)?);
        }

        Ok(Schema::new(label, features).with_importances(self.feature_importances.clone()))
    }

    fn encode_feature(
        &self,
        index: usize,
        name: &str,
        info: &FeatureInfo,
        category_list: Option<&CategoryList>,
    ) -> Result<Option<Feature>, ConversionError> {
        let name = name.to_owned();
        let binary = self.is_binary(index).unwrap_or(false);
        let categorical = self.is_categorical(index).unwrap_or_else(|| info.is_values());
        if binary && categorical {
            return Err(ConversionError::FeatureConflict(name));
        }

        let feature = match info {
            FeatureInfo::None => return Ok(None),
            FeatureInfo::Values(values) if categorical => match category_list {
                Some(list) => Feature::Categorical {
                    name,
                    data_type: list.data_type(),
                    labels: list.labels(),
                },
                None => {
                    let mut categories: Vec<u32> = values.iter().filter_map(|&v| u32::try_from(v).ok()).collect();
                    categories.sort_unstable();
                    categories.dedup();
                    Feature::DirectCategorical { name, categories }
                }
            },
            FeatureInfo::Values(_) => {
                warn!(feature = %name, "category-list feature is split on numerically; treating it as continuous");
                Feature::Continuous {
                    name,
                    data_type: DataType::Double,
                    interval: None,
                }
            }
            FeatureInfo::Interval { .. } if binary => Feature::Binary {
                name,
                value: "1".to_owned(),
            },
            FeatureInfo::Interval { lo, hi } => Feature::Continuous {
                name,
                data_type: DataType::Double,
                interval: Interval::from_bounds(*lo, *hi),
            },
        };
        Ok(Some(feature))
    }

    /// Reconcile a caller-declared feature list with the trees' split
    /// patterns.
    ///
    /// Declared types win unless a tree contradicts them: a binary feature
    /// split categorically becomes a `{0, 1}` categorical, other
    /// contradicted binary and categorical features become continuous.
    pub fn reconcile_schema(&self, schema: Schema) -> Result<Schema, ConversionError> {
        if schema.features().len() != self.num_features() {
            return Err(ConversionError::SchemaSizeMismatch {
                expected: self.num_features(),
                actual: schema.features().len(),
            });
        }
        let label = schema.label().clone();
        let features = schema
            .into_features()
            .into_iter()
            .enumerate()
            .map(|(index, feature)| feature.map(|feature| self.reconcile_feature(index, feature)))
            .collect();
        Ok(Schema::new(label, features).with_importances(self.feature_importances.clone()))
    }

    fn reconcile_feature(&self, index: usize, feature: Feature) -> Feature {
        let binary = self.tree_signal(|tree| tree.is_binary(index));
        let categorical = self.tree_signal(|tree| tree.is_categorical(index));
        match feature {
            Feature::Binary { .. } if binary != Some(false) => feature,
            Feature::Binary { name, .. } if categorical == Some(true) => Feature::DirectCategorical {
                name,
                categories: vec![0, 1],
            },
            Feature::DirectCategorical { .. } | Feature::Categorical { .. } if categorical != Some(false) => feature,
            Feature::Continuous { .. } => feature,
            other => {
                debug!(feature = other.name(), "declared type contradicted by splits; treating it as continuous");
                other.into_continuous()
            }
        }
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Encode the ensemble over `schema`, compacting it when configured.
    pub fn encode_model(&self, schema: &Schema, options: &ConvertOptions) -> Result<Model, ConversionError> {
        let objective = self.objective.as_ref().ok_or(ConversionError::MissingObjective)?;
        let parallelism = Parallelism::from_threads(options.n_threads);

        let mut model = objective.encode_model(&self.trees, options.num_iteration, schema, parallelism)?;
        if let Model::MiningModel(mining) = &mut model {
            mining.algorithm_name = Some(ALGORITHM_NAME.to_owned());
        }
        if options.compact {
            model = compact_model(model)?;
        }
        Ok(model)
    }

    /// Convert the model into a document using the inferred schema.
    pub fn encode_pmml(&self, options: &ConvertOptions) -> Result<Pmml, ConversionError> {
        let schema = self.encode_schema(options.target_name.as_deref(), options.target_categories.as_deref())?;
        self.encode_pmml_with_schema(&schema, options)
    }

    /// Convert the model into a document over an explicit schema.
    pub fn encode_pmml_with_schema(&self, schema: &Schema, options: &ConvertOptions) -> Result<Pmml, ConversionError> {
        let start = Instant::now();
        let model = self.encode_model(schema, options)?;
        let pmml = DocumentBuilder::new()
            .nan_as_missing(options.nan_as_missing)
            .build(schema, model);
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "converted LightGBM model");
        Ok(pmml)
    }
}

/// A multiclass objective grows one tree per class and iteration; the header
/// must agree with it.
fn check_class_count(header: &LgbHeader, num_class: usize) -> Result<(), ParseError> {
    for (field, actual) in [
        ("num_class", header.num_class),
        ("num_tree_per_iteration", header.num_tree_per_iteration),
    ] {
        if actual != num_class {
            return Err(ParseError::ClassCountMismatch {
                field: field.to_owned(),
                expected: num_class,
                actual,
            });
        }
    }
    Ok(())
}

/// Take the next section if it satisfies `pred`. Errors are always taken.
fn next_if<I>(sections: &mut Peekable<I>, pred: impl Fn(&Section) -> bool) -> Result<Option<Section>, ParseError>
where
    I: Iterator<Item = Result<Section, ParseError>>,
{
    match sections.peek() {
        None => Ok(None),
        Some(Ok(section)) if !pred(section) => Ok(None),
        Some(_) => sections.next().transpose(),
    }
}

fn parse_importances(section: &Section, feature_names: &[String]) -> Result<HashMap<String, f64>, ParseError> {
    let known: HashSet<&str> = feature_names.iter().map(String::as_str).collect();
    section
        .entries()
        .skip(1)
        .filter(|(name, _)| known.contains(name))
        .map(|(name, _)| Ok((name.to_owned(), section.get_double(name)?)))
        .collect()
}
