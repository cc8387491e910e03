//! Assembles a [`Pmml`] document from a schema and an encoded model.

use std::collections::HashSet;

use super::{
    DataField, Header, InvalidValueTreatment, MiningField, Model, OpType, Pmml, PMML_VERSION,
};
use crate::schema::{Feature, Label, Schema};

pub const APPLICATION_NAME: &str = "lgbm-pmml";

/// Builds the data dictionary and mining schemas around a model.
///
/// The top-level mining schema lists the target and every active feature.
/// Nested models list only the dictionary fields they reference.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    nan_as_missing: bool,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self { nan_as_missing: true }
    }

    /// Declare `NaN` as a missing value of floating-point fields.
    pub fn nan_as_missing(mut self, nan_as_missing: bool) -> Self {
        self.nan_as_missing = nan_as_missing;
        self
    }

    pub fn build(&self, schema: &Schema, mut model: Model) -> Pmml {
        let mut data_dictionary: Vec<DataField> = Vec::new();
        if let Some(target) = label_field(schema.label()) {
            data_dictionary.push(target);
        }
        data_dictionary.extend(schema.active_features().map(|feature| self.feature_field(feature)));

        let known: HashSet<String> = data_dictionary.iter().map(|field| field.name.clone()).collect();
        fill_nested_schemas(&mut model, &known);

        let top = model.mining_schema_mut();
        top.fields.retain(|field| schema.label().name() == Some(field.name.as_str()));
        top.fields.extend(schema.active_features().map(|feature| MiningField {
            invalid_value_treatment: Some(invalid_value_treatment(feature)),
            importance: schema.importance(feature.name()),
            ..MiningField::active(feature.name())
        }));

        Pmml {
            version: PMML_VERSION.to_owned(),
            header: Header {
                application_name: APPLICATION_NAME.to_owned(),
                application_version: env!("CARGO_PKG_VERSION").to_owned(),
            },
            data_dictionary,
            model,
        }
    }

    fn feature_field(&self, feature: &Feature) -> DataField {
        let data_type = feature.data_type();
        let mut missing_values = Vec::new();
        if self.nan_as_missing && data_type.is_floating() {
            missing_values.push("NaN".to_owned());
        }
        let intervals = match feature {
            Feature::Continuous {
                interval: Some(interval),
                ..
            } => vec![*interval],
            _ => Vec::new(),
        };
        DataField {
            name: feature.name().to_owned(),
            op_type: feature.op_type(),
            data_type,
            values: feature.valid_values(),
            missing_values,
            intervals,
        }
    }
}

fn label_field(label: &Label) -> Option<DataField> {
    let name = label.name()?.to_owned();
    let op_type = match label {
        Label::Continuous { .. } => OpType::Continuous,
        Label::Categorical { .. } => OpType::Categorical,
    };
    Some(DataField {
        name,
        op_type,
        data_type: label.data_type(),
        values: label.values().to_vec(),
        missing_values: Vec::new(),
        intervals: Vec::new(),
    })
}

fn invalid_value_treatment(feature: &Feature) -> InvalidValueTreatment {
    if feature.is_categorical() {
        InvalidValueTreatment::AsMissing
    } else {
        InvalidValueTreatment::AsIs
    }
}

/// Add each nested model's referenced dictionary fields as active fields.
fn fill_nested_schemas(model: &mut Model, known: &HashSet<String>) {
    let referenced = model.referenced_fields();
    let schema = model.mining_schema_mut();
    for name in referenced.into_iter().filter(|name| known.contains(name)) {
        if schema.field(&name).is_none() {
            schema.fields.push(MiningField::active(name));
        }
    }
    if let Model::MiningModel(mining) = model {
        for segment in &mut mining.segmentation.segments {
            fill_nested_schemas(&mut segment.model, known);
        }
    }
}
