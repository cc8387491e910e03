//! The `pandas_categorical:` trailer written by the Python package.
//!
//! It holds one JSON array of category labels per categorical column of the
//! training data frame, in column order, or `null` when the frame had none.

use serde_json::Value;

use super::text::ParseError;
use crate::pmml::DataType;
use crate::utils::format_value;

pub const PANDAS_CATEGORICAL_PREFIX: &str = "pandas_categorical:";

/// A single category label.
#[derive(Debug, Clone, PartialEq)]
pub enum Category {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
}

impl Category {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        match value {
            Value::String(s) => Ok(Category::String(s.clone())),
            Value::Bool(b) => Ok(Category::Boolean(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Category::Integer)
                .or_else(|| n.as_f64().map(Category::Double))
                .ok_or_else(|| ParseError::InvalidPandasCategorical(format!("unsupported number {n}"))),
            other => Err(ParseError::InvalidPandasCategorical(format!(
                "unsupported category value {other}"
            ))),
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            Category::String(_) => DataType::String,
            Category::Integer(_) => DataType::Integer,
            Category::Double(_) => DataType::Double,
            Category::Boolean(_) => DataType::Boolean,
        }
    }

    /// Document representation of the label.
    pub fn to_value_string(&self) -> String {
        match self {
            Category::String(s) => s.clone(),
            Category::Integer(i) => i.to_string(),
            Category::Double(d) => format_value(*d),
            Category::Boolean(b) => b.to_string(),
        }
    }
}

/// Category labels of one categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryList(pub Vec<Category>);

impl CategoryList {
    /// Common data type: integers widen to double when mixed with floats,
    /// any other mix falls back to string.
    pub fn data_type(&self) -> DataType {
        let mut types = self.0.iter().map(Category::data_type);
        let Some(first) = types.next() else {
            return DataType::String;
        };
        types.try_fold(first, |acc, next| match (acc, next) {
            (a, b) if a == b => Some(a),
            (DataType::Integer, DataType::Double) | (DataType::Double, DataType::Integer) => {
                Some(DataType::Double)
            }
            _ => None,
        })
        .unwrap_or(DataType::String)
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(Category::to_value_string).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse a `pandas_categorical:<json>` section id.
pub fn parse_pandas_categorical(line: &str) -> Result<Vec<CategoryList>, ParseError> {
    let json = line.strip_prefix(PANDAS_CATEGORICAL_PREFIX).ok_or_else(|| {
        ParseError::InvalidPandasCategorical(format!("expected prefix {PANDAS_CATEGORICAL_PREFIX:?}"))
    })?;
    let value: Value = serde_json::from_str(json.trim())
        .map_err(|err| ParseError::InvalidPandasCategorical(err.to_string()))?;

    let lists = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(lists) => lists,
        other => {
            return Err(ParseError::InvalidPandasCategorical(format!(
                "expected a list of lists, got {other}"
            )))
        }
    };

    lists
        .iter()
        .map(|list| match list {
            Value::Array(values) => values
                .iter()
                .map(Category::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(CategoryList),
            other => Err(ParseError::InvalidPandasCategorical(format!(
                "expected a list of categories, got {other}"
            ))),
        })
        .collect()
}
