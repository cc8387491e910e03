//! Testing utilities for lgbm-pmml.
//!
//! Two halves:
//!
//! - [`ModelText`] renders synthetic LightGBM dumps, so tests can describe
//!   a model as [`LgbTree`] values instead of hand-written text.
//! - [`evaluate_tree`] and friends score document trees against a record,
//!   following the missing value and no-true-child strategies of the tree
//!   model, so decoded and compacted trees can be checked for agreement.
//!
//! # Usage
//!
//! ```
//! use lgbm_pmml::testing::ModelText;
//! use lgbm_pmml::compat::lightgbm::{LgbModel, LgbTree};
//!
//! let text = ModelText::new("regression")
//!     .feature("x", "[0:10]")
//!     .tree(LgbTree::numeric_split(0, 2.5, 1.0, 2.0))
//!     .render();
//! let model = LgbModel::from_string(&text).unwrap();
//! assert_eq!(model.num_trees(), 1);
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use crate::compat::lightgbm::{find_in_bitset, LgbTree};
use crate::pmml::{
    MissingValueStrategy, Model, Node, NoTrueChildStrategy, Predicate, SimpleOperator, TreeModel,
};

// =============================================================================
// Synthetic dumps
// =============================================================================

/// Builder for the text of a LightGBM model dump.
#[derive(Debug, Clone)]
pub struct ModelText {
    version: Option<String>,
    objective: Option<String>,
    num_class: usize,
    average_output: bool,
    features: Vec<(String, String)>,
    trees: Vec<LgbTree>,
    importances: Vec<(String, f64)>,
    parameters: Vec<(String, String)>,
    pandas_categorical: Option<String>,
}

impl ModelText {
    pub fn new(objective: &str) -> Self {
        Self {
            version: Some("v4".to_owned()),
            objective: Some(objective.to_owned()),
            num_class: 1,
            average_output: false,
            features: Vec::new(),
            trees: Vec::new(),
            importances: Vec::new(),
            parameters: Vec::new(),
            pandas_categorical: None,
        }
    }

    /// A dump without an `objective` line, as written for custom objectives.
    pub fn custom() -> Self {
        Self {
            objective: None,
            ..Self::new("")
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_owned());
        self
    }

    /// Leave out the `version=` line.
    pub fn unversioned(mut self) -> Self {
        self.version = None;
        self
    }

    pub fn num_class(mut self, num_class: usize) -> Self {
        self.num_class = num_class;
        self
    }

    pub fn average_output(mut self) -> Self {
        self.average_output = true;
        self
    }

    /// Add a feature with its `feature_infos` descriptor.
    pub fn feature(mut self, name: &str, info: &str) -> Self {
        self.features.push((name.to_owned(), info.to_owned()));
        self
    }

    pub fn tree(mut self, tree: LgbTree) -> Self {
        self.trees.push(tree);
        self
    }

    pub fn trees(mut self, trees: impl IntoIterator<Item = LgbTree>) -> Self {
        self.trees.extend(trees);
        self
    }

    pub fn importance(mut self, name: &str, value: f64) -> Self {
        self.importances.push((name.to_owned(), value));
        self
    }

    pub fn parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Raw JSON of the `pandas_categorical:` line.
    pub fn pandas_categorical(mut self, json: &str) -> Self {
        self.pandas_categorical = Some(json.to_owned());
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let names: Vec<&str> = self.features.iter().map(|(name, _)| name.as_str()).collect();
        let infos: Vec<&str> = self.features.iter().map(|(_, info)| info.as_str()).collect();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "tree");
        if let Some(version) = &self.version {
            let _ = writeln!(out, "version={version}");
        }
        let _ = writeln!(out, "num_class={}", self.num_class);
        let _ = writeln!(out, "num_tree_per_iteration={}", self.num_class);
        let _ = writeln!(out, "label_index=0");
        let _ = writeln!(out, "max_feature_idx={}", self.features.len() as i64 - 1);
        if let Some(objective) = &self.objective {
            let _ = writeln!(out, "objective={objective}");
        }
        if self.average_output {
            let _ = writeln!(out, "average_output");
        }
        let _ = writeln!(out, "feature_names={}", names.join(" "));
        let _ = writeln!(out, "feature_infos={}", infos.join(" "));
        out.push('\n');

        for (index, tree) in self.trees.iter().enumerate() {
            out.push_str(&tree_text(tree, index));
            out.push('\n');
        }
        out.push_str("end of trees\n\n");

        if !self.importances.is_empty() {
            out.push_str("feature_importances:\n");
            for (name, value) in &self.importances {
                let _ = writeln!(out, "{name}={value}");
            }
            out.push('\n');
        }

        if !self.parameters.is_empty() {
            out.push_str("parameters:\n");
            for (key, value) in &self.parameters {
                let _ = writeln!(out, "[{key}: {value}]");
            }
            out.push_str("end of parameters\n\n");
        }

        if let Some(json) = &self.pandas_categorical {
            let _ = writeln!(out, "pandas_categorical:{json}");
        }
        out
    }
}

/// Render one `Tree=<index>` section.
pub fn tree_text(tree: &LgbTree, index: usize) -> String {
    fn join<T: std::fmt::Debug>(values: &[T]) -> String {
        values.iter().map(|v| format!("{v:?}")).collect::<Vec<_>>().join(" ")
    }

    let mut out = String::new();
    let _ = writeln!(out, "Tree={index}");
    let _ = writeln!(out, "num_leaves={}", tree.num_leaves);
    let _ = writeln!(out, "num_cat={}", tree.num_cat);
    let _ = writeln!(out, "split_feature={}", join(&tree.split_feature));
    let _ = writeln!(out, "threshold={}", join(&tree.threshold));
    let _ = writeln!(out, "decision_type={}", join(&tree.decision_type));
    let _ = writeln!(out, "left_child={}", join(&tree.left_child));
    let _ = writeln!(out, "right_child={}", join(&tree.right_child));
    let _ = writeln!(out, "leaf_value={}", join(&tree.leaf_value));
    if let Some(counts) = &tree.leaf_count {
        let _ = writeln!(out, "leaf_count={}", join(counts));
    }
    if let Some(counts) = &tree.internal_count {
        let _ = writeln!(out, "internal_count={}", join(counts));
    }
    if tree.num_cat > 0 {
        let _ = writeln!(out, "cat_boundaries={}", join(&tree.cat_boundaries));
        let _ = writeln!(out, "cat_threshold={}", join(&tree.cat_threshold));
    }
    let _ = writeln!(out, "is_linear=0");
    let _ = writeln!(out, "shrinkage={:?}", tree.shrinkage);
    out
}

impl LgbTree {
    /// Single-leaf tree.
    pub fn stump(value: f64) -> Self {
        LgbTree {
            num_leaves: 1,
            leaf_value: vec![value],
            shrinkage: 1.0,
            ..LgbTree::default()
        }
    }

    /// `x[feature] <= threshold` goes left; missing values go right.
    pub fn numeric_split(feature: i32, threshold: f64, left: f64, right: f64) -> Self {
        LgbTree {
            num_leaves: 2,
            split_feature: vec![feature],
            threshold: vec![threshold],
            decision_type: vec![0],
            left_child: vec![-1],
            right_child: vec![-2],
            leaf_value: vec![left, right],
            shrinkage: 1.0,
            ..LgbTree::default()
        }
    }

    /// Categories in `left_categories` go left.
    pub fn categorical_split(feature: i32, left_categories: &[u32], left: f64, right: f64) -> Self {
        LgbTree {
            num_leaves: 2,
            num_cat: 1,
            split_feature: vec![feature],
            threshold: vec![0.0],
            decision_type: vec![1],
            left_child: vec![-1],
            right_child: vec![-2],
            leaf_value: vec![left, right],
            cat_boundaries: vec![0, bitset_words(left_categories).len() as i32],
            cat_threshold: bitset_words(left_categories),
            shrinkage: 1.0,
            ..LgbTree::default()
        }
    }
}

/// Pack category indices into LightGBM bitset words.
pub fn bitset_words(categories: &[u32]) -> Vec<u32> {
    let len = categories.iter().max().map_or(0, |&max| max as usize / 32 + 1);
    let mut words = vec![0u32; len];
    for &category in categories {
        words[category as usize / 32] |= 1 << (category % 32);
    }
    words
}

/// Leaf value LightGBM itself would reach for a fully observed row.
///
/// Numeric splits go left on `x <= threshold`, categorical splits go left
/// when the (truncated) value is in the node's bitset.
pub fn lightgbm_leaf_value(tree: &LgbTree, row: &[f64]) -> f64 {
    if tree.is_stump() {
        return tree.leaf_value[0];
    }
    let mut node = 0i32;
    while node >= 0 {
        let index = node as usize;
        let value = row[tree.split_feature[index] as usize];
        let go_left = if tree.decision(index).is_categorical {
            let bits = tree.category_bitset(tree.threshold[index] as usize).unwrap_or(&[]);
            value >= 0.0 && find_in_bitset(bits, value as u32)
        } else {
            value <= tree.threshold[index]
        };
        node = if go_left {
            tree.left_child[index]
        } else {
            tree.right_child[index]
        };
    }
    tree.leaf_value[(!node) as usize]
}

// =============================================================================
// Document tree evaluation
// =============================================================================

/// Input values by field name; an absent field is missing.
pub type Record = HashMap<String, String>;

pub fn record<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Record {
    values
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect()
}

/// Three-valued predicate evaluation; `None` is unknown.
pub fn evaluate_predicate(predicate: &Predicate, record: &Record) -> Option<bool> {
    match predicate {
        Predicate::True => Some(true),
        Predicate::False => Some(false),
        Predicate::Simple(simple) => {
            let value = record.get(&simple.field)?;
            Some(match simple.operator {
                SimpleOperator::Equal => values_equal(value, &simple.value),
                SimpleOperator::NotEqual => !values_equal(value, &simple.value),
                SimpleOperator::LessOrEqual => compare(value, &simple.value)? <= 0.0,
                SimpleOperator::GreaterThan => compare(value, &simple.value)? > 0.0,
            })
        }
        Predicate::SimpleSet(set) => {
            let value = record.get(&set.field)?;
            Some(set.values.iter().any(|member| values_equal(value, member)))
        }
    }
}

fn values_equal(left: &str, right: &str) -> bool {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}

fn compare(left: &str, right: &str) -> Option<f64> {
    Some(left.parse::<f64>().ok()? - right.parse::<f64>().ok()?)
}

/// Score a tree model, honoring its strategies. `None` is a null prediction.
pub fn evaluate_tree(tree: &TreeModel, record: &Record) -> Option<f64> {
    evaluate_node(tree, &tree.node, record)
}

fn evaluate_node(tree: &TreeModel, node: &Node, record: &Record) -> Option<f64> {
    if node.is_leaf() {
        return node.score;
    }
    for child in &node.nodes {
        match evaluate_predicate(&child.predicate, record) {
            Some(true) => return evaluate_node(tree, child, record),
            Some(false) => {}
            None => match tree.missing_value_strategy {
                MissingValueStrategy::DefaultChild => {
                    let default = node.default_child.as_deref()?;
                    let child = node.nodes.iter().find(|c| c.id.as_deref() == Some(default))?;
                    return evaluate_node(tree, child, record);
                }
                MissingValueStrategy::None => {}
            },
        }
    }
    match tree.no_true_child_strategy {
        NoTrueChildStrategy::ReturnNullPrediction => None,
        NoTrueChildStrategy::ReturnLastPrediction => node.score,
    }
}

/// Sum of all tree scores in `model`, i.e. the raw score of a summed
/// ensemble.
pub fn evaluate_sum(model: &Model, record: &Record) -> Option<f64> {
    model
        .tree_models()
        .into_iter()
        .map(|tree| evaluate_tree(tree, record))
        .sum()
}
