//! Decoding of LightGBM trees into document tree models.
//!
//! Each internal node becomes a binary split whose two children carry
//! complementary predicates. Which predicates are emitted depends on the
//! split feature's classification in the [`Schema`]:
//!
//! | feature              | left child              | right child           |
//! |----------------------|-------------------------|-----------------------|
//! | binary               | `x != 1`                | `x == 1`              |
//! | categorical          | `x in {bitset ∩ R}`     | `x in R \ bitset`     |
//! | continuous           | `x <= t`                | `x > t`               |
//!
//! `R` is the set of categories still reachable on the current path. Missing
//! values follow the node's default child.

use std::collections::BTreeSet;
use std::rc::Rc;

use super::tree::{bitset_members, find_in_bitset, LgbTree};
use crate::pmml::{DataType, Node, Predicate, SimpleOperator, TreeModel};
use crate::schema::Feature;
use crate::schema::Schema;
use crate::transform::CompactionError;
use crate::utils::format_value;

/// `1.0e-35` after a float round trip; LightGBM's stand-in for a zero threshold.
const ZERO_THRESHOLD: f64 = 1.0000000180025095e-35;

/// Error type for LightGBM model conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("tree {tree}: node {node} splits on feature {feature}, which is not part of the schema")]
    MissingFeature {
        tree: usize,
        node: usize,
        feature: i32,
    },
    #[error("tree {tree}: node {node} is not a valid {expected} split on feature \"{feature}\"")]
    SplitMismatch {
        tree: usize,
        node: usize,
        feature: String,
        expected: &'static str,
    },
    #[error("tree {tree}: node {node} selects category {category}, which is not a category of feature \"{feature}\"")]
    CategoryOutOfDomain {
        tree: usize,
        node: usize,
        feature: String,
        category: u32,
    },
    #[error("tree {tree}: node {node} refers to missing categorical split {index}")]
    InvalidCategoricalIndex { tree: usize, node: usize, index: f64 },
    #[error("tree {tree}: invalid child index {child} at node {node}")]
    InvalidChildIndex { tree: usize, node: usize, child: i32 },
    #[error("tree {0} contains a cycle")]
    CyclicTree(usize),
    #[error("feature \"{0}\" is split on both as a binary and as a categorical feature")]
    FeatureConflict(String),
    #[error("expected {expected} target categories, got {actual}")]
    TargetCategoryMismatch { expected: usize, actual: usize },
    #[error("regression targets do not take categories")]
    UnexpectedTargetCategories,
    #[error("tree limit {limit} is greater than the number of trees ({available})")]
    TreeLimitExceeded { limit: usize, available: usize },
    #[error("{trees} trees cannot be partitioned between {num_class} classes")]
    TreeCountNotDivisible { trees: usize, num_class: usize },
    #[error("the objective function is not set; a custom objective must be replaced before conversion")]
    MissingObjective,
    #[error("expected {expected} features, got {actual}")]
    SchemaSizeMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Compaction(#[from] CompactionError),
}

// =============================================================================
// Category bookkeeping
// =============================================================================

/// Categories still reachable per feature on the path from the root.
///
/// Restrictions are kept in a shared association list, so forking at a
/// categorical split copies pointers rather than sets.
#[derive(Debug, Clone, Default)]
struct CategoryManager {
    restrictions: Vec<(usize, Rc<BTreeSet<u32>>)>,
}

impl CategoryManager {
    fn reachable(&self, feature: usize, domain: &Feature) -> Rc<BTreeSet<u32>> {
        self.restrictions
            .iter()
            .rev()
            .find(|(index, _)| *index == feature)
            .map(|(_, values)| Rc::clone(values))
            .unwrap_or_else(|| Rc::new(domain.category_indices().into_iter().collect()))
    }

    fn fork(&self, feature: usize, values: Rc<BTreeSet<u32>>) -> Self {
        let mut restrictions = self.restrictions.clone();
        restrictions.push((feature, values));
        CategoryManager { restrictions }
    }
}

// =============================================================================
// Tree decoding
// =============================================================================

/// Decode one LightGBM tree into a binary-split tree model.
///
/// Node ids are the LightGBM node indices (`"0"` for the root, `"-1"` for
/// leaf 0). A single-leaf tree becomes a root leaf holding its value.
pub fn encode_tree_model(tree: &LgbTree, index: usize, schema: &Schema) -> Result<TreeModel, ConversionError> {
    let decoder = TreeDecoder { tree, index, schema };
    let root = if tree.is_stump() {
        decoder.leaf(0, Predicate::True)
    } else {
        decoder.node(0, Predicate::True, &CategoryManager::default(), 0)?
    };
    tracing::trace!(tree = index, nodes = root.size(), "decoded tree");
    Ok(TreeModel::binary(root))
}

struct TreeDecoder<'a> {
    tree: &'a LgbTree,
    index: usize,
    schema: &'a Schema,
}

impl TreeDecoder<'_> {
    fn leaf(&self, leaf: usize, predicate: Predicate) -> Node {
        Node {
            id: Some((!(leaf as i32)).to_string()),
            record_count: self.tree.leaf_count.as_ref().map(|counts| counts[leaf]),
            ..Node::leaf(predicate, self.tree.leaf_value[leaf])
        }
    }

    fn child(
        &self,
        node: usize,
        child: i32,
        predicate: Predicate,
        categories: &CategoryManager,
        depth: usize,
    ) -> Result<Node, ConversionError> {
        let invalid = || ConversionError::InvalidChildIndex {
            tree: self.index,
            node,
            child,
        };
        if child < 0 {
            let leaf = (!child) as usize;
            if leaf >= self.tree.num_leaves {
                return Err(invalid());
            }
            return Ok(self.leaf(leaf, predicate));
        }
        let child = child as usize;
        if child >= self.tree.num_internal() {
            return Err(invalid());
        }
        self.node(child, predicate, categories, depth + 1)
    }

    fn node(
        &self,
        node: usize,
        predicate: Predicate,
        categories: &CategoryManager,
        depth: usize,
    ) -> Result<Node, ConversionError> {
        // A path can visit every internal node at most once.
        if depth >= self.tree.num_internal() {
            return Err(ConversionError::CyclicTree(self.index));
        }

        let split_feature = self.tree.split_feature[node];
        let feature_index = usize::try_from(split_feature).ok();
        let feature = feature_index
            .and_then(|i| self.schema.feature(i))
            .ok_or(ConversionError::MissingFeature {
                tree: self.index,
                node,
                feature: split_feature,
            })?;
        let feature_index = feature_index.unwrap_or_default();

        let decision = self.tree.decision(node);
        let threshold = self.tree.threshold[node];
        let name = feature.name();
        let mismatch = |expected| ConversionError::SplitMismatch {
            tree: self.index,
            node,
            feature: name.to_owned(),
            expected,
        };

        let (left_predicate, right_predicate, left_categories, right_categories, default_left) = match feature {
            Feature::Binary { value, .. } => {
                if decision.is_categorical || threshold != 0.5 {
                    return Err(mismatch("binary"));
                }
                (
                    Predicate::simple(name, SimpleOperator::NotEqual, value.clone()),
                    Predicate::simple(name, SimpleOperator::Equal, value.clone()),
                    categories.clone(),
                    categories.clone(),
                    decision.default_left,
                )
            }
            Feature::DirectCategorical { .. } | Feature::Categorical { .. } => {
                if !decision.is_categorical {
                    return Err(mismatch("categorical"));
                }
                let bits = usize::try_from(threshold as i64)
                    .ok()
                    .filter(|_| threshold >= 0.0 && threshold.fract() == 0.0)
                    .and_then(|cat_idx| self.tree.category_bitset(cat_idx))
                    .ok_or(ConversionError::InvalidCategoricalIndex {
                        tree: self.index,
                        node,
                        index: threshold,
                    })?;

                if let Some(category) = bitset_members(bits).find(|&c| feature.category_label(c).is_none()) {
                    return Err(ConversionError::CategoryOutOfDomain {
                        tree: self.index,
                        node,
                        feature: name.to_owned(),
                        category,
                    });
                }

                let reachable = categories.reachable(feature_index, feature);
                let (left, right): (BTreeSet<u32>, BTreeSet<u32>) =
                    reachable.iter().partition(|&&c| find_in_bitset(bits, c));

                let labels = |set: &BTreeSet<u32>| {
                    set.iter()
                        .filter_map(|&c| feature.category_label(c))
                        .collect::<Vec<_>>()
                };
                let left_predicate = Predicate::is_in(name, labels(&left));
                let right_predicate = if right.len() == reachable.len() {
                    Predicate::True
                } else {
                    Predicate::is_in(name, labels(&right))
                };
                (
                    left_predicate,
                    right_predicate,
                    categories.fork(feature_index, Rc::new(left)),
                    categories.fork(feature_index, Rc::new(right)),
                    false,
                )
            }
            Feature::Continuous { data_type, .. } => {
                if decision.is_categorical {
                    return Err(mismatch("continuous"));
                }
                let threshold = if *data_type == DataType::Integer && threshold == ZERO_THRESHOLD {
                    0.0
                } else {
                    threshold
                };
                let value = format_value(threshold);
                (
                    Predicate::simple(name, SimpleOperator::LessOrEqual, value.clone()),
                    Predicate::simple(name, SimpleOperator::GreaterThan, value),
                    categories.clone(),
                    categories.clone(),
                    decision.default_left,
                )
            }
        };

        let left = self.child(node, self.tree.left_child[node], left_predicate, &left_categories, depth)?;
        let right = self.child(node, self.tree.right_child[node], right_predicate, &right_categories, depth)?;
        let default_child = if default_left {
            left.id.clone()
        } else {
            right.id.clone()
        };

        Ok(Node {
            id: Some(node.to_string()),
            score: None,
            record_count: self
                .tree
                .internal_count
                .as_ref()
                .map(|counts| counts[node]),
            default_child,
            predicate,
            nodes: vec![left, right],
        })
    }
}
