//! Collapse binary default-child trees into multi-way trees.
//!
//! In a binary tree every internal node has a left/right pair plus a default
//! child taken when the split value is missing. Compaction moves the default
//! child last, turns its predicate into `True`, and splices such catch-all
//! children into their parent. The parent inherits the catch-all's score,
//! which the `returnLastPrediction` strategy returns when no child matches.
//!
//! Scoring is unchanged: a missing value makes every remaining predicate
//! unknown, so evaluation falls through to the parent's inherited score,
//! which is the score the default branch would have produced.

use crate::pmml::{
    MissingValueStrategy, Model, NoTrueChildStrategy, Node, Predicate, SplitCharacteristic, TreeModel,
};

#[derive(Debug, thiserror::Error)]
pub enum CompactionError {
    #[error(
        "tree model must use the defaultChild missing value strategy, returnNullPrediction \
         no true child strategy and binary splits"
    )]
    UnsupportedTreeModel,
    #[error("node {node:?} has {count} children, expected 2")]
    ChildCount { node: Option<String>, count: usize },
    #[error("node {0:?} has no default child")]
    MissingDefaultChild(Option<String>),
    #[error("default child {default:?} of node {node:?} is not one of its children")]
    UnknownDefaultChild { node: Option<String>, default: String },
    #[error("leaf {0:?} has no score")]
    MissingScore(Option<String>),
    #[error("leaf {0:?} has a default child")]
    LeafDefaultChild(Option<String>),
    #[error("node {0:?} already has a score")]
    ScoreConflict(Option<String>),
}

/// Compact every tree model inside `model`.
pub fn compact_model(model: Model) -> Result<Model, CompactionError> {
    match model {
        Model::TreeModel(tree) => compact_tree_model(tree).map(Model::TreeModel),
        Model::MiningModel(mut mining) => {
            mining.segmentation.segments = mining
                .segmentation
                .segments
                .into_iter()
                .map(|mut segment| {
                    segment.model = compact_model(segment.model)?;
                    Ok(segment)
                })
                .collect::<Result<_, CompactionError>>()?;
            Ok(Model::MiningModel(mining))
        }
        Model::RegressionModel(_) => Ok(model),
    }
}

/// Compact a single tree model.
///
/// A model that is already compacted is returned unchanged.
pub fn compact_tree_model(tree: TreeModel) -> Result<TreeModel, CompactionError> {
    match (
        tree.missing_value_strategy,
        tree.no_true_child_strategy,
        tree.split_characteristic,
    ) {
        (
            MissingValueStrategy::DefaultChild,
            NoTrueChildStrategy::ReturnNullPrediction,
            SplitCharacteristic::BinarySplit,
        ) => {}
        (
            MissingValueStrategy::None,
            NoTrueChildStrategy::ReturnLastPrediction,
            SplitCharacteristic::MultiSplit,
        ) => {
            tracing::trace!("tree model is already compacted");
            return Ok(tree);
        }
        _ => return Err(CompactionError::UnsupportedTreeModel),
    }

    Ok(TreeModel {
        missing_value_strategy: MissingValueStrategy::None,
        no_true_child_strategy: NoTrueChildStrategy::ReturnLastPrediction,
        split_characteristic: SplitCharacteristic::MultiSplit,
        node: compact_node(tree.node)?,
        ..tree
    })
}

fn compact_node(node: Node) -> Result<Node, CompactionError> {
    let Node {
        id,
        score,
        default_child,
        predicate,
        nodes,
        ..
    } = node;

    if nodes.is_empty() {
        if default_child.is_some() {
            return Err(CompactionError::LeafDefaultChild(id));
        }
        if score.is_none() {
            return Err(CompactionError::MissingScore(id));
        }
        return Ok(Node {
            id: None,
            score,
            record_count: None,
            default_child: None,
            predicate,
            nodes,
        });
    }

    let [first, second]: [Node; 2] = nodes.try_into().map_err(|nodes: Vec<Node>| {
        CompactionError::ChildCount {
            node: id.clone(),
            count: nodes.len(),
        }
    })?;
    let Some(default) = default_child else {
        return Err(CompactionError::MissingDefaultChild(id));
    };
    let (other, mut fallback) = if first.id.as_deref() == Some(default.as_str()) {
        (second, first)
    } else if second.id.as_deref() == Some(default.as_str()) {
        (first, second)
    } else {
        return Err(CompactionError::UnknownDefaultChild { node: id, default });
    };
    fallback.predicate = Predicate::True;

    let mut score = score;
    let mut children = Vec::with_capacity(2);
    for child in [other, fallback] {
        let child = compact_node(child)?;
        if child.predicate.is_true() {
            if score.is_some() {
                return Err(CompactionError::ScoreConflict(id));
            }
            score = child.score;
            children.extend(child.nodes);
        } else {
            children.push(child);
        }
    }

    Ok(Node {
        id: None,
        score,
        record_count: None,
        default_child: None,
        predicate,
        nodes: children,
    })
}
