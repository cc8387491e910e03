use serde::Serialize;

use super::{MiningFunction, MiningSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingValueStrategy {
    DefaultChild,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoTrueChildStrategy {
    ReturnNullPrediction,
    ReturnLastPrediction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitCharacteristic {
    BinarySplit,
    MultiSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeModel {
    pub mining_function: MiningFunction,
    pub mining_schema: MiningSchema,
    pub missing_value_strategy: MissingValueStrategy,
    pub no_true_child_strategy: NoTrueChildStrategy,
    pub split_characteristic: SplitCharacteristic,
    pub node: Node,
}

impl TreeModel {
    /// A binary-split regression tree whose missing values follow each
    /// node's default child.
    pub fn binary(node: Node) -> Self {
        TreeModel {
            mining_function: MiningFunction::Regression,
            mining_schema: MiningSchema::default(),
            missing_value_strategy: MissingValueStrategy::DefaultChild,
            no_true_child_strategy: NoTrueChildStrategy::ReturnNullPrediction,
            split_characteristic: SplitCharacteristic::BinarySplit,
            node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_child: Option<String>,
    pub predicate: Predicate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn leaf(predicate: Predicate, score: f64) -> Self {
        Node {
            id: None,
            score: Some(score),
            record_count: None,
            default_child: None,
            predicate,
            nodes: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.nodes.iter().map(Node::size).sum::<usize>()
    }

    pub fn leaves(&self) -> Vec<&Node> {
        if self.is_leaf() {
            return vec![self];
        }
        self.nodes.iter().flat_map(Node::leaves).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SimpleOperator {
    Equal,
    NotEqual,
    LessOrEqual,
    GreaterThan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimplePredicate {
    pub field: String,
    pub operator: SimpleOperator,
    pub value: String,
}

/// `isIn` membership test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleSetPredicate {
    pub field: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Predicate {
    True,
    False,
    Simple(SimplePredicate),
    SimpleSet(SimpleSetPredicate),
}

impl Predicate {
    pub fn simple(field: &str, operator: SimpleOperator, value: impl Into<String>) -> Self {
        Predicate::Simple(SimplePredicate {
            field: field.to_owned(),
            operator,
            value: value.into(),
        })
    }

    /// Membership in `values`: `False` when empty, `equal` for a single value.
    pub fn is_in(field: &str, mut values: Vec<String>) -> Self {
        match values.len() {
            0 => Predicate::False,
            1 => Predicate::simple(field, SimpleOperator::Equal, values.remove(0)),
            _ => Predicate::SimpleSet(SimpleSetPredicate {
                field: field.to_owned(),
                values,
            }),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Predicate::True)
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Predicate::Simple(p) => Some(&p.field),
            Predicate::SimpleSet(p) => Some(&p.field),
            Predicate::True | Predicate::False => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_predicate_shapes() {
        assert_eq!(Predicate::is_in("x", vec![]), Predicate::False);
        assert_eq!(
            Predicate::is_in("x", vec!["a".into()]),
            Predicate::simple("x", SimpleOperator::Equal, "a")
        );
        let set = Predicate::is_in("x", vec!["a".into(), "b".into()]);
        assert!(matches!(set, Predicate::SimpleSet(ref p) if p.values.len() == 2));
        assert_eq!(set.field(), Some("x"));
    }

    #[test]
    fn node_size_and_leaves() {
        let mut root = Node::leaf(Predicate::True, 0.0);
        root.score = None;
        root.nodes = vec![
            Node::leaf(Predicate::simple("x", SimpleOperator::LessOrEqual, "1"), 1.0),
            Node::leaf(Predicate::simple("x", SimpleOperator::GreaterThan, "1"), 2.0),
        ];

        assert_eq!(root.size(), 3);
        let scores: Vec<_> = root.leaves().iter().map(|n| n.score).collect();
        assert_eq!(scores, vec![Some(1.0), Some(2.0)]);
    }
}
