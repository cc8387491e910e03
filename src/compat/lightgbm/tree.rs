//! Per-tree arrays of a LightGBM dump.
//!
//! A tree with `n` leaves stores `n - 1` internal nodes in parallel arrays.
//! Child references are node indices when non-negative, and bitwise
//! complemented leaf indices (`!leaf`) when negative.

use super::text::{ParseError, Section};

// =============================================================================
// Decision type bitfield
// =============================================================================

/// Bit 0: categorical split.
pub const CATEGORICAL_MASK: i32 = 1;
/// Bit 1: missing values follow the left branch.
pub const DEFAULT_LEFT_MASK: i32 = 2;

/// Missing value handling strategy recorded in bits 2-3.
///
/// The decoder routes missing values through `default_left` alone; this is
/// kept so callers inspecting a tree can see how LightGBM was told to treat
/// zeros and NaNs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingType {
    /// No special missing value handling
    #[default]
    None = 0,
    /// Treat zeros as missing
    Zero = 1,
    /// Treat NaN as missing
    NaN = 2,
}

impl MissingType {
    fn from_bits(bits: i32) -> Self {
        match bits {
            1 => MissingType::Zero,
            2 => MissingType::NaN,
            _ => MissingType::None,
        }
    }
}

/// Parsed decision type from LightGBM's bitfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionType {
    pub is_categorical: bool,
    pub default_left: bool,
    pub missing_type: MissingType,
}

impl DecisionType {
    /// Bit layout:
    /// - Bit 0: categorical flag (1 = categorical)
    /// - Bit 1: default_left flag (1 = left)
    /// - Bits 2-3: missing type (0=None, 1=Zero, 2=NaN)
    pub fn from_bits(value: i32) -> Self {
        DecisionType {
            is_categorical: value & CATEGORICAL_MASK != 0,
            default_left: value & DEFAULT_LEFT_MASK != 0,
            missing_type: MissingType::from_bits((value >> 2) & 3),
        }
    }
}

// =============================================================================
// Parsed tree structure
// =============================================================================

/// A parsed LightGBM tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LgbTree {
    pub num_leaves: usize,
    /// Number of categorical splits (not features) in this tree
    pub num_cat: usize,
    pub split_feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub decision_type: Vec<i32>,
    pub left_child: Vec<i32>,
    pub right_child: Vec<i32>,
    pub leaf_value: Vec<f64>,
    /// Training records per leaf, when the dump carries them
    pub leaf_count: Option<Vec<f64>>,
    /// Training records per internal node, when the dump carries them
    pub internal_count: Option<Vec<f64>>,
    /// Word offsets into `cat_threshold`, one range per categorical split
    pub cat_boundaries: Vec<i32>,
    pub cat_threshold: Vec<u32>,
    pub shrinkage: f64,
}

impl LgbTree {
    /// Load a `Tree=<index>` section.
    pub fn from_section(section: &Section, index: usize) -> Result<Self, ParseError> {
        let num_leaves = section.get_int("num_leaves")?;
        let num_leaves = usize::try_from(num_leaves)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ParseError::invalid("num_leaves", format!("tree {index} has {num_leaves} leaves")))?;

        if section
            .get("is_linear")
            .is_some_and(|linear| linear != "0")
        {
            return Err(ParseError::LinearTreesNotSupported(index));
        }

        let shrinkage = match section.get("shrinkage") {
            Some(_) => section.get_double("shrinkage")?,
            None => 1.0,
        };

        // Single-leaf tree has no splits
        if num_leaves == 1 {
            return Ok(LgbTree {
                num_leaves,
                leaf_value: section.get_double_array("leaf_value", Some(1))?,
                leaf_count: optional_counts(section, "leaf_count", 1)?,
                shrinkage,
                ..LgbTree::default()
            });
        }

        let num_splits = num_leaves - 1;
        let num_cat = match section.get("num_cat") {
            Some(_) => usize::try_from(section.get_int("num_cat")?)
                .map_err(|_| ParseError::invalid("num_cat", "negative categorical split count"))?,
            None => 0,
        };

        let (cat_boundaries, cat_threshold) = if num_cat > 0 {
            (
                section.get_int_array("cat_boundaries", Some(num_cat + 1))?,
                section.get_unsigned_int_array("cat_threshold", None)?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(LgbTree {
            num_leaves,
            num_cat,
            split_feature: section.get_int_array("split_feature", Some(num_splits))?,
            threshold: section.get_double_array("threshold", Some(num_splits))?,
            decision_type: section.get_int_array("decision_type", Some(num_splits))?,
            left_child: section.get_int_array("left_child", Some(num_splits))?,
            right_child: section.get_int_array("right_child", Some(num_splits))?,
            leaf_value: section.get_double_array("leaf_value", Some(num_leaves))?,
            leaf_count: optional_counts(section, "leaf_count", num_leaves)?,
            internal_count: optional_counts(section, "internal_count", num_splits)?,
            cat_boundaries,
            cat_threshold,
            shrinkage,
        })
    }

    pub fn num_internal(&self) -> usize {
        self.num_leaves.saturating_sub(1)
    }

    pub fn is_stump(&self) -> bool {
        self.num_leaves == 1
    }

    pub fn decision(&self, node: usize) -> DecisionType {
        DecisionType::from_bits(self.decision_type[node])
    }

    /// Bitset words of categorical split `cat_idx`, or `None` when the index
    /// or its boundaries are out of range.
    pub fn category_bitset(&self, cat_idx: usize) -> Option<&[u32]> {
        let start = usize::try_from(*self.cat_boundaries.get(cat_idx)?).ok()?;
        let end = usize::try_from(*self.cat_boundaries.get(cat_idx + 1)?).ok()?;
        self.cat_threshold.get(start..end)
    }

    /// Whether every split on `feature` is a `0.5` numeric threshold.
    ///
    /// `None` when the tree never splits on the feature.
    pub fn is_binary(&self, feature: usize) -> Option<bool> {
        self.fold_splits(feature, |decision, threshold| {
            !decision.is_categorical && threshold == 0.5
        })
    }

    /// Whether every split on `feature` is categorical.
    ///
    /// `None` when the tree never splits on the feature.
    pub fn is_categorical(&self, feature: usize) -> Option<bool> {
        self.fold_splits(feature, |decision, _| decision.is_categorical)
    }

    fn fold_splits(&self, feature: usize, pred: impl Fn(DecisionType, f64) -> bool) -> Option<bool> {
        let mut result = None;
        for node in 0..self.num_internal() {
            if usize::try_from(self.split_feature[node]).ok() != Some(feature) {
                continue;
            }
            if !pred(self.decision(node), self.threshold[node]) {
                return Some(false);
            }
            result = Some(true);
        }
        result
    }
}

/// Test membership of `pos` in a LightGBM bitset.
///
/// Positions beyond the stored words are not members.
pub fn find_in_bitset(bits: &[u32], pos: u32) -> bool {
    let word = (pos / 32) as usize;
    match bits.get(word) {
        Some(bits) => (bits >> (pos % 32)) & 1 == 1,
        None => false,
    }
}

/// All positions set in a LightGBM bitset, ascending.
pub fn bitset_members(bits: &[u32]) -> impl Iterator<Item = u32> + '_ {
    bits.iter().enumerate().flat_map(|(word, &value)| {
        (0..32u32)
            .filter(move |bit| (value >> bit) & 1 == 1)
            .map(move |bit| word as u32 * 32 + bit)
    })
}

fn optional_counts(section: &Section, key: &str, len: usize) -> Result<Option<Vec<f64>>, ParseError> {
    if !section.contains_key(key) {
        return Ok(None);
    }
    section.get_double_array(key, Some(len)).map(Some)
}
