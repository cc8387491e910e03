//! LightGBM text model format parser.
//!
//! A model dump (`.txt` files saved via `save_model()`) is a sequence of
//! blank-line separated sections. Every line inside a section is a
//! `key=value` pair (or a bare key); the first line identifies the section
//! (`tree`, `Tree=3`, `feature_importances:`, `parameters:`, ...).
//!
//! [`SectionReader`] splits the raw text into [`Section`]s lazily. Typed
//! accessors on [`Section`] recover integers, doubles, bitset words and
//! `\uXXXX`-escaped strings, checking array lengths along the way.

use std::collections::HashMap;
use std::io;

// =============================================================================
// Error types
// =============================================================================

/// Error type for LightGBM model parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
    #[error("array size mismatch for {field}: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    #[error("version {0} is not supported")]
    UnsupportedVersion(String),
    #[error("expected section \"{expected}\", got \"{found}\"")]
    UnexpectedSection { expected: String, found: String },
    #[error("unexpected end of input while parsing {0}")]
    UnexpectedEnd(String),
    #[error("invalid pandas_categorical section: {0}")]
    InvalidPandasCategorical(String),
    #[error(
        "conflicting categorical feature information between the header and \"pandas_categorical\" \
         sections: {expected} categorical features, {actual} category lists"
    )]
    PandasCategoricalMismatch { expected: usize, actual: usize },
    #[error("header {field}={actual} does not match the objective's {expected} classes")]
    ClassCountMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    #[error("unsupported objective function \"{0}\"")]
    UnknownObjective(String),
    #[error("tree {0} has linear leaves, which are not supported")]
    LinearTreesNotSupported(usize),
}

impl ParseError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ParseError::InvalidValue {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Section
// =============================================================================

/// One blank-line delimited block of a model dump.
///
/// Keys keep their insertion order. A key that appears twice keeps its first
/// position and its last value. Empty values are stored as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    id: String,
    entries: Vec<(String, Option<String>)>,
    index: HashMap<String, usize>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a section from `key<separator>value` tokens.
    ///
    /// Used for the trailing parameters of an objective string
    /// (`binary sigmoid:1` becomes `{sigmoid: 1}`).
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>, separator: char) -> Self {
        let mut section = Section::new();
        for token in tokens {
            section.put_token(token, separator);
        }
        section
    }

    /// Add one line of a dump.
    ///
    /// `[key: value]` lines (the `parameters:` block) are split on the first
    /// colon, everything else on the first `=`.
    pub fn put_line(&mut self, line: &str) {
        if self.entries.is_empty() {
            self.id = line.trim().to_owned();
        }
        match line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            Some(inner) => self.put_token(inner, ':'),
            None => self.put_token(line, '='),
        }
    }

    /// Add a `key<separator>value` token. A separator at position 0 (or no
    /// separator at all) makes the whole token a bare key.
    pub fn put_token(&mut self, token: &str, separator: char) {
        match token.find(separator) {
            Some(pos) if pos > 0 => {
                let (key, rest) = token.split_at(pos);
                self.put(key, Some(&rest[separator.len_utf8()..]));
            }
            _ => self.put(token, None),
        }
    }

    pub fn put(&mut self, key: &str, value: Option<&str>) {
        if self.entries.is_empty() && self.id.is_empty() {
            self.id = match value {
                Some(value) => format!("{key}={}", value.trim()),
                None => key.to_owned(),
            };
        }
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        match self.index.get(key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.to_owned(), self.entries.len());
                self.entries.push((key.to_owned(), value));
            }
        }
    }

    /// Section identifier: the first line, e.g. `tree` or `Tree=0`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Raw value of a key; `None` when the key is absent or has no value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .and_then(|&pos| self.entries[pos].1.as_deref())
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    fn value(&self, key: &str) -> Result<Option<&str>, ParseError> {
        match self.index.get(key) {
            Some(&pos) => Ok(self.entries[pos].1.as_deref()),
            None => Err(ParseError::MissingField(key.to_owned())),
        }
    }

    fn required(&self, key: &str) -> Result<&str, ParseError> {
        self.value(key)?
            .ok_or_else(|| ParseError::MissingField(key.to_owned()))
    }

    pub fn get_string(&self, key: &str) -> Result<String, ParseError> {
        unescape(self.required(key)?).map_err(|message| ParseError::invalid(key, message))
    }

    pub fn get_int(&self, key: &str) -> Result<i32, ParseError> {
        let value = self.required(key)?;
        value
            .parse()
            .map_err(|_| ParseError::invalid(key, format!("invalid integer: {value}")))
    }

    pub fn get_double(&self, key: &str) -> Result<f64, ParseError> {
        let value = self.required(key)?;
        parse_double(value)
            .ok_or_else(|| ParseError::invalid(key, format!("invalid double: {value}")))
    }

    /// Whitespace separated, unescaped string tokens. `len` of `None` accepts
    /// any number of tokens.
    pub fn get_string_array(&self, key: &str, len: Option<usize>) -> Result<Vec<String>, ParseError> {
        self.parse_array(key, len, |token| unescape(token))
    }

    pub fn get_int_array(&self, key: &str, len: Option<usize>) -> Result<Vec<i32>, ParseError> {
        self.parse_array(key, len, |token| {
            token.parse().map_err(|_| format!("invalid integer: {token}"))
        })
    }

    /// Bitset words, as written for `cat_threshold`.
    pub fn get_unsigned_int_array(&self, key: &str, len: Option<usize>) -> Result<Vec<u32>, ParseError> {
        self.parse_array(key, len, |token| {
            token.parse().map_err(|_| format!("invalid unsigned integer: {token}"))
        })
    }

    pub fn get_double_array(&self, key: &str, len: Option<usize>) -> Result<Vec<f64>, ParseError> {
        self.parse_array(key, len, |token| {
            parse_double(token).ok_or_else(|| format!("invalid double: {token}"))
        })
    }

    fn parse_array<T>(
        &self,
        key: &str,
        len: Option<usize>,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<Vec<T>, ParseError> {
        let values = match self.value(key)? {
            Some(value) => value
                .split_whitespace()
                .map(|token| parse(token).map_err(|message| ParseError::invalid(key, message)))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        if let Some(expected) = len {
            validate_array_size(key, &values, expected)?;
        }
        Ok(values)
    }
}

// =============================================================================
// Section reader
// =============================================================================

/// Lazily splits a line source into [`Section`]s.
///
/// The reader is single-pass: it consumes the underlying line iterator and
/// stops at the first I/O error.
pub struct SectionReader<I> {
    lines: I,
    failed: bool,
}

impl<I> SectionReader<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            failed: false,
        }
    }
}

/// Sections of an in-memory dump.
pub fn sections(text: &str) -> SectionReader<impl Iterator<Item = io::Result<String>> + '_> {
    SectionReader::new(text.lines().map(|line| Ok(line.to_owned())))
}

impl<I> Iterator for SectionReader<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<Section, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut section = Section::new();
        for line in self.lines.by_ref() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            };
            if line.trim().is_empty() {
                if section.is_empty() {
                    continue;
                }
                return Some(Ok(section));
            }
            section.put_line(&line);
        }
        (!section.is_empty()).then_some(Ok(section))
    }
}

// =============================================================================
// Feature descriptors
// =============================================================================

/// Per-feature descriptor from the header's `feature_infos` field.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureInfo {
    /// `none`: the feature was dropped during training.
    None,
    /// `[lo:hi]`, bounds may be infinite.
    Interval { lo: f64, hi: f64 },
    /// `v1:v2:...`: observed categories of a categorical feature.
    Values(Vec<i32>),
}

impl FeatureInfo {
    pub fn parse(info: &str) -> Result<Self, String> {
        if info == "none" {
            return Ok(FeatureInfo::None);
        }
        if let Some(inner) = info.strip_prefix('[').and_then(|i| i.strip_suffix(']')) {
            let (lo, hi) = inner
                .split_once(':')
                .ok_or_else(|| format!("invalid interval: {info}"))?;
            let bound = |token: &str| {
                parse_double(token).ok_or_else(|| format!("invalid interval bound: {token}"))
            };
            return Ok(FeatureInfo::Interval {
                lo: bound(lo)?,
                hi: bound(hi)?,
            });
        }
        info.split(':')
            .map(|token| {
                token
                    .parse()
                    .map_err(|_| format!("invalid category value: {token}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FeatureInfo::Values)
    }

    /// The `[0:1]` range of a binary indicator.
    pub fn is_binary_interval(&self) -> bool {
        matches!(self, FeatureInfo::Interval { lo, hi } if *lo == 0.0 && *hi == 1.0)
    }

    pub fn is_values(&self) -> bool {
        matches!(self, FeatureInfo::Values(_))
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

/// Parse a double, accepting LightGBM's `inf` / `-inf` spellings.
pub fn parse_double(token: &str) -> Option<f64> {
    match token {
        "inf" | "+inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => token.parse().ok(),
    }
}

/// Resolve `\uXXXX` escapes, including UTF-16 surrogate pairs.
pub fn unescape(value: &str) -> Result<String, String> {
    if !value.contains("\\u") {
        return Ok(value.to_owned());
    }
    let mut out = String::with_capacity(value.len());
    let mut units: Vec<u16> = Vec::new();
    let mut rest = value;
    while let Some(pos) = rest.find("\\u") {
        let (head, tail) = rest.split_at(pos);
        if !head.is_empty() {
            flush_utf16(&mut units, &mut out)?;
            out.push_str(head);
        }
        let hex = tail
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| format!("malformed escape sequence in {value:?}"))?;
        let unit = u16::from_str_radix(hex, 16)
            .map_err(|_| format!("malformed escape sequence in {value:?}"))?;
        units.push(unit);
        rest = &tail[6..];
    }
    flush_utf16(&mut units, &mut out)?;
    out.push_str(rest);
    Ok(out)
}

fn flush_utf16(units: &mut Vec<u16>, out: &mut String) -> Result<(), String> {
    for c in char::decode_utf16(units.drain(..)) {
        let c = c.map_err(|err| format!("unpaired surrogate {:#06x}", err.unpaired_surrogate()))?;
        out.push(c);
    }
    Ok(())
}

fn validate_array_size<T>(field: &str, arr: &[T], expected: usize) -> Result<(), ParseError> {
    if arr.len() != expected {
        return Err(ParseError::ArraySizeMismatch {
            field: field.to_owned(),
            expected,
            actual: arr.len(),
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
