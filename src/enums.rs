//! Ordered name ↔ integer bijections.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// An immutable bijection between string keys and distinct integer values.
///
/// Entries are held sorted by value, ascending by default. Lookups run in
/// both directions. Once built, an `Enum` never changes; there are no
/// mutating operations.
#[derive(Clone, Debug)]
pub struct Enum {
    /// Sorted by value, ascending or descending per the constructor.
    entries: Vec<(String, i64)>,
    by_key: HashMap<String, usize>,
    by_value: HashMap<i64, usize>,
}

impl Enum {
    /// Build an ascending enum over the full integer range.
    pub fn new<I, S>(pairs: I) -> Result<Enum>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self::build(pairs, i64::MIN, i64::MAX, false)
    }

    /// Build a descending enum over the full integer range.
    pub fn descending<I, S>(pairs: I) -> Result<Enum>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self::build(pairs, i64::MIN, i64::MAX, true)
    }

    /// Build an ascending enum whose values must fit an unsigned byte.
    pub fn uint8<I, S>(pairs: I) -> Result<Enum>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self::build(pairs, 0, 255, false)
    }

    /// Build an ascending enum whose values all fit a single-byte
    /// MessagePack integer encoding.
    pub fn fixint<I, S>(pairs: I) -> Result<Enum>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self::build(pairs, -32, 127, false)
    }

    /// Build an ascending enum with an explicit value range.
    pub fn ranged<I, S>(pairs: I, min: i64, max: i64) -> Result<Enum>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self::build(pairs, min, max, false)
    }

    fn build<I, S>(pairs: I, min: i64, max: i64, descending: bool) -> Result<Enum>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, i64)> = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            if key.is_empty() {
                return Err(Error::InvalidArgument("Enum key is empty".into()));
            }
            if key.parse::<f64>().is_ok() {
                return Err(Error::InvalidArgument(format!(
                    "Enum key {:?} reads as a number",
                    key
                )));
            }
            if value < min || value > max {
                return Err(Error::InvalidArgument(format!(
                    "Enum value {} for key {:?} is outside [{}, {}]",
                    value, key, min, max
                )));
            }
            entries.push((key, value));
        }
        if descending {
            entries.sort_by(|a, b| b.1.cmp(&a.1));
        } else {
            entries.sort_by_key(|e| e.1);
        }

        let mut by_key = HashMap::with_capacity(entries.len());
        let mut by_value = HashMap::with_capacity(entries.len());
        for (slot, (key, value)) in entries.iter().enumerate() {
            if by_value.insert(*value, slot).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "Enum value {} appears more than once",
                    value
                )));
            }
            if by_key.insert(key.clone(), slot).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "Enum key {:?} appears more than once",
                    key
                )));
            }
        }
        Ok(Enum {
            entries,
            by_key,
            by_value,
        })
    }

    /// Rebuild an enum from the key/value columns of its wire form. The
    /// direction is inferred from the stored value order.
    pub(crate) fn from_columns(keys: Vec<String>, values: Vec<i64>) -> Result<Enum> {
        if keys.len() != values.len() {
            return Err(Error::BadEncode(format!(
                "Enum has {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        let descending = values.len() > 1 && values[0] > values[values.len() - 1];
        Self::build(keys.into_iter().zip(values), i64::MIN, i64::MAX, descending)
    }

    /// Look up the integer value for `key`.
    pub fn by_key(&self, key: &str) -> Result<i64> {
        self.by_key
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .ok_or_else(|| Error::NotFound(format!("enum key {:?}", key)))
    }

    /// Look up the key for an integer value.
    pub fn by_value(&self, value: i64) -> Result<&str> {
        self.by_value
            .get(&value)
            .map(|&slot| self.entries[slot].0.as_str())
            .ok_or_else(|| Error::NotFound(format!("enum value {}", value)))
    }

    /// Iterate `(key, value)` pairs in sort order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff `min` equals the smallest value and `max` is at least the
    /// largest.
    pub fn is_in(&self, min: i64, max: i64) -> bool {
        let values = self.entries.iter().map(|e| e.1);
        let (Some(lo), Some(hi)) = (values.clone().min(), values.max()) else {
            return false;
        };
        min == lo && max >= hi
    }
}

impl PartialEq for Enum {
    fn eq(&self, other: &Enum) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Enum {}
