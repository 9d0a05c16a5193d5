//! Ordered, case-folding map from table name to value
//!
//! Every dataset keeps its tables in an [`OrderedTableNameMap`]. Insertion
//! order is preserved because comparison and export walk tables in the order
//! they were registered; lookups fold the name first when the map is case
//! insensitive.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, Result};

/// Fold a table (or column) name into its lookup key
///
/// Case-insensitive keys are uppercased with Unicode rules, which do not
/// depend on the process locale.
pub fn fold_name(name: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_uppercase())
    }
}

/// Compare two names under a case policy
pub fn names_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    fold_name(a, case_sensitive) == fold_name(b, case_sensitive)
}

/// Match `name` against a pattern where `*` matches any run of characters
/// and `?` matches exactly one
pub fn wildcard_match(pattern: &str, name: &str, case_sensitive: bool) -> bool {
    let pattern: Vec<char> = fold_name(pattern, case_sensitive).chars().collect();
    let name: Vec<char> = fold_name(name, case_sensitive).chars().collect();

    let (mut p, mut n) = (0, 0);
    // position of the last `*` and the name index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    p = star + 1;
                    n = tried + 1;
                    backtrack = Some((star, tried + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// A table name paired with its folded lookup key
///
/// Equality, hashing and ordering use the folded key; display uses the
/// original spelling.
#[derive(Debug, Clone)]
pub struct TableKey {
    name: String,
    key: String,
}

impl TableKey {
    /// Create a key for `name` under a case policy
    pub fn new(name: &str, case_sensitive: bool) -> Self {
        Self {
            name: name.to_string(),
            key: fold_name(name, case_sensitive).into_owned(),
        }
    }

    /// Original spelling
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folded lookup key
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TableKey {}

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for TableKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TableKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    /// Name as it was registered
    name: String,
    value: V,
}

/// Insertion-ordered table registry with a case-sensitivity policy
#[derive(Debug, Clone)]
pub struct OrderedTableNameMap<V> {
    entries: IndexMap<String, Entry<V>>,
    case_sensitive: bool,
    last_override: Option<String>,
}

impl<V> OrderedTableNameMap<V> {
    /// Create an empty map
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            entries: IndexMap::new(),
            case_sensitive,
            last_override: None,
        }
    }

    /// Whether names are compared verbatim
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Lookup key for `name` under this map's policy
    pub fn fold<'a>(&self, name: &'a str) -> Cow<'a, str> {
        fold_name(name, self.case_sensitive)
    }

    /// Register `value` under `name`
    ///
    /// Fails with [`Error::DuplicateName`] when the folded name is already
    /// present; the map is left untouched in that case.
    pub fn add(&mut self, name: impl Into<String>, value: V) -> Result<()> {
        let name = name.into();
        let key = self.fold(&name).into_owned();
        if self.entries.contains_key(&key) {
            trace!(table = %name, "rejecting duplicate table name");
            return Err(Error::DuplicateName(name));
        }
        self.entries.insert(key, Entry { name, value });
        self.last_override = None;
        Ok(())
    }

    /// Value registered under `name`, if any
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.get(self.fold(name).as_ref()).map(|e| &e.value)
    }

    /// Mutable value registered under `name`, if any
    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        let key = fold_name(name, self.case_sensitive);
        self.entries.get_mut(key.as_ref()).map(|e| &mut e.value)
    }

    /// Existence check under the folding policy
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(self.fold(name).as_ref())
    }

    /// Name under which `name` was registered (original spelling)
    pub fn registered_name(&self, name: &str) -> Option<&str> {
        self.entries
            .get(self.fold(name).as_ref())
            .map(|e| e.name.as_str())
    }

    /// Names in insertion order, as they were registered
    pub fn ordered_names(&self) -> Vec<String> {
        self.entries.values().map(|e| e.name.clone()).collect()
    }

    /// Values in insertion order
    pub fn ordered_values(&self) -> Vec<&V> {
        self.entries.values().map(|e| &e.value).collect()
    }

    /// `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &V)> + '_ {
        self.entries.values().map(|e| (e.name.as_str(), &e.value))
    }

    /// Replace the value of an already registered name
    pub fn update(&mut self, name: &str, value: V) -> Result<()> {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::NoSuchTable(name.to_string())),
        }
    }

    /// Name treated as the most recently completed table
    ///
    /// This is the explicit override when one is set, otherwise the last
    /// registered name.
    pub fn last_name(&self) -> Option<&str> {
        if let Some(name) = &self.last_override {
            return Some(name.as_str());
        }
        self.entries.values().last().map(|e| e.name.as_str())
    }

    /// Override which registered name counts as the last one
    pub fn set_last_name(&mut self, name: &str) -> Result<()> {
        let registered = self
            .registered_name(name)
            .ok_or_else(|| Error::NoSuchTable(name.to_string()))?
            .to_string();
        self.last_override = Some(registered);
        Ok(())
    }

    /// Whether `name` is the table [`last_name`](Self::last_name) reports
    pub fn is_last(&self, name: &str) -> bool {
        self.last_name()
            .is_some_and(|last| names_equal(last, name, self.case_sensitive))
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the map, yielding values in insertion order
    pub fn into_values(self) -> Vec<V> {
        self.entries.into_values().map(|e| e.value).collect()
    }
}

impl<V> Default for OrderedTableNameMap<V> {
    fn default() -> Self {
        Self::new(false)
    }
}
