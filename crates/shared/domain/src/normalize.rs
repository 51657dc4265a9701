//! Field normalizer for raw update payloads.
//!
//! Nested attributes reach us as native JSON lists, JSON-encoded strings,
//! compact `a|b;c|d` rows, or flat form keys (`education[0][degree]`).
//! Everything is folded into one canonical list shape. Normalization
//! never fails: malformed input degrades to empty lists or empty fields.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::constants::{
    FIELD_COMPANY_EXPERIENCE, FIELD_DELIMITER, FIELD_EDUCATION, FIELD_EXPERIENCE,
    FIELD_PERMISSIONS, FIELD_ROLE, FIELD_SKILLS, LIST_DELIMITER, ROW_DELIMITER,
};
use crate::record::{CompanyExperience, Education, Experience, ReviewStatus};

/// `attr[3]` or `attr[3][field]`
static INDEXED_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\[(\d+)\](?:\[([A-Za-z_][A-Za-z0-9_]*)\])?$")
        .expect("indexed key pattern is valid")
});

/// Three-state scalar patch: absent, explicitly cleared, or set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    Keep,
    Clear,
    Set(T),
}

impl FieldPatch<String> {
    /// Apply to a text field where empty string means "not set".
    pub fn resolve(self, current: &str) -> String {
        match self {
            FieldPatch::Keep => current.to_string(),
            FieldPatch::Clear => String::new(),
            FieldPatch::Set(value) => value,
        }
    }

    /// Apply to an optional field.
    pub fn resolve_optional(self, current: Option<&str>) -> Option<String> {
        match self {
            FieldPatch::Keep => current.map(str::to_string),
            FieldPatch::Clear => None,
            FieldPatch::Set(value) => Some(value),
        }
    }
}

/// Raw update payload, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawUpdate(Map<String, Value>);

impl RawUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from form pairs. Repeated keys collect into a list.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut raw = Self::new();
        for (key, value) in pairs {
            raw.push(key, Value::String(value));
        }
        raw
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert, turning a repeated key into a list of values.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.0.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.0.insert(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the payload mentions `attr`, directly or through indexed keys.
    pub fn contains(&self, attr: &str) -> bool {
        self.0.contains_key(attr)
            || self.0.keys().any(|key| {
                INDEXED_KEY
                    .captures(key)
                    .is_some_and(|caps| &caps[1] == attr)
            })
    }

    /// A single-valued field. When a form repeats the key, the last value
    /// sent wins.
    fn scalar(&self, key: &str) -> Option<&Value> {
        match self.0.get(key)? {
            Value::Array(items) => items.last(),
            value => Some(value),
        }
    }

    /// Read a scalar text field. Absent or null keeps the current value,
    /// an empty string clears it. Whitespace is a value like any other.
    pub fn text(&self, key: &str) -> FieldPatch<String> {
        match self.scalar(key) {
            None | Some(Value::Null) => FieldPatch::Keep,
            Some(Value::String(s)) if s.is_empty() => FieldPatch::Clear,
            Some(Value::String(s)) => FieldPatch::Set(s.clone()),
            Some(Value::Number(n)) => FieldPatch::Set(n.to_string()),
            Some(Value::Bool(b)) => FieldPatch::Set(b.to_string()),
            Some(_) => FieldPatch::Keep,
        }
    }

    /// Read a boolean flag sent either natively or as form text.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.scalar(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(true),
                "false" | "0" | "off" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Requested role, if the payload carries a non-empty one.
    pub fn role(&self) -> Option<String> {
        match self.text(FIELD_ROLE) {
            FieldPatch::Set(role) if !role.trim().is_empty() => Some(role.trim().to_string()),
            _ => None,
        }
    }

    /// Regroup `attr[N][field]` keys into per-index objects, ordered by N.
    fn indexed_objects(&self, attr: &str) -> Vec<Map<String, Value>> {
        let mut grouped: BTreeMap<usize, Map<String, Value>> = BTreeMap::new();
        for (key, value) in &self.0 {
            let Some(caps) = INDEXED_KEY.captures(key) else {
                continue;
            };
            if &caps[1] != attr {
                continue;
            }
            let (Ok(index), Some(field)) = (caps[2].parse::<usize>(), caps.get(3)) else {
                continue;
            };
            grouped
                .entry(index)
                .or_default()
                .insert(field.as_str().to_string(), value.clone());
        }
        grouped.into_values().collect()
    }

    /// Regroup `attr[N]` keys into an ordered list of values.
    fn indexed_values(&self, attr: &str) -> Vec<Value> {
        let mut grouped: BTreeMap<usize, Value> = BTreeMap::new();
        for (key, value) in &self.0 {
            let Some(caps) = INDEXED_KEY.captures(key) else {
                continue;
            };
            if &caps[1] != attr || caps.get(3).is_some() {
                continue;
            }
            if let Ok(index) = caps[2].parse::<usize>() {
                grouped.insert(index, value.clone());
            }
        }
        grouped.into_values().collect()
    }
}

impl From<Map<String, Value>> for RawUpdate {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A sub-object of a nested list attribute.
pub trait NestedEntry: Sized {
    /// Field names, in the positional order used by the compact row form.
    const FIELDS: &'static [&'static str];

    /// Build an entry from loose fields; missing fields default to empty.
    fn from_fields(fields: &Map<String, Value>) -> Self;
}

impl NestedEntry for Education {
    const FIELDS: &'static [&'static str] = &["degree", "institution", "year"];

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let id = ["id", "_id"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
            .unwrap_or_else(Uuid::nil);
        let certificate = Some(field_text(fields, "certificate")).filter(|path| !path.is_empty());

        Education {
            id,
            degree: field_text(fields, "degree"),
            institution: field_text(fields, "institution"),
            year: field_text(fields, "year"),
            certificate,
            status: ReviewStatus::parse_or_pending(&field_text(fields, "status")),
        }
    }
}

impl NestedEntry for Experience {
    const FIELDS: &'static [&'static str] = &["company", "role", "years"];

    fn from_fields(fields: &Map<String, Value>) -> Self {
        Experience {
            company: field_text(fields, "company"),
            role: field_text(fields, "role"),
            years: field_text(fields, "years"),
        }
    }
}

impl NestedEntry for CompanyExperience {
    const FIELDS: &'static [&'static str] = &["company", "role", "years"];

    fn from_fields(fields: &Map<String, Value>) -> Self {
        CompanyExperience {
            company: field_text(fields, "company"),
            role: field_text(fields, "role"),
            years: field_text(fields, "years"),
        }
    }
}

/// Canonical nested fields of an update payload.
///
/// Every collection is present; a missing attribute is an empty list.
/// Education ids are nil until the record they land in assigns them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFields {
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub skills: Vec<String>,
    pub company_experience: Vec<CompanyExperience>,
    pub permissions: Vec<String>,
}

/// Normalize every nested attribute of a raw payload.
pub fn normalize(raw: &RawUpdate) -> NormalizedFields {
    NormalizedFields {
        education: normalize_entries(raw, FIELD_EDUCATION),
        experience: normalize_entries(raw, FIELD_EXPERIENCE),
        skills: normalize_list(raw, FIELD_SKILLS),
        company_experience: normalize_entries(raw, FIELD_COMPANY_EXPERIENCE),
        permissions: normalize_list(raw, FIELD_PERMISSIONS),
    }
}

/// Normalize one list-of-objects attribute.
pub fn normalize_entries<T: NestedEntry>(raw: &RawUpdate, attr: &str) -> Vec<T> {
    match raw.get(attr) {
        Some(value) => decode_entries(value),
        None => raw
            .indexed_objects(attr)
            .iter()
            .map(T::from_fields)
            .collect(),
    }
}

/// Normalize one list-of-strings attribute.
pub fn normalize_list(raw: &RawUpdate, attr: &str) -> Vec<String> {
    match raw.get(attr) {
        Some(value) => decode_list(value),
        None => clean_list(raw.indexed_values(attr).iter().filter_map(scalar_text)),
    }
}

/// Give every entry without a stable id a fresh one.
pub fn assign_missing_ids(entries: &mut [Education]) {
    for entry in entries.iter_mut().filter(|entry| entry.id.is_nil()) {
        entry.id = Uuid::new_v4();
    }
}

fn decode_entries<T: NestedEntry>(value: &Value) -> Vec<T> {
    match value {
        Value::Array(items) => items.iter().map(entry_from_value).collect(),
        Value::Object(map) => match numeric_keyed(map) {
            Some(items) => items.into_iter().map(entry_from_value).collect(),
            None => vec![T::from_fields(map)],
        },
        Value::String(text) => decode_entry_text(text),
        _ => Vec::new(),
    }
}

fn decode_entry_text<T: NestedEntry>(text: &str) -> Vec<T> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if looks_like_json(text) {
        return match serde_json::from_str::<Value>(text) {
            Ok(value) if !value.is_string() => decode_entries(&value),
            _ => Vec::new(),
        };
    }

    text.split(ROW_DELIMITER)
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .map(|row| {
            let fields: Map<String, Value> = T::FIELDS
                .iter()
                .zip(row.split(FIELD_DELIMITER))
                .map(|(name, segment)| (name.to_string(), Value::String(segment.trim().to_string())))
                .collect();
            T::from_fields(&fields)
        })
        .collect()
}

fn entry_from_value<T: NestedEntry>(value: &Value) -> T {
    match value {
        Value::Object(map) => T::from_fields(map),
        _ => T::from_fields(&Map::new()),
    }
}

fn decode_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => clean_list(items.iter().filter_map(scalar_text)),
        Value::Object(map) => match numeric_keyed(map) {
            Some(items) => clean_list(items.into_iter().filter_map(scalar_text)),
            None => Vec::new(),
        },
        Value::String(text) => {
            let text = text.trim();
            if text.starts_with('[') {
                match serde_json::from_str::<Value>(text) {
                    Ok(parsed @ Value::Array(_)) => decode_list(&parsed),
                    _ => Vec::new(),
                }
            } else {
                clean_list(text.split(LIST_DELIMITER).map(str::to_string))
            }
        }
        Value::Number(_) | Value::Bool(_) => clean_list(scalar_text(value)),
        Value::Null => Vec::new(),
    }
}

/// Values of an object whose keys are all indices, in index order.
fn numeric_keyed(map: &Map<String, Value>) -> Option<Vec<&Value>> {
    if map.is_empty() {
        return None;
    }
    let mut indexed = map
        .iter()
        .map(|(key, value)| key.parse::<usize>().ok().map(|index| (index, value)))
        .collect::<Option<Vec<_>>>()?;
    indexed.sort_by_key(|(index, _)| *index);
    Some(indexed.into_iter().map(|(_, value)| value).collect())
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('[') || text.starts_with('{')
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).and_then(scalar_text).unwrap_or_default()
}

fn clean_list<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
