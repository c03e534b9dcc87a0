//! A tiny query and mutation language over registries.
//!
//! A `Query` is a conjunction of filters, each comparing one field
//! (`id` or `createdAt`) against a value. Ids compare by their hex
//! string, so `Lt`/`Gt` on `id` is a lexicographic range and not a
//! time range.
//!
//! Mutations are applied in order to the JSON form of a record, which
//! is then parsed back and checked, so a mutation that would leave the
//! record ill-typed is rejected before anything is written.
//!
//! Both have a JSON text form mirroring the familiar document-store
//! syntax:
//!
//! ```text
//! [{"id": {"$gt": "84e0..."}}, {"createdAt": {"$lte": "2024-01-01T00:00:00Z"}}]
//! [{"content": {"$set": "new"}}, {"content": "shorthand for $set"}]
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value};

use super::id::Id;
use super::registry::Registry;
use crate::errors::{VaultError, Result};

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// One comparison operator with its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparator<T> {
    Eq(T),
    Lt(T),
    Gt(T),
    Lte(T),
    Gte(T),
}

impl<T: Ord> Comparator<T> {
    /// Does `field` satisfy this comparison?
    pub fn matches(&self, field: &T) -> bool {
        match self {
            Self::Eq(v) => field == v,
            Self::Lt(v) => field < v,
            Self::Gt(v) => field > v,
            Self::Lte(v) => field <= v,
            Self::Gte(v) => field >= v,
        }
    }
}

impl<T> Comparator<T> {
    fn parse<F>(chunk: &Value, field: &str, parse_value: F) -> Result<Self>
    where
        F: Fn(&Value) -> Result<T>,
    {
        let obj = chunk.as_object().ok_or_else(|| {
            VaultError::Validation(format!("filter on '{field}' must be an object"))
        })?;
        let mut entries = obj.iter();
        let (op, value) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(VaultError::Validation(format!(
                    "filter on '{field}' must have exactly one operator"
                )))
            }
        };
        let value = parse_value(value)?;
        match op.as_str() {
            "$eq" => Ok(Self::Eq(value)),
            "$lt" => Ok(Self::Lt(value)),
            "$gt" => Ok(Self::Gt(value)),
            "$lte" => Ok(Self::Lte(value)),
            "$gte" => Ok(Self::Gte(value)),
            other => Err(VaultError::Validation(format!(
                "unknown comparison operator '{other}'"
            ))),
        }
    }
}

/// A comparison on one queryable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Id(Comparator<Id>),
    CreatedAt(Comparator<DateTime<Utc>>),
}

/// Conjunction of filters. An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<Filter>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality on `id`, the shape single-record operations expect.
    pub fn by_id(id: Id) -> Self {
        Self::new().and(Filter::Id(Comparator::Eq(id)))
    }

    pub fn and(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The id named by the first `id` equality filter, if any.
    pub fn id_eq(&self) -> Option<&Id> {
        self.filters.iter().find_map(|f| match f {
            Filter::Id(Comparator::Eq(id)) => Some(id),
            _ => None,
        })
    }

    /// Check only the `id` filters; usable before a record is loaded.
    pub fn matches_id(&self, id: &Id) -> bool {
        self.filters.iter().all(|f| match f {
            Filter::Id(c) => c.matches(id),
            Filter::CreatedAt(_) => true,
        })
    }

    /// Whether any filter needs the record body to be evaluated.
    pub fn needs_record(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::CreatedAt(_)))
    }

    /// Check every filter against a loaded record.
    pub fn matches(&self, registry: &Registry) -> bool {
        self.filters.iter().all(|f| match f {
            Filter::Id(c) => c.matches(registry.id()),
            Filter::CreatedAt(c) => c.matches(&registry.created_at()),
        })
    }

    /// Parse the JSON array form.
    pub fn from_json(value: &Value) -> Result<Self> {
        let chunks = value
            .as_array()
            .ok_or_else(|| VaultError::Validation("query must be an array of filters".into()))?;

        let mut query = Self::new();
        for chunk in chunks {
            let obj = chunk
                .as_object()
                .ok_or_else(|| VaultError::Validation("query filter must be an object".into()))?;
            for (field, cond) in obj {
                let filter = match field.as_str() {
                    "id" => Filter::Id(Comparator::parse(cond, field, parse_id)?),
                    "createdAt" => {
                        Filter::CreatedAt(Comparator::parse(cond, field, parse_timestamp)?)
                    }
                    other => {
                        return Err(VaultError::Validation(format!(
                            "field '{other}' cannot be queried (use id or createdAt)"
                        )))
                    }
                };
                query = query.and(filter);
            }
        }
        Ok(query)
    }
}

fn parse_id(value: &Value) -> Result<Id> {
    value
        .as_str()
        .ok_or_else(|| VaultError::Validation("id must be a hex string".into()))
        .and_then(Id::from_hex)
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| VaultError::Validation(format!("createdAt '{s}' is not RFC 3339: {e}"))),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| VaultError::Validation(format!("createdAt {n} is out of range"))),
        _ => Err(VaultError::Validation(
            "createdAt must be an RFC 3339 string or epoch milliseconds".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Fields a mutation may touch. `id`, the owner key and the creation
/// time are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Content,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Self::Content => "content",
        }
    }

    fn parse(name: &str) -> Result<Self> {
        match name {
            "content" | "vaultStore" => Ok(Self::Content),
            "id" | "ownerPublicKey" | "publicKey" | "createdAt" => Err(VaultError::Validation(
                format!("field '{name}' is immutable"),
            )),
            other => Err(VaultError::Validation(format!("unknown field '{other}'"))),
        }
    }
}

/// One update operator.
///
/// `Push` and `Sum` are part of the language but the only mutable field,
/// `content`, is a string, so on a registry they always fail with a
/// `Validation` error and leave the record untouched. Only `Set` changes
/// a registry today.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace the field value.
    Set(Field, Value),
    /// Append to an array field. Rejected on `content`.
    Push(Field, Value),
    /// Add to a numeric field. Rejected on `content`.
    Sum(Field, Number),
}

impl Mutation {
    /// Plain assignment; the operator-less form is shorthand for `$set`.
    pub fn assign(field: Field, value: impl Into<Value>) -> Self {
        Self::Set(field, value.into())
    }

    pub fn field(&self) -> Field {
        match self {
            Self::Set(f, _) | Self::Push(f, _) | Self::Sum(f, _) => *f,
        }
    }

    /// Parse one `{field: {$op: value}}` or `{field: value}` chunk.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| VaultError::Validation("mutation must be an object".into()))?;
        let mut entries = obj.iter();
        let (name, op) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(VaultError::Validation(
                    "mutation must name exactly one field".into(),
                ))
            }
        };
        let field = Field::parse(name)?;

        let Some(op_obj) = op.as_object().filter(|o| is_operator_object(o)) else {
            return Ok(Self::assign(field, op.clone()));
        };
        let (op_name, operand) = op_obj
            .iter()
            .next()
            .ok_or_else(|| VaultError::Validation("empty mutation operator".into()))?;
        match op_name.as_str() {
            "$set" => Ok(Self::Set(field, operand.clone())),
            "$push" => Ok(Self::Push(field, operand.clone())),
            "$sum" => match operand {
                Value::Number(n) => Ok(Self::Sum(field, n.clone())),
                _ => Err(VaultError::Validation("$sum needs a number".into())),
            },
            other => Err(VaultError::Validation(format!(
                "unknown mutation operator '{other}'"
            ))),
        }
    }

    /// Parse an array of mutation chunks.
    pub fn list_from_json(value: &Value) -> Result<Vec<Self>> {
        value
            .as_array()
            .ok_or_else(|| VaultError::Validation("mutations must be an array".into()))?
            .iter()
            .map(Self::from_json)
            .collect()
    }

    fn apply(&self, doc: &mut Map<String, Value>) -> Result<()> {
        let key = self.field().key();
        match self {
            Self::Set(_, value) => {
                doc.insert(key.to_string(), value.clone());
            }
            Self::Push(_, value) => match doc.get_mut(key) {
                Some(Value::Array(items)) => items.push(value.clone()),
                _ => {
                    return Err(VaultError::Validation(format!(
                        "$push needs '{key}' to be an array"
                    )))
                }
            },
            Self::Sum(_, by) => {
                let current = match doc.get(key) {
                    Some(Value::Number(n)) => n.clone(),
                    _ => {
                        return Err(VaultError::Validation(format!(
                            "$sum needs '{key}' to be a number"
                        )))
                    }
                };
                doc.insert(key.to_string(), Value::Number(add_numbers(&current, by)?));
            }
        }
        Ok(())
    }
}

fn is_operator_object(obj: &Map<String, Value>) -> bool {
    obj.len() == 1 && obj.keys().all(|k| k.starts_with('$'))
}

fn add_numbers(a: &Number, b: &Number) -> Result<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(Number::from(sum));
        }
    }
    let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
    Number::from_f64(x + y)
        .ok_or_else(|| VaultError::Validation("$sum produced a non-finite number".into()))
}

/// Apply `mutations` in order and return the resulting record.
///
/// The input record is never modified; on error nothing changes.
pub fn apply_mutations(registry: &Registry, mutations: &[Mutation]) -> Result<Registry> {
    let mut doc = match serde_json::to_value(registry)? {
        Value::Object(map) => map,
        _ => return Err(VaultError::Serialization("registry is not an object".into())),
    };

    for mutation in mutations {
        mutation.apply(&mut doc)?;
    }

    let next: Registry = serde_json::from_value(Value::Object(doc))
        .map_err(|e| VaultError::Validation(format!("mutation left an invalid record: {e}")))?;

    if !registry.same_identity(&next) {
        return Err(VaultError::Validation(
            "mutation attempted to change an immutable field".into(),
        ));
    }
    Ok(next)
}
