//! Runtime values and lazy sequences.
//!
//! A [`Value`] is what a node evaluates to in scalar position; a
//! [`Sequence`] is the single-pass, pull-based view produced in collection
//! position. Collections only become a materialized [`Value::List`] when a
//! sequence-valued node is evaluated as a scalar.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use provql_types::{ItemId, Version, VersionRange};

use crate::error::QueryError;
use crate::query::QueryObject;

pub const ID_PROPERTY: &str = "id";
pub const VERSION_PROPERTY: &str = "version";
const KIND_PROPERTY: &str = "kind";
const DEFAULT_KIND: &str = "record";

/// A lazy, forward-only stream of values. Not restartable.
pub type Sequence<'a> = Box<dyn Iterator<Item = Result<Value, QueryError>> + 'a>;

pub fn empty_sequence<'a>() -> Sequence<'a> {
    Box::new(std::iter::empty())
}

pub fn sequence_of<'a, I>(values: I) -> Sequence<'a>
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: 'a,
{
    Box::new(values.into_iter().map(Ok))
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
    Id(ItemId),
    Version(Version),
    Range(VersionRange),
    Record(Arc<Record>),
    List(Arc<Vec<Value>>),
    Query(QueryObject),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Arc::new(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Id(_) => "id",
            Value::Version(_) => "version",
            Value::Range(_) => "version-range",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Query(_) => "query",
        }
    }

    /// Predicate truth: only `Boolean(true)` counts as a match.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Id(id) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The identifier+version shape, if this value is a versioned record.
    pub fn versioned(&self) -> Option<(&ItemId, &Version)> {
        self.as_record()
            .and_then(|r| Some((r.identifier()?, r.version()?)))
    }

    /// Orders two values of compatible kinds. Strings are coerced to
    /// versions when compared against a version.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Version(a), Value::Version(b)) => Some(a.cmp(b)),
            (Value::Version(a), Value::String(b)) => Version::parse(b).ok().map(|b| a.cmp(&b)),
            (Value::String(a), Value::Version(b)) => Version::parse(a).ok().map(|a| a.cmp(b)),
            (Value::String(_) | Value::Id(_), Value::String(_) | Value::Id(_)) => {
                Some(self.as_str().cmp(&other.as_str()))
            }
            _ => None,
        }
    }

    /// Turns the value into a sequence: lists are iterated, `Null` is the
    /// empty sequence and everything else is a singleton.
    pub fn into_sequence<'a>(self) -> Sequence<'a> {
        match self {
            Value::Null => empty_sequence(),
            Value::List(items) => Box::new((0..items.len()).map(move |i| Ok(items[i].clone()))),
            other => Box::new(std::iter::once(Ok(other))),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::String(n.to_string()),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::list(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(_) => match Record::from_json(json) {
                Some(record) => Value::from(record),
                None => Value::Null,
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => (*b).into(),
            Value::Integer(i) => (*i).into(),
            Value::String(s) => s.clone().into(),
            Value::Id(id) => id.as_str().into(),
            Value::Version(v) => v.to_string().into(),
            Value::Range(r) => r.to_string().into(),
            Value::Record(r) => r.to_json(),
            Value::List(items) => items.iter().map(Value::to_json).collect(),
            Value::Query(q) => format!("{}", q).into(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a == b,
            (Value::Version(a), Value::Version(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Query(a), Value::Query(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::String(s) => s.hash(state),
            Value::Id(id) => id.hash(state),
            Value::Version(v) => v.hash(state),
            Value::Range(r) => r.hash(state),
            Value::Record(r) => r.hash(state),
            Value::List(items) => items.hash(state),
            Value::Query(q) => q.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Id(id) => write!(f, "{}", id),
            Value::Version(v) => write!(f, "{}", v),
            Value::Range(r) => write!(f, "{}", r),
            Value::Record(r) => write!(f, "{}", r),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Query(q) => write!(f, "{}", q),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ItemId> for Value {
    fn from(id: ItemId) -> Self {
        Value::Id(id)
    }
}

impl From<Version> for Value {
    fn from(v: Version) -> Self {
        Value::Version(v)
    }
}

impl From<VersionRange> for Value {
    fn from(r: VersionRange) -> Self {
        Value::Range(r)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(Arc::new(r))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<QueryObject> for Value {
    fn from(q: QueryObject) -> Self {
        Value::Query(q)
    }
}

/// A property bag with a kind name. Records holding an `id` and a
/// comparable `version` have the versioned-item shape; a string `id` is
/// stored as [`Value::Id`] and a parseable `version` string as
/// [`Value::Version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    kind: String,
    properties: IndexMap<String, Value>,
}

impl Record {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn versioned(kind: impl Into<String>, id: impl Into<ItemId>, version: Version) -> Self {
        Self::new(kind)
            .with(ID_PROPERTY, Value::Id(id.into()))
            .with(VERSION_PROPERTY, Value::Version(version))
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = match (name.as_str(), value.into()) {
            (ID_PROPERTY, Value::String(s)) => Value::Id(ItemId::from(s)),
            (VERSION_PROPERTY, Value::String(s)) => match Version::parse(&s) {
                Ok(v) => Value::Version(v),
                Err(_) => Value::String(s),
            },
            (_, value) => value,
        };
        self.properties.insert(name, value);
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn identifier(&self) -> Option<&ItemId> {
        match self.properties.get(ID_PROPERTY) {
            Some(Value::Id(id)) => Some(id),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<&Version> {
        match self.properties.get(VERSION_PROPERTY) {
            Some(Value::Version(v)) => Some(v),
            _ => None,
        }
    }

    /// Builds a record from a JSON object. The `kind` key names the record
    /// kind. Returns `None` for non-objects.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let object = json.as_object()?;
        let kind = object
            .get(KIND_PROPERTY)
            .and_then(|k| k.as_str())
            .unwrap_or(DEFAULT_KIND);

        let mut record = Record::new(kind);
        for (name, value) in object.iter().filter(|(name, _)| *name != KIND_PROPERTY) {
            record.set(name.clone(), Value::from_json(value));
        }
        Some(record)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert(KIND_PROPERTY.to_string(), self.kind.clone().into());
        for (name, value) in &self.properties {
            object.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(object)
    }
}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Property order is not part of equality, so only order-free parts are hashed.
        self.kind.hash(state);
        self.properties.len().hash(state);
        self.properties.get(ID_PROPERTY).hash(state);
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.identifier(), self.version()) {
            (Some(id), Some(version)) => write!(f, "{} {}/{}", self.kind, id, version),
            _ => write!(f, "{} {{{} properties}}", self.kind, self.properties.len()),
        }
    }
}
