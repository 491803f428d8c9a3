//! Data supplied to a render.
//!
//! A render takes one [`Value`] as its data root. Mappings and lists are
//! plain variants; caller structs are exposed through the [`FieldSource`]
//! trait, either implemented directly or by registering accessors with
//! [`Accessors`] and wrapping the struct in a [`Record`].
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Named-field access on a caller object.
///
/// Field names are matched exactly (case-sensitive).
pub trait FieldSource: Send + Sync {
    /// The value of field `name`, or `None` when the object has no such field.
    fn field(&self, name: &str) -> Option<Value>;

    /// Field names, for diagnostics.
    fn field_names(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// A value bound to a placeholder path.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Arc<dyn FieldSource>),
}

impl Value {
    /// Wrap a field source.
    pub fn object<S: FieldSource + 'static>(source: S) -> Self {
        Value::Object(Arc::new(source))
    }

    /// Build a map from key/value pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use quince::Value;
    ///
    /// let data = Value::map([("name", Value::from("Ada")), ("age", Value::from(36))]);
    /// assert_eq!(data.get("name"), Some(Value::from("Ada")));
    /// ```
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert any serializable value through its JSON form.
    ///
    /// Numbers become `Int` when they fit in `i64`, `Decimal` for larger
    /// unsigned integers, and `Float` otherwise. Types that serialize as
    /// strings (such as `Decimal` or `NaiveDate`) arrive as `String`; number
    /// and date formats accept those strings.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Field `name` of a map or object.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(name).cloned(),
            Value::Object(source) => source.field(name),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Decimal(d) => f.debug_tuple("Decimal").field(d).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Value::DateTime(d) => f.debug_tuple("DateTime").field(d).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(source) => f
                .debug_struct("Object")
                .field("fields", &source.field_names())
                .finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    Decimal => Decimal,
    String => String,
    &str => String,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Decimal(Decimal::from(v)),
        }
    }
}

impl From<usize> for Value {
    #[inline]
    fn from(v: usize) -> Self {
        Value::from(v as u64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(map: HashMap<K, V>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Decimal(Decimal::from(u))
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;

/// Field accessors registered for a struct type.
///
/// Build one registry per type and share it between records with an `Arc`.
///
/// # Examples
///
/// ```
/// use quince::{Accessors, Record, Value};
/// use std::sync::Arc;
///
/// struct Customer {
///     name: String,
///     vip: bool,
/// }
///
/// let fields = Arc::new(
///     Accessors::new()
///         .field("name", |c: &Customer| c.name.clone().into())
///         .field("vip", |c: &Customer| c.vip.into()),
/// );
/// let ada = Value::from(Record::new(Customer { name: "Ada".into(), vip: true }, fields));
/// assert_eq!(ada.get("name"), Some(Value::from("Ada")));
/// assert_eq!(ada.get("Name"), None);
/// ```
pub struct Accessors<T> {
    getters: Vec<(&'static str, Getter<T>)>,
}

impl<T> Default for Accessors<T> {
    fn default() -> Self {
        Self {
            getters: Vec::new(),
        }
    }
}

impl<T> Accessors<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register field `name`. A later registration of the same name wins.
    pub fn field<F>(mut self, name: &'static str, getter: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.getters.retain(|(n, _)| *n != name);
        self.getters.push((name, Box::new(getter)));
        self
    }

    /// Read field `name` of `target`.
    pub fn get(&self, target: &T, name: &str) -> Option<Value> {
        self.getters
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, getter)| getter(target))
    }

    /// Registered field names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.getters.iter().map(|(n, _)| *n)
    }
}

/// A struct exposed through registered accessors.
pub struct Record<T> {
    target: T,
    accessors: Arc<Accessors<T>>,
}

impl<T> Record<T> {
    #[inline]
    pub fn new(target: T, accessors: Arc<Accessors<T>>) -> Self {
        Self { target, accessors }
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }
}

impl<T: Send + Sync> FieldSource for Record<T> {
    fn field(&self, name: &str) -> Option<Value> {
        self.accessors.get(&self.target, name)
    }

    fn field_names(&self) -> Vec<&str> {
        self.accessors.names().collect()
    }
}

impl<T: Send + Sync + 'static> From<Record<T>> for Value {
    fn from(record: Record<T>) -> Self {
        Value::object(record)
    }
}
