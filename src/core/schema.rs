use crate::core::{BoxError, CsvError, Result};
use chrono::format::{Item, StrftimeItems};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Field metadata key holding a per-field date format.
pub const DATE_FORMAT: &str = "dateformat";

/// Field metadata key enabling whitespace-only string values.
pub const ACCEPT_WHITESPACES: &str = "accept_whitespaces";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    /// A user type built from the raw string through its `FromStr` impl.
    #[serde(skip)]
    Custom(Constructor),
    /// Nullable wrapper. Only a single inner type is supported.
    Optional(Box<DataType>),
}

impl DataType {
    pub fn optional(inner: DataType) -> Self {
        DataType::Optional(Box::new(inner))
    }

    pub fn custom<T>() -> Self
    where
        T: FromStr + fmt::Display + Serialize + DeserializeOwned,
        T::Err: Into<BoxError>,
    {
        DataType::Custom(Constructor::of::<T>())
    }

    /// The type a raw value is coerced into once `Optional` wrappers are peeled off.
    pub fn effective(&self) -> &DataType {
        match self {
            DataType::Optional(inner) => inner.effective(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, DataType::Optional(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self.effective(), DataType::Date | DataType::DateTime)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => f.write_str("string"),
            DataType::Integer => f.write_str("integer"),
            DataType::Float => f.write_str("float"),
            DataType::Boolean => f.write_str("boolean"),
            DataType::Date => f.write_str("date"),
            DataType::DateTime => f.write_str("datetime"),
            DataType::Custom(constructor) => f.write_str(constructor.type_name()),
            DataType::Optional(inner) => write!(f, "optional<{}>", inner),
        }
    }
}

pub type ParseFn = fn(&str) -> std::result::Result<Value, BoxError>;
pub type FormatFn = fn(&Value) -> std::result::Result<String, BoxError>;

/// Statically resolved string conversions of a user-defined field type:
/// "from string" for decoding and "to string" for encoding.
#[derive(Clone, Copy)]
pub struct Constructor {
    type_path: &'static str,
    parse: ParseFn,
    format: FormatFn,
}

impl Constructor {
    /// `type_path` identifies the type; its last path segment is used in messages.
    pub fn new(type_path: &'static str, parse: ParseFn, format: FormatFn) -> Self {
        Self {
            type_path,
            parse,
            format,
        }
    }

    /// Builds a constructor from the type's `FromStr` and `Display` impls. The
    /// parsed value is stored in its serde representation.
    pub fn of<T>() -> Self
    where
        T: FromStr + fmt::Display + Serialize + DeserializeOwned,
        T::Err: Into<BoxError>,
    {
        Self {
            type_path: std::any::type_name::<T>(),
            parse: parse_with_from_str::<T>,
            format: format_with_display::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        let path = self.type_path.split('<').next().unwrap_or(self.type_path);
        path.rsplit("::").next().unwrap_or(path)
    }

    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    pub fn construct(&self, raw: &str) -> std::result::Result<Value, BoxError> {
        (self.parse)(raw)
    }

    /// Renders a stored value back into the string `construct` accepts.
    pub fn render(&self, value: &Value) -> std::result::Result<String, BoxError> {
        (self.format)(value)
    }
}

fn parse_with_from_str<T>(raw: &str) -> std::result::Result<Value, BoxError>
where
    T: FromStr + Serialize,
    T::Err: Into<BoxError>,
{
    let parsed = raw.parse::<T>().map_err(Into::<BoxError>::into)?;
    Ok(serde_json::to_value(parsed)?)
}

fn format_with_display<T>(value: &Value) -> std::result::Result<String, BoxError>
where
    T: fmt::Display + DeserializeOwned,
{
    let typed: T = serde_json::from_value(value.clone())?;
    Ok(typed.to_string())
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("type_path", &self.type_path)
            .finish()
    }
}

impl PartialEq for Constructor {
    fn eq(&self, other: &Self) -> bool {
        self.type_path == other.type_path
    }
}

/// Value used when an optional field is absent or empty.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(fn() -> Value),
}

impl DefaultValue {
    pub fn value(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DefaultValue::Value(Value::Null))
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(DefaultValue::Value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub optional: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    /// Whether the value is read from the row. Fields with `init == false`
    /// keep their default.
    #[serde(default = "default_init")]
    pub init: bool,
}

// An explicit `null` is a null default, not an absent one.
fn deserialize_default<'de, D>(deserializer: D) -> std::result::Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    DefaultValue::deserialize(deserializer).map(Some)
}

fn default_init() -> bool {
    true
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            optional: false,
            default: None,
            metadata: HashMap::new(),
            init: true,
        }
    }

    /// Marks the field optional with a literal default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn with_default_factory(mut self, factory: fn() -> Value) -> Self {
        self.optional = true;
        self.default = Some(DefaultValue::Factory(factory));
        self
    }

    /// Marks the field optional without supplying a default. Resolution fails
    /// if the default is ever needed.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_date_format(self, format: impl Into<String>) -> Self {
        self.with_metadata(DATE_FORMAT, format.into())
    }

    pub fn accept_whitespaces(self) -> Self {
        self.with_metadata(ACCEPT_WHITESPACES, true)
    }

    pub fn skip_init(mut self) -> Self {
        self.init = false;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }
}

/// Schema-wide annotations. Per-field metadata overrides them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchemaOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_whitespaces: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub options: SchemaOptions,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            options: SchemaOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.options.date_format = Some(format.into());
        self
    }

    pub fn accept_whitespaces(mut self) -> Self {
        self.options.accept_whitespaces = Some(true);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Checks the schema can drive a reader or writer.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CsvError::Schema("schema name must not be empty".to_string()));
        }
        if self.fields.is_empty() {
            return Err(CsvError::Schema(format!(
                "schema '{}' does not declare any field",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(CsvError::Schema(format!(
                    "schema '{}' has a field with an empty name",
                    self.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CsvError::Schema(format!(
                    "field '{}' is declared more than once in schema '{}'",
                    field.name, self.name
                )));
            }
            if let Some(format) = field.metadata.get(DATE_FORMAT) {
                match format.as_str() {
                    Some(format) => check_date_format(format)?,
                    None => {
                        return Err(CsvError::Schema(format!(
                            "the {} of field '{}' must be a string",
                            DATE_FORMAT, field.name
                        )));
                    }
                }
            }
        }

        if let Some(format) = &self.options.date_format {
            check_date_format(format)?;
        }
        Ok(())
    }
}

fn check_date_format(format: &str) -> Result<()> {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(CsvError::Schema(format!(
            "invalid value for the date format: '{}'",
            format
        )));
    }
    Ok(())
}
