//! Table Schema descriptor model, validation, and JSON/YAML persistence.
//!
//! A [`Descriptor`] is an ordered list of [`Field`]s plus an optional
//! [`PrimaryKey`]. Descriptors are plain data: building one never checks
//! it, [`Descriptor::validate`] does. Loading from a file validates.
//!
//! The wire shape follows Table Schema (`fields`, `primaryKey`,
//! `missingValues`, camel-cased field options) so descriptors written by
//! other tools load unchanged.

use std::{collections::HashSet, fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use anyhow::{Context, Result as AnyResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Date,
    Time,
    Datetime,
    Year,
    Yearmonth,
    Duration,
    Geopoint,
    Geojson,
    Any,
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::String => "string",
            LogicalType::Number => "number",
            LogicalType::Integer => "integer",
            LogicalType::Boolean => "boolean",
            LogicalType::Array => "array",
            LogicalType::Object => "object",
            LogicalType::Date => "date",
            LogicalType::Time => "time",
            LogicalType::Datetime => "datetime",
            LogicalType::Year => "year",
            LogicalType::Yearmonth => "yearmonth",
            LogicalType::Duration => "duration",
            LogicalType::Geopoint => "geopoint",
            LogicalType::Geojson => "geojson",
            LogicalType::Any => "any",
        }
    }

    pub fn variants() -> &'static [LogicalType] {
        &[
            LogicalType::String,
            LogicalType::Number,
            LogicalType::Integer,
            LogicalType::Boolean,
            LogicalType::Array,
            LogicalType::Object,
            LogicalType::Date,
            LogicalType::Time,
            LogicalType::Datetime,
            LogicalType::Year,
            LogicalType::Yearmonth,
            LogicalType::Duration,
            LogicalType::Geopoint,
            LogicalType::Geojson,
            LogicalType::Any,
        ]
    }

    fn supported_formats(&self) -> Option<&'static [&'static str]> {
        match self {
            LogicalType::String => Some(&["default", "email", "uri", "binary", "uuid"]),
            LogicalType::Geopoint => Some(&["default", "array", "object"]),
            LogicalType::Geojson => Some(&["default", "topojson"]),
            // Date and time formats accept arbitrary strftime patterns.
            LogicalType::Date | LogicalType::Time | LogicalType::Datetime => None,
            _ => Some(&["default"]),
        }
    }

    fn is_ordered(&self) -> bool {
        matches!(
            self,
            LogicalType::Number
                | LogicalType::Integer
                | LogicalType::Year
                | LogicalType::Date
                | LogicalType::Time
                | LogicalType::Datetime
        )
    }

    fn has_length(&self) -> bool {
        matches!(
            self,
            LogicalType::String | LogicalType::Array | LogicalType::Object
        )
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogicalType {
    type Err = StorageError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = value.trim();
        LogicalType::variants()
            .iter()
            .copied()
            .find(|ty| ty.as_str() == normalized)
            .ok_or_else(|| StorageError::UnsupportedType(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    pub fn required() -> Self {
        Constraints {
            required: Some(true),
            ..Constraints::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: LogicalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_char: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_char: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bare_number: Option<bool>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: LogicalType) -> Self {
        Field {
            name: name.into(),
            field_type,
            format: None,
            constraints: Constraints::default(),
            title: None,
            description: None,
            true_values: None,
            false_values: None,
            decimal_char: None,
            group_char: None,
            bare_number: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn required(mut self) -> Self {
        self.constraints.required = Some(true);
        self
    }

    pub fn is_required(&self) -> bool {
        self.constraints.required.unwrap_or(false)
    }

    /// The declared format, with `None` and the legacy `fmt:` prefix normalised away.
    pub fn format_name(&self) -> &str {
        match self.format.as_deref() {
            None | Some("") => "default",
            Some(format) => format.strip_prefix("fmt:").unwrap_or(format),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StorageError::invalid("Field name cannot be empty"));
        }
        if let Some(supported) = self.field_type.supported_formats() {
            let format = self.format_name();
            if !supported.contains(&format) {
                return Err(StorageError::invalid(format!(
                    "Field \"{}\" of type {} does not support format \"{format}\"",
                    self.name, self.field_type
                )));
            }
        }
        let constraints = &self.constraints;
        if (constraints.minimum.is_some() || constraints.maximum.is_some())
            && !self.field_type.is_ordered()
        {
            return Err(StorageError::invalid(format!(
                "Field \"{}\" of type {} cannot declare minimum/maximum",
                self.name, self.field_type
            )));
        }
        if (constraints.min_length.is_some() || constraints.max_length.is_some())
            && !self.field_type.has_length()
        {
            return Err(StorageError::invalid(format!(
                "Field \"{}\" of type {} cannot declare minLength/maxLength",
                self.name, self.field_type
            )));
        }
        if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length)
            && min > max
        {
            return Err(StorageError::invalid(format!(
                "Field \"{}\" has minLength {min} greater than maxLength {max}",
                self.name
            )));
        }
        if let Some(pattern) = &constraints.pattern {
            if self.field_type != LogicalType::String {
                return Err(StorageError::invalid(format!(
                    "Field \"{}\" of type {} cannot declare a pattern",
                    self.name, self.field_type
                )));
            }
            Regex::new(pattern).map_err(|err| {
                StorageError::invalid(format!(
                    "Field \"{}\" has invalid pattern: {err}",
                    self.name
                ))
            })?;
        }
        if constraints
            .enum_values
            .as_ref()
            .is_some_and(|values| values.is_empty())
        {
            return Err(StorageError::invalid(format!(
                "Field \"{}\" declares an empty enum",
                self.name
            )));
        }
        for (label, values) in [("trueValues", &self.true_values), ("falseValues", &self.false_values)] {
            if values.as_ref().is_some_and(|values| values.is_empty()) {
                return Err(StorageError::invalid(format!(
                    "Field \"{}\" declares empty {label}",
                    self.name
                )));
            }
        }
        for (label, value) in [("decimalChar", &self.decimal_char), ("groupChar", &self.group_char)] {
            if value.as_ref().is_some_and(|value| value.is_empty()) {
                return Err(StorageError::invalid(format!(
                    "Field \"{}\" declares empty {label}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn names(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(name) => vec![name.as_str()],
            PrimaryKey::Composite(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        self.names().len() > 1
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }
}

fn default_missing_values() -> Vec<String> {
    vec![String::new()]
}

fn is_default_missing_values(values: &[String]) -> bool {
    values.len() == 1 && values[0].is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub fields: Vec<Field>,
    #[serde(
        default,
        rename = "primaryKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_key: Option<PrimaryKey>,
    #[serde(
        default = "default_missing_values",
        rename = "missingValues",
        skip_serializing_if = "is_default_missing_values"
    )]
    pub missing_values: Vec<String>,
}

impl Default for Descriptor {
    fn default() -> Self {
        Descriptor::new(Vec::new())
    }
}

impl Descriptor {
    pub fn new(fields: Vec<Field>) -> Self {
        Descriptor {
            fields,
            primary_key: None,
            missing_values: default_missing_values(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    pub fn primary_key_names(&self) -> Vec<&str> {
        self.primary_key
            .as_ref()
            .map(PrimaryKey::names)
            .unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(StorageError::invalid("Descriptor must declare at least one field"));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !seen.insert(field.name.as_str()) {
                return Err(StorageError::invalid(format!(
                    "Duplicate field name \"{}\"",
                    field.name
                )));
            }
        }
        if let Some(primary_key) = &self.primary_key {
            let names = primary_key.names();
            if names.is_empty() {
                return Err(StorageError::invalid("Primary key cannot be empty"));
            }
            let mut key_seen = HashSet::new();
            for name in names {
                if !seen.contains(name) {
                    return Err(StorageError::invalid(format!(
                        "Primary key references unknown field \"{name}\""
                    )));
                }
                if !key_seen.insert(name) {
                    return Err(StorageError::invalid(format!(
                        "Primary key lists field \"{name}\" more than once"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn from_json_value(value: &serde_json::Value) -> Result<Self> {
        let descriptor: Descriptor = serde_json::from_value(value.clone())
            .map_err(|err| StorageError::invalid(err.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let descriptor: Descriptor =
            serde_json::from_str(source).map_err(|err| StorageError::invalid(err.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let descriptor: Descriptor =
            serde_yaml::from_str(source).map_err(|err| StorageError::invalid(err.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn to_json_string(&self) -> AnyResult<String> {
        serde_json::to_string_pretty(self).context("Serializing descriptor to JSON")
    }

    pub fn to_yaml_string(&self) -> AnyResult<String> {
        serde_yaml::to_string(self).context("Serializing descriptor to YAML")
    }

    /// Loads a descriptor from `.json`, `.yaml` or `.yml`; other extensions are read as JSON.
    pub fn load(path: &Path) -> AnyResult<Self> {
        let file = File::open(path).with_context(|| format!("Opening descriptor {path:?}"))?;
        let reader = BufReader::new(file);
        let descriptor: Descriptor = if is_yaml_path(path) {
            serde_yaml::from_reader(reader).context("Parsing descriptor YAML")?
        } else {
            serde_json::from_reader(reader).context("Parsing descriptor JSON")?
        };
        descriptor
            .validate()
            .with_context(|| format!("Validating descriptor {path:?}"))?;
        Ok(descriptor)
    }

    pub fn save(&self, path: &Path) -> AnyResult<()> {
        let file = File::create(path).with_context(|| format!("Creating descriptor {path:?}"))?;
        if is_yaml_path(path) {
            serde_yaml::to_writer(file, self).context("Writing descriptor YAML")
        } else {
            serde_json::to_writer_pretty(file, self).context("Writing descriptor JSON")
        }
    }
}

fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}
