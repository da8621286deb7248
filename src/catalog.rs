//! Type catalog: logical field types to column storage types and back.
//!
//! The forward direction is a fixed table. The reverse direction is lossy:
//! storage alone cannot distinguish `date` from `string` in an empty boxed
//! column, `year` from `integer`, or `yearmonth` from `array`, and formats are
//! never recoverable. Generic columns are narrowed by looking at a sample
//! value.

use std::{fmt, str::FromStr};

use crate::{
    error::{Result, StorageError},
    schema::LogicalType,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// Boxed values of any shape.
    Object,
    Float64,
    Int64,
    Bool,
    Timestamp,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Object => "object",
            StorageType::Float64 => "float64",
            StorageType::Int64 => "int64",
            StorageType::Bool => "bool",
            StorageType::Timestamp => "datetime64[ns]",
        }
    }

    /// Whether a column of this type can represent a missing value.
    pub fn is_nullable(&self) -> bool {
        !matches!(self, StorageType::Int64 | StorageType::Bool)
    }

    /// The nearest type able to hold nulls: integers widen to floats, booleans to boxed values.
    pub fn nullable(self) -> StorageType {
        match self {
            StorageType::Int64 => StorageType::Float64,
            StorageType::Bool => StorageType::Object,
            other => other,
        }
    }

    /// The narrowest type able to hold values of both `self` and `other`.
    pub fn unify(self, other: StorageType) -> StorageType {
        match (self, other) {
            (a, b) if a == b => a,
            (StorageType::Int64, StorageType::Float64) | (StorageType::Float64, StorageType::Int64) => {
                StorageType::Float64
            }
            _ => StorageType::Object,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "object" | "o" => Ok(StorageType::Object),
            "float64" | "float" => Ok(StorageType::Float64),
            "int64" | "int" => Ok(StorageType::Int64),
            "bool" => Ok(StorageType::Bool),
            "datetime64[ns]" | "datetime64" => Ok(StorageType::Timestamp),
            _ => Err(StorageError::UnsupportedType(value.to_string())),
        }
    }
}

pub fn logical_to_storage(logical: LogicalType) -> StorageType {
    match logical {
        LogicalType::Number => StorageType::Float64,
        LogicalType::Integer | LogicalType::Year => StorageType::Int64,
        LogicalType::Boolean => StorageType::Bool,
        LogicalType::Datetime => StorageType::Timestamp,
        LogicalType::String
        | LogicalType::Array
        | LogicalType::Object
        | LogicalType::Date
        | LogicalType::Time
        | LogicalType::Yearmonth
        | LogicalType::Duration
        | LogicalType::Geopoint
        | LogicalType::Geojson
        | LogicalType::Any => StorageType::Object,
    }
}

/// Name-based lookup; fails with `UnsupportedType` outside the catalog.
pub fn storage_for_type_name(name: &str) -> Result<StorageType> {
    name.parse::<LogicalType>().map(logical_to_storage)
}

pub fn storage_to_logical(storage: StorageType, sample: Option<&Value>) -> LogicalType {
    match storage {
        StorageType::Bool => return LogicalType::Boolean,
        StorageType::Int64 => return LogicalType::Integer,
        StorageType::Float64 => return LogicalType::Number,
        StorageType::Timestamp => return LogicalType::Datetime,
        StorageType::Object => {}
    }
    match sample {
        Some(Value::Sequence(_)) => LogicalType::Array,
        Some(Value::Date(_)) => LogicalType::Date,
        Some(Value::Duration(_)) => LogicalType::Duration,
        Some(Value::Mapping(_)) => LogicalType::Object,
        Some(Value::Time(_)) => LogicalType::Time,
        // Boxed scalars appear after widening or concatenation.
        Some(Value::Bool(_)) => LogicalType::Boolean,
        Some(Value::Int(_)) => LogicalType::Integer,
        Some(Value::Float(_)) => LogicalType::Number,
        Some(Value::Timestamp(_)) => LogicalType::Datetime,
        Some(Value::Text(_)) | Some(Value::Null) | None => LogicalType::String,
    }
}
