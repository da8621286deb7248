//! Column-oriented in-memory tables.
//!
//! A [`Table`] is an ordered set of equally long, homogeneously typed
//! [`Column`]s plus an optional [`Index`] holding the key of every row.
//! Values are coerced into a column's [`StorageType`] on construction, so a
//! `float64` column only ever holds `Float` (missing values are NaN), an
//! `int64` column only `Int`, and so on.

use chrono::NaiveTime;
use log::debug;

use crate::{
    catalog::StorageType,
    error::{Result, StorageError},
    value::{Value, exact_integer},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    storage: StorageType,
    values: Vec<Value>,
}

fn coerce(storage: StorageType, value: Value, column: &str) -> Result<Value> {
    match (storage, value) {
        (StorageType::Object, value) if value.is_missing() => Ok(Value::Null),
        (StorageType::Object, value) => Ok(value),
        (StorageType::Float64, Value::Float(f)) => Ok(Value::Float(f)),
        (StorageType::Float64, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (StorageType::Float64, Value::Null) => Ok(Value::Float(f64::NAN)),
        (StorageType::Int64, Value::Int(i)) => Ok(Value::Int(i)),
        (StorageType::Int64, Value::Float(f)) => exact_integer(f).map(Value::Int).ok_or_else(|| {
            StorageError::cast(column, format!("int64 column cannot hold float value '{f}'"))
        }),
        (StorageType::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (StorageType::Timestamp, Value::Timestamp(dt)) => Ok(Value::Timestamp(dt)),
        (StorageType::Timestamp, Value::Date(d)) => Ok(Value::Timestamp(d.and_time(NaiveTime::MIN))),
        (StorageType::Timestamp, value) if value.is_missing() => Ok(Value::Null),
        (storage, other) => Err(StorageError::cast(
            column,
            format!(
                "{storage} column cannot hold {} value '{other}'",
                other.type_name()
            ),
        )),
    }
}

impl Column {
    pub fn new(name: impl Into<String>, storage: StorageType, values: Vec<Value>) -> Result<Self> {
        let name = name.into();
        let values = values
            .into_iter()
            .map(|value| coerce(storage, value, &name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Column {
            name,
            storage,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> StorageType {
        self.storage
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_missing()).count()
    }

    pub fn first_valid(&self) -> Option<&Value> {
        self.values.iter().find(|value| !value.is_missing())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Generic,
    /// Single timestamp level built from a date or datetime key.
    Chronological,
    /// One level per key component; each row's key is the tuple across levels.
    Composite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    kind: IndexKind,
    levels: Vec<Column>,
}

impl Index {
    pub fn new(name: impl Into<String>, storage: StorageType, values: Vec<Value>) -> Result<Self> {
        Index::checked(IndexKind::Generic, vec![Column::new(name, storage, values)?])
    }

    pub fn chronological(name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let level = Column::new(name, StorageType::Timestamp, values)?;
        Index::checked(IndexKind::Chronological, vec![level])
    }

    /// Builds a composite index, or a generic one when only one level is given.
    pub fn from_levels(levels: Vec<Column>) -> Result<Self> {
        let kind = if levels.len() > 1 {
            IndexKind::Composite
        } else {
            IndexKind::Generic
        };
        Index::checked(kind, levels)
    }

    fn checked(kind: IndexKind, levels: Vec<Column>) -> Result<Self> {
        let Some(first) = levels.first() else {
            return Err(StorageError::Shape("index requires at least one level".to_string()));
        };
        let len = first.len();
        for level in &levels {
            if level.len() != len {
                return Err(StorageError::Shape(format!(
                    "index level '{}' has {} value(s), expected {len}",
                    level.name(),
                    level.len()
                )));
            }
            if level.null_count() > 0 {
                return Err(StorageError::Shape(format!(
                    "index level '{}' contains missing values",
                    level.name()
                )));
            }
        }
        Ok(Index { kind, levels })
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn levels(&self) -> &[Column] {
        &self.levels
    }

    pub fn level(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.levels.iter().map(Column::name).collect()
    }

    /// An index is named when every level carries a non-empty name.
    pub fn is_named(&self) -> bool {
        self.levels.iter().all(|level| !level.name().is_empty())
    }

    pub fn len(&self) -> usize {
        self.levels.first().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key(&self, row: usize) -> Option<Vec<&Value>> {
        self.levels.iter().map(|level| level.get(row)).collect()
    }

    fn concat(&self, other: &Index) -> Result<Index> {
        if self.names() != other.names() {
            return Err(StorageError::Shape(format!(
                "cannot append index {:?} to index {:?}",
                other.names(),
                self.names()
            )));
        }
        let levels = self
            .levels
            .iter()
            .zip(&other.levels)
            .map(|(head, tail)| {
                let mut values = head.values().to_vec();
                values.extend_from_slice(tail.values());
                Column::new(head.name(), head.storage().unify(tail.storage()), values)
            })
            .collect::<Result<Vec<_>>>()?;
        if self.kind == IndexKind::Chronological
            && other.kind == IndexKind::Chronological
        {
            return Index::checked(IndexKind::Chronological, levels);
        }
        Index::from_levels(levels)
    }
}

/// Per-column summary exposed to schema inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub storage: StorageType,
    pub null_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: Option<Index>,
    rows: usize,
}

impl Table {
    /// The placeholder a freshly created bucket holds: no rows, no columns, no types.
    pub fn empty() -> Self {
        Table::default()
    }

    pub fn build(columns: Vec<Column>, index: Option<Index>) -> Result<Self> {
        let rows = index
            .as_ref()
            .map(Index::len)
            .or_else(|| columns.first().map(Column::len))
            .unwrap_or(0);
        for (position, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(StorageError::Shape(format!(
                    "column '{}' has {} value(s), expected {rows}",
                    column.name(),
                    column.len()
                )));
            }
            if columns[..position]
                .iter()
                .any(|earlier| earlier.name() == column.name())
            {
                return Err(StorageError::Shape(format!(
                    "duplicate column '{}'",
                    column.name()
                )));
            }
        }
        Ok(Table {
            columns,
            index,
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`; index levels are not counted as columns.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    pub fn column_info(&self) -> Vec<ColumnInfo> {
        self.columns
            .iter()
            .map(|column| ColumnInfo {
                name: column.name().to_string(),
                storage: column.storage(),
                null_count: column.null_count(),
            })
            .collect()
    }

    /// Appends `other` below `self`, aligning columns by name.
    ///
    /// Columns present on one side only are filled with nulls on the other,
    /// which widens non-nullable storage. Shared columns of differing storage
    /// are unified. Both tables must have the same index levels, or none.
    pub fn concat(&self, other: &Table) -> Result<Table> {
        let mut names: Vec<&str> = self.columns.iter().map(Column::name).collect();
        for column in &other.columns {
            if !names.contains(&column.name()) {
                names.push(column.name());
            }
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let head = self.column(name);
            let tail = other.column(name);
            let storage = match (head, tail) {
                (Some(head), Some(tail)) => head.storage().unify(tail.storage()),
                (Some(only), None) | (None, Some(only)) => only.storage().nullable(),
                (None, None) => continue,
            };
            let mut values = Vec::with_capacity(self.rows + other.rows);
            values.extend(column_values(head, self.rows));
            values.extend(column_values(tail, other.rows));
            if head.map(Column::storage) != Some(storage) {
                debug!("Column '{name}' stored as {storage} after append");
            }
            columns.push(Column::new(name, storage, values)?);
        }

        let index = match (&self.index, &other.index) {
            (None, None) => None,
            (Some(head), Some(tail)) => Some(head.concat(tail)?),
            _ => {
                return Err(StorageError::Shape(
                    "cannot append a keyed table to an unkeyed table or vice versa".to_string(),
                ));
            }
        };
        Table::build(columns, index)
    }
}

fn column_values(column: Option<&Column>, rows: usize) -> Vec<Value> {
    match column {
        Some(column) => column.values().to_vec(),
        None => vec![Value::Null; rows],
    }
}
