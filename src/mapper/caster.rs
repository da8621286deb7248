use crate::{
    cast::cast_value,
    catalog::{StorageType, logical_to_storage},
    error::{Result, StorageError},
    frame::Table,
    schema::{Descriptor, Field, LogicalType},
    value::{Value, exact_integer},
};

/// Field lookups for one descriptor, resolved once per build or read.
#[derive(Debug, Clone)]
pub struct RowLayout {
    fields: Vec<Field>,
    missing_values: Vec<String>,
    /// Field positions of the key components, in primary key order.
    key_positions: Vec<usize>,
    /// Field positions of the non-key columns, in field order.
    value_positions: Vec<usize>,
}

impl RowLayout {
    /// Key fields are always cast as required.
    pub fn new(descriptor: &Descriptor) -> Result<Self> {
        let mut fields = descriptor.fields.clone();
        let mut key_positions = Vec::new();
        for name in descriptor.primary_key_names() {
            let position = descriptor.field_position(name).ok_or_else(|| {
                StorageError::invalid(format!("Primary key references unknown field \"{name}\""))
            })?;
            fields[position].constraints.required = Some(true);
            key_positions.push(position);
        }
        let value_positions = (0..fields.len())
            .filter(|position| !key_positions.contains(position))
            .collect();
        Ok(RowLayout {
            fields,
            missing_values: descriptor.missing_values.clone(),
            key_positions,
            value_positions,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &Field> {
        self.key_positions.iter().map(|&position| &self.fields[position])
    }

    pub fn value_fields(&self) -> impl Iterator<Item = &Field> {
        self.value_positions.iter().map(|&position| &self.fields[position])
    }

    pub fn has_key(&self) -> bool {
        !self.key_positions.is_empty()
    }

    pub fn is_key(&self, position: usize) -> bool {
        self.key_positions.contains(&position)
    }
}

/// Storage overrides collected while casting, one slot per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Widening {
    overrides: Vec<Option<StorageType>>,
}

impl Widening {
    pub fn for_layout(layout: &RowLayout) -> Self {
        Widening {
            overrides: vec![None; layout.fields.len()],
        }
    }

    fn record(&mut self, position: usize, storage: StorageType) {
        if let Some(slot) = self.overrides.get_mut(position) {
            *slot = Some(storage);
        }
    }

    pub fn get(&self, position: usize) -> Option<StorageType> {
        self.overrides.get(position).copied().flatten()
    }

    /// The override if one was recorded, otherwise the declared type's storage.
    pub fn storage_for(&self, position: usize, field: &Field) -> StorageType {
        self.get(position)
            .unwrap_or_else(|| logical_to_storage(field.field_type))
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastRow {
    /// Key components in primary key order; empty without a primary key.
    pub key: Vec<Value>,
    /// Non-key values in field order.
    pub values: Vec<Value>,
}

fn normalize_missing(value: &Value) -> Value {
    match value {
        Value::Float(f) if f.is_nan() => Value::Null,
        Value::Text(text) if text == "nan" => Value::Null,
        other => other.clone(),
    }
}

fn is_structured(field: &Field) -> bool {
    matches!(field.field_type, LogicalType::Array | LogicalType::Object)
}

fn cast_field(field: &Field, value: &Value, missing_values: &[String]) -> Result<Value> {
    match cast_value(field, value, missing_values) {
        Err(err) if err.is_cast() && is_structured(field) => {
            // Structured values may arrive serialized as JSON text.
            let Some(text) = value.as_str() else {
                return Err(err);
            };
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(parsed) => cast_value(field, &Value::from_json(&parsed), missing_values),
                Err(_) => Err(err),
            }
        }
        other => other,
    }
}

/// Casts one raw row, positionally aligned with the descriptor's fields.
///
/// Missing values in columns whose storage cannot hold them are recorded in
/// `widening`; numeric ones are replaced by NaN.
pub fn cast_row(row: &[Value], layout: &RowLayout, widening: &mut Widening) -> Result<CastRow> {
    if row.len() != layout.fields.len() {
        return Err(StorageError::cast(
            "<row>",
            format!(
                "row has {} value(s) but the descriptor declares {} field(s)",
                row.len(),
                layout.fields.len()
            ),
        ));
    }

    let mut key = vec![Value::Null; layout.key_positions.len()];
    let mut values = Vec::with_capacity(layout.value_positions.len());
    for (position, (field, raw)) in layout.fields.iter().zip(row).enumerate() {
        let mut value = normalize_missing(raw);
        if field.field_type == LogicalType::Integer
            && let Value::Float(f) = value
            && let Some(integer) = exact_integer(f)
        {
            value = Value::Int(integer);
        }
        let mut value = cast_field(field, &value, &layout.missing_values)?;

        if value.is_null() {
            let storage = widening.storage_for(position, field);
            if !storage.is_nullable() {
                widening.record(position, storage.nullable());
            }
            if matches!(
                widening.storage_for(position, field),
                StorageType::Float64
            ) {
                value = Value::Float(f64::NAN);
            }
        }

        if let Some(slot) = layout.key_positions.iter().position(|&key| key == position) {
            key[slot] = value;
        } else {
            values.push(value);
        }
    }
    Ok(CastRow { key, values })
}

/// Undoes storage artifacts on one stored value and casts it again for `field`.
pub fn restore_value(field: &Field, stored: &Value, missing_values: &[String]) -> Result<Value> {
    let value = match stored {
        value if value.is_missing() => Value::Null,
        Value::Float(f) if matches!(field.field_type, LogicalType::Integer | LogicalType::Year) => {
            exact_integer(*f).map_or_else(|| stored.clone(), Value::Int)
        }
        other => other.clone(),
    };
    cast_value(field, &value, missing_values)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Index(usize),
    Column(usize),
}

/// Where each descriptor field lives in a particular table.
#[derive(Debug, Clone)]
pub struct RestorePlan {
    layout: RowLayout,
    sources: Vec<Option<Source>>,
}

impl RestorePlan {
    /// Key fields are read from the index level of the same name, everything
    /// else from the column of the same name.
    pub fn new(descriptor: &Descriptor, table: &Table) -> Result<Self> {
        let layout = RowLayout::new(descriptor)?;
        let sources: Vec<Option<Source>> = layout
            .fields
            .iter()
            .enumerate()
            .map(|(position, field)| {
                let level = table.index().and_then(|index| index.level(&field.name));
                match level {
                    Some(level) if layout.is_key(position) || table.column(&field.name).is_none() => {
                        Some(Source::Index(level))
                    }
                    _ => table
                        .column_position(&field.name)
                        .map(Source::Column)
                        .or(level.map(Source::Index)),
                }
            })
            .collect();
        if !table.is_empty()
            && let Some(missing) = sources
                .iter()
                .position(Option::is_none)
                .map(|position| &layout.fields[position].name)
        {
            return Err(StorageError::Shape(format!(
                "table has no column or index level named '{missing}'"
            )));
        }
        Ok(RestorePlan { layout, sources })
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Rebuilds row `row` of `table` in descriptor field order.
    pub fn restore_row(&self, table: &Table, row: usize) -> Result<Vec<Value>> {
        self.layout
            .fields
            .iter()
            .zip(&self.sources)
            .map(|(field, source)| {
                let stored = match source {
                    Some(Source::Index(level)) => table
                        .index()
                        .and_then(|index| index.levels().get(*level))
                        .and_then(|level| level.get(row)),
                    Some(Source::Column(position)) => table
                        .columns()
                        .get(*position)
                        .and_then(|column| column.get(row)),
                    None => None,
                };
                let stored = stored.ok_or_else(|| {
                    StorageError::Shape(format!("row {row} has no value for '{}'", field.name))
                })?;
                restore_value(field, stored, &self.layout.missing_values)
            })
            .collect()
    }
}
