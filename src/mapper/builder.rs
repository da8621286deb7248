use log::debug;

use crate::{
    catalog::logical_to_storage,
    error::Result,
    frame::{Column, Index, Table},
    mapper::caster::{RowLayout, Widening, cast_row},
    schema::{Descriptor, LogicalType},
    value::Value,
};

/// Casts every row of `rows` and assembles the resulting table.
///
/// The source is drained before any column is materialised: a single
/// missing value late in the stream changes the storage type of the whole
/// column, including rows already seen.
pub fn build_table<I, R>(descriptor: &Descriptor, rows: I) -> Result<Table>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[Value]>,
{
    let layout = RowLayout::new(descriptor)?;
    let mut widening = Widening::for_layout(&layout);
    let value_count = layout.value_fields().count();
    let key_count = layout.key_fields().count();
    let mut column_values: Vec<Vec<Value>> = vec![Vec::new(); value_count];
    let mut key_values: Vec<Vec<Value>> = vec![Vec::new(); key_count];

    for row in rows {
        let cast = cast_row(row.as_ref(), &layout, &mut widening)?;
        for (target, value) in column_values.iter_mut().zip(cast.values) {
            target.push(value);
        }
        for (target, value) in key_values.iter_mut().zip(cast.key) {
            target.push(value);
        }
    }

    let mut columns = Vec::with_capacity(value_count);
    let mut column_values = column_values.into_iter();
    for (position, field) in layout.fields().iter().enumerate() {
        if layout.is_key(position) {
            continue;
        }
        let values = column_values.next().unwrap_or_default();
        let storage = widening.storage_for(position, field);
        if widening.get(position).is_some() {
            debug!(
                "Column '{}' declared {} widened to {storage}",
                field.name, field.field_type
            );
        }
        columns.push(Column::new(field.name.clone(), storage, values)?);
    }

    let index = if layout.has_key() {
        Some(build_index(&layout, key_values)?)
    } else {
        None
    };

    let table = Table::build(columns, index)?;
    debug!(
        "Built table with {} row(s) and {} column(s)",
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

fn build_index(layout: &RowLayout, key_values: Vec<Vec<Value>>) -> Result<Index> {
    let key_fields: Vec<_> = layout.key_fields().collect();
    if let [field] = key_fields.as_slice() {
        let values = key_values.into_iter().next().unwrap_or_default();
        return match field.field_type {
            LogicalType::Date | LogicalType::Datetime => {
                Index::chronological(field.name.clone(), values)
            }
            other => Index::new(field.name.clone(), logical_to_storage(other), values),
        };
    }
    let levels = key_fields
        .iter()
        .zip(key_values)
        .map(|(field, values)| {
            Column::new(field.name.clone(), logical_to_storage(field.field_type), values)
        })
        .collect::<Result<Vec<_>>>()?;
    Index::from_levels(levels)
}
