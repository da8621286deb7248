use crate::{
    catalog::storage_to_logical,
    frame::Table,
    schema::{Constraints, Descriptor, Field, PrimaryKey},
};

/// Infers a descriptor from the storage types of `table`.
///
/// Named index levels come first, as required fields forming the primary
/// key; the columns follow in table order. A column is required exactly
/// when it holds no missing value. Boxed columns are typed from their first
/// non-missing value.
pub fn restore_descriptor(table: &Table) -> Descriptor {
    let mut fields = Vec::with_capacity(table.column_count() + 1);
    let mut primary_key = None;

    if let Some(index) = table.index().filter(|index| index.is_named()) {
        for level in index.levels() {
            let field_type = storage_to_logical(level.storage(), level.first_valid());
            fields.push(
                Field::new(level.name(), field_type).with_constraints(Constraints::required()),
            );
        }
        let mut names: Vec<String> = index.names().into_iter().map(String::from).collect();
        primary_key = Some(if names.len() == 1 {
            PrimaryKey::Single(names.remove(0))
        } else {
            PrimaryKey::Composite(names)
        });
    }

    for column in table.columns() {
        let field_type = storage_to_logical(column.storage(), column.first_valid());
        let mut field = Field::new(column.name(), field_type);
        if column.null_count() == 0 {
            field = field.with_constraints(Constraints::required());
        }
        fields.push(field);
    }

    let descriptor = Descriptor::new(fields);
    match primary_key {
        Some(primary_key) => descriptor.with_primary_key(primary_key),
        None => descriptor,
    }
}
