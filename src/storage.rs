//! Named collection of tables ("buckets") with cached descriptors.
//!
//! Each bucket moves through `absent -> created -> written* -> deleted`.
//! `create` stores an empty placeholder table together with the descriptor;
//! the first `write` replaces the placeholder, later writes append. Reads
//! and writes use the cached descriptor when there is one, otherwise the
//! descriptor inferred from the table.
//!
//! A store is single-writer: callers sharing one across threads must
//! serialise access themselves.

use std::{borrow::Cow, collections::BTreeMap, fmt};

use log::{debug, info};

use crate::{
    error::{Result, StorageError},
    frame::Table,
    mapper::{RestorePlan, build_table, restore_descriptor},
    schema::Descriptor,
    value::Value,
};

#[derive(Debug, Clone, Default)]
pub struct Store {
    /// Tables in creation order.
    tables: Vec<(String, Table)>,
    descriptors: BTreeMap<String, Descriptor>,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store({})", self.buckets().join(", "))
    }
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Seeds a store with existing tables; they start without cached descriptors.
    pub fn with_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = (S, Table)>,
        S: Into<String>,
    {
        let mut store = Store::new();
        for (name, table) in tables {
            let name = name.into();
            store.tables.retain(|(existing, _)| *existing != name);
            store.tables.push((name, table));
        }
        store
    }

    pub fn buckets(&self) -> Vec<&str> {
        self.tables.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.position(bucket).is_some()
    }

    pub fn table(&self, bucket: &str) -> Option<&Table> {
        self.position(bucket).map(|position| &self.tables[position].1)
    }

    fn position(&self, bucket: &str) -> Option<usize> {
        self.tables.iter().position(|(name, _)| name == bucket)
    }

    pub fn create(&mut self, bucket: &str, descriptor: Descriptor, force: bool) -> Result<()> {
        self.create_many([(bucket, descriptor)], force)
    }

    /// Creates several buckets. Existence is checked for every bucket before
    /// any is created; with `force` the existing ones are deleted first.
    /// Each descriptor is validated right before its bucket is created, so
    /// an invalid descriptor leaves earlier buckets of the same call created.
    pub fn create_many<I, S>(&mut self, entries: I, force: bool) -> Result<()>
    where
        I: IntoIterator<Item = (S, Descriptor)>,
        S: Into<String>,
    {
        let entries: Vec<(String, Descriptor)> = entries
            .into_iter()
            .map(|(name, descriptor)| (name.into(), descriptor))
            .collect();

        for (bucket, _) in &entries {
            if self.contains(bucket) {
                if !force {
                    return Err(StorageError::AlreadyExists(bucket.clone()));
                }
                self.delete(bucket, false)?;
            }
        }

        for (bucket, descriptor) in entries {
            descriptor.validate()?;
            if self.contains(&bucket) {
                return Err(StorageError::AlreadyExists(bucket));
            }
            info!(
                "Created bucket '{bucket}' with {} field(s)",
                descriptor.fields.len()
            );
            self.descriptors.insert(bucket.clone(), descriptor);
            self.tables.push((bucket, Table::empty()));
        }
        Ok(())
    }

    pub fn delete(&mut self, bucket: &str, ignore: bool) -> Result<()> {
        self.delete_many(&[bucket], ignore)
    }

    /// Deletes the named buckets in the given order.
    pub fn delete_many<S: AsRef<str>>(&mut self, buckets: &[S], ignore: bool) -> Result<()> {
        for bucket in buckets {
            let bucket = bucket.as_ref();
            let Some(position) = self.position(bucket) else {
                if ignore {
                    continue;
                }
                return Err(StorageError::NotFound(bucket.to_string()));
            };
            self.tables.remove(position);
            self.descriptors.remove(bucket);
            info!("Deleted bucket '{bucket}'");
        }
        Ok(())
    }

    /// Deletes every bucket, most recently created first.
    pub fn delete_all(&mut self) {
        while let Some((bucket, _)) = self.tables.pop() {
            self.descriptors.remove(&bucket);
            info!("Deleted bucket '{bucket}'");
        }
    }

    /// Replaces the cached descriptor without touching the table or validating it.
    pub fn set_descriptor(&mut self, bucket: &str, descriptor: Descriptor) {
        debug!("Caching descriptor for bucket '{bucket}'");
        self.descriptors.insert(bucket.to_string(), descriptor);
    }

    /// The cached descriptor, or one inferred from the table. Inferred
    /// descriptors are not cached.
    pub fn describe(&self, bucket: &str) -> Result<Descriptor> {
        self.effective_descriptor(bucket).map(Cow::into_owned)
    }

    fn effective_descriptor(&self, bucket: &str) -> Result<Cow<'_, Descriptor>> {
        if let Some(descriptor) = self.descriptors.get(bucket) {
            return Ok(Cow::Borrowed(descriptor));
        }
        let table = self
            .table(bucket)
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;
        Ok(Cow::Owned(restore_descriptor(table)))
    }

    /// Lazily restores the rows of `bucket` in table order. Calling `read`
    /// again starts over from the first row.
    pub fn read(&self, bucket: &str) -> Result<Rows<'_>> {
        let table = self
            .table(bucket)
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;
        let descriptor = self.effective_descriptor(bucket)?;
        let plan = RestorePlan::new(&descriptor, table)?;
        Ok(Rows {
            table,
            plan,
            position: 0,
        })
    }

    pub fn read_all(&self, bucket: &str) -> Result<Vec<Vec<Value>>> {
        self.read(bucket)?.collect()
    }

    /// Casts `rows` with the bucket's descriptor and appends them.
    ///
    /// The new rows are built into a complete table before the stored one is
    /// touched, so a failed cast leaves the bucket unchanged. Returns the
    /// number of rows written.
    pub fn write<I, R>(&mut self, bucket: &str, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[Value]>,
    {
        let position = self
            .position(bucket)
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;
        let descriptor = self.effective_descriptor(bucket)?;
        let incoming = build_table(&descriptor, rows)?;
        let written = incoming.row_count();

        let current = &self.tables[position].1;
        let next = if current.is_empty() {
            incoming
        } else {
            current.concat(&incoming)?
        };
        debug!(
            "Bucket '{bucket}' now holds {} row(s) in {} column(s)",
            next.row_count(),
            next.column_count()
        );
        self.tables[position].1 = next;
        info!("Wrote {written} row(s) to bucket '{bucket}'");
        Ok(written)
    }
}

/// Restored rows of one bucket, produced on demand.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    table: &'a Table,
    plan: RestorePlan,
    position: usize,
}

impl Iterator for Rows<'_> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.table.row_count() {
            return None;
        }
        let row = self.plan.restore_row(self.table, self.position);
        self.position += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.row_count().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows<'_> {}
