//! Delimited-text row sources.
//!
//! Rows are read with headers and reordered into descriptor field order, so
//! a file may carry its columns in any order or hold extra columns. Every
//! cell is yielded as text; casting happens in the mapper. The `-` path
//! reads standard input.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::{schema::Descriptor, value::Value};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Tab for `.tsv` files, comma otherwise, unless a delimiter was given.
pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    /// Header position feeding each descriptor field.
    positions: Vec<usize>,
}

impl CsvSource<Box<dyn Read>> {
    pub fn open(path: &Path, delimiter: Option<u8>, descriptor: &Descriptor) -> Result<Self> {
        let input: Box<dyn Read> = if is_dash(path) {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
            Box::new(BufReader::new(file))
        };
        CsvSource::from_reader(input, resolve_delimiter(path, delimiter), descriptor)
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(input: R, delimiter: u8, descriptor: &Descriptor) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .double_quote(true)
            .flexible(false)
            .from_reader(input);
        let headers = reader.headers().context("Reading CSV headers")?.clone();

        let positions = descriptor
            .fields
            .iter()
            .map(|field| {
                headers
                    .iter()
                    .position(|header| header.trim() == field.name)
                    .ok_or_else(|| anyhow!("Column '{}' not found in input headers", field.name))
            })
            .collect::<Result<Vec<_>>>()?;

        let unused = headers.len().saturating_sub(positions.len());
        if unused > 0 {
            debug!("Ignoring {unused} input column(s) not named by the descriptor");
        }
        Ok(CsvSource { reader, positions })
    }

    /// Reads every remaining record, in file order.
    pub fn read_rows(&mut self) -> Result<Vec<Vec<Value>>> {
        let mut rows = Vec::new();
        for (line, record) in self.reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading record {}", line + 1))?;
            let row = self
                .positions
                .iter()
                .map(|&position| Value::Text(record.get(position).unwrap_or_default().to_string()))
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}
