use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Load tabular data through a Table Schema descriptor",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Cast CSV rows through a descriptor and preview the stored table
    Load(LoadArgs),
    /// Load CSV rows and print the descriptor inferred from the stored table
    Describe(DescribeArgs),
}

/// Options shared by every command that loads a CSV file into a bucket.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Table Schema descriptor (.json, .yaml or .yml)
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Input CSV file (`-` reads stdin)
    #[arg(short, long)]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Bucket name the rows are written to
    #[arg(short, long, default_value = "data")]
    pub bucket: String,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Number of rows shown in the preview
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Print storage type and missing count per column instead of rows
    #[arg(long)]
    pub info: bool,
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output format of the descriptor
    #[arg(long, value_enum, default_value = "json")]
    pub format: DescriptorFormat,
    /// Write the descriptor to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DescriptorFormat {
    Json,
    Yaml,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
