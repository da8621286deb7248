pub mod cast;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod frame;
pub mod mapper;
pub mod schema;
pub mod source;
pub mod storage;
pub mod table;
pub mod value;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, DescribeArgs, DescriptorFormat, LoadArgs, SourceArgs},
    mapper::restore_descriptor,
    schema::Descriptor,
    source::{CsvSource, printable_delimiter, resolve_delimiter},
};

pub use error::{Result as StorageResult, StorageError};
pub use frame::Table;
pub use schema::{Field, LogicalType, PrimaryKey};
pub use storage::{Rows, Store};
pub use value::Value;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("frame_store", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Load(args) => handle_load(&args),
        Commands::Describe(args) => handle_describe(&args),
    }
}

/// Loads the descriptor, reads the CSV rows and writes them into a fresh store.
fn load_store(args: &SourceArgs) -> Result<(Store, Descriptor)> {
    let descriptor = Descriptor::load(&args.schema)
        .with_context(|| format!("Loading descriptor from {:?}", args.schema))?;
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(resolve_delimiter(&args.input, args.delimiter))
    );
    let rows = CsvSource::open(&args.input, args.delimiter, &descriptor)
        .and_then(|mut source| source.read_rows())
        .with_context(|| format!("Reading rows from {:?}", args.input))?;
    debug!("Read {} row(s) from {:?}", rows.len(), args.input);

    let mut store = Store::new();
    store
        .create(&args.bucket, descriptor.clone(), false)
        .with_context(|| format!("Creating bucket '{}'", args.bucket))?;
    store
        .write(&args.bucket, &rows)
        .with_context(|| format!("Writing rows from {:?}", args.input))?;
    Ok((store, descriptor))
}

fn handle_load(args: &LoadArgs) -> Result<()> {
    let (store, descriptor) = load_store(&args.source)?;
    let bucket = args.source.bucket.as_str();
    let stored = store
        .table(bucket)
        .with_context(|| format!("Bucket '{bucket}' vanished after loading"))?;

    if args.info {
        print!("{}", table::render_column_info(&stored.column_info()));
        return Ok(());
    }

    let rows = store
        .read(bucket)?
        .take(args.rows)
        .collect::<StorageResult<Vec<_>>>()
        .with_context(|| format!("Restoring rows of bucket '{bucket}'"))?;
    table::print_rows(&descriptor.headers(), &rows);
    info!(
        "Loaded {} row(s) into bucket '{bucket}', showing {}",
        stored.row_count(),
        rows.len()
    );
    Ok(())
}

fn handle_describe(args: &DescribeArgs) -> Result<()> {
    let (store, _) = load_store(&args.source)?;
    let bucket = args.source.bucket.as_str();
    let stored = store
        .table(bucket)
        .with_context(|| format!("Bucket '{bucket}' vanished after loading"))?;
    let inferred = restore_descriptor(stored);

    let rendered = match args.format {
        DescriptorFormat::Json => inferred.to_json_string()?,
        DescriptorFormat::Yaml => inferred.to_yaml_string()?,
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered.as_bytes())
                .with_context(|| format!("Writing descriptor to {path:?}"))?;
            info!(
                "Descriptor with {} field(s) written to {path:?}",
                inferred.fields.len()
            );
        }
        None => println!("{}", rendered.trim_end()),
    }
    Ok(())
}
