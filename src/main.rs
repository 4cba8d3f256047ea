use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::io::{self, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use typedcsv::{Dialect, Reader, ReaderOptions, Schema};

const DEFAULT_LOG_FILTER: &str = "typedcsv=info";

// Decodes a CSV file against a JSON schema and prints one JSON object per row.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(schema_path), Some(input_path)) = (args.next(), args.next()) else {
        bail!("usage: typedcsv <schema.json> <input.csv> [dialect]");
    };
    let dialect: Dialect = match args.next() {
        Some(name) => name.parse()?,
        None => Default::default(),
    };

    let schema_text = std::fs::read_to_string(&schema_path)
        .with_context(|| format!("Failed to read schema file: {}", schema_path))?;
    let schema: Schema = serde_json::from_str(&schema_text)
        .with_context(|| format!("Invalid schema file: {}", schema_path))?;
    let field_names: Vec<String> = schema.field_names().into_iter().map(String::from).collect();

    let options = ReaderOptions::new().with_dialect(dialect);
    let reader = Reader::from_path(&input_path, schema, options)
        .with_context(|| format!("Failed to open {}", input_path))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let (mut decoded, mut rejected) = (0usize, 0usize);

    for result in reader {
        match result {
            Ok(mut record) => {
                let mut object = Map::new();
                for name in &field_names {
                    let value = record.data.remove(name).unwrap_or(Value::Null);
                    object.insert(name.clone(), value);
                }
                serde_json::to_writer(&mut out, &object)?;
                writeln!(out)?;
                decoded += 1;
            }
            Err(e) => {
                warn!(line = e.line(), "{}", e);
                rejected += 1;
            }
        }
    }

    out.flush()?;
    info!(decoded, rejected, "Data decoding completed");
    Ok(())
}
