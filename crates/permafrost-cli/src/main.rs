//! permafrost CLI
//!
//! Command-line tool generating Data Vault load scripts from a model
//! manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::DateTime;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use permafrost_core::{
    ColumnMetadata, Conventions, DataVaultLoad, DrivingKeyField, ModelDeserializer,
};

/// Snowflake SQL generator for Data Vault 2.0 loads.
#[derive(Parser)]
#[command(name = "permafrost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model manifest (JSON).
    #[arg(
        short,
        long,
        env = "PERMAFROST_MANIFEST",
        default_value = "permafrost.json"
    )]
    manifest: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the full load script, staging statement included.
    Generate {
        /// Write the script to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the staging table statement only.
    StagingDdl,
}

/// Everything one load needs, declared in a single JSON document.
#[derive(Debug, Deserialize)]
struct Manifest {
    /// Schema holding the extract table.
    extract_schema: String,
    /// Table holding the raw extraction batch.
    extract_table: String,
    /// Schema receiving the staging table.
    staging_schema: String,
    /// Staging table base name, suffixed with the extraction timestamp.
    staging_table: String,
    /// Schema holding the target tables.
    target_schema: String,
    /// RFC 3339 timestamp marking the start of the extraction.
    extract_start_timestamp: String,
    /// Record source literal. Without one, the extract table must carry
    /// its own record source column.
    #[serde(default)]
    source: Option<String>,
    /// Tables to load, in any order.
    target_tables: Vec<String>,
    /// Column metadata of every target table.
    columns: Vec<ColumnMetadata>,
    /// Driving keys of the effectivity satellites.
    #[serde(default)]
    driving_keys: Vec<DrivingKeyField>,
    /// Role playing hub names mapped to the hub each one merges into.
    #[serde(default)]
    role_playing_hubs: BTreeMap<String, String>,
    /// Naming convention overrides.
    #[serde(default)]
    conventions: Conventions,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manifest = read_manifest(&cli.manifest)?;
    let load = build_load(manifest)?;

    match cli.command {
        Commands::Generate { output } => {
            let script = load.sql_load_script()?;

            match output {
                Some(path) => {
                    let mut sql = script.join(";\n\n");
                    sql.push_str(";\n");
                    fs::write(&path, sql)
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    info!("{} statements written to {}", script.len(), path.display());
                }
                None => {
                    for statement in &script {
                        println!("{statement};");
                        println!();
                    }
                }
            }
        }

        Commands::StagingDdl => {
            println!("{};", load.staging_create_sql_statement()?);
        }
    }

    Ok(())
}

fn read_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read manifest {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("cannot parse manifest {}", path.display()))
}

fn build_load(manifest: Manifest) -> anyhow::Result<DataVaultLoad> {
    let extract_start_timestamp = DateTime::parse_from_rfc3339(&manifest.extract_start_timestamp)
        .with_context(|| {
            format!(
                "invalid extract_start_timestamp '{}'",
                manifest.extract_start_timestamp
            )
        })?;

    let tables = ModelDeserializer::new(
        manifest.target_schema,
        manifest.target_tables,
        manifest.columns,
    )
    .with_driving_keys(manifest.driving_keys)
    .with_role_playing_hubs(manifest.role_playing_hubs)
    .with_conventions(manifest.conventions.clone())
    .deserialize()?;

    let mut load = DataVaultLoad::new(
        manifest.extract_schema,
        manifest.extract_table,
        manifest.staging_schema,
        manifest.staging_table,
        extract_start_timestamp,
        tables,
        manifest.conventions,
    )?;
    if let Some(source) = manifest.source {
        load = load.with_source(source);
    }
    Ok(load)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MANIFEST: &str = r#"{
      "extract_schema": "dv_extract",
      "extract_table": "extract_orders",
      "staging_schema": "dv_stg",
      "staging_table": "orders",
      "target_schema": "dv",
      "extract_start_timestamp": "2019-08-06T00:00:00Z",
      "source": "test",
      "target_tables": ["h_order", "hs_order"],
      "columns": [
        {"table_name": "h_order", "column_name": "h_order_hashkey",
         "data_type": "TEXT", "length": 32, "nullable": false},
        {"table_name": "h_order", "column_name": "r_timestamp",
         "data_type": "TIMESTAMP_NTZ", "nullable": false},
        {"table_name": "h_order", "column_name": "r_source",
         "data_type": "TEXT", "nullable": false},
        {"table_name": "h_order", "column_name": "order_id",
         "data_type": "TEXT", "nullable": false},
        {"table_name": "hs_order", "column_name": "h_order_hashkey",
         "data_type": "TEXT", "length": 32, "nullable": false},
        {"table_name": "hs_order", "column_name": "s_hashdiff",
         "data_type": "TEXT", "length": 32, "nullable": false},
        {"table_name": "hs_order", "column_name": "r_timestamp",
         "data_type": "TIMESTAMP_NTZ", "nullable": false},
        {"table_name": "hs_order", "column_name": "r_timestamp_end",
         "data_type": "TIMESTAMP_NTZ", "nullable": false},
        {"table_name": "hs_order", "column_name": "r_source",
         "data_type": "TEXT", "nullable": false},
        {"table_name": "hs_order", "column_name": "total_price",
         "data_type": "NUMBER", "precision": 18, "scale": 2}
      ]
    }"#;

    #[test]
    fn manifest_round_trips_into_a_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = read_manifest(file.path()).unwrap();
        let load = build_load(manifest).unwrap();

        assert_eq!(load.staging_table().physical_name, "orders_20190806_000000");
        let script = load.sql_load_script().unwrap();
        assert_eq!(script.len(), 3);
        assert!(script[0].starts_with("CREATE OR REPLACE TABLE"));
        assert!(script[1].starts_with("MERGE INTO dv.h_order AS target"));
        assert!(script[2].starts_with("MERGE INTO dv.hs_order AS satellite"));
    }

    #[test]
    fn a_missing_manifest_is_reported_with_its_path() {
        let err = read_manifest(Path::new("/nonexistent/permafrost.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/permafrost.json"));
    }

    #[test]
    fn a_bad_timestamp_is_rejected() {
        let mut manifest: Manifest = serde_json::from_str(MANIFEST).unwrap();
        manifest.extract_start_timestamp = "yesterday".to_string();
        let err = build_load(manifest).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }
}
