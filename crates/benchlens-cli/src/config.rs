//! Configuration and path resolution for the CLI.
//!
//! Resolves the benchmark registry and the data directory:
//! - Explicit command-line flags
//! - Environment variables
//! - Built-in registry / platform data directory

use anyhow::{anyhow, Context, Result};
use benchlens_core::config::BenchmarkRegistry;
use benchlens_core::storage::RedbScoreStore;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Database file name inside the data directory
const DATABASE_FILENAME: &str = "scores.redb";

/// Environment variable for a custom registry file
const REGISTRY_ENV: &str = "BENCHLENS_REGISTRY";

/// Environment variable for a custom data directory
const DATA_DIR_ENV: &str = "BENCHLENS_DATA_DIR";

/// Loads the benchmark registry.
///
/// Search order:
/// 1. `--registry` flag
/// 2. `$BENCHLENS_REGISTRY` environment variable
/// 3. Built-in catalog
pub fn load_registry(custom_path: Option<&Path>) -> Result<BenchmarkRegistry> {
    let path = custom_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(REGISTRY_ENV).map(PathBuf::from));

    match path {
        Some(path) => {
            info!("Loading registry: {}", path.display());
            BenchmarkRegistry::from_path(&path)
                .with_context(|| format!("Failed to load registry: {}", path.display()))
        }
        None => Ok(BenchmarkRegistry::builtin()),
    }
}

/// Returns the data directory holding the score database.
///
/// Search order:
/// 1. `--data-dir` flag
/// 2. `$BENCHLENS_DATA_DIR` environment variable
/// 3. Platform data directory:
///    - macOS: `~/Library/Application Support/dev.benchlens.BenchLens/`
///    - Linux: `~/.local/share/benchlens/`
///    - Windows: `%APPDATA%\benchlens\BenchLens\data\`
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    ProjectDirs::from("dev", "benchlens", "BenchLens")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Returns the path to the database file.
pub fn database_path(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let data_dir = get_data_dir(custom_dir)?;
    Ok(data_dir.join(DATABASE_FILENAME))
}

/// Opens an existing score database for analysis.
pub fn open_existing_store(custom_dir: Option<&PathBuf>) -> Result<RedbScoreStore> {
    let db_path = database_path(custom_dir)?;

    if !db_path.exists() {
        return Err(anyhow!(
            "No score database found at {}.\n\
             Load evaluation results with `benchlens import` first.",
            db_path.display()
        ));
    }

    info!("Opening database: {}", db_path.display());
    RedbScoreStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))
}

/// Opens the score database for writing, creating the data directory if needed.
pub fn open_or_create_store(custom_dir: Option<&PathBuf>) -> Result<RedbScoreStore> {
    let data_dir = get_data_dir(custom_dir)?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    let db_path = data_dir.join(DATABASE_FILENAME);
    info!("Opening database: {}", db_path.display());
    RedbScoreStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))
}
