//! CLI subcommands and shared helpers.

pub mod batch;
pub mod config;
pub mod inspect;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use qres_core::models::{ModePreference, PdfConfig, QresConfig, ValueStrategy};
use qres_core::pdf::{DumpSource, PdfExtractor, TokenSource};

/// Statement mode argument.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    /// Consolidated if the document mentions it
    Auto,
    /// Consolidated figures
    Consolidated,
    /// Standalone figures
    Standalone,
}

impl From<ModeArg> for ModePreference {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Auto => ModePreference::Auto,
            ModeArg::Consolidated => ModePreference::Consolidated,
            ModeArg::Standalone => ModePreference::Standalone,
        }
    }
}

/// Value selection argument.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// Reporting-period column, first significant number otherwise
    Anchored,
    /// First significant number
    FirstToken,
}

impl From<StrategyArg> for ValueStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Anchored => ValueStrategy::Anchored,
            StrategyArg::FirstToken => ValueStrategy::FirstToken,
        }
    }
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qres")
        .join("config.json")
}

/// Load the configuration from `path`, else the default file, else defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<QresConfig> {
    if let Some(path) = path {
        return Ok(QresConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(QresConfig::from_file(&default_path)?)
    } else {
        Ok(QresConfig::default())
    }
}

/// Open a token source by file extension: `.pdf` or a `.json` page dump.
pub fn open_source(path: &Path, pdf: &PdfConfig) -> anyhow::Result<Box<dyn TokenSource + Send>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfExtractor::open(path, &pdf.password)?)),
        "json" => Ok(Box::new(DumpSource::from_file(path)?)),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Whether a path has an extension `open_source` accepts.
pub fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "json")
}

/// Company name for a document: its file stem.
pub fn company_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}
