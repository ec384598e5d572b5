//! Configuration structures for the note monitor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NotamonError, Result};

/// Main configuration for the notamon pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotamonConfig {
    /// Input and output locations.
    pub paths: PathsConfig,

    /// Batch processing options.
    pub processing: ProcessingConfig,

    /// Spreadsheet history options.
    pub excel: ExcelConfig,

    /// Logging options.
    pub logging: LoggingConfig,
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for note PDFs.
    pub pdf_input_dir: PathBuf,

    /// File holding the accumulated operation history. An `.xlsx` path is
    /// written as a spreadsheet, anything else as CSV.
    pub history_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pdf_input_dir: PathBuf::from("notas"),
            history_path: PathBuf::from("output/operations.xlsx"),
        }
    }
}

/// Batch processing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Rename the existing history file before overwriting it.
    pub backup_before_save: bool,

    /// Number of documents extracted concurrently (1 = sequential).
    pub jobs: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            backup_before_save: true,
            jobs: 1,
        }
    }
}

/// Spreadsheet history options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelConfig {
    /// Worksheet the history is read from and written to.
    pub sheet_name: String,

    /// Fill rows whose `alert_int` is 1.
    pub highlight_alerts: bool,
}

impl Default for ExcelConfig {
    fn default() -> Self {
        Self {
            sheet_name: "operacoes".to_string(),
            highlight_alerts: true,
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no `-v` flag is given (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl NotamonConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NotamonError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            NotamonError::Config(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the environment the run depends on.
    pub fn validate(&self) -> Result<()> {
        if !self.paths.pdf_input_dir.is_dir() {
            return Err(NotamonError::InputDirMissing(self.paths.pdf_input_dir.clone()));
        }
        let sheet = self.excel.sheet_name.trim();
        if sheet.is_empty() || sheet.chars().count() > 31 {
            return Err(NotamonError::Config(
                "excel.sheet_name must be 1 to 31 characters".to_string(),
            ));
        }
        if self.processing.jobs == 0 {
            return Err(NotamonError::Config("processing.jobs must be at least 1".to_string()));
        }
        Ok(())
    }
}
