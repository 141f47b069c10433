// Configuration file and layered loading

use crate::validation::Validate;
use crate::{ConfigError, EnvLoader, Result, Settings};
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }
}

/// Reads settings files
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: &str) -> Result<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))?;

        Ok(Self::new(format))
    }

    /// Load settings from a file
    pub fn load_file(&self, path: &str) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("Failed to read {}: {}", path, e)))?;

        self.parse(&content)
    }

    /// Parse settings; missing keys keep their defaults
    pub fn parse(&self, content: &str) -> Result<Settings> {
        match self.format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e))),
            FileFormat::Toml => toml::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e))),
        }
    }
}

/// Layered settings loading: defaults, then an optional file, then `.env`
/// and `DVCS_*` variables, then validation.
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<String>,
    dotenv: Option<String>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON or TOML settings file
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Read fallback variables from a `.env` file
    pub fn dotenv(mut self, path: impl Into<String>) -> Self {
        self.dotenv = Some(path.into());
        self
    }

    /// Load and validate
    pub fn load(self) -> Result<Settings> {
        let mut settings = match &self.file {
            Some(path) => ConfigLoader::auto(path)?.load_file(path)?,
            None => Settings::default(),
        };

        let env = match &self.dotenv {
            Some(path) => EnvLoader::new().with_dotenv(path)?,
            None => EnvLoader::new(),
        };
        env.apply(&mut settings)?;

        settings.validate()?;
        Ok(settings)
    }
}
