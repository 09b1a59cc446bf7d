use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod fields;
pub mod validator;
pub mod watcher;

pub use fields::load_fields;

use crate::cli::Cli;
use crate::domain::transforms::TransformRules;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub transforms: TransformRules,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Locations of the field schema and the document template
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathSettings {
    #[serde(default = "default_fields_path")]
    pub fields: PathBuf,
    #[serde(default = "default_template_path")]
    pub template: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            fields: default_fields_path(),
            template: default_template_path(),
        }
    }
}

fn default_fields_path() -> PathBuf {
    PathBuf::from("templates/fields.yaml")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("templates/purchase_agreement_template.docx")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Filename offered when the user leaves the field blank (no extension)
    #[serde(default = "default_filename")]
    pub default_filename: String,
    /// Heading shown above the form
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            default_filename: default_filename(),
            title: default_title(),
        }
    }
}

fn default_filename() -> String {
    "Purchase_Agreement".to_string()
}

fn default_title() -> String {
    "Purchase Agreement Filler".to_string()
}

impl Settings {
    /// Create settings from CLI arguments (config file, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::build(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a single file, falling back to defaults when it is absent
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let settings = Self::build(path.as_ref())?;
        settings.validate()?;
        Ok(settings)
    }

    fn build(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(fields) = &cli.fields {
            self.paths.fields = fields.clone();
        }
        if let Some(template) = &cli.template {
            self.paths.template = template.clone();
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            paths: PathSettings::default(),
            output: OutputSettings::default(),
            transforms: TransformRules::default(),
        }
    }
}
