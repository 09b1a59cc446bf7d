use clap::Parser;
use std::path::PathBuf;

/// Fill a document template from a web form
#[derive(Parser, Debug, Clone)]
#[command(name = "docfill", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "DOCFILL_CONFIG", default_value = "docfill.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "DOCFILL_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "DOCFILL_PORT")]
    pub port: Option<u16>,

    /// Path to the field schema (YAML)
    #[arg(long, env = "DOCFILL_FIELDS")]
    pub fields: Option<PathBuf>,

    /// Path to the .docx template
    #[arg(long, env = "DOCFILL_TEMPLATE")]
    pub template: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["docfill"]);
        assert_eq!(cli.config, PathBuf::from("docfill.toml"));
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.fields.is_none());
        assert!(cli.template.is_none());
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "docfill",
            "--config",
            "custom.toml",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--fields",
            "forms/fields.yaml",
            "--template",
            "forms/agreement.docx",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.host, Some("0.0.0.0".to_string()));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.fields, Some(PathBuf::from("forms/fields.yaml")));
        assert_eq!(cli.template, Some(PathBuf::from("forms/agreement.docx")));
    }
}
