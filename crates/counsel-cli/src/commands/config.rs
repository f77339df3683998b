//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// `path` is the `--config` override; without it the default location is used.
pub async fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::path()?,
    };

    match args.action {
        ConfigAction::Show => {
            println!("{}", render_config(config, &path, formatter)?);
        }
        ConfigAction::Init { force } => {
            if init_config(&path, force)? {
                println!(
                    "{}",
                    formatter.success(&format!("Wrote default configuration to {}", path.display()))
                );
            } else {
                println!(
                    "{}",
                    formatter.warning(&format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ))
                );
            }
        }
    }

    Ok(())
}

fn render_config(config: &Config, path: &Path, formatter: &Formatter) -> Result<String> {
    match formatter.format() {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        OutputFormat::Quiet => Ok(path.display().to_string()),
        OutputFormat::Table => Ok(format!(
            "{}\n\n{}",
            formatter.info(&format!("Configuration file: {}", path.display())),
            config.to_toml()?
        )),
    }
}

/// Write the default configuration; returns false if a file exists and
/// `force` is not set
fn init_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    Config::default().save_to(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".counsel").join("config.toml");

        assert!(init_config(&path, false).unwrap());
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.gemini.api_key_env, "GOOGLE_API_KEY");
    }

    #[test]
    fn test_init_keeps_existing_file_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settings]\ncolor = false\n").unwrap();

        assert!(!init_config(&path, false).unwrap());
        assert!(!Config::load_from(&path).unwrap().settings.color);

        assert!(init_config(&path, true).unwrap());
        assert!(Config::load_from(&path).unwrap().settings.color);
    }

    #[test]
    fn test_show_as_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output =
            render_config(&Config::default(), &PathBuf::from("config.toml"), &formatter).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["reasoner"]["max_steps"], 6);
    }

    #[test]
    fn test_show_as_table_includes_path_and_toml() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output =
            render_config(&Config::default(), &PathBuf::from("/home/u/.counsel/config.toml"), &formatter)
                .unwrap();
        assert!(output.contains("/home/u/.counsel/config.toml"));
        assert!(output.contains("[reasoner]"));
    }
}
