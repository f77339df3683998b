//! Command-line interface definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Counsel - Legal question answering with planning, retrieval and self-review
#[derive(Debug, Parser)]
#[command(name = "counsel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Gemini API key (overrides the configured environment variable)
    #[arg(long, global = true, env = "COUNSEL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a legal question
    Ask(AskArgs),

    /// Inspect the passage corpus
    Corpus(CorpusArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the ask command
#[derive(Debug, Parser)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Jurisdiction the question concerns (e.g., "California")
    #[arg(short, long)]
    pub jurisdiction: Option<String>,

    /// Legal domain (contract, litigation, ip, regulatory, general); inferred if omitted
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Text file with the document the question is about
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// JSON corpus to retrieve from instead of the configured one
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Skip the critique and revision pass
    #[arg(long)]
    pub no_reflect: bool,
}

/// Arguments for the corpus command
#[derive(Debug, Parser)]
pub struct CorpusArgs {
    #[command(subcommand)]
    pub action: CorpusAction,
}

/// Corpus actions
#[derive(Debug, Subcommand)]
pub enum CorpusAction {
    /// Search the corpus the way RETRIEVE steps do
    Search {
        /// Search query
        query: String,

        /// JSON corpus to search instead of the configured one
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Maximum number of passages
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

/// Arguments for the config command
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet mode (minimal output)
    Quiet,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_command() {
        let cli = Cli::parse_from([
            "counsel",
            "ask",
            "Is a non-compete clause enforceable?",
            "--jurisdiction",
            "California",
            "--no-reflect",
        ]);
        match cli.command {
            Command::Ask(args) => {
                assert_eq!(args.question, "Is a non-compete clause enforceable?");
                assert_eq!(args.jurisdiction.as_deref(), Some("California"));
                assert!(args.no_reflect);
                assert!(args.domain.is_none());
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_corpus_search_defaults() {
        let cli = Cli::parse_from(["counsel", "corpus", "search", "arbitration"]);
        match cli.command {
            Command::Corpus(CorpusArgs {
                action: CorpusAction::Search { query, limit, corpus },
            }) => {
                assert_eq!(query, "arbitration");
                assert_eq!(limit, 5);
                assert!(corpus.is_none());
            }
            _ => panic!("Expected Corpus Search command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["counsel", "config", "show", "--format", "json", "--no-color", "-v"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn test_missing_question_rejected() {
        assert!(Cli::try_parse_from(["counsel", "ask"]).is_err());
    }

    #[test]
    fn test_format_conversion() {
        let format: crate::config::OutputFormat = CliFormat::Quiet.into();
        assert_eq!(format, crate::config::OutputFormat::Quiet);
    }
}
