use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_PREPROCESSED_OUT: &str = "customer_reviews_preprocessed.csv";

#[derive(Parser, Debug)]
#[command(
    name = "reviewqa",
    version,
    about = "Ask questions about a spreadsheet of customer reviews"
)]
pub struct Cli {
    /// JSON config file; defaults are used when omitted.
    #[arg(long, global = true, env = "REVIEWQA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Load, split and embed the given CSV files and save the vector index.
    Index {
        /// Files, directories or glob patterns.
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Rebuild even when the saved index matches the input.
        #[arg(long)]
        rebuild: bool,
    },

    /// Answer a single question from the saved index.
    Ask {
        question: String,
    },

    /// Index the given files, then answer questions read from stdin.
    Chat {
        #[arg(required = true)]
        patterns: Vec<String>,
        #[arg(long)]
        rebuild: bool,
    },

    /// Print the accumulated log.
    Logs,

    /// Clean a review export and insert it into PostgreSQL.
    Import {
        /// The review CSV export.
        csv: PathBuf,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        /// Where to write the preprocessed CSV.
        #[arg(long, default_value = DEFAULT_PREPROCESSED_OUT)]
        preprocessed_out: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_index_with_patterns() {
        let cli = Cli::try_parse_from([
            "reviewqa",
            "index",
            "data/*.csv",
            "more.csv",
            "--rebuild",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Index {
                patterns: vec!["data/*.csv".to_string(), "more.csv".to_string()],
                rebuild: true,
            }
        );
    }

    #[test]
    fn index_requires_a_pattern() {
        assert!(Cli::try_parse_from(["reviewqa", "index"]).is_err());
        assert!(Cli::try_parse_from(["reviewqa", "chat"]).is_err());
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["reviewqa", "ask", "Is shipping fast?", "--config", "rq.json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("rq.json")));
        assert_eq!(
            cli.command,
            Command::Ask {
                question: "Is shipping fast?".to_string()
            }
        );
    }

    #[test]
    fn parse_import_defaults() {
        let cli = Cli::try_parse_from([
            "reviewqa",
            "import",
            "reviews.csv",
            "--database-url",
            "postgres://localhost/reviews",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Import {
                csv: PathBuf::from("reviews.csv"),
                database_url: "postgres://localhost/reviews".to_string(),
                preprocessed_out: PathBuf::from(DEFAULT_PREPROCESSED_OUT),
            }
        );
    }
}
