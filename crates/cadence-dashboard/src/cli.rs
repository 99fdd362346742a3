//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Study dashboard for the cadence scheduling service
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Spaced-repetition study dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (TOML, JSON or YAML). Defaults to ~/.cadence/config.toml if present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Scheduling service URL (overrides config and $CADENCE_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every topic grouped by when it is due
    Overview {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the service's recommended reviews
    Due {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Record a review for a topic
    Review(ReviewArgs),

    /// Add a subject
    AddSubject { name: String },

    /// Add a subskill under a subject
    AddSubskill { subject: String, name: String },

    /// Add a topic under a subskill
    AddTopic {
        subject: String,
        subskill: String,
        name: String,
    },

    /// Retrain the scheduling model
    Retrain,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("verdict").required(true).args(["good", "needs_improvement", "score"])))]
pub struct ReviewArgs {
    /// Topic id
    pub topic_id: String,

    /// Raise the score by one step
    #[arg(long)]
    pub good: bool,

    /// Lower the score by one step
    #[arg(long)]
    pub needs_improvement: bool,

    /// Set an explicit score between 0 and 1
    #[arg(long)]
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_review_requires_a_verdict() {
        assert!(Cli::try_parse_from(["cadence", "review", "7"]).is_err());
        assert!(Cli::try_parse_from(["cadence", "review", "7", "--good", "--score", "0.4"]).is_err());

        let cli = Cli::try_parse_from(["cadence", "review", "7", "--needs-improvement"]).unwrap();
        match cli.command {
            Commands::Review(args) => {
                assert_eq!(args.topic_id, "7");
                assert!(args.needs_improvement);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cadence",
            "add-topic",
            "Math",
            "Algebra",
            "Vectors",
            "--base-url",
            "http://tracker:5000",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://tracker:5000"));
        assert!(matches!(cli.command, Commands::AddTopic { .. }));
    }
}
