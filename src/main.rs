use clap::{Parser, Subcommand};
use folio_chat::Result;
use folio_chat::commands::{ask, embed, history, rebuild, show_status};
use folio_chat::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "folio-chat")]
#[command(about = "Knowledge base and retrieval-augmented chat for a portfolio site")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the OpenAI-compatible provider and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Rebuild the knowledge base from all portfolio content
    Rebuild,
    /// Generate embeddings for knowledge items that lack them
    Embed,
    /// Ask a question about the candidate
    Ask {
        /// The question to answer
        question: String,
        /// Session identifier to record the exchange under
        #[arg(long)]
        session: Option<String>,
    },
    /// Show chat history for a session
    History {
        /// Session identifier
        #[arg(long)]
        session: String,
        /// Maximum number of messages to show
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show knowledge base and embedding status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Rebuild => {
            rebuild().await?;
        }
        Commands::Embed => {
            embed().await?;
        }
        Commands::Ask { question, session } => {
            ask(&question, session.as_deref()).await?;
        }
        Commands::History { session, limit } => {
            history(&session, limit).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["folio-chat", "rebuild"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Rebuild);
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["folio-chat", "ask", "What is their experience?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question, session } = parsed.command {
                assert_eq!(question, "What is their experience?");
                assert_eq!(session, None);
            }
        }
    }

    #[test]
    fn ask_command_with_session() {
        let cli = Cli::try_parse_from([
            "folio-chat",
            "ask",
            "What stack do they use?",
            "--session",
            "abc-123",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { session, .. } = parsed.command {
                assert_eq!(session, Some("abc-123".to_string()));
            }
        }
    }

    #[test]
    fn history_requires_session() {
        let cli = Cli::try_parse_from(["folio-chat", "history"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["folio-chat", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["folio-chat", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["folio-chat", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
