use anyhow::Result;
use clap::{Parser, Subcommand};
use docqa::commands::{
    ask, history, index, keywords, query, register, show_config, summarize, write_default_config,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about PDF documents with local models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or write the configuration file
    Config {
        /// Write the default configuration file for hand editing
        #[arg(long)]
        write: bool,
    },
    /// Register a new account (the first account becomes Admin)
    Register {
        /// Username for the new account
        username: String,
    },
    /// Summarize a PDF document
    Summarize {
        /// Path of the PDF file
        file: PathBuf,
        /// Account to act as; the password is prompted
        #[arg(long, short)]
        username: String,
    },
    /// Answer a question about a PDF document
    Ask {
        /// Path of the PDF file
        file: PathBuf,
        /// The question to answer
        question: String,
        /// Account to act as; the password is prompted
        #[arg(long, short)]
        username: String,
    },
    /// Extract keywords from a PDF document
    Keywords {
        /// Path of the PDF file
        file: PathBuf,
        /// Account to act as; the password is prompted
        #[arg(long, short)]
        username: String,
    },
    /// Build the persistent similarity index from a PDF document
    Index {
        /// Path of the PDF file
        file: PathBuf,
        /// Account to act as; the password is prompted
        #[arg(long, short)]
        username: String,
    },
    /// Answer a question against the persistent index
    Query {
        /// The question to answer
        question: String,
        /// Account to act as; the password is prompted
        #[arg(long, short)]
        username: String,
    },
    /// Show the document history log (Admin only)
    History {
        /// Account to act as; the password is prompted
        #[arg(long, short)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { write } => {
            if write {
                write_default_config()?;
            } else {
                show_config()?;
            }
        }
        Commands::Register { username } => {
            register(username).await?;
        }
        Commands::Summarize { file, username } => {
            summarize(file, username).await?;
        }
        Commands::Ask {
            file,
            question,
            username,
        } => {
            ask(file, question, username).await?;
        }
        Commands::Keywords { file, username } => {
            keywords(file, username).await?;
        }
        Commands::Index { file, username } => {
            index(file, username).await?;
        }
        Commands::Query { question, username } => {
            query(question, username).await?;
        }
        Commands::History { username } => {
            history(username).await?;
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
        let cli = Cli::try_parse_from(["docqa", "config"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Config { .. });
        }
    }

    #[test]
    fn register_command() {
        let cli = Cli::try_parse_from(["docqa", "register", "alice"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Register { username } = parsed.command {
                assert_eq!(username, "alice");
            }
        }
    }

    #[test]
    fn summarize_command_requires_username() {
        let cli = Cli::try_parse_from(["docqa", "summarize", "report.pdf"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from([
            "docqa",
            "ask",
            "report.pdf",
            "What is the total?",
            "--username",
            "alice",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                file,
                question,
                username,
            } = parsed.command
            {
                assert_eq!(file, PathBuf::from("report.pdf"));
                assert_eq!(question, "What is the total?");
                assert_eq!(username, "alice");
            }
        }
    }

    #[test]
    fn config_write_flag() {
        let cli = Cli::try_parse_from(["docqa", "config", "--write"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { write } = parsed.command {
                assert!(write);
            }
        }
    }

    #[test]
    fn history_command_short_username() {
        let cli = Cli::try_parse_from(["docqa", "history", "-u", "alice"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::History { username } = parsed.command {
                assert_eq!(username, "alice");
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["docqa", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["docqa", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
