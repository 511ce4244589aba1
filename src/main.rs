use std::path::PathBuf;

use clap::{Parser, Subcommand};
use textqa::Result;
use textqa::commands::{ask, delete_store, ingest, list_stores, ping, show_config};

#[derive(Parser)]
#[command(name = "textqa")]
#[command(about = "Ask questions about your text files using local models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk and embed a text file into a named store
    Ingest {
        /// Path to the text file to ingest
        file: PathBuf,
        /// Store name (defaults to the file stem)
        #[arg(long)]
        store: Option<String>,
        /// Maximum characters per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Characters shared between adjacent chunks
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Ask a question against a store
    Ask {
        /// The question to answer
        question: String,
        /// Store to answer against (defaults to the sole existing store)
        #[arg(long)]
        store: Option<String>,
        /// Number of chunks to retrieve as grounding
        #[arg(long)]
        k: Option<usize>,
    },
    /// List all persisted stores
    Stores,
    /// Delete a persisted store
    Delete {
        /// Store name to delete
        store: String,
    },
    /// Show the active configuration
    Config,
    /// Check connectivity to the Ollama server and model availability
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            file,
            store,
            chunk_size,
            overlap,
        } => {
            ingest(file, store, chunk_size, overlap).await?;
        }
        Commands::Ask { question, store, k } => {
            ask(question, store, k).await?;
        }
        Commands::Stores => {
            list_stores().await?;
        }
        Commands::Delete { store } => {
            delete_store(store).await?;
        }
        Commands::Config => {
            show_config().await?;
        }
        Commands::Ping => {
            ping().await?;
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
        let cli = Cli::try_parse_from(["textqa", "stores"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Stores);
        }
    }

    #[test]
    fn ingest_command_with_file() {
        let cli = Cli::try_parse_from(["textqa", "ingest", "notes.txt"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest {
                file,
                store,
                chunk_size,
                overlap,
            } = parsed.command
            {
                assert_eq!(file, PathBuf::from("notes.txt"));
                assert_eq!(store, None);
                assert_eq!(chunk_size, None);
                assert_eq!(overlap, None);
            }
        }
    }

    #[test]
    fn ingest_command_with_options() {
        let cli = Cli::try_parse_from([
            "textqa",
            "ingest",
            "notes.txt",
            "--store",
            "notes",
            "--chunk-size",
            "500",
            "--overlap",
            "50",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest {
                store,
                chunk_size,
                overlap,
                ..
            } = parsed.command
            {
                assert_eq!(store, Some("notes".to_string()));
                assert_eq!(chunk_size, Some(500));
                assert_eq!(overlap, Some(50));
            }
        }
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["textqa", "ask", "what is chunking?", "--k", "5"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question, store, k } = parsed.command {
                assert_eq!(question, "what is chunking?");
                assert_eq!(store, None);
                assert_eq!(k, Some(5));
            }
        }
    }

    #[test]
    fn delete_command_requires_store() {
        let cli = Cli::try_parse_from(["textqa", "delete"]);
        assert!(cli.is_err());

        let cli = Cli::try_parse_from(["textqa", "delete", "notes"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["textqa", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["textqa", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
