use clap::{Parser, Subcommand};
use pdfseal::{
    Config,
    cli::{
        self,
        commands::{DocumentCommands, KeyCommands, SignatureCommands},
    },
    error::Result,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Disable the progress spinner (also: PDFSEAL_NO_PROGRESS)
    #[arg(long = "no-progress", global = true)]
    no_progress: bool,

    /// Default key file for sign/verify (also: PDFSEAL_KEY)
    #[arg(long = "key-file", global = true)]
    key_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Document(DocumentCommands),

    #[command(flatten)]
    Signature(SignatureCommands),

    /// Key pair management
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    pdfseal::init_logging()?;

    // Parse command line arguments
    let cli = Cli::parse();

    // Flags override the environment
    let mut config = Config::from_env();
    if cli.no_progress {
        config.show_progress = false;
    }
    if cli.key_file.is_some() {
        config.key_path = cli.key_file;
    }

    // Handle commands
    let result = match cli.command {
        Commands::Document(command) => cli::handlers::handle_document_command(command, &config),
        Commands::Signature(command) => cli::handlers::handle_signature_command(command, &config),
        Commands::Key { command } => cli::handlers::handle_key_command(command),
    };

    // Format and display any errors
    if let Err(ref e) = result {
        eprintln!("{}", cli::format_error(e));
    }

    result
}
