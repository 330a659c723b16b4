use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "recollate",
    version,
    author,
    about = "Restores the logical page order of shuffled PDF documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn print_help() {
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        println!();
    }
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP reconstruction server.
    Serve(ServeArgs),
    /// Reorder a PDF on disk and write the reconstructed document.
    Reconstruct(ReconstructArgs),
    /// Decide the page order and print a diagnostics report without
    /// writing a PDF.
    Explain(ExplainArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs;

#[derive(Debug, Args)]
pub struct ReconstructArgs {
    /// Input PDF path.
    pub input: PathBuf,
    /// Output path; defaults to `<input>.reordered.pdf`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Rule catalog YAML overriding the built-in document-type profiles.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExplainArgs {
    /// Input PDF path.
    pub input: PathBuf,
    /// Rule catalog YAML overriding the built-in document-type profiles.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}
