use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scribe_core::{BookVariant, Language};

#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(about = "Generate PDF books from a prompt")]
pub(crate) struct ScribeCli {
    /// Config file (RON). Defaults to ./scribe.ron
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Also write logs to ./scribe.log
    #[arg(long, global = true)]
    pub log_file: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Generate a book and save the PDF
    Generate(GenerateArgs),
    /// Store the signed-in user in the config
    SignIn(SignInArgs),
    /// Forget the signed-in user
    SignOut,
    /// Show where a path resolves to for the current user
    Route { path: String },
    /// Ask the service to stop the current user's running generation
    Cancel,
}

#[derive(Args, Debug)]
pub(crate) struct GenerateArgs {
    /// What the book is about
    #[arg(long, short)]
    pub prompt: String,
    /// short, medium, long or research
    #[arg(long, default_value = "medium")]
    pub variant: BookVariant,
    /// Language the book is written in
    #[arg(long, default_value = "English")]
    pub language: Language,
    /// Overrides output_dir from the config
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SignInArgs {
    #[arg(long)]
    pub uid: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub photo_url: Option<String>,
}
