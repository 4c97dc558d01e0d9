use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use tracklens::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize access to the streaming platform
    Auth(AuthOptions),

    /// Show tempo, key, mood and metadata of a track
    Analyze(AnalyzeOptions),

    /// Print the track id a link resolves to
    Resolve(ResolveOptions),

    /// Remove stored credentials
    Logout,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Finish a pending login from the address the browser was redirected to
    #[clap(long)]
    pub callback_url: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeOptions {
    /// Track URL, platform URI or bare track id
    pub link: String,

    /// Write a text export into this directory
    #[clap(long)]
    pub export: Option<PathBuf>,

    /// Include album, duration and all characteristics in the export
    #[clap(long, requires = "export")]
    pub extended: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveOptions {
    pub link: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

async fn load_config() -> config::Config {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Auth(opt) => cli::auth(&load_config().await, opt.callback_url).await,
        Command::Analyze(opt) => {
            cli::analyze(&load_config().await, &opt.link, opt.export, opt.extended).await
        }
        Command::Resolve(opt) => cli::resolve(&opt.link),
        Command::Logout => cli::logout(&load_config().await).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
