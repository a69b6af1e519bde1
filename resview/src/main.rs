use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

use res_view::SaveFormat;

mod commands;

use commands::{export::export_resources, list::list_resources};

#[derive(Parser)]
#[command(name = "resview")]
#[command(about = "Inspect and export .resources containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RESVIEW_LOG", default_value_t = Level::INFO)]
    log_level: Level,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the strings, objects and embedded files of a container
    List {
        /// Container path (.resources or .resources.zst)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the classified entries as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Save a container unchanged or as ResX
    Export {
        /// Container path (.resources or .resources.zst)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file, or a directory to write under the container's name
        #[arg(short, long)]
        output: PathBuf,

        /// Output format; inferred from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Replace an existing output file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Raw,
    Resx,
}

impl From<FormatArg> for SaveFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Raw => SaveFormat::RawCopy,
            FormatArg::Resx => SaveFormat::ResX,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List { input, json } => list_resources(&input, json),
        Commands::Export {
            input,
            output,
            format,
            force,
        } => export_resources(&input, output, format.map(SaveFormat::from), force),
    }
}
