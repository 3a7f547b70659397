mod commands;
mod config;
mod server;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mw_core::{OutputRequest, Representation, ics};
use tracing_subscriber::EnvFilter;

use crate::config::{Ports, Settings};

const DEFAULT_LOG_FILTER: &str = "mw=info,tower_http=warn";

#[derive(Parser)]
#[command(name = "mw")]
#[command(about = "Render timeline documents to JSON or HTML views, or serve a live preview")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the rendered view and push updates whenever the input changes
    Serve {
        #[command(flatten)]
        output: OutputArgs,

        /// HTTP port (the PORT environment variable takes precedence)
        #[arg(short, long)]
        port: Option<u16>,

        /// Push channel port (the SOCKET_PORT environment variable takes precedence)
        #[arg(short = 's', long = "socketPort")]
        socket_port: Option<u16>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Timeline file to read. Calendar files (.ics, .ical, .ifb, .icalendar)
    /// are converted to a .mw file next to them instead.
    input: Option<PathBuf>,

    /// Output destination (same as --destination)
    destination: Option<PathBuf>,

    /// Output type. Defaults to parsing the document and writing json;
    /// a view like "timeline" produces an html document.
    #[arg(short = 'o', long = "outputType", value_enum)]
    output_type: Option<OutputType>,

    /// Output destination, e.g. "timeline.html". Without --outputType the
    /// type is inferred from the name: "MyTimeline.json" gives json,
    /// "product_calendar.html" the calendar view.
    #[arg(short = 'd', long = "destination", value_name = "PATH")]
    destination_flag: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputType {
    Json,
    Timeline,
    Calendar,
    Resume,
}

impl From<OutputType> for Representation {
    fn from(output_type: OutputType) -> Self {
        match output_type {
            OutputType::Json => Representation::Json,
            OutputType::Timeline => Representation::Timeline,
            OutputType::Calendar => Representation::Calendar,
            OutputType::Resume => Representation::Resume,
        }
    }
}

impl OutputArgs {
    fn input(&self) -> Result<PathBuf> {
        match &self.input {
            Some(input) => Ok(input.clone()),
            None => anyhow::bail!("Provide an input markwhen file"),
        }
    }

    fn request(self, serving: bool) -> OutputRequest {
        OutputRequest {
            representation: self.output_type.map(Representation::from),
            destination_flag: self.destination_flag,
            destination_arg: self.destination,
            serving,
            preferred_view: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let (output, serve_ports) = match cli.command {
        Some(Commands::Serve {
            output,
            port,
            socket_port,
        }) => (output, Some((port, socket_port))),
        None => (cli.output, None),
    };

    let input = output.input()?;

    // Calendar input is only ever converted.
    if ics::is_calendar_path(&input) {
        return commands::convert::run(&input);
    }

    let settings = Settings::load()?;

    match serve_ports {
        Some((port, socket_port)) => {
            let ports = Ports::from_env(port, socket_port, &settings)?;
            commands::serve::run(input, output.request(true), ports, &settings).await
        }
        None => commands::render::run(&input, &output.request(false), &settings),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
