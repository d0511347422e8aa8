use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ventlink_cli::commands;

#[derive(Parser)]
#[command(name = "ventlink")]
#[command(about = "Ventlink - inspect and generate ventilator serial link traffic", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a captured byte stream layer by layer
    Decode {
        /// Captured bytes as hex (whitespace and colons are ignored)
        hex: Option<String>,

        /// Raw capture file, or - for stdin
        #[arg(short, long, conflicts_with = "hex")]
        input: Option<String>,
    },

    /// Run the output schedule and print the frames it emits
    Encode {
        /// Number of clock ticks to run
        #[arg(long, default_value = "90")]
        ticks: u32,

        /// Clock value before the first tick
        #[arg(long, default_value = "0")]
        start_time: u32,

        /// Write the raw frame stream to this file
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Decode { hex, input } => commands::decode::execute(hex.as_deref(), input.as_deref()),
        Commands::Encode {
            ticks,
            start_time,
            output,
        } => commands::encode::execute(ticks, start_time, output.as_deref()),
    }
}
