//! Ember Shader Tool
//!
//! Inspects multi-stage shader files and checks that they compile and link.
//!
//! Features:
//! - Per-stage summary of a `#type` shader file
//! - Print a single stage's source
//! - Compile and link check without a window or GPU

mod app;

use clap::Parser;
use std::path::PathBuf;

/// Ember - shader file inspection
#[derive(Parser, Debug)]
#[command(name = "ember")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the shader file
    file: PathBuf,

    /// Compile and link the stages instead of only splitting them
    #[arg(short, long)]
    check: bool,

    /// Print the source of one stage (vertex, fragment)
    #[arg(short, long)]
    stage: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    app::init_logging(&app::LoggingConfig {
        level: args.log_level.clone(),
    });

    match app::run(&args) {
        Ok(report) => print!("{report}"),
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(log) = e.diagnostic() {
                eprintln!("{log}");
            }
            std::process::exit(1);
        }
    }
}
