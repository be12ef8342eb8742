//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// spotlite - a small terminal music player for one folder of audio files.
#[derive(Parser, Debug)]
#[command(name = "spotlite")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Music folder to scan. Overrides `library.folder` from the config file.
    pub folder: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `spotlite=trace`. `RUST_LOG` still wins.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}
