//! Command-line argument definitions for the Dotlens CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, layout selection and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Dotlens graph tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input DOT file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Output path; `.dot` saves the graph, `.xdot` saves it with layout,
    /// anything else is written as SVG
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Layout command line, e.g. "dot -Txdot"
    #[arg(long)]
    pub layout_command: Option<String>,

    /// Layout method (external, embedded)
    #[arg(long)]
    pub method: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
