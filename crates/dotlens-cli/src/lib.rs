//! CLI logic for the Dotlens graph tool.
//!
//! Loads a DOT file, lays it out and writes it as SVG, DOT or xdot
//! depending on the output file's extension.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::Path};

use log::info;

use dotlens::{DotlensError, GraphView, engine::LayoutMethod, export::dot::DotWriter};

/// What the output path asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Svg,
    Dot,
    Xdot,
}

impl OutputFormat {
    fn from_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("dot" | "gv") => Self::Dot,
            Some("xdot") => Self::Xdot,
            _ => Self::Svg,
        }
    }
}

/// Run the Dotlens CLI application
///
/// # Errors
///
/// Returns `DotlensError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Layout errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), DotlensError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing graph"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(command) = &args.layout_command {
        app_config.layout.command = Some(command.clone());
    }
    if let Some(method) = &args.method {
        app_config.layout.method = method
            .parse::<LayoutMethod>()
            .map_err(|err| DotlensError::Config(format!("{err}: {method}")))?;
    }

    let mut view = GraphView::new(app_config);
    view.load_file(&args.input)?;

    let format = OutputFormat::from_path(&args.output);
    match format {
        OutputFormat::Svg => view.export_svg(&args.output)?,
        OutputFormat::Dot => view.save_dot(&args.output)?,
        OutputFormat::Xdot => {
            let text = DotWriter::new(view.graph()).with_layout(true).write();
            fs::write(&args.output, text)?;
        }
    }

    info!(output_file = args.output, format:?; "Output written successfully");
    Ok(())
}
