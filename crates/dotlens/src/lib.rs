//! Dotlens - A viewer and editor core for Graphviz DOT graphs
//!
//! This library loads DOT source into a live graph model, lays it out with
//! Graphviz or an in-process layered layout, and keeps a screen-space scene
//! in step with the model as it is edited.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotlens::{GraphView, config::AppConfig};
//!
//! let mut view = GraphView::new(AppConfig::default());
//! view.load_file("graph.dot").expect("Failed to load graph");
//! view.export_svg("graph.svg").expect("Failed to export");
//! ```

pub mod config;
pub mod export;
pub mod layout;
pub mod scene;
pub mod view;

mod error;

pub use dotlens_core::{attributes, color, element, engine, geometry, graph, identifier, render_op};

pub use error::DotlensError;
pub use view::GraphView;
