//! Dotlens Core Types and Definitions
//!
//! This crate provides the graph model shared by every other Dotlens crate.
//! It includes:
//!
//! - **Identifiers**: Interned element identifiers ([`identifier::Id`])
//! - **Attributes**: Per-element attribute storage ([`attributes::AttributeStore`])
//! - **Render operations**: The xdot drawing payload ([`render_op::RenderOp`])
//! - **Elements**: The update protocol shared by nodes, edges, subgraphs and
//!   the graph itself ([`element::GraphElement`])
//! - **Graph**: The identifier-keyed model with referential integrity and a
//!   change-event queue ([`graph::Graph`])
//! - **Colors** and **geometry** used by the scene bridge
//! - **Engine** selection types shared by configuration and layout code

pub mod attributes;
pub mod color;
pub mod element;
pub mod engine;
pub mod geometry;
pub mod graph;
pub mod identifier;
pub mod render_op;

mod error;

pub use error::GraphError;
