//! Toit mind map core
//!
//! This crate contains the renderer-independent part of the mind map:
//! - [`math`]: transform math and projection conventions
//! - [`SceneNode`]: hierarchical transform node with cached world matrix
//! - [`Branch`]: undirected link between two nodes
//! - [`SceneGraph`]: node arena, hierarchy, branches, selection and layout
//! - [`NodeRecord`] / [`NodeStore`]: persisted snapshot shape and storage

pub mod branch;
pub mod error;
pub mod graph;
pub mod math;
pub mod node;
pub mod record;
pub mod store;

pub use branch::*;
pub use error::*;
pub use graph::*;
pub use node::*;
pub use record::*;
pub use store::*;
