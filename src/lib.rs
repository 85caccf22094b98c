//! Model loading and geometry assembly for a real-time shading demo.
//!
//! Files are read either through the manifest loader (JSON scene manifest with binary buffers,
//! walked node by node) or through the importer path (third-party importers with the hierarchy
//! flattened). Both produce the same [`geometry::Geometry`] schema, grouped into an
//! [`geometry::Object`] that carries per-geometry transforms for the renderer.

pub mod asset_pipeline;
pub mod config;
pub mod demo;
pub mod geometry;
pub mod loader;
pub mod math;
pub mod model;
pub mod scene_graph;

pub use config::{DemoConfig, LoadConfig};
pub use geometry::{Geometry, GeometryError, Object};
pub use loader::{LoadError, LoadedModel, LoaderKind};
pub use model::{Material, Texture, Vertex};
