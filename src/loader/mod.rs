use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glam::Mat4;
use thiserror::Error;

use crate::config::LoadConfig;
use crate::geometry::{Geometry, GeometryError};

pub mod accessor;
pub mod container;
pub mod importer;
pub mod manifest;
pub mod manifest_loader;
pub mod normalize;

pub use accessor::AccessorError;
pub use importer::ImporterLoader;
pub use manifest_loader::ManifestLoader;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not import {}: {reason}", path.display())]
    ImportFailed { path: PathBuf, reason: String },

    #[error("Invalid manifest {}: {source}", path.display())]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid container {}: {reason}", path.display())]
    InvalidContainer { path: PathBuf, reason: String },

    #[error("{}: {kind} {index} does not exist", path.display())]
    MissingReference {
        path: PathBuf,
        kind: &'static str,
        index: usize,
    },

    #[error("{}: mesh {mesh} has no {attribute} attribute", path.display())]
    MissingAttribute {
        path: PathBuf,
        mesh: usize,
        attribute: &'static str,
    },

    #[error("{}: accessor {accessor}: {source}", path.display())]
    Accessor {
        path: PathBuf,
        accessor: usize,
        #[source]
        source: AccessorError,
    },

    #[error("{}: mesh {mesh}: {source}", path.display())]
    Geometry {
        path: PathBuf,
        mesh: usize,
        #[source]
        source: GeometryError,
    },

    #[error("{}: mesh {mesh} uses unsupported primitive mode {mode}", path.display())]
    UnsupportedPrimitiveMode {
        path: PathBuf,
        mesh: usize,
        mode: u32,
    },

    #[error("{}: node {node} is its own ancestor", path.display())]
    NodeCycle { path: PathBuf, node: usize },

    #[error("{}: node {node} is reachable from more than one parent", path.display())]
    SharedNode { path: PathBuf, node: usize },

    #[error("{}: node {node} is nested deeper than {max_depth} levels", path.display())]
    DepthExceeded {
        path: PathBuf,
        node: usize,
        max_depth: usize,
    },

    #[error("Unknown loader kind {tag:?} (expected \"gltf\" or \"assimp\")")]
    UnsupportedLoaderKind { tag: String },
}

/// Geometries of one file, each paired with the transform its placement in the file implies.
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    pub geometries: Vec<Geometry>,
    pub transforms: Vec<Mat4>,
}

pub trait ModelLoader {
    fn load(&self, path: &Path) -> Result<LoadedModel, LoadError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// JSON manifest plus binary payload, walked node by node.
    Manifest,
    /// Format-agnostic importer with node transforms baked into the vertices.
    Importer,
}

impl LoaderKind {
    /// Manifest loader for `.gltf`/`.glb`, importer for everything else.
    pub fn for_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("gltf") | Some("glb") => LoaderKind::Manifest,
            _ => LoaderKind::Importer,
        }
    }

    pub fn load(self, path: &Path, config: &LoadConfig) -> Result<LoadedModel, LoadError> {
        match self {
            LoaderKind::Manifest => ManifestLoader::new(config).load(path),
            LoaderKind::Importer => ImporterLoader::new(config).load(path),
        }
    }
}

impl FromStr for LoaderKind {
    type Err = LoadError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_ascii_lowercase().as_str() {
            "gltf" | "manifest" => Ok(LoaderKind::Manifest),
            "assimp" | "importer" | "import" => Ok(LoaderKind::Importer),
            _ => Err(LoadError::UnsupportedLoaderKind {
                tag: tag.to_string(),
            }),
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderKind::Manifest => f.write_str("gltf"),
            LoaderKind::Importer => f.write_str("assimp"),
        }
    }
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_kind_from_tag() {
        assert_eq!("GLTF".parse::<LoaderKind>().unwrap(), LoaderKind::Manifest);
        assert_eq!("Assimp".parse::<LoaderKind>().unwrap(), LoaderKind::Importer);
        assert!(matches!(
            "fbx".parse::<LoaderKind>(),
            Err(LoadError::UnsupportedLoaderKind { tag }) if tag == "fbx"
        ));
    }

    #[test]
    fn loader_kind_from_extension() {
        assert_eq!(LoaderKind::for_path(Path::new("a/b.gltf")), LoaderKind::Manifest);
        assert_eq!(LoaderKind::for_path(Path::new("scene.GLB")), LoaderKind::Manifest);
        assert_eq!(LoaderKind::for_path(Path::new("teapot.obj")), LoaderKind::Importer);
        assert_eq!(LoaderKind::for_path(Path::new("noextension")), LoaderKind::Importer);
    }

    #[test]
    fn unreadable_files_name_the_path() {
        let error = read_file(Path::new("/definitely/not/here.gltf")).unwrap_err();
        assert!(matches!(error, LoadError::FileUnreadable { .. }));
        assert!(error.to_string().contains("/definitely/not/here.gltf"));
    }
}
