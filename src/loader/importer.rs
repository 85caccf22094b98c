use std::path::Path;

use glam::{Mat3, Mat4, Vec2, Vec3};
use gltf::mesh::Mode;

use crate::config::LoadConfig;
use crate::geometry::Geometry;
use crate::loader::accessor::{group_vec2, group_vec3};
use crate::loader::normalize::{normalize, AttributeStreams};
use crate::loader::{LoadError, LoadedModel, ModelLoader};
use crate::model::{Material, Vertex};

/// Shininess of imported materials that do not specify one.
const DEFAULT_IMPORTED_SHININESS: f32 = 0.0;

/// Loads through general-purpose importers, triangulated and with the node hierarchy flattened
/// into the vertex data. Every geometry gets an identity base transform.
///
/// Imported geometries carry no textures: texture acquisition is not implemented on this path.
pub struct ImporterLoader<'a> {
    config: &'a LoadConfig,
}

impl<'a> ImporterLoader<'a> {
    pub fn new(config: &'a LoadConfig) -> Self {
        Self { config }
    }
}

impl ModelLoader for ImporterLoader<'_> {
    fn load(&self, path: &Path) -> Result<LoadedModel, LoadError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        let geometries = match extension.as_deref() {
            Some("obj") => import_obj(path)?,
            Some("gltf") | Some("glb") => self.import_gltf(path)?,
            _ => {
                return Err(LoadError::ImportFailed {
                    path: path.to_path_buf(),
                    reason: "no importer handles this file extension".to_string(),
                })
            }
        };

        let transforms = vec![Mat4::IDENTITY; geometries.len()];
        Ok(LoadedModel {
            geometries,
            transforms,
        })
    }
}

fn import_failed(path: &Path, reason: impl ToString) -> LoadError {
    LoadError::ImportFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn import_obj(path: &Path) -> Result<Vec<Geometry>, LoadError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, materials) = tobj::load_obj(path, &options).map_err(|err| import_failed(path, err))?;
    let materials = materials.unwrap_or_else(|err| {
        log::warn!("{}: could not load materials: {}", path.display(), err);
        Vec::new()
    });

    log::info!(
        "{}: {} meshes, {} materials",
        path.display(),
        models.len(),
        materials.len()
    );

    models
        .into_iter()
        .enumerate()
        .map(|(index, model)| {
            let mesh = model.mesh;
            let source = mesh.material_id.and_then(|id| materials.get(id));

            let material = Material {
                color: source
                    .and_then(|material| material.diffuse)
                    .map(Vec3::from)
                    .unwrap_or(Vertex::DEFAULT_COLOR),
                shininess: source
                    .and_then(|material| material.shininess)
                    .unwrap_or(DEFAULT_IMPORTED_SHININESS),
                textures: Vec::new(),
            };

            let streams = AttributeStreams {
                positions: group_vec3(&mesh.positions),
                normals: (!mesh.normals.is_empty()).then(|| group_vec3(&mesh.normals)),
                uvs: (!mesh.texcoords.is_empty()).then(|| group_vec2(&mesh.texcoords)),
                colors: None,
            };

            normalize(streams, mesh.indices, material).map_err(|source| LoadError::Geometry {
                path: path.to_path_buf(),
                mesh: index,
                source,
            })
        })
        .collect()
}

impl ImporterLoader<'_> {
    fn import_gltf(&self, path: &Path) -> Result<Vec<Geometry>, LoadError> {
        let (document, buffers, _images) = gltf::import(path).map_err(|err| import_failed(path, err))?;

        log::info!(
            "{}: {} meshes, {} materials, {} textures",
            path.display(),
            document.meshes().len(),
            document.materials().len(),
            document.textures().len()
        );

        let mut geometries = Vec::new();
        let mut visited = vec![false; document.nodes().len()];
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());

        let flatten = Flatten {
            path,
            buffers: &buffers,
        };

        match scene {
            Some(scene) => {
                for node in scene.nodes() {
                    self.flatten_node(&flatten, &node, Mat4::IDENTITY, 0, &mut visited, &mut geometries)?;
                }
            }
            None => log::warn!("{}: no scenes to import", path.display()),
        }

        Ok(geometries)
    }

    fn flatten_node(
        &self,
        flatten: &Flatten<'_>,
        node: &gltf::Node,
        parent: Mat4,
        depth: usize,
        visited: &mut [bool],
        geometries: &mut Vec<Geometry>,
    ) -> Result<(), LoadError> {
        let Flatten { path, buffers } = *flatten;

        // Also catches cycles, which revisit a node
        if visited[node.index()] {
            return Err(LoadError::SharedNode {
                path: path.to_path_buf(),
                node: node.index(),
            });
        }
        visited[node.index()] = true;

        if depth >= self.config.max_node_depth {
            return Err(LoadError::DepthExceeded {
                path: path.to_path_buf(),
                node: node.index(),
                max_depth: self.config.max_node_depth,
            });
        }

        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if let Some(geometry) = import_primitive(path, buffers, &mesh, &primitive, world)? {
                    geometries.push(geometry);
                }
            }
        }

        for child in node.children() {
            self.flatten_node(flatten, &child, world, depth + 1, visited, geometries)?;
        }

        Ok(())
    }
}

/// File-wide inputs of the glTF hierarchy flattening.
#[derive(Clone, Copy)]
struct Flatten<'a> {
    path: &'a Path,
    buffers: &'a [gltf::buffer::Data],
}

fn import_primitive(
    path: &Path,
    buffers: &[gltf::buffer::Data],
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    world: Mat4,
) -> Result<Option<Geometry>, LoadError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let Some(positions) = reader.read_positions() else {
        log::warn!(
            "{}: mesh {} has a primitive without positions, skipping it",
            path.display(),
            mesh.index()
        );
        return Ok(None);
    };

    let normal_matrix = Mat3::from_mat4(world);
    let normal_matrix = if normal_matrix.determinant().abs() > f32::EPSILON {
        normal_matrix.inverse().transpose()
    } else {
        normal_matrix
    };

    let positions: Vec<Vec3> = positions
        .map(|position| world.transform_point3(Vec3::from(position)))
        .collect();
    let normals = reader.read_normals().map(|normals| {
        normals
            .map(|normal| (normal_matrix * Vec3::from(normal)).normalize_or_zero())
            .collect()
    });
    let uvs = reader
        .read_tex_coords(0)
        .map(|uvs| uvs.into_f32().map(Vec2::from).collect());

    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let Some(indices) = triangulate(primitive.mode(), indices) else {
        log::warn!(
            "{}: mesh {} has a {:?} primitive, skipping it",
            path.display(),
            mesh.index(),
            primitive.mode()
        );
        return Ok(None);
    };

    let base_color = primitive.material().pbr_metallic_roughness().base_color_factor();
    let material = Material {
        color: Vec3::from_slice(&base_color[..3]),
        shininess: DEFAULT_IMPORTED_SHININESS,
        textures: Vec::new(),
    };

    let streams = AttributeStreams {
        positions,
        normals,
        uvs,
        colors: None,
    };

    normalize(streams, indices, material)
        .map(Some)
        .map_err(|source| LoadError::Geometry {
            path: path.to_path_buf(),
            mesh: mesh.index(),
            source,
        })
}

/// Rewrites strip and fan index lists as triangle lists. `None` for point and line modes.
fn triangulate(mode: Mode, indices: Vec<u32>) -> Option<Vec<u32>> {
    match mode {
        Mode::Triangles => Some(indices),
        Mode::TriangleStrip => Some(
            indices
                .windows(3)
                .enumerate()
                .flat_map(|(i, window)| {
                    // Every other triangle flips to keep the winding consistent
                    if i % 2 == 0 {
                        [window[0], window[1], window[2]]
                    } else {
                        [window[1], window[0], window[2]]
                    }
                })
                .collect(),
        ),
        Mode::TriangleFan => match indices.split_first() {
            Some((&hub, rest)) => Some(
                rest.windows(2)
                    .flat_map(|pair| [hub, pair[0], pair[1]])
                    .collect(),
            ),
            None => Some(Vec::new()),
        },
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => None,
    }
}
