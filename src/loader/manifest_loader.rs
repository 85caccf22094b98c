use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec2;

use crate::config::LoadConfig;
use crate::geometry::Geometry;
use crate::loader::accessor::{self, AccessorError, AccessorShape, IndexComponent};
use crate::loader::manifest::{Accessor, Manifest, Primitive};
use crate::loader::normalize::{normalize, AttributeStreams};
use crate::loader::{container, read_file, LoadError, LoadedModel, ModelLoader};
use crate::model::{Material, Texture};
use crate::scene_graph::{SceneWalker, WalkError};

/// Loads a JSON manifest with external binary buffers, or the single-file container holding both.
pub struct ManifestLoader<'a> {
    config: &'a LoadConfig,
}

impl<'a> ManifestLoader<'a> {
    pub fn new(config: &'a LoadConfig) -> Self {
        Self { config }
    }
}

impl ModelLoader for ManifestLoader<'_> {
    fn load(&self, path: &Path) -> Result<LoadedModel, LoadError> {
        let data = read_file(path)?;

        let (json, embedded) = if container::is_container(&data) {
            let container = container::parse(&data).map_err(|reason| LoadError::InvalidContainer {
                path: path.to_path_buf(),
                reason,
            })?;
            (container.json, container.bin)
        } else {
            (&data[..], None)
        };

        let manifest: Manifest =
            serde_json::from_slice(json).map_err(|source| LoadError::InvalidManifest {
                path: path.to_path_buf(),
                source,
            })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let buffers = resolve_buffers(path, base_dir, &manifest, embedded)?;

        let document = Document {
            path,
            base_dir,
            manifest: &manifest,
            buffers: &buffers,
            config: self.config,
        };

        let model = document.assemble()?;
        log::info!(
            "{}: {} geometries from {} meshes",
            path.display(),
            model.geometries.len(),
            manifest.meshes.len()
        );

        Ok(model)
    }
}

fn resolve_buffers(
    path: &Path,
    base_dir: &Path,
    manifest: &Manifest,
    embedded: Option<&[u8]>,
) -> Result<Vec<Vec<u8>>, LoadError> {
    manifest
        .buffers
        .iter()
        .enumerate()
        .map(|(index, buffer)| match (&buffer.uri, embedded) {
            (Some(uri), _) if uri.starts_with("data:") => Err(LoadError::InvalidContainer {
                path: path.to_path_buf(),
                reason: format!("buffer {} uses an embedded data URI", index),
            }),
            (Some(uri), _) => read_file(&base_dir.join(uri)),
            (None, Some(bin)) if index == 0 => Ok(bin.to_vec()),
            (None, _) => Err(LoadError::MissingReference {
                path: path.to_path_buf(),
                kind: "buffer payload",
                index,
            }),
        })
        .collect()
}

/// Parsed manifest plus its resolved buffers, for the duration of one load.
struct Document<'a> {
    path: &'a Path,
    base_dir: &'a Path,
    manifest: &'a Manifest,
    buffers: &'a [Vec<u8>],
    config: &'a LoadConfig,
}

impl Document<'_> {
    fn assemble(&self) -> Result<LoadedModel, LoadError> {
        let roots = self.manifest.root_nodes();
        let instances = SceneWalker::new(&self.manifest.nodes, self.config.max_node_depth)
            .walk_roots(&roots)
            .map_err(|error| self.walk_error(error))?;

        let mut model = LoadedModel::default();
        let mut mesh_geometries: HashMap<usize, Vec<Geometry>> = HashMap::new();

        for instance in instances {
            if !mesh_geometries.contains_key(&instance.mesh) {
                let geometries = self.load_mesh(instance.mesh)?;
                mesh_geometries.insert(instance.mesh, geometries);
            }

            for geometry in &mesh_geometries[&instance.mesh] {
                model.geometries.push(geometry.clone());
                model.transforms.push(instance.world);
            }
        }

        Ok(model)
    }

    fn walk_error(&self, error: WalkError) -> LoadError {
        let path = self.path.to_path_buf();
        match error {
            WalkError::MissingNode { node } => LoadError::MissingReference {
                path,
                kind: "node",
                index: node,
            },
            WalkError::Cycle { node } => LoadError::NodeCycle { path, node },
            WalkError::SharedNode { node } => LoadError::SharedNode { path, node },
            WalkError::DepthExceeded { node, max_depth } => LoadError::DepthExceeded {
                path,
                node,
                max_depth,
            },
        }
    }

    fn missing(&self, kind: &'static str, index: usize) -> LoadError {
        LoadError::MissingReference {
            path: self.path.to_path_buf(),
            kind,
            index,
        }
    }

    fn accessor_error(&self, accessor: usize, source: AccessorError) -> LoadError {
        LoadError::Accessor {
            path: self.path.to_path_buf(),
            accessor,
            source,
        }
    }

    fn load_mesh(&self, mesh_index: usize) -> Result<Vec<Geometry>, LoadError> {
        let mesh = self
            .manifest
            .meshes
            .get(mesh_index)
            .ok_or_else(|| self.missing("mesh", mesh_index))?;

        log::debug!(
            "Normalizing mesh {} ({}), {} primitives",
            mesh_index,
            mesh.name.as_deref().unwrap_or("Unnamed"),
            mesh.primitives.len()
        );

        mesh.primitives
            .iter()
            .map(|primitive| self.load_primitive(mesh_index, primitive))
            .collect()
    }

    fn load_primitive(&self, mesh_index: usize, primitive: &Primitive) -> Result<Geometry, LoadError> {
        if primitive.mode() != Primitive::MODE_TRIANGLES {
            return Err(LoadError::UnsupportedPrimitiveMode {
                path: self.path.to_path_buf(),
                mesh: mesh_index,
                mode: primitive.mode(),
            });
        }

        let position_accessor =
            primitive
                .attributes
                .get("POSITION")
                .ok_or_else(|| LoadError::MissingAttribute {
                    path: self.path.to_path_buf(),
                    mesh: mesh_index,
                    attribute: "POSITION",
                })?;

        let positions = self.read_vec3(*position_accessor)?;
        let normals = primitive
            .attributes
            .get("NORMAL")
            .map(|&index| self.read_vec3(index))
            .transpose()?;
        let uvs = primitive
            .attributes
            .get("TEXCOORD_0")
            .map(|&index| self.read_uvs(index))
            .transpose()?;
        let colors = primitive
            .attributes
            .get("COLOR_0")
            .map(|&index| self.read_colors(index))
            .transpose()?;

        let indices = match primitive.indices {
            Some(index) => self.read_indices(index)?,
            None if self.config.generate_missing_indices => (0..positions.len() as u32).collect(),
            None => {
                return Err(LoadError::MissingAttribute {
                    path: self.path.to_path_buf(),
                    mesh: mesh_index,
                    attribute: "indices",
                })
            }
        };

        let material = self.material(primitive.material)?;
        let streams = AttributeStreams {
            positions,
            normals,
            uvs,
            colors,
        };

        normalize(streams, indices, material).map_err(|source| LoadError::Geometry {
            path: self.path.to_path_buf(),
            mesh: mesh_index,
            source,
        })
    }

    /// Upper bound for accessors without a buffer view: they decode as zeros, but never to more
    /// bytes than the file's buffers hold together.
    fn payload_len(&self) -> usize {
        self.buffers.iter().map(Vec::len).sum()
    }

    fn accessor(&self, index: usize) -> Result<&Accessor, LoadError> {
        self.manifest
            .accessors
            .get(index)
            .ok_or_else(|| self.missing("accessor", index))
    }

    /// Bytes of the accessor's buffer view and its stride, or `None` for a view-less accessor.
    fn view_bytes(
        &self,
        index: usize,
        accessor: &Accessor,
    ) -> Result<Option<(&[u8], Option<usize>)>, LoadError> {
        let Some(view_index) = accessor.buffer_view else {
            return Ok(None);
        };

        let view = self
            .manifest
            .buffer_views
            .get(view_index)
            .ok_or_else(|| self.missing("buffer view", view_index))?;
        let buffer = self
            .buffers
            .get(view.buffer)
            .ok_or_else(|| self.missing("buffer", view.buffer))?;

        let bytes = view
            .byte_offset
            .checked_add(view.byte_length)
            .and_then(|end| buffer.get(view.byte_offset..end))
            .ok_or_else(|| {
                self.accessor_error(
                    index,
                    AccessorError::OutOfBounds {
                        offset: view.byte_offset,
                        length: view.byte_length,
                        available: buffer.len(),
                    },
                )
            })?;

        Ok(Some((bytes, view.byte_stride)))
    }

    fn read_floats(
        &self,
        index: usize,
        allowed: &[AccessorShape],
    ) -> Result<(Vec<f32>, AccessorShape), LoadError> {
        let accessor = self.accessor(index)?;
        let shape = AccessorShape::from_type_name(&accessor.accessor_type)
            .map_err(|source| self.accessor_error(index, source))?;

        if accessor.component_type != accessor::COMPONENT_FLOAT {
            return Err(self.accessor_error(
                index,
                AccessorError::UnsupportedComponentType {
                    code: accessor.component_type,
                },
            ));
        }
        if !allowed.contains(&shape) {
            return Err(self.accessor_error(
                index,
                AccessorError::UnexpectedShape {
                    expected: allowed[0],
                    found: shape,
                },
            ));
        }

        let floats = match self.view_bytes(index, accessor)? {
            Some((bytes, stride)) => {
                accessor::read_floats(bytes, accessor.byte_offset, accessor.count, shape, stride)
                    .map_err(|source| self.accessor_error(index, source))?
            }
            None => {
                accessor::check_zeroed(accessor.count, shape.components() * 4, self.payload_len())
                    .map_err(|source| self.accessor_error(index, source))?;
                vec![0.0; accessor.count * shape.components()]
            }
        };

        Ok((floats, shape))
    }

    fn read_vec3(&self, index: usize) -> Result<Vec<glam::Vec3>, LoadError> {
        let (floats, _) = self.read_floats(index, &[AccessorShape::Vec3])?;
        Ok(accessor::group_vec3(&floats))
    }

    fn read_uvs(&self, index: usize) -> Result<Vec<Vec2>, LoadError> {
        let (floats, _) = self.read_floats(index, &[AccessorShape::Vec2])?;
        let uvs = accessor::group_vec2(&floats);

        if self.config.swap_uv_axes {
            Ok(uvs.into_iter().map(|uv| Vec2::new(uv.y, uv.x)).collect())
        } else {
            Ok(uvs)
        }
    }

    fn read_colors(&self, index: usize) -> Result<Vec<glam::Vec3>, LoadError> {
        let (floats, shape) = self.read_floats(index, &[AccessorShape::Vec3, AccessorShape::Vec4])?;

        Ok(match shape {
            AccessorShape::Vec4 => accessor::group_vec4_rgb(&floats),
            _ => accessor::group_vec3(&floats),
        })
    }

    fn read_indices(&self, index: usize) -> Result<Vec<u32>, LoadError> {
        let accessor = self.accessor(index)?;

        let component = IndexComponent::from_code(accessor.component_type).ok_or_else(|| {
            self.accessor_error(
                index,
                AccessorError::UnsupportedIndexComponent {
                    code: accessor.component_type,
                },
            )
        })?;
        AccessorShape::from_type_name(&accessor.accessor_type)
            .and_then(|shape| shape.expect(AccessorShape::Scalar))
            .map_err(|source| self.accessor_error(index, source))?;

        match self.view_bytes(index, accessor)? {
            Some((bytes, stride)) => {
                accessor::read_indices(bytes, accessor.byte_offset, accessor.count, component, stride)
                    .map_err(|source| self.accessor_error(index, source))
            }
            None => {
                accessor::check_zeroed(accessor.count, component.byte_width(), self.payload_len())
                    .map_err(|source| self.accessor_error(index, source))?;
                Ok(vec![0; accessor.count])
            }
        }
    }

    fn material(&self, index: Option<usize>) -> Result<Material, LoadError> {
        let Some(index) = index else {
            return Ok(Material::default());
        };

        let material = self
            .manifest
            .materials
            .get(index)
            .ok_or_else(|| self.missing("material", index))?;
        let name = material
            .name
            .clone()
            .unwrap_or_else(|| format!("Material {}", index));

        let base_color = material
            .pbr_metallic_roughness
            .as_ref()
            .and_then(|pbr| pbr.base_color_texture.as_ref());

        let textures = match base_color {
            Some(texture_ref) => self
                .texture_path(texture_ref.index)?
                .map(|path| Texture {
                    path,
                    name,
                    slot: 0,
                })
                .into_iter()
                .collect(),
            None => Vec::new(),
        };

        Ok(Material {
            textures,
            ..Material::default()
        })
    }

    /// File path of a texture's image, relative paths resolved against the manifest directory.
    fn texture_path(&self, texture_index: usize) -> Result<Option<PathBuf>, LoadError> {
        let texture = self
            .manifest
            .textures
            .get(texture_index)
            .ok_or_else(|| self.missing("texture", texture_index))?;

        let Some(image_index) = texture.source else {
            return Ok(None);
        };
        let image = self
            .manifest
            .images
            .get(image_index)
            .ok_or_else(|| self.missing("image", image_index))?;

        match &image.uri {
            Some(uri) if !uri.starts_with("data:") => Ok(Some(self.base_dir.join(uri))),
            _ => {
                log::warn!(
                    "{}: image {} is not an external file, skipping its texture",
                    self.path.display(),
                    image_index
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use byteorder::{LittleEndian, WriteBytesExt};
    use glam::Vec3;

    use super::*;
    use crate::loader::container::tests::build_container;

    const JSON: &str = r#"{
  "nodes": [{ "mesh": 0, "translation": [0.0, 0.0, 2.0] }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }],
  "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
  "buffers": [{ "byteLength": 36 }]
}"#;

    fn triangle_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.write_f32::<LittleEndian>(value).unwrap();
        }
        bytes
    }

    #[test]
    fn loads_single_file_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triangle.glb");
        std::fs::write(&path, build_container(JSON, &triangle_bytes())).unwrap();

        let config = LoadConfig::default();
        let model = ManifestLoader::new(&config).load(&path).unwrap();

        assert_eq!(model.geometries.len(), 1);
        assert_eq!(model.geometries[0].indices(), &[0, 1, 2]);
        assert_eq!(model.geometries[0].vertices()[2].position, Vec3::Y);
        assert_eq!(model.transforms[0].w_axis.truncate(), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn empty_bin_chunk_is_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.glb");
        std::fs::write(&path, build_container(JSON, &[])).unwrap();

        let config = LoadConfig::default();
        let error = ManifestLoader::new(&config).load(&path).unwrap_err();
        assert!(matches!(
            error,
            LoadError::Accessor {
                accessor: 0,
                source: AccessorError::OutOfBounds { available: 0, .. },
                ..
            }
        ));
    }
}
