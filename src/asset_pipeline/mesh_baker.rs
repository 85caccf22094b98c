use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::geometry::Object;
use crate::model::Vertex;

pub struct GeometryBuffers {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshInfo {
    pub index_count: u32,
    pub first_index: u32,
    pub vertex_offset: u32,
    pub shininess: f32,

    pub model: Mat4,

    // w coordinates are unused
    pub aabb_min: Vec4,
    pub aabb_max: Vec4,
}

pub struct BakedMeshes {
    pub buffers: GeometryBuffers,
    pub meshes: Vec<MeshInfo>,
}

/// Packs every geometry of the objects into one vertex and one index buffer. Indices stay
/// relative to each mesh's `vertex_offset`.
pub fn bake_objects(objects: &[&Object]) -> BakedMeshes {
    let mut buffers = GeometryBuffers {
        vertices: Vec::new(),
        indices: Vec::new(),
    };
    let mut meshes = Vec::new();

    for object in objects {
        let (geometries, _) = object.geometries();

        for (index, geometry) in geometries.iter().enumerate() {
            let vertex_offset = buffers.vertices.len() as u32;
            let first_index = buffers.indices.len() as u32;

            buffers.vertices.extend(geometry.vertices().iter());
            buffers.indices.extend(geometry.indices().iter());

            let (aabb_min, aabb_max) = match geometry.bounding_box() {
                Some(aabb) => (aabb.min.extend(0.0), aabb.max.extend(0.0)),
                None => (Vec4::ZERO, Vec4::ZERO),
            };

            meshes.push(MeshInfo {
                index_count: geometry.indices().len() as u32,
                first_index,
                vertex_offset,
                shininess: geometry.shininess(),
                model: object.model_matrix(index),
                aabb_min,
                aabb_max,
            });
        }
    }

    BakedMeshes { buffers, meshes }
}
