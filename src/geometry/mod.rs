use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::math::AABB;
use crate::model::{Texture, Vertex};

pub mod object;

pub use object::Object;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error(
        "Attribute streams differ in length: {positions} positions, {normals} normals, {uvs} UVs, {colors} colors"
    )]
    AttributeLengthMismatch {
        positions: usize,
        normals: usize,
        uvs: usize,
        colors: usize,
    },

    #[error("Index count {index_count} is not a multiple of 3")]
    IncompleteTriangle { index_count: usize },

    #[error("Index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// One renderer-ready mesh: a triangle list, its material and a runtime transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture>,
    shininess: f32,
    transform: Mat4,
}

impl Geometry {
    pub fn new(
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture>,
        shininess: f32,
    ) -> Result<Self, GeometryError> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IncompleteTriangle {
                index_count: indices.len(),
            });
        }

        if let Some(&index) = indices
            .iter()
            .find(|&&index| index as usize >= vertices.len())
        {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        Ok(Self {
            vertices,
            indices,
            textures,
            shininess,
            transform: Mat4::IDENTITY,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Box around the model-space vertex positions. The runtime transform is not applied.
    /// `None` when the geometry has no vertices.
    pub fn bounding_box(&self) -> Option<AABB> {
        AABB::from_points(self.vertices.iter().map(|vertex| vertex.position))
    }

    pub fn reset_transforms(&mut self) {
        self.transform = Mat4::IDENTITY;
    }

    /// Rotates by `angle` degrees around the axis `(x, y, z)`.
    pub fn rotate(&mut self, x: f32, y: f32, z: f32, angle: f32) {
        let axis = Vec3::new(x, y, z).normalize_or_zero();
        if axis == Vec3::ZERO {
            log::warn!("Ignoring rotation around a zero-length axis");
            return;
        }

        self.transform *= Mat4::from_axis_angle(axis, angle.to_radians());
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.transform *= Mat4::from_scale(Vec3::new(x, y, z));
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.transform *= Mat4::from_translation(Vec3::new(x, y, z));
    }
}
