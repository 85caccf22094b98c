use std::path::PathBuf;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    /// Stand-ins for attribute streams a source mesh does not carry.
    pub const DEFAULT_NORMAL: Vec3 = Vec3::ONE;
    pub const DEFAULT_COLOR: Vec3 = Vec3::ONE;
    pub const DEFAULT_UV: Vec2 = Vec2::ZERO;

    pub fn new(position: Vec3, normal: Vec3, color: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            color,
            uv,
        }
    }
}

/// A texture referenced by path; the image itself is decoded by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub path: PathBuf,
    pub name: String,
    pub slot: u32,
}

/// Surface parameters shared by every vertex of one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub shininess: f32,
    pub textures: Vec<Texture>,
}

impl Material {
    pub const DEFAULT_SHININESS: f32 = 1.0;
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vertex::DEFAULT_COLOR,
            shininess: Self::DEFAULT_SHININESS,
            textures: Vec::new(),
        }
    }
}
