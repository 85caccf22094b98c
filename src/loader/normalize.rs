use glam::{Vec2, Vec3};
use itertools::{izip, Either};

use crate::geometry::{Geometry, GeometryError};
use crate::model::{Material, Vertex};

/// Per-vertex attribute arrays of one mesh, as decoded from a source format. Streams the
/// format does not carry are `None`.
#[derive(Debug, Clone, Default)]
pub struct AttributeStreams {
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub uvs: Option<Vec<Vec2>>,
    pub colors: Option<Vec<Vec3>>,
}

impl AttributeStreams {
    fn check_lengths(&self) -> Result<(), GeometryError> {
        let count = self.positions.len();
        let normals = self.normals.as_ref().map_or(count, Vec::len);
        let uvs = self.uvs.as_ref().map_or(count, Vec::len);
        let colors = self.colors.as_ref().map_or(count, Vec::len);

        if normals != count || uvs != count || colors != count {
            return Err(GeometryError::AttributeLengthMismatch {
                positions: count,
                normals,
                uvs,
                colors,
            });
        }

        Ok(())
    }
}

fn stream_or<T: Copy>(stream: Option<Vec<T>>, default: T) -> impl Iterator<Item = T> {
    match stream {
        Some(values) => Either::Left(values.into_iter()),
        None => Either::Right(std::iter::repeat(default)),
    }
}

/// Zips the attribute streams into vertices and builds a validated geometry. Vertices without a
/// color stream take the material color.
pub fn normalize(
    streams: AttributeStreams,
    indices: Vec<u32>,
    material: Material,
) -> Result<Geometry, GeometryError> {
    streams.check_lengths()?;

    let AttributeStreams {
        positions,
        normals,
        uvs,
        colors,
    } = streams;

    let vertices = izip!(
        positions,
        stream_or(normals, Vertex::DEFAULT_NORMAL),
        stream_or(uvs, Vertex::DEFAULT_UV),
        stream_or(colors, material.color)
    )
    .map(|(position, normal, uv, color)| Vertex::new(position, normal, color, uv))
    .collect::<Vec<Vertex>>();

    Geometry::new(vertices, indices, material.textures, material.shininess)
}
