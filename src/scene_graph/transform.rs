use glam::{Mat4, Quat, Vec3};

use crate::loader::manifest::Node;

/// Local transform of a manifest node. Every part is optional in the file and contributes
/// identity when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTransform {
    matrix: Option<Mat4>,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl NodeTransform {
    pub fn from_node(node: &Node) -> Self {
        // Zero-length or non-finite quaternions fall back to no rotation
        let rotation = node
            .rotation
            .map(Quat::from_array)
            .filter(|rotation| rotation.length_squared() > f32::EPSILON && rotation.is_finite())
            .map(Quat::normalize)
            .unwrap_or(Quat::IDENTITY);

        Self {
            matrix: node.matrix.map(|matrix| Mat4::from_cols_array(&matrix)),
            translation: node.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
            rotation,
            scale: node.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
        }
    }

    /// True when an explicit matrix and a non-identity TRS are both present.
    pub fn has_matrix_and_trs(&self) -> bool {
        self.matrix.is_some()
            && (self.translation != Vec3::ZERO
                || self.rotation != Quat::IDENTITY
                || self.scale != Vec3::ONE)
    }

    /// `matrix × T × R × S`. A matrix and a TRS given together both contribute.
    pub fn local_matrix(&self) -> Mat4 {
        let trs = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation);

        match self.matrix {
            Some(matrix) => matrix * trs,
            None => trs,
        }
    }
}
