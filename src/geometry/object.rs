use std::path::Path;

use glam::{Mat4, Vec3};

use crate::config::LoadConfig;
use crate::geometry::Geometry;
use crate::loader::{LoadError, LoadedModel, LoaderKind};
use crate::math::AABB;

/// One loaded model instance. Cloning copies every geometry, so each copy carries its own
/// transform state.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    geometries: Vec<Geometry>,
    base_transforms: Vec<Mat4>,
}

impl Object {
    pub fn load(path: impl AsRef<Path>, kind: LoaderKind, config: &LoadConfig) -> Result<Self, LoadError> {
        let model = kind.load(path.as_ref(), config)?;
        Ok(Self::from_loaded(model))
    }

    pub fn from_loaded(model: LoadedModel) -> Self {
        let LoadedModel {
            geometries,
            mut transforms,
        } = model;

        // Missing transforms are identity
        transforms.resize(geometries.len(), Mat4::IDENTITY);

        Self {
            geometries,
            base_transforms: transforms,
        }
    }

    pub fn from_geometries(geometries: Vec<Geometry>) -> Self {
        let base_transforms = vec![Mat4::IDENTITY; geometries.len()];
        Self {
            geometries,
            base_transforms,
        }
    }

    pub fn geometries(&self) -> (&[Geometry], &[Mat4]) {
        (&self.geometries, &self.base_transforms)
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn geometry(&self, index: usize) -> Option<&Geometry> {
        self.geometries.get(index)
    }

    pub fn geometry_mut(&mut self, index: usize) -> Option<&mut Geometry> {
        self.geometries.get_mut(index)
    }

    pub fn triangle_count(&self) -> usize {
        self.geometries.iter().map(Geometry::triangle_count).sum()
    }

    /// Matrix the renderer uses for geometry `index`: runtime transform applied after the base
    /// transform baked in at load time.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn model_matrix(&self, index: usize) -> Mat4 {
        self.geometries[index].transform() * self.base_transforms[index]
    }

    /// Union of the model-space boxes of every geometry. `None` when no geometry has vertices.
    pub fn bounding_box(&self) -> Option<AABB> {
        self.geometries
            .iter()
            .filter_map(Geometry::bounding_box)
            .reduce(|a, b| a.union(&b))
    }

    /// Like [`Object::bounding_box`], but each geometry's box is first moved by its base
    /// transform.
    pub fn placed_bounding_box(&self) -> Option<AABB> {
        self.geometries
            .iter()
            .zip(&self.base_transforms)
            .filter_map(|(geometry, base)| geometry.bounding_box().map(|aabb| aabb.transformed(base)))
            .reduce(|a, b| a.union(&b))
    }

    /// Centre of the bounding box and the uniform scale that makes its largest extent
    /// `norm_size`.
    pub fn fit_transform(&self, norm_size: f32) -> Option<(Vec3, f32)> {
        let aabb = self.bounding_box()?;
        let max_extent = aabb.size().max_element();
        let scale = if max_extent > 0.0 {
            norm_size / max_extent
        } else {
            1.0
        };

        Some((aabb.center(), scale))
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        for geometry in &mut self.geometries {
            geometry.set_shininess(shininess);
        }
    }

    pub fn reset_transforms(&mut self) {
        for geometry in &mut self.geometries {
            geometry.reset_transforms();
        }
    }

    pub fn rotate(&mut self, x: f32, y: f32, z: f32, angle: f32) {
        for geometry in &mut self.geometries {
            geometry.rotate(x, y, z, angle);
        }
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        for geometry in &mut self.geometries {
            geometry.scale(x, y, z);
        }
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        for geometry in &mut self.geometries {
            geometry.translate(x, y, z);
        }
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn rotate_geometry(&mut self, index: usize, x: f32, y: f32, z: f32, angle: f32) {
        self.geometries[index].rotate(x, y, z, angle);
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn scale_geometry(&mut self, index: usize, x: f32, y: f32, z: f32) {
        self.geometries[index].scale(x, y, z);
    }

    /// # Panics
    /// If `index` is out of range.
    pub fn translate_geometry(&mut self, index: usize, x: f32, y: f32, z: f32) {
        self.geometries[index].translate(x, y, z);
    }
}
