use std::fmt;

use crate::config::DemoConfig;
use crate::geometry::Object;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingModel {
    BlinnPhong,
    Toon,
    OrenNayar,
    CookTorrance,
}

impl ShadingModel {
    pub const ALL: [ShadingModel; 4] = [
        ShadingModel::BlinnPhong,
        ShadingModel::Toon,
        ShadingModel::OrenNayar,
        ShadingModel::CookTorrance,
    ];
}

impl fmt::Display for ShadingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShadingModel::BlinnPhong => "Blinn-Phong",
            ShadingModel::Toon => "Toon",
            ShadingModel::OrenNayar => "Oren-Nayar",
            ShadingModel::CookTorrance => "Cook-Torrance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// The current object drawn once per shading model, side by side.
    Comparison,
    Single(ShadingModel),
}

impl ViewMode {
    /// Comparison, then each shading model in turn, then back to comparison.
    pub fn next(self) -> ViewMode {
        match self {
            ViewMode::Comparison => ViewMode::Single(ShadingModel::ALL[0]),
            ViewMode::Single(model) => {
                let position = ShadingModel::ALL
                    .iter()
                    .position(|&candidate| candidate == model)
                    .unwrap_or(0);
                match ShadingModel::ALL.get(position + 1) {
                    Some(&next) => ViewMode::Single(next),
                    None => ViewMode::Comparison,
                }
            }
        }
    }
}

/// One object to draw, with the transforms for this frame already applied.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub shading: ShadingModel,
    pub object: Object,
}

pub struct DemoState {
    pub config: DemoConfig,
    pub view_mode: ViewMode,
    objects: Vec<Object>,
    current_object: usize,
}

impl DemoState {
    pub fn new(objects: Vec<Object>, config: DemoConfig) -> Self {
        Self {
            config,
            view_mode: ViewMode::Comparison,
            objects,
            current_object: 0,
        }
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn current_object(&self) -> Option<&Object> {
        self.objects.get(self.current_object)
    }

    pub fn next_object(&mut self) {
        if !self.objects.is_empty() {
            self.current_object = (self.current_object + 1) % self.objects.len();
        }
    }

    pub fn previous_object(&mut self) {
        if !self.objects.is_empty() {
            self.current_object = self
                .current_object
                .checked_sub(1)
                .unwrap_or(self.objects.len() - 1);
        }
    }

    pub fn next_view_mode(&mut self) {
        self.view_mode = self.view_mode.next();
    }

    /// Copies of the current object, spun by `time` seconds, centred and scaled to
    /// `norm_size`.
    pub fn draw_list(&self, time: f32) -> Vec<DrawItem> {
        let Some(original) = self.current_object() else {
            return Vec::new();
        };
        let Some((centre, scale)) = original.fit_transform(self.config.norm_size) else {
            return Vec::new();
        };

        let spin = |period: f32| (time % period) / period * 360.0;

        match self.view_mode {
            ViewMode::Comparison => {
                let step = 360.0 / ShadingModel::ALL.len() as f32;

                ShadingModel::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, &shading)| {
                        let mut object = original.clone();
                        object.rotate(0.0, 1.0, 0.0, spin(self.config.comparison_period_secs));
                        object.rotate(0.0, 1.0, 0.0, step * i as f32);
                        object.translate(0.0, 0.0, self.config.comparison_offset);
                        object.scale(scale, scale, scale);
                        object.translate(-centre.x, -centre.y, -centre.z);

                        DrawItem { shading, object }
                    })
                    .collect()
            }
            ViewMode::Single(shading) => {
                let mut object = original.clone();
                object.rotate(0.0, 1.0, 0.0, spin(self.config.single_period_secs));
                object.scale(scale, scale, scale);
                object.translate(-centre.x, -centre.y, -centre.z);

                vec![DrawItem { shading, object }]
            }
        }
    }
}
