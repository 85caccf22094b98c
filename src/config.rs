#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Deepest node nesting the scene-graph walker follows before giving up.
    pub max_node_depth: usize,
    /// Swap U and V of manifest texture coordinates.
    pub swap_uv_axes: bool,
    /// Give primitives without an index accessor the sequential list `0..n`.
    pub generate_missing_indices: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_node_depth: 64,
            swap_uv_axes: false,
            generate_missing_indices: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Largest extent a model is scaled to before drawing.
    pub norm_size: f32,
    pub comparison_period_secs: f32,
    pub single_period_secs: f32,
    /// Distance each copy is pushed out from the centre in the comparison view.
    pub comparison_offset: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            norm_size: 1.0,
            comparison_period_secs: 30.0,
            single_period_secs: 20.0,
            comparison_offset: 0.7,
        }
    }
}
