pub mod transform;
pub mod walker;

pub use transform::NodeTransform;
pub use walker::{MeshInstance, SceneWalker, WalkError};
