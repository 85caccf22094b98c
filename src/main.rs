use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use shading_demo::asset_pipeline::mesh_baker::bake_objects;
use shading_demo::demo::DemoState;
use shading_demo::{DemoConfig, LoadConfig, LoaderKind, Object};

/// Loads models and reports the geometry the renderer would receive.
#[derive(Debug, Parser)]
struct Args {
    /// Model files
    #[arg(required = true)]
    models: Vec<PathBuf>,

    /// Loader to use ("gltf" or "assimp"); picked from the file extension when omitted
    #[arg(long)]
    loader: Option<LoaderKind>,

    /// Deepest node nesting to follow
    #[arg(long, default_value_t = LoadConfig::default().max_node_depth)]
    max_depth: usize,

    /// Swap U and V of manifest texture coordinates
    #[arg(long)]
    swap_uv: bool,

    /// Override the shininess of every loaded model
    #[arg(long)]
    shininess: Option<f32>,

    /// Print the draw list of the comparison view at this time, in seconds
    #[arg(long)]
    time: Option<f32>,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = LoadConfig {
        max_node_depth: args.max_depth,
        swap_uv_axes: args.swap_uv,
        ..LoadConfig::default()
    };

    let mut objects = Vec::new();
    for path in &args.models {
        let kind = args.loader.unwrap_or_else(|| LoaderKind::for_path(path));
        let mut object = Object::load(path, kind, &config)
            .with_context(|| format!("Failed to load {}", path.display()))?;

        if let Some(shininess) = args.shininess {
            object.set_shininess(shininess);
        }

        print_summary(path, kind, &object);
        objects.push(object);
    }

    let baked = bake_objects(&objects.iter().collect::<Vec<_>>());
    log::info!(
        "Baked {} meshes: {} vertices, {} indices",
        baked.meshes.len(),
        baked.buffers.vertices.len(),
        baked.buffers.indices.len()
    );

    if let Some(time) = args.time {
        let state = DemoState::new(objects, DemoConfig::default());
        for item in state.draw_list(time) {
            println!("{}:", item.shading);
            for index in 0..item.object.len() {
                println!("  geometry {}: {:?}", index, item.object.model_matrix(index));
            }
        }
    }

    Ok(())
}

fn print_summary(path: &std::path::Path, kind: LoaderKind, object: &Object) {
    println!("{} ({} loader)", path.display(), kind);
    println!(
        "  {} geometries, {} triangles",
        object.len(),
        object.triangle_count()
    );

    match object.bounding_box() {
        Some(aabb) => println!("  bounds {:?} .. {:?}", aabb.min, aabb.max),
        None => println!("  no vertices"),
    }

    let (geometries, transforms) = object.geometries();
    for (index, (geometry, transform)) in geometries.iter().zip(transforms).enumerate() {
        println!(
            "  geometry {}: {} vertices, {} textures, shininess {}, translation {:?}",
            index,
            geometry.vertices().len(),
            geometry.textures().len(),
            geometry.shininess(),
            transform.w_axis.truncate()
        );
    }
}
