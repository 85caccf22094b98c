use std::fs;

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Mat4, Vec3};
use shading_demo::{LoadConfig, LoadError, LoaderKind, Object};

const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 2.0 2.0 0.0
v 0.0 2.0 0.0
vn 0.0 0.0 1.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
usemtl red
f 1/1/1 2/2/1 3/3/1 4/4/1
";

const QUAD_MTL: &str = "\
newmtl red
Kd 1.0 0.0 0.0
Ns 32.0
";

fn import(path: &std::path::Path) -> Result<Object, LoadError> {
    Object::load(path, LoaderKind::Importer, &LoadConfig::default())
}

#[test]
fn obj_faces_are_triangulated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quad.obj");
    fs::write(&path, QUAD_OBJ).unwrap();
    fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();

    let object = import(&path).unwrap();
    let (geometries, transforms) = object.geometries();

    assert_eq!(geometries.len(), 1);
    assert_eq!(transforms, &[Mat4::IDENTITY]);

    let quad = &geometries[0];
    assert_eq!(quad.triangle_count(), 2);
    assert_eq!(quad.vertices().len(), 4);
    assert_eq!(quad.shininess(), 32.0);
    assert!(quad.textures().is_empty());
    for vertex in quad.vertices() {
        assert_eq!(vertex.normal, Vec3::Z);
        assert_eq!(vertex.color, Vec3::X);
    }

    let aabb = object.bounding_box().unwrap();
    assert_eq!(aabb.max, Vec3::new(2.0, 2.0, 0.0));
}

#[test]
fn obj_without_materials_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.obj");
    fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

    let object = import(&path).unwrap();
    let geometry = object.geometry(0).unwrap();

    assert_eq!(geometry.indices().len(), 3);
    assert_eq!(geometry.shininess(), 0.0);
    assert_eq!(geometry.vertices()[0].normal, Vec3::ONE);
    assert_eq!(geometry.vertices()[0].color, Vec3::ONE);
}

#[test]
fn gltf_hierarchy_is_baked_into_vertices() {
    let dir = tempfile::tempdir().unwrap();

    let mut payload = Vec::new();
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        payload.write_f32::<LittleEndian>(value).unwrap();
    }
    fs::write(dir.path().join("tri.bin"), &payload).unwrap();

    let path = dir.path().join("tri.gltf");
    fs::write(
        &path,
        r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "children": [1], "translation": [0.0, 0.0, 3.0] },
    { "mesh": 0, "translation": [5.0, 0.0, 0.0] }
  ],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "accessors": [{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }],
  "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
  "buffers": [{ "uri": "tri.bin", "byteLength": 36 }]
}"#,
    )
    .unwrap();

    let object = import(&path).unwrap();
    let (geometries, transforms) = object.geometries();

    assert_eq!(geometries.len(), 1);
    assert_eq!(transforms, &[Mat4::IDENTITY]);
    assert_eq!(geometries[0].indices(), &[0, 1, 2]);
    assert!(geometries[0].vertices()[0]
        .position
        .abs_diff_eq(Vec3::new(5.0, 0.0, 3.0), 1e-6));
}

#[test]
fn unreadable_obj_fails_to_import() {
    let dir = tempfile::tempdir().unwrap();
    let error = import(&dir.path().join("missing.obj")).unwrap_err();

    assert!(matches!(error, LoadError::ImportFailed { .. }));
}

#[test]
fn gltf_nodes_reachable_twice_are_not_flattened_twice() {
    let dir = tempfile::tempdir().unwrap();

    let mut payload = Vec::new();
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        payload.write_f32::<LittleEndian>(value).unwrap();
    }
    fs::write(dir.path().join("chain.bin"), &payload).unwrap();

    // Every node lists its successor twice
    let nodes = (0..40)
        .map(|i| {
            if i < 39 {
                format!(r#"{{ "mesh": 0, "children": [{next}, {next}] }}"#, next = i + 1)
            } else {
                r#"{ "mesh": 0 }"#.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    let path = dir.path().join("chain.gltf");
    fs::write(
        &path,
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{nodes}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
  "accessors": [{{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "buffers": [{{ "uri": "chain.bin", "byteLength": 36 }}]
}}"#
        ),
    )
    .unwrap();

    // Either the importer's own validation or the flattening rejects the graph
    assert!(matches!(
        import(&path),
        Err(LoadError::SharedNode { node: 39, .. }) | Err(LoadError::ImportFailed { .. })
    ));
}
