use std::path::Path;

use gltf::mesh::Mode;

use super::{ImportOptions, SourceMaterial, SourceMesh, SourceNode, SourceScene};
use crate::error::ImportError;

/// Loads a `.gltf` or `.glb` file.
///
/// Each primitive becomes its own [`SourceMesh`]. Images are not decoded
/// here; only external image URIs are recorded as texture paths.
pub(super) fn load(path: &Path, options: &ImportOptions) -> Result<SourceScene, ImportError> {
    let gltf_error = |source| ImportError::Gltf {
        path: path.to_path_buf(),
        source,
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_error)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_error)?;

    let Some(default_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return Err(ImportError::IncompleteScene(format!(
            "{} defines no scene",
            path.display()
        )));
    };

    let materials = document.materials().map(convert_material).collect();

    // glTF mesh index -> indices of the SourceMeshes made from its primitives
    let mut meshes = Vec::new();
    let mut primitives_of_mesh = Vec::new();
    for mesh in document.meshes() {
        let mut produced = Vec::new();
        for primitive in mesh.primitives() {
            let label = format!("{}#{}", mesh.name().unwrap_or("mesh"), primitive.index());
            if let Some(source) = read_primitive(&primitive, &buffers, &label, options) {
                produced.push(meshes.len());
                meshes.push(source);
            }
        }
        primitives_of_mesh.push(produced);
    }

    let mut nodes: Vec<SourceNode> = document
        .nodes()
        .map(|node| SourceNode {
            name: node.name().unwrap_or_default().to_owned(),
            meshes: node
                .mesh()
                .map(|mesh| primitives_of_mesh[mesh.index()].clone())
                .unwrap_or_default(),
            children: node.children().map(|child| child.index()).collect(),
        })
        .collect();

    // A scene may have several root nodes; hang them under one root
    let root = nodes.len();
    nodes.push(SourceNode {
        name: default_scene.name().unwrap_or("scene").to_owned(),
        meshes: Vec::new(),
        children: default_scene.nodes().map(|node| node.index()).collect(),
    });

    Ok(SourceScene {
        nodes,
        root,
        meshes,
        materials,
    })
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    label: &str,
    options: &ImportOptions,
) -> Option<SourceMesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &**data));

    let Some(positions) = reader.read_positions() else {
        log::warn!("skipping primitive `{label}`: no positions");
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();

    let raw_indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let indices = match (primitive.mode(), options.triangulate) {
        (Mode::Triangles, _) => raw_indices,
        (Mode::TriangleStrip, true) => strip_to_list(&raw_indices),
        (Mode::TriangleFan, true) => fan_to_list(&raw_indices),
        (mode, _) => {
            log::warn!("skipping primitive `{label}`: {mode:?} is not a triangle list");
            return None;
        }
    };

    let normals = reader.read_normals().map(|normals| normals.collect());
    let tex_coords = reader.read_tex_coords(0).map(|uvs| {
        uvs.into_f32()
            // glTF already puts the UV origin top-left
            .map(|[u, v]| if options.flip_uvs { [u, v] } else { [u, 1.0 - v] })
            .collect()
    });

    Some(SourceMesh {
        name: label.to_owned(),
        positions,
        normals,
        tex_coords,
        indices,
        material: primitive.material().index(),
    })
}

fn convert_material(material: gltf::Material<'_>) -> SourceMaterial {
    let name = material.name().unwrap_or_default().to_owned();
    let mut diffuse_maps = Vec::new();

    if let Some(info) = material.pbr_metallic_roughness().base_color_texture() {
        match info.texture().source().source() {
            gltf::image::Source::Uri { uri, .. } => diffuse_maps.push(uri.to_owned()),
            gltf::image::Source::View { .. } => {
                log::info!(
                    "material `{name}`: embedded base colour image is not supported, skipping"
                );
            }
        }
    }

    SourceMaterial {
        name,
        diffuse_maps,
        specular_maps: Vec::new(),
    }
}

fn strip_to_list(strip: &[u32]) -> Vec<u32> {
    strip
        .windows(3)
        .enumerate()
        .flat_map(|(i, w)| {
            // Every other triangle is flipped to keep the winding consistent
            if i % 2 == 0 {
                [w[0], w[1], w[2]]
            } else {
                [w[1], w[0], w[2]]
            }
        })
        .collect()
}

fn fan_to_list(fan: &[u32]) -> Vec<u32> {
    match fan.split_first() {
        Some((&hub, rest)) => rest.windows(2).flat_map(|w| [hub, w[0], w[1]]).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_alternates_winding() {
        assert_eq!(strip_to_list(&[0, 1, 2, 3]), vec![0, 1, 2, 2, 1, 3]);
        assert!(strip_to_list(&[0, 1]).is_empty());
    }

    #[test]
    fn test_fan_shares_first_vertex() {
        assert_eq!(fan_to_list(&[0, 1, 2, 3]), vec![0, 1, 2, 0, 2, 3]);
        assert!(fan_to_list(&[]).is_empty());
    }

    #[test]
    fn test_triangle_with_external_buffer_is_imported() {
        // One triangle, positions in a .bin file next to the .gltf
        let dir = std::env::temp_dir().join(format!("tabletop-gltf-{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();

        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let bytes: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
        std::fs::write(dir.join("tri.bin"), &bytes).unwrap();

        let json = r#"{
  "asset": {"version": "2.0"},
  "scene": 0,
  "scenes": [{"nodes": [0]}],
  "nodes": [{"name": "tri", "mesh": 0}],
  "meshes": [{"name": "tri", "primitives": [{"attributes": {"POSITION": 0}}]}],
  "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0, 0, 0], "max": [1, 1, 0]}],
  "bufferViews": [{"buffer": 0, "byteLength": 36}],
  "buffers": [{"byteLength": 36, "uri": "tri.bin"}]
}"#;
        let path = dir.join("tri.gltf");
        std::fs::write(&path, json).unwrap();

        let scene = load(&path, &ImportOptions::default()).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.meshes[0].indices, vec![0, 1, 2]);
        assert!(scene.meshes[0].normals.is_none());
        assert_eq!(scene.mesh_order(), vec![0]);

        std::fs::remove_dir_all(dir).ok();
    }
}
