use std::path::Path;

use super::{ImportOptions, SourceMaterial, SourceMesh, SourceNode, SourceScene};
use crate::error::ImportError;

/// Loads an OBJ file and its material library.
///
/// Every OBJ object/group becomes a child of a synthetic root node holding
/// one mesh. A missing or broken `.mtl` only costs the textures.
pub(super) fn load(path: &Path, options: &ImportOptions) -> Result<SourceScene, ImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: options.triangulate,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| ImportError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("no usable MTL library for {}: {err}", path.display());
        Vec::new()
    });

    let mut scene = SourceScene {
        nodes: vec![SourceNode {
            name: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Default::default()
        }],
        root: 0,
        meshes: Vec::with_capacity(models.len()),
        materials: materials.iter().map(convert_material).collect(),
    };

    for model in models {
        let mesh = &model.mesh;
        if mesh.face_arities.iter().any(|&arity| arity != 3) {
            log::warn!(
                "skipping `{}` in {}: faces are not triangles",
                model.name,
                path.display()
            );
            continue;
        }

        let normals = (!mesh.normals.is_empty())
            .then(|| mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect());
        let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
            mesh.texcoords
                .chunks_exact(2)
                .map(|uv| {
                    // OBJ puts the UV origin bottom-left
                    let v = if options.flip_uvs { 1.0 - uv[1] } else { uv[1] };
                    [uv[0], v]
                })
                .collect()
        });

        let mesh_index = scene.meshes.len();
        scene.meshes.push(SourceMesh {
            name: model.name.clone(),
            positions: mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
            normals,
            tex_coords,
            indices: mesh.indices.clone(),
            material: mesh.material_id,
        });

        let node_index = scene.nodes.len();
        scene.nodes.push(SourceNode {
            name: model.name,
            meshes: vec![mesh_index],
            children: Vec::new(),
        });
        scene.nodes[0].children.push(node_index);
    }

    log::debug!(
        "imported {} mesh(es), {} material(s) from {}",
        scene.meshes.len(),
        scene.materials.len(),
        path.display()
    );
    Ok(scene)
}

fn convert_material(material: &tobj::Material) -> SourceMaterial {
    SourceMaterial {
        name: material.name.clone(),
        diffuse_maps: material.diffuse_texture.iter().cloned().collect(),
        specular_maps: material.specular_texture.iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tabletop-obj-{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_quad_is_triangulated_and_uvs_flipped() {
        let dir = temp_dir();
        let obj = dir.join("quad.obj");
        std::fs::write(
            &obj,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             o quad\nf 1/1 2/2 3/3 4/4\n",
        )
        .unwrap();

        let scene = load(&obj, &ImportOptions::default()).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.normals.is_none());
        let uvs = mesh.tex_coords.as_ref().unwrap();
        assert!(uvs.contains(&[0.0, 1.0]), "v=0 flips to 1");
        assert_eq!(scene.mesh_order(), vec![0]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_material_maps_are_collected() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("cup.mtl"),
            "newmtl glaze\nmap_Kd cup_diffuse.png\nmap_Ks cup_spec.png\n",
        )
        .unwrap();
        let obj = dir.join("cup.obj");
        std::fs::write(
            &obj,
            "mtllib cup.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl glaze\nf 1 2 3\n",
        )
        .unwrap();

        let scene = load(&obj, &ImportOptions::default()).unwrap();
        let material = scene.material(scene.meshes[0].material).unwrap();
        assert_eq!(material.diffuse_maps, vec!["cup_diffuse.png".to_owned()]);
        assert_eq!(material.specular_maps, vec!["cup_spec.png".to_owned()]);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load(Path::new("does/not/exist.obj"), &ImportOptions::default());
        assert!(matches!(result, Err(ImportError::Obj { .. })));
    }
}
