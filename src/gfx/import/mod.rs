//! # Model Import
//!
//! Format-specific importers read a model file into a [`SourceScene`], a
//! small format-neutral node/mesh/material arena. [`Model`] then flattens
//! that scene into drawable meshes.
//!
//! Supported formats, chosen by file extension:
//!
//! - Wavefront OBJ (`.obj`, with its `.mtl` library) through `tobj`
//! - glTF 2.0 (`.gltf`, `.glb`) through `gltf`
//!
//! Texture coordinates in a [`SourceScene`] use a top-left origin unless
//! [`ImportOptions::flip_uvs`] is turned off.
//!
//! [`Model`]: crate::gfx::scene::model::Model

mod gltf_importer;
mod obj_importer;

use std::{collections::HashSet, path::Path};

use crate::{error::ImportError, gfx::scene::vertex::Vertex};

/// Post-processing applied while importing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Split polygons into triangles. Meshes that are not triangle lists
    /// after import are skipped.
    pub triangulate: bool,
    /// Flip the V texture axis so that V grows downward.
    pub flip_uvs: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
        }
    }
}

/// A node of the imported hierarchy. Local transforms are not kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceNode {
    pub name: String,
    /// Indices into [`SourceScene::meshes`].
    pub meshes: Vec<usize>,
    /// Indices into [`SourceScene::nodes`].
    pub children: Vec<usize>,
}

/// Triangle-list geometry of one imported mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// First texture coordinate channel, if present.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    /// Index into [`SourceScene::materials`].
    pub material: Option<usize>,
}

impl SourceMesh {
    /// Interleaves the attribute streams. Missing normals and texture
    /// coordinates become zero vectors.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let normal = self
                    .normals
                    .as_ref()
                    .and_then(|normals| normals.get(i).copied())
                    .unwrap_or([0.0; 3]);
                let tex_coords = self
                    .tex_coords
                    .as_ref()
                    .and_then(|uvs| uvs.get(i).copied())
                    .unwrap_or([0.0; 2]);
                Vertex::new(position, normal, tex_coords)
            })
            .collect()
    }
}

/// Texture maps referenced by a material. Paths are relative to the model
/// file's directory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMaterial {
    pub name: String,
    pub diffuse_maps: Vec<String>,
    pub specular_maps: Vec<String>,
}

/// A parsed model file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceScene {
    pub nodes: Vec<SourceNode>,
    pub root: usize,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
}

impl SourceScene {
    /// Mesh indices in depth-first pre-order, children visited in
    /// declaration order.
    ///
    /// Walks with an explicit stack so deep hierarchies cannot overflow the
    /// call stack. Dangling node or mesh references and nodes reached twice
    /// (cycles, shared children) are skipped with a warning.
    pub fn mesh_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];

        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                log::warn!("skipping reference to missing node {index}");
                continue;
            };
            if !visited.insert(index) {
                log::warn!("node {index} (`{}`) reached twice, skipping", node.name);
                continue;
            }

            for &mesh in &node.meshes {
                if mesh < self.meshes.len() {
                    order.push(mesh);
                } else {
                    log::warn!("node `{}` references missing mesh {mesh}", node.name);
                }
            }
            stack.extend(node.children.iter().rev());
        }

        order
    }

    pub fn material(&self, index: Option<usize>) -> Option<&SourceMaterial> {
        index.and_then(|i| self.materials.get(i))
    }
}

/// Reads `path` with the importer matching its extension.
pub fn load_scene(path: &Path, options: &ImportOptions) -> Result<SourceScene, ImportError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("obj") => obj_importer::load(path, options),
        Some("gltf" | "glb") => gltf_importer::load(path, options),
        _ => Err(ImportError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(meshes: Vec<usize>, children: Vec<usize>) -> SourceNode {
        SourceNode {
            name: String::new(),
            meshes,
            children,
        }
    }

    fn scene_with(nodes: Vec<SourceNode>, mesh_count: usize) -> SourceScene {
        SourceScene {
            nodes,
            root: 0,
            meshes: vec![SourceMesh::default(); mesh_count],
            materials: Vec::new(),
        }
    }

    #[test]
    fn test_traversal_is_depth_first_preorder() {
        //      0[m0]
        //     /     \
        //  1[m1]    3[m3]
        //    |
        //  2[m2]
        let scene = scene_with(
            vec![
                node(vec![0], vec![1, 3]),
                node(vec![1], vec![2]),
                node(vec![2], vec![]),
                node(vec![3], vec![]),
            ],
            4,
        );
        assert_eq!(scene.mesh_order(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cycles_and_dangling_references_are_skipped() {
        let scene = scene_with(
            vec![node(vec![0, 9], vec![1, 7]), node(vec![1], vec![0, 1])],
            2,
        );
        assert_eq!(scene.mesh_order(), vec![0, 1]);
    }

    #[test]
    fn test_deep_hierarchy_does_not_recurse() {
        let depth = 100_000;
        let nodes = (0..depth)
            .map(|i| {
                let children = if i + 1 < depth { vec![i + 1] } else { vec![] };
                node(vec![0], children)
            })
            .collect();
        let scene = scene_with(nodes, 1);
        assert_eq!(scene.mesh_order().len(), depth);
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let mesh = SourceMesh {
            positions: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            tex_coords: Some(vec![[0.5, 0.25]]),
            ..Default::default()
        };
        let vertices = mesh.vertices();
        assert_eq!(vertices[0].normal, [0.0; 3]);
        assert_eq!(vertices[0].tex_coords, [0.5, 0.25]);
        assert_eq!(vertices[1].tex_coords, [0.0; 2]);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = load_scene(Path::new("scene.fbx"), &ImportOptions::default());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
