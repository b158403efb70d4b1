//! glTF 2.0 / GLB reader. Keeps the node hierarchy of the default scene;
//! node transforms are not applied.

use crate::{
    error::ImportError,
    scene::{Mesh, Node, Scene},
};
use std::path::Path;

pub fn read_file(path: &Path) -> Result<Scene, ImportError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| ImportError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    // One of our meshes per triangle primitive; remember which belong to
    // which glTF mesh so nodes can reference them.
    let mut meshes = Vec::new();
    let mut by_gltf_mesh: Vec<Vec<usize>> = Vec::with_capacity(document.meshes().len());

    for gmesh in document.meshes() {
        let mut ours = Vec::new();
        for (p, primitive) in gmesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!(
                    "Skipping {:?} primitive {} of mesh {:?}",
                    primitive.mode(),
                    p,
                    gmesh.name()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let colors: Option<Vec<[f32; 3]>> = reader
                .read_colors(0)
                .map(|iter| iter.into_rgb_f32().collect());

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let name = match gmesh.name() {
                Some(name) => format!("{name}.{p}"),
                None => format!("mesh{}.{p}", gmesh.index()),
            };

            // The gltf crate does not range-check index values.
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(ImportError::IndexOutOfRange {
                    path: path.to_path_buf(),
                    mesh: name,
                    index,
                    vertex_count: positions.len(),
                });
            }

            let faces = indices.chunks_exact(3).map(|t| t.to_vec()).collect();

            ours.push(meshes.len());
            meshes.push(Mesh {
                name,
                positions,
                normals,
                colors,
                faces,
            });
        }
        by_gltf_mesh.push(ours);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| ImportError::EmptyScene {
            path: path.to_path_buf(),
        })?;

    let mut root = Node::new(scene.name().unwrap_or("scene"));
    root.children = scene
        .nodes()
        .map(|n| convert_node(&n, &by_gltf_mesh))
        .collect();

    if meshes.is_empty() {
        return Err(ImportError::EmptyScene {
            path: path.to_path_buf(),
        });
    }

    Ok(Scene { root, meshes })
}

fn convert_node(node: &gltf::Node<'_>, by_gltf_mesh: &[Vec<usize>]) -> Node {
    Node {
        name: node.name().unwrap_or_default().to_owned(),
        meshes: node
            .mesh()
            .and_then(|m| by_gltf_mesh.get(m.index()).cloned())
            .unwrap_or_default(),
        children: node
            .children()
            .map(|c| convert_node(&c, by_gltf_mesh))
            .collect(),
    }
}
