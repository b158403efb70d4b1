//! In-memory scene graph produced by the importers.

/// A node of the imported hierarchy. Meshes are referenced by index into
/// [`Scene::meshes`], so one mesh may be instanced by several nodes.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub meshes: Vec<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Visits this node and its descendants depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A polygon mesh. Faces index into `positions`; after triangulation every
/// face has exactly three corners.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals; empty when the source carried none.
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex colours from the first colour set, if present.
    pub colors: Option<Vec<[f32; 3]>>,
    pub faces: Vec<Vec<u32>>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles this mesh yields once fan-triangulated.
    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|f| f.len().saturating_sub(2))
            .sum()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub root: Node,
    pub meshes: Vec<Mesh>,
}

impl Scene {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    /// Meshes in node traversal order (depth-first), repeated once per
    /// referencing node.
    pub fn meshes_in_traversal_order(&self) -> Vec<&Mesh> {
        let mut out = Vec::new();
        self.root.walk(&mut |node| {
            out.extend(node.meshes.iter().filter_map(|&i| self.meshes.get(i)));
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Mesh {
        Mesh {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn traversal_is_depth_first_and_repeats_instances() {
        //   root [a]
        //   ├── n1 [b]
        //   │   └── n2 [a, c]
        //   └── n3 [b]
        let mut n1 = Node::new("n1");
        n1.meshes = vec![1];
        let mut n2 = Node::new("n2");
        n2.meshes = vec![0, 2];
        n1.children.push(n2);
        let mut n3 = Node::new("n3");
        n3.meshes = vec![1];

        let mut root = Node::new("root");
        root.meshes = vec![0];
        root.children = vec![n1, n3];

        let scene = Scene {
            root,
            meshes: vec![named("a"), named("b"), named("c")],
        };

        let order: Vec<&str> = scene
            .meshes_in_traversal_order()
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(order, ["a", "b", "a", "c", "b"]);

        let mut visited = Vec::new();
        scene.root.walk(&mut |n| visited.push(n.name.as_str()));
        assert_eq!(visited, ["root", "n1", "n2", "n3"]);
    }

    #[test]
    fn dangling_mesh_reference_is_skipped() {
        let mut root = Node::new("root");
        root.meshes = vec![0, 5];
        let scene = Scene {
            root,
            meshes: vec![named("only")],
        };
        assert_eq!(scene.meshes_in_traversal_order().len(), 1);
    }
}
