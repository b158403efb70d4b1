//! Wavefront OBJ reader and writer.
//!
//! Supported records: `v x y z [r g b]`, `vn`, `f` with `v`, `v/t`, `v//n`
//! or `v/t/n` corners (negative indices are relative), and `o`/`g` which
//! start a new mesh. Texture coordinates are parsed past and ignored.

use crate::{
    error::{ExportError, ImportError},
    scene::{Mesh, Node, Scene},
};
use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

pub fn read_file(path: &Path) -> Result<Scene, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read(BufReader::new(file), path)
}

/// Mesh under construction; corners are de-duplicated per mesh by
/// (position, normal) index pair.
struct MeshBuilder {
    mesh: Mesh,
    corners: HashMap<(usize, Option<usize>), u32>,
    missing_normals: bool,
    has_color: bool,
}

impl MeshBuilder {
    fn new(name: &str) -> Self {
        Self {
            mesh: Mesh {
                name: name.to_owned(),
                ..Default::default()
            },
            corners: HashMap::new(),
            missing_normals: false,
            has_color: false,
        }
    }

    fn finish(mut self) -> Option<Mesh> {
        if self.mesh.faces.is_empty() {
            return None;
        }
        if self.missing_normals {
            self.mesh.normals.clear();
        }
        if !self.has_color {
            self.mesh.colors = None;
        }
        Some(self.mesh)
    }
}

pub fn read<R: BufRead>(reader: R, path: &Path) -> Result<Scene, ImportError> {
    let parse_err = |line: usize, message: String| ImportError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut colors: Vec<Option<[f32; 3]>> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut scene = Scene {
        root: Node::new(
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("root"),
        ),
        meshes: Vec::new(),
    };
    let mut current = MeshBuilder::new("default");

    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result.map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let keyword = parts.next().unwrap_or_default();

        match keyword {
            "v" => {
                let values = parse_floats(parts).map_err(|m| parse_err(line_no, m))?;
                match values.len() {
                    3 | 4 => {
                        positions.push([values[0], values[1], values[2]]);
                        colors.push(None);
                    }
                    6 | 7 => {
                        positions.push([values[0], values[1], values[2]]);
                        colors.push(Some([values[3], values[4], values[5]]));
                    }
                    n => return Err(parse_err(line_no, format!("vertex with {n} components"))),
                }
            }
            "vn" => {
                let values = parse_floats(parts).map_err(|m| parse_err(line_no, m))?;
                if values.len() != 3 {
                    return Err(parse_err(line_no, "normal needs 3 components".into()));
                }
                normals.push([values[0], values[1], values[2]]);
            }
            "f" => {
                let mut face = Vec::new();
                for token in parts {
                    let (v, n) = parse_corner(token, positions.len(), normals.len())
                        .map_err(|m| parse_err(line_no, m))?;

                    let next = current.mesh.positions.len() as u32;
                    let index = *current.corners.entry((v, n)).or_insert(next);
                    if index == next {
                        current.mesh.positions.push(positions[v]);
                        match n {
                            Some(n) => current.mesh.normals.push(normals[n]),
                            None => {
                                current.mesh.normals.push([0.0; 3]);
                                current.missing_normals = true;
                            }
                        }
                        let color = colors[v];
                        current.has_color |= color.is_some();
                        current
                            .mesh
                            .colors
                            .get_or_insert_with(Vec::new)
                            .push(color.unwrap_or([1.0; 3]));
                    }
                    face.push(index);
                }
                if face.len() < 3 {
                    return Err(parse_err(line_no, "face with fewer than 3 corners".into()));
                }
                current.mesh.faces.push(face);
            }
            "o" | "g" => {
                let name = trimmed[keyword.len()..].trim();
                let finished = std::mem::replace(&mut current, MeshBuilder::new(name));
                push_mesh(finished, &mut scene);
            }
            // vt, s, usemtl, mtllib, l, p ...
            _ => {}
        }
    }
    push_mesh(current, &mut scene);

    if scene.meshes.is_empty() {
        return Err(ImportError::EmptyScene {
            path: path.to_path_buf(),
        });
    }

    Ok(scene)
}

fn push_mesh(builder: MeshBuilder, scene: &mut Scene) {
    if let Some(mesh) = builder.finish() {
        let mut node = Node::new(mesh.name.clone());
        node.meshes.push(scene.meshes.len());
        scene.root.children.push(node);
        scene.meshes.push(mesh);
    }
}

fn parse_floats<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<f32>, String> {
    parts
        .map(|p| p.parse::<f32>().map_err(|e| format!("bad number '{p}': {e}")))
        .collect()
}

/// Resolves a 1-based (or negative, relative) OBJ index to a 0-based one.
fn resolve_index(raw: &str, len: usize) -> Result<usize, String> {
    let i: i64 = raw
        .parse()
        .map_err(|e| format!("bad index '{raw}': {e}"))?;
    let resolved = match i {
        0 => return Err("index 0 is invalid in OBJ".into()),
        i if i > 0 => i - 1,
        i => len as i64 + i,
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(format!("index {i} out of range ({len} defined)"));
    }
    Ok(resolved as usize)
}

fn parse_corner(
    token: &str,
    position_count: usize,
    normal_count: usize,
) -> Result<(usize, Option<usize>), String> {
    let mut fields = token.split('/');
    let v = resolve_index(fields.next().unwrap_or_default(), position_count)?;
    let _texcoord = fields.next();
    let n = match fields.next() {
        Some(raw) if !raw.is_empty() => Some(resolve_index(raw, normal_count)?),
        _ => None,
    };
    Ok((v, n))
}

/// Writes `scene` to `path` as OBJ, one `o` block per mesh in traversal order.
pub fn write_file(path: &Path, scene: &Scene) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    write(scene, &mut out).map_err(io_err)?;
    out.flush().map_err(io_err)
}

pub fn write<W: Write>(scene: &Scene, out: &mut W) -> io::Result<()> {
    writeln!(out, "# mesh_io OBJ export")?;
    writeln!(
        out,
        "# {} vertices, {} triangles",
        scene.vertex_count(),
        scene.triangle_count()
    )?;

    // OBJ indices are global and 1-based.
    let mut v_base = 1usize;
    let mut n_base = 1usize;

    for (i, mesh) in scene.meshes_in_traversal_order().into_iter().enumerate() {
        let name = if mesh.name.is_empty() {
            format!("mesh_{i}")
        } else {
            mesh.name.clone()
        };
        writeln!(out, "o {name}")?;

        for (j, p) in mesh.positions.iter().enumerate() {
            match mesh.colors.as_ref().and_then(|c| c.get(j)) {
                Some(c) => writeln!(
                    out,
                    "v {} {} {} {} {} {}",
                    p[0], p[1], p[2], c[0], c[1], c[2]
                )?,
                None => writeln!(out, "v {} {} {}", p[0], p[1], p[2])?,
            }
        }

        let with_normals = mesh.has_normals();
        if with_normals {
            for n in &mesh.normals {
                writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
            }
        }

        for face in &mesh.faces {
            write!(out, "f")?;
            for &idx in face {
                let v = v_base + idx as usize;
                if with_normals {
                    write!(out, " {}//{}", v, n_base + idx as usize)?;
                } else {
                    write!(out, " {v}")?;
                }
            }
            writeln!(out)?;
        }

        v_base += mesh.positions.len();
        if with_normals {
            n_base += mesh.normals.len();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CUBE: &str = "\
# unit cube
o cube
v -1 -1 -1
v  1 -1 -1
v  1  1 -1
v -1  1 -1
v -1 -1  1
v  1 -1  1
v  1  1  1
v -1  1  1
f 1 2 3 4
f 5 8 7 6
f 1 5 6 2
f 2 6 7 3
f 3 7 8 4
f 5 1 4 8
";

    fn parse(src: &str) -> Result<Scene, ImportError> {
        read(Cursor::new(src), Path::new("test.obj"))
    }

    #[test]
    fn parses_polygons_without_normals() {
        let scene = parse(CUBE).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, "cube");
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.faces.len(), 6);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(!mesh.has_normals());
        assert!(mesh.colors.is_none());
    }

    #[test]
    fn groups_split_meshes_and_negative_indices_resolve() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
g first
f 1//1 2//1 3//1
g second
v 0 0 1
f -4//-1 -3//-1 -1//-1
";
        let scene = parse(src).unwrap();
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.root.children.len(), 2);
        assert_eq!(scene.meshes[1].name, "second");
        assert_eq!(scene.meshes[1].positions[2], [0.0, 0.0, 1.0]);
        assert!(scene.meshes[1].has_normals());
    }

    #[test]
    fn vertex_colours_are_read() {
        let src = "v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nf 1 2 3\n";
        let scene = parse(src).unwrap();
        let colors = scene.meshes[0].colors.as_ref().unwrap();
        assert_eq!(colors[1], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let err = parse("v 0 0 0\nf 1 2 3\n").unwrap_err();
        match err {
            ImportError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn vertices_only_is_an_empty_scene() {
        let err = parse("v 0 0 0\nv 1 1 1\n").unwrap_err();
        assert!(matches!(err, ImportError::EmptyScene { .. }));
    }

    #[test]
    fn written_obj_reads_back_with_same_counts() {
        let mut scene = parse(CUBE).unwrap();
        crate::process::apply(&mut scene, crate::ImportOptions::VIEWER);

        let mut bytes = Vec::new();
        write(&scene, &mut bytes).unwrap();
        let back = parse(std::str::from_utf8(&bytes).unwrap()).unwrap();

        assert_eq!(back.vertex_count(), scene.vertex_count());
        assert_eq!(back.triangle_count(), scene.triangle_count());
        assert!(back.meshes[0].has_normals());
    }
}
