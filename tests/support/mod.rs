//! Test support library
//! Provides builders for triangles and small studio models.
#![allow(dead_code)]

use clipmesh::{
    float_types::Real,
    mesh::facet::TriVertex,
    studio::{BodyPart, Bone, StudioMesh, StudioModel, SubModel, Texture, TextureFlags},
};
use nalgebra::Point3;

/// Route `log` output through the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Helper to make a triangle from three corners, with zero texture coordinates.
pub fn tri(points: [[Real; 3]; 3]) -> [TriVertex; 3] {
    points.map(|p| TriVertex::new(Point3::new(p[0], p[1], p[2]), [0.0, 0.0]))
}

/// Triangle commands encoding each triangle as its own three vertex strip.
pub fn strip_cmds(triangles: &[[i16; 3]]) -> Vec<i16> {
    let mut cmds = Vec::with_capacity(triangles.len() * 13 + 1);
    for t in triangles {
        cmds.push(3);
        for v in t {
            cmds.extend([*v, 0, 0, 0]);
        }
    }
    cmds.push(0);
    cmds
}

/// A single bone model with one body part, one sub-model and one 64x64 texture.
pub fn model_from_triangles(
    name: &str,
    checksum: u32,
    vertices: Vec<Point3<Real>>,
    triangles: &[[i16; 3]],
) -> StudioModel {
    let vertex_bones = vec![0; vertices.len()];
    StudioModel {
        name: name.to_string(),
        checksum,
        bones: vec![Bone {
            name: "root".to_string(),
            parent: None,
            value: [0.0; 6],
            scale: [1.0; 6],
        }],
        anims: Vec::new(),
        body_parts: vec![BodyPart {
            name: "body".to_string(),
            base: 1,
            models: vec![SubModel {
                name: "mesh".to_string(),
                vertices,
                vertex_bones,
                meshes: vec![StudioMesh {
                    skin_ref: 0,
                    tri_cmds: strip_cmds(triangles),
                }],
            }],
        }],
        textures: vec![Texture {
            name: "skin.bmp".to_string(),
            width: 64,
            height: 64,
            flags: TextureFlags::empty(),
        }],
        skin_families: vec![vec![0]],
    }
}

/// Flat grid of `num_tris` triangles in the z = 0 plane, four units per cell.
pub fn grid_model(name: &str, checksum: u32, num_tris: usize) -> StudioModel {
    const COLS: usize = 16;
    let quads = num_tris.div_ceil(2);
    let rows = quads.div_ceil(COLS).max(1);

    let mut vertices = Vec::with_capacity((COLS + 1) * (rows + 1));
    for r in 0..=rows {
        for c in 0..=COLS {
            vertices.push(Point3::new(c as Real * 4.0, r as Real * 4.0, 0.0));
        }
    }

    let idx = |c: usize, r: usize| (r * (COLS + 1) + c) as i16;
    let mut triangles = Vec::with_capacity(quads * 2);
    for q in 0..quads {
        let (c, r) = (q % COLS, q / COLS);
        triangles.push([idx(c, r), idx(c + 1, r), idx(c + 1, r + 1)]);
        triangles.push([idx(c, r), idx(c + 1, r + 1), idx(c, r + 1)]);
    }
    triangles.truncate(num_tris);

    model_from_triangles(name, checksum, vertices, &triangles)
}
