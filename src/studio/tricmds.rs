//! Triangle command stream decoding.
//!
//! A stream is a sequence of runs. Each run starts with a vertex count; a positive
//! count is a triangle strip, a negative one a triangle fan, and zero ends the
//! stream. Every vertex is four words: vertex index, normal index, s and t.

use crate::errors::BuildError;
use crate::float_types::Real;
use crate::mesh::facet::TriVertex;
use crate::studio::{Texture, TextureFlags};
use nalgebra::Point3;

/// Words per vertex in a triangle command run.
const VERTEX_WORDS: usize = 4;

/// Expanded vertices and triangle indices of one or more meshes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleSoup {
    pub points: Vec<Point3<Real>>,
    pub coords: Vec<[Real; 2]>,
    /// Material of each vertex
    pub skin_refs: Vec<i32>,
    pub indices: Vec<u32>,
    /// Triangles announced by the run headers
    pub expected_tris: isize,
}

impl TriangleSoup {
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            points: Vec::with_capacity(vertices),
            coords: Vec::with_capacity(vertices),
            skin_refs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(vertices * 3),
            expected_tris: 0,
        }
    }

    /// Triangles actually present in the index list.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over `(corners, skin_ref)`; the material is the first corner's.
    pub fn triangles(&self) -> impl Iterator<Item = ([TriVertex; 3], i32)> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            let corner = |i: u32| {
                let i = i as usize;
                TriVertex::new(self.points[i], self.coords[i])
            };
            (
                [corner(tri[0]), corner(tri[1]), corner(tri[2])],
                self.skin_refs[tri[0] as usize],
            )
        })
    }
}

/// Convert an IEEE 754 half precision value to `f32`.
pub fn half_to_float(bits: u16) -> f32 {
    let sign = u32::from(bits & 0x8000) << 16;
    let exponent = u32::from(bits >> 10) & 0x1f;
    let mantissa = u32::from(bits & 0x03ff);

    let magnitude = match (exponent, mantissa) {
        (0, 0) => 0,
        (0, _) => {
            // subnormal: renormalize into an f32 normal
            let mut e = 127 - 15 + 1;
            let mut m = mantissa;
            while m & 0x0400 == 0 {
                m <<= 1;
                e -= 1;
            }
            ((e as u32) << 23) | ((m & 0x03ff) << 13)
        },
        (0x1f, 0) => 0x7f80_0000,
        (0x1f, _) => 0x7fc0_0000 | (mantissa << 13),
        _ => ((exponent + 127 - 15) << 23) | (mantissa << 13),
    };

    f32::from_bits(sign | magnitude)
}

/// Texture coordinate of one command vertex under the texture's flags.
fn texcoord(texture: &Texture, s: i16, t: i16) -> [Real; 2] {
    let rs = 1.0 / texture.width.max(1) as Real;
    let rt = 1.0 / texture.height.max(1) as Real;

    if texture.flags.contains(TextureFlags::CHROME) {
        [rs, rt]
    } else if texture.flags.contains(TextureFlags::UV_COORDS) {
        [half_to_float(s as u16), half_to_float(t as u16)]
    } else {
        [Real::from(s) * rs, Real::from(t) * rt]
    }
}

/// Append the triangles of one mesh command stream to `soup`.
///
/// `vertices` are the skinned vertices of the owning sub-model.
pub fn decode_mesh(
    soup: &mut TriangleSoup,
    tri_cmds: &[i16],
    vertices: &[Point3<Real>],
    texture: &Texture,
    skin_ref: i32,
) -> Result<(), BuildError> {
    let mut cmds = tri_cmds;

    while let Some((&count, rest)) = cmds.split_first() {
        if count == 0 {
            break;
        }

        let strip = count > 0;
        let count = usize::from(count.unsigned_abs());
        let Some((run, rest)) = rest.split_at_checked(count * VERTEX_WORDS) else {
            return Err(BuildError::MalformedModel(format!(
                "triangle command run of {count} vertices is truncated"
            )));
        };
        cmds = rest;
        soup.expected_tris += count as isize - 2;
        if count < 3 {
            log::debug!("skipping triangle command run of {count} vertices");
            continue;
        }

        for (state, vertex) in run.chunks_exact(VERTEX_WORDS).enumerate() {
            let n = soup.points.len() as u32;
            let position = state + 1;

            if state < 3 {
                soup.indices.push(n);
            } else if strip {
                // flip winding on every other strip triangle
                if position & 1 == 1 {
                    soup.indices.extend([n - 2, n - 1, n]);
                } else {
                    soup.indices.extend([n - 1, n - 2, n]);
                }
            } else {
                soup.indices.extend([n - state as u32, n - 1, n]);
            }

            let point = usize::try_from(vertex[0])
                .ok()
                .and_then(|i| vertices.get(i))
                .ok_or_else(|| {
                    BuildError::MalformedModel(format!("vertex index {} out of range", vertex[0]))
                })?;

            soup.points.push(*point);
            soup.coords.push(texcoord(texture, vertex[2], vertex[3]));
            soup.skin_refs.push(skin_ref);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<Point3<Real>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ]
    }

    fn texture() -> Texture {
        Texture {
            width: 64,
            height: 32,
            ..Default::default()
        }
    }

    #[test]
    fn strip_alternates_winding() {
        let cmds = [4, 0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0];
        let mut soup = TriangleSoup::default();
        decode_mesh(&mut soup, &cmds, &quad(), &texture(), 3).unwrap();
        assert_eq!(soup.indices, vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(soup.expected_tris, 2);
        assert_eq!(soup.num_triangles(), 2);
    }

    #[test]
    fn fan_shares_first_vertex() {
        let cmds = [-5, 0, 0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 2, 0, 0, 0];
        let mut soup = TriangleSoup::default();
        decode_mesh(&mut soup, &cmds, &quad(), &texture(), 0).unwrap();
        assert_eq!(soup.indices, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
        assert_eq!(soup.expected_tris, 3);
    }

    #[test]
    fn pixel_coordinates_are_normalized() {
        let cmds = [3, 0, 0, 32, 16, 1, 0, 64, 0, 2, 0, 0, 32, 0];
        let mut soup = TriangleSoup::default();
        decode_mesh(&mut soup, &cmds, &quad(), &texture(), 0).unwrap();
        assert_eq!(soup.coords, vec![[0.5, 0.5], [1.0, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn out_of_range_vertex_is_malformed() {
        let cmds = [3, 0, 0, 0, 0, 1, 0, 0, 0, 9, 0, 0, 0];
        let mut soup = TriangleSoup::default();
        let result = decode_mesh(&mut soup, &cmds, &quad(), &texture(), 0);
        assert!(matches!(result, Err(BuildError::MalformedModel(_))));
    }

    #[test]
    fn truncated_run_is_malformed() {
        let cmds = [3, 0, 0, 0, 0, 1, 0];
        let mut soup = TriangleSoup::default();
        let result = decode_mesh(&mut soup, &cmds, &quad(), &texture(), 0);
        assert!(matches!(result, Err(BuildError::MalformedModel(_))));
    }

    #[test]
    fn short_runs_are_skipped_but_counted() {
        let cmds = [1, 4, 0, 0, 0, 3, 0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0];
        let mut soup = TriangleSoup::default();
        decode_mesh(&mut soup, &cmds, &quad(), &texture(), 0).unwrap();
        assert_eq!(soup.indices, vec![0, 1, 2]);
        assert_eq!(soup.num_triangles(), 1);
        // the announced count no longer matches what was decoded
        assert_eq!(soup.expected_tris, 0);
    }

    #[test]
    fn half_floats() {
        assert_eq!(half_to_float(0x0000), 0.0);
        assert_eq!(half_to_float(0x3c00), 1.0);
        assert_eq!(half_to_float(0xc000), -2.0);
        assert_eq!(half_to_float(0x3800), 0.5);
        assert_eq!(half_to_float(0x0001), 2.0f32.powi(-24));
        assert!(half_to_float(0x7c00).is_infinite());
    }
}
