//! Smooth vertex normal reconstruction.

use glam::Vec3;

use crate::error::{MeshError, MeshResult};

/// Compute one unit normal per vertex by accumulating face normals.
///
/// For each triangle `(p1, p2, p3)` the face normal is `(p3 - p1) × (p2 - p1)`,
/// added unnormalized to all three corners so larger faces weigh more. Each
/// accumulated vector is then negated and normalized. The cross-product order
/// and the negation together fix the orientation for the decoders' winding
/// and must be kept as they are.
///
/// Vertices that no triangle references, or whose faces cancel out, get the
/// zero vector.
///
/// # Arguments
///
/// * `positions` - Interleaved XYZ positions, 3 floats per vertex
/// * `triangles` - Vertex indices, 3 per triangle
///
/// # Returns
///
/// Interleaved XYZ normals with the same length as `positions`.
pub fn compute_vertex_normals(positions: &[f32], triangles: &[u32]) -> MeshResult<Vec<f32>> {
    let vertex_count = positions.len() / 3;
    if positions.len() % 3 != 0 {
        return Err(MeshError::PositionLength {
            vertices: vertex_count,
            expected: vertex_count * 3,
            actual: positions.len(),
        });
    }
    if triangles.len() % 3 != 0 {
        return Err(MeshError::TriangleLength {
            triangles: triangles.len() / 3,
            expected: triangles.len() / 3 * 3,
            actual: triangles.len(),
        });
    }

    let mut accumulated = vec![Vec3::ZERO; vertex_count];
    let point = |index: usize| Vec3::from_slice(&positions[index * 3..index * 3 + 3]);

    for (face, corners) in triangles.chunks_exact(3).enumerate() {
        let mut idx = [0usize; 3];
        for (corner, (&index, slot)) in corners.iter().zip(idx.iter_mut()).enumerate() {
            let index_usize = index as usize;
            if index_usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    slot: face * 3 + corner,
                    index,
                    vertices: vertex_count,
                });
            }
            *slot = index_usize;
        }

        let p1 = point(idx[0]);
        let q = point(idx[1]) - p1;
        let p = point(idx[2]) - p1;
        let normal = p.cross(q);

        for &i in &idx {
            accumulated[i] += normal;
        }
    }

    Ok(accumulated
        .into_iter()
        .flat_map(|n| (-n).normalize_or_zero().to_array())
        .collect())
}
