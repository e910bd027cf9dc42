//! Surface mesh records and the sub-surface chain.

use crate::compositor::composite_colors;
use crate::error::{MeshError, MeshResult};
use crate::normals::compute_vertex_normals;
use crate::overlay::{BoundaryLayer, DisplayRanges, OverlayLayer};

/// Raw geometry for one sub-surface as a decoder reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Interleaved XYZ, `3 * vertex_count` floats.
    pub positions: Vec<f32>,
    /// Vertex indices, `3 * triangle_count` entries.
    pub triangles: Vec<u32>,
    /// Interleaved unit normals, if the file carried them.
    pub normals: Option<Vec<f32>>,
}

/// One render-ready surface.
///
/// A decoded file can hold several sub-surfaces; they are chained through
/// [`SurfaceMesh::next`], each record owning its successor.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    /// Name the surface was loaded under.
    pub name: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub positions: Vec<f32>,
    pub triangles: Vec<u32>,
    /// Unit normal per vertex once known.
    pub normals: Option<Vec<f32>>,
    /// RGBA per vertex, written by [`SurfaceMesh::recolor`].
    pub colors: Vec<f32>,
    /// Base color under translucent overlay results.
    pub solid_color: Option<[f32; 3]>,
    /// Whole-surface opacity in `[0, 1]`.
    pub opacity: f32,
    /// Display icon reference.
    pub icon: Option<String>,
    /// Scalar overlays in declaration order.
    pub overlays: Vec<OverlayLayer>,
    pub boundary: Option<BoundaryLayer>,
    pub next: Option<Box<SurfaceMesh>>,
}

impl SurfaceMesh {
    /// Build a record from decoded geometry, checking its invariants.
    ///
    /// Colors start empty; call [`SurfaceMesh::recolor`] to fill them.
    pub fn from_geometry(name: impl Into<String>, geometry: MeshGeometry) -> MeshResult<Self> {
        let mesh = Self {
            name: name.into(),
            vertex_count: geometry.vertex_count,
            triangle_count: geometry.triangle_count,
            positions: geometry.positions,
            triangles: geometry.triangles,
            normals: geometry.normals,
            colors: Vec::new(),
            solid_color: None,
            opacity: 1.0,
            icon: None,
            overlays: Vec::new(),
            boundary: None,
            next: None,
        };
        mesh.check_geometry()?;
        Ok(mesh)
    }

    /// Check buffer lengths and index bounds, colors included.
    pub fn validate(&self) -> MeshResult<()> {
        self.check_geometry()?;
        let expected = self.vertex_count * 4;
        if self.colors.len() != expected {
            return Err(MeshError::ColorLength {
                expected,
                actual: self.colors.len(),
            });
        }
        Ok(())
    }

    fn check_geometry(&self) -> MeshResult<()> {
        let expected = self.vertex_count * 3;
        if self.positions.len() != expected {
            return Err(MeshError::PositionLength {
                vertices: self.vertex_count,
                expected,
                actual: self.positions.len(),
            });
        }

        let expected = self.triangle_count * 3;
        if self.triangles.len() != expected {
            return Err(MeshError::TriangleLength {
                triangles: self.triangle_count,
                expected,
                actual: self.triangles.len(),
            });
        }

        if let Some((slot, &index)) = self
            .triangles
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= self.vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                slot,
                index,
                vertices: self.vertex_count,
            });
        }

        if let Some(normals) = self
            .normals
            .as_ref()
            .filter(|normals| normals.len() != self.positions.len())
        {
            return Err(MeshError::NormalLength {
                expected: self.positions.len(),
                actual: normals.len(),
            });
        }

        Ok(())
    }

    /// Replace the normals with ones reconstructed from the triangles.
    pub fn generate_normals(&mut self) -> MeshResult<()> {
        self.normals = Some(compute_vertex_normals(&self.positions, &self.triangles)?);
        Ok(())
    }

    /// Recompute [`SurfaceMesh::colors`] from the overlays, the boundary and
    /// the solid color. Only this record is touched, not its successors.
    pub fn recolor<R>(&mut self, ranges: &R)
    where
        R: DisplayRanges + ?Sized,
    {
        composite_colors(
            self.vertex_count,
            &self.overlays,
            self.boundary.as_ref(),
            self.solid_color,
            ranges,
            &mut self.colors,
        );
    }

    /// Link records in order, returning the head.
    #[must_use]
    pub fn chain(meshes: Vec<SurfaceMesh>) -> Option<SurfaceMesh> {
        meshes.into_iter().rev().fold(None, |next, mut mesh| {
            mesh.next = next.map(Box::new);
            Some(mesh)
        })
    }

    /// Unlink the chain into a vector, head first.
    #[must_use]
    pub fn into_vec(self) -> Vec<SurfaceMesh> {
        let mut meshes = Vec::new();
        let mut current = Some(self);
        while let Some(mut mesh) = current {
            current = mesh.next.take().map(|next| *next);
            meshes.push(mesh);
        }
        meshes
    }

    /// Iterate over this record and all its successors.
    #[must_use]
    pub fn iter(&self) -> Chain<'_> {
        Chain {
            current: Some(self),
        }
    }

    /// Number of records in the chain starting here.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.iter().count()
    }
}

impl<'a> IntoIterator for &'a SurfaceMesh {
    type Item = &'a SurfaceMesh;
    type IntoIter = Chain<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a sub-surface chain.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    current: Option<&'a SurfaceMesh>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a SurfaceMesh;

    fn next(&mut self) -> Option<Self::Item> {
        let mesh = self.current?;
        self.current = mesh.next.as_deref();
        Some(mesh)
    }
}
