//! Multi-layer vertex color compositing.

use crate::Rgba;
use crate::overlay::{
    BoundaryLayer, DisplayRanges, LayerRanges, OverlayLayer, boundary_color, overlay_color,
};

enum Layer<'a> {
    Overlay {
        values: &'a [f32],
        ranges: LayerRanges<'a>,
    },
    Boundary(&'a BoundaryLayer),
}

impl Layer<'_> {
    fn color(&self, vertex: usize) -> Rgba {
        match self {
            Self::Overlay { values, ranges } => overlay_color(values[vertex], ranges),
            // Vertices past the end of a short mask read as background.
            Self::Boundary(boundary) => boundary
                .values
                .get(vertex)
                .map_or(Rgba::WHITE, |&value| boundary_color(value, boundary.alpha)),
        }
    }
}

/// Fill `out` with one RGBA quadruple per vertex.
///
/// Active overlays are stacked newest first, followed by the boundary mask.
/// Each vertex starts transparent and every layer is blended in with
/// [`Rgba::combine`], the running color as the front operand. A result that
/// is not fully opaque is finished over `solid_color` (or white), so every
/// vertex ends with alpha 1.
///
/// With no active layer the whole buffer is opaque white. The output depends
/// only on the arguments, so calling this again after a display change
/// recolors in place.
///
/// # Arguments
///
/// * `vertex_count` - Number of vertices; `out` is resized to `4 * vertex_count`
/// * `overlays` - Overlays in declaration order
/// * `boundary` - Optional boundary mask; only used when it has values.
///   Vertices it does not cover get white from the mask
/// * `solid_color` - Base color under partially transparent results
/// * `ranges` - Current display windows for the overlays' volumes
pub fn composite_colors<R>(
    vertex_count: usize,
    overlays: &[OverlayLayer],
    boundary: Option<&BoundaryLayer>,
    solid_color: Option<[f32; 3]>,
    ranges: &R,
    out: &mut Vec<f32>,
) where
    R: DisplayRanges + ?Sized,
{
    out.clear();
    out.resize(vertex_count * 4, 1.0);

    let mut layers: Vec<Layer<'_>> = overlays
        .iter()
        .rev()
        .filter(|overlay| overlay.is_active(vertex_count))
        .map(|overlay| Layer::Overlay {
            values: &overlay.values,
            ranges: ranges.ranges(overlay.volume),
        })
        .collect();
    if let Some(boundary) = boundary.filter(|b| b.is_active()) {
        layers.push(Layer::Boundary(boundary));
    }

    if layers.is_empty() {
        return;
    }

    let base = Rgba::opaque(solid_color.unwrap_or([1.0, 1.0, 1.0]));
    for (vertex, rgba) in out.chunks_exact_mut(4).enumerate() {
        let mut color = layers
            .iter()
            .fold(Rgba::TRANSPARENT, |color, layer| color.combine(layer.color(vertex)));
        if color.a < 1.0 {
            color = color.combine(base);
        }
        rgba.copy_from_slice(&color.to_array());
    }
}
