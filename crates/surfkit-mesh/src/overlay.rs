//! Scalar overlay and boundary descriptors, and the per-value color mappers.
//!
//! Overlays do not own their display state. Each [`OverlayLayer`] names the
//! volume it was sampled from, and the compositor resolves the currently
//! visible display ranges for that volume through a [`DisplayRanges`]
//! implementation each time it runs. Changing a range or a color table and
//! then recoloring is how callers pick up display changes.

use std::sync::Arc;

use crate::{LUT_MAX, Rgba, SCREEN_PIXEL_MAX, SCREEN_PIXEL_MIN};

/// Identifies the volume an overlay was sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeId(pub u32);

/// Maps a pixel code to an RGB triple with channels in `0..=255`.
pub trait ColorTable {
    fn lookup(&self, code: u8) -> [u8; 3];
}

impl ColorTable for [[u8; 3]; 256] {
    fn lookup(&self, code: u8) -> [u8; 3] {
        self[usize::from(code)]
    }
}

/// Borrowed view of one display window and its color table.
#[derive(Clone, Copy)]
pub struct DisplayRange<'a> {
    /// Window start. For a negative range this is the value closest to zero.
    pub screen_min: f32,
    /// Window end.
    pub screen_max: f32,
    /// Precomputed `SCREEN_PIXEL_MAX / (screen_max - screen_min)`. Infinite
    /// for a zero-width window; the code mappers never read it in that case.
    pub screen_ratio: f32,
    /// Alpha assigned to every color this range produces.
    pub alpha: f32,
    pub table: &'a dyn ColorTable,
}

impl<'a> DisplayRange<'a> {
    #[must_use]
    pub fn new(screen_min: f32, screen_max: f32, alpha: f32, table: &'a dyn ColorTable) -> Self {
        Self {
            screen_min,
            screen_max,
            screen_ratio: f32::from(SCREEN_PIXEL_MAX) / (screen_max - screen_min),
            alpha,
            table,
        }
    }

    /// Pixel code for a value inside a positive window.
    #[must_use]
    pub fn positive_code(&self, value: f32) -> u8 {
        if value <= self.screen_min {
            SCREEN_PIXEL_MIN
        } else if value >= self.screen_max {
            SCREEN_PIXEL_MAX
        } else {
            self.interpolate(value)
        }
    }

    /// Pixel code for a value inside a negative window, where
    /// `screen_max < screen_min`.
    #[must_use]
    pub fn negative_code(&self, value: f32) -> u8 {
        if value >= self.screen_min {
            SCREEN_PIXEL_MIN
        } else if value <= self.screen_max {
            SCREEN_PIXEL_MAX
        } else {
            self.interpolate(value)
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn interpolate(&self, value: f32) -> u8 {
        // Round half up, then saturate into the code range.
        ((value - self.screen_min) * self.screen_ratio + 0.5)
            .trunc()
            .clamp(f32::from(SCREEN_PIXEL_MIN), f32::from(SCREEN_PIXEL_MAX)) as u8
    }

    fn color(&self, code: u8) -> Rgba {
        let [r, g, b] = self.table.lookup(code);
        Rgba::new(
            f32::from(r) / LUT_MAX,
            f32::from(g) / LUT_MAX,
            f32::from(b) / LUT_MAX,
            self.alpha,
        )
    }
}

impl std::fmt::Debug for DisplayRange<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayRange")
            .field("screen_min", &self.screen_min)
            .field("screen_max", &self.screen_max)
            .field("screen_ratio", &self.screen_ratio)
            .field("alpha", &self.alpha)
            .finish_non_exhaustive()
    }
}

/// The positive and negative windows currently bound to one volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerRanges<'a> {
    pub positive: Option<DisplayRange<'a>>,
    pub negative: Option<DisplayRange<'a>>,
}

/// Source of display windows, owned by the caller.
pub trait DisplayRanges {
    /// Visible windows for `volume`. Either slot may be empty.
    fn ranges(&self, volume: VolumeId) -> LayerRanges<'_>;
}

/// A [`DisplayRanges`] with nothing bound, used when no viewer state exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRanges;

impl DisplayRanges for NoRanges {
    fn ranges(&self, _volume: VolumeId) -> LayerRanges<'_> {
        LayerRanges::default()
    }
}

/// Display state for one volume as a viewer holds it.
#[derive(Clone)]
pub struct ScreenVolume {
    pub volume: VolumeId,
    /// Whether this window covers the negative tail of the data.
    pub negative: bool,
    pub hidden: bool,
    pub screen_min: f32,
    pub screen_max: f32,
    pub alpha: f32,
    pub color_table: Arc<dyn ColorTable + Send + Sync>,
}

impl ScreenVolume {
    #[must_use]
    pub fn display_range(&self) -> DisplayRange<'_> {
        DisplayRange::new(
            self.screen_min,
            self.screen_max,
            self.alpha,
            self.color_table.as_ref(),
        )
    }
}

impl std::fmt::Debug for ScreenVolume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenVolume")
            .field("volume", &self.volume)
            .field("negative", &self.negative)
            .field("hidden", &self.hidden)
            .field("screen_min", &self.screen_min)
            .field("screen_max", &self.screen_max)
            .field("alpha", &self.alpha)
            .finish_non_exhaustive()
    }
}

impl DisplayRanges for [ScreenVolume] {
    fn ranges(&self, volume: VolumeId) -> LayerRanges<'_> {
        let mut ranges = LayerRanges::default();
        for screen in self.iter().filter(|s| s.volume == volume && !s.hidden) {
            if screen.negative {
                ranges.negative = Some(screen.display_range());
            } else {
                ranges.positive = Some(screen.display_range());
            }
        }
        ranges
    }
}

impl DisplayRanges for Vec<ScreenVolume> {
    fn ranges(&self, volume: VolumeId) -> LayerRanges<'_> {
        self.as_slice().ranges(volume)
    }
}

/// Per-vertex scalar data drawn through a volume's display windows.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub values: Vec<f32>,
    pub volume: VolumeId,
}

impl OverlayLayer {
    #[must_use]
    pub fn new(volume: VolumeId, values: Vec<f32>) -> Self {
        Self { values, volume }
    }

    /// An overlay only takes part in compositing when it has exactly one
    /// value per vertex.
    #[must_use]
    pub fn is_active(&self, vertex_count: usize) -> bool {
        self.values.len() == vertex_count
    }
}

/// Binary per-vertex mask drawn as a dark outline.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    pub values: Vec<f32>,
    /// Alpha of the dark outline color.
    pub alpha: f32,
}

impl BoundaryLayer {
    #[must_use]
    pub fn new(values: Vec<f32>, alpha: f32) -> Self {
        Self { values, alpha }
    }

    /// A mask with any values takes part in compositing, even one shorter
    /// than the mesh.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.values.is_empty()
    }
}

/// Color for one overlay value.
///
/// The negative window is tried first and claims values below its
/// `screen_min`; the positive window claims values at or above its
/// `screen_min`. Anything else is transparent black.
#[must_use]
pub fn overlay_color(value: f32, ranges: &LayerRanges<'_>) -> Rgba {
    if let Some(negative) = ranges.negative.as_ref().filter(|r| value < r.screen_min) {
        negative.color(negative.negative_code(value))
    } else if let Some(positive) = ranges.positive.as_ref().filter(|r| value >= r.screen_min) {
        positive.color(positive.positive_code(value))
    } else {
        Rgba::TRANSPARENT
    }
}

/// Color for one boundary value: outline above `0.5`, opaque white otherwise.
#[must_use]
pub fn boundary_color(value: f32, alpha: f32) -> Rgba {
    if value > 0.5 {
        Rgba::new(0.0, 0.0, 0.0, alpha)
    } else {
        Rgba::WHITE
    }
}
