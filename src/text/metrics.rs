use std::collections::HashMap;

use log::warn;

/// Opaque handle identifying one font atlas texture and its metric tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtlasId(pub u32);

/// Left/right/bottom/top extents of a glyph rectangle, either in normalized
/// atlas space (UV bounds) or em-relative space (quad bounds).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub l: f32,
    pub r: f32,
    pub b: f32,
    pub t: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerticalMetrics {
    pub line_height: f64,
    pub ascender: f64,
    /// Magnitude of the descender, stored positive.
    pub descender: f64,
}

/// Metric tables for one atlas. Populated in full at atlas-load time and
/// read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct FontMetrics {
    pub advances: HashMap<char, f64>,
    pub uv_bounds: HashMap<char, Rect>,
    pub quad_bounds: HashMap<char, Rect>,
    /// Keyed by (code point, previous code point).
    pub kerning: HashMap<(char, char), f64>,
    pub vertical: VerticalMetrics,
}

/// Per-atlas metric lookup. Every accessor degrades softly: a missing atlas
/// or code point logs a diagnostic and yields zeroed geometry instead of
/// aborting the frame.
#[derive(Debug, Default)]
pub struct MetricsProvider {
    fonts: HashMap<AtlasId, FontMetrics>,
}

impl MetricsProvider {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
        }
    }

    pub fn insert(&mut self, atlas: AtlasId, metrics: FontMetrics) {
        self.fonts.insert(atlas, metrics);
    }

    pub fn advance(&self, atlas: AtlasId, code_point: char) -> f64 {
        let Some(font) = self.fonts.get(&atlas) else {
            warn!("advance lookup: no metric tables for atlas {:?}", atlas);
            return 0.0;
        };
        match font.advances.get(&code_point) {
            Some(advance) => *advance,
            None => {
                warn!(
                    "advance lookup: {:?} missing in atlas {:?}",
                    code_point, atlas
                );
                0.0
            }
        }
    }

    pub fn uv_bounds(&self, atlas: AtlasId, code_point: char) -> Rect {
        let Some(font) = self.fonts.get(&atlas) else {
            warn!("uv bounds lookup: no metric tables for atlas {:?}", atlas);
            return Rect::default();
        };
        match font.uv_bounds.get(&code_point) {
            Some(rect) => *rect,
            None => {
                warn!(
                    "uv bounds lookup: {:?} missing in atlas {:?}",
                    code_point, atlas
                );
                Rect::default()
            }
        }
    }

    /// Em-relative quad extents with the kerning adjustment for
    /// (code point, previous) applied as a shift of the left/right edges.
    /// An absent kerning pair means zero adjustment, not an error.
    pub fn quad_bounds(&self, atlas: AtlasId, code_point: char, previous: Option<char>) -> Rect {
        let Some(font) = self.fonts.get(&atlas) else {
            warn!("quad bounds lookup: no metric tables for atlas {:?}", atlas);
            return Rect::default();
        };
        let Some(rect) = font.quad_bounds.get(&code_point) else {
            warn!(
                "quad bounds lookup: {:?} missing in atlas {:?}",
                code_point, atlas
            );
            return Rect::default();
        };

        let mut rect = *rect;
        if let Some(prev) = previous {
            if let Some(kern) = font.kerning.get(&(code_point, prev)) {
                rect.l += *kern as f32;
                rect.r += *kern as f32;
            }
        }
        rect
    }

    pub fn vertical_metrics(&self, atlas: AtlasId) -> VerticalMetrics {
        match self.fonts.get(&atlas) {
            Some(font) => font.vertical,
            None => {
                warn!("vertical metrics: no metric tables for atlas {:?}", atlas);
                VerticalMetrics::default()
            }
        }
    }
}
