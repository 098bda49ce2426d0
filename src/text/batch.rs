use std::collections::HashMap;

use bytemuck::Zeroable;
use log::debug;

use crate::{render::Vertex, text::metrics::AtlasId};

/// Two counter-clockwise triangles per glyph, no index buffer; the shared
/// diagonal is duplicated.
pub const VERTS_PER_GLYPH: usize = 6;

// Initially space for 256 / 6 = 42 letters.
const INITIAL_VERTEX_CAPACITY: usize = 256;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex for GlyphVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Growable vertex store for one atlas texture.
///
/// Physical capacity only ever grows; the logical quad count is zeroed each
/// frame and bounds the range handed to the draw call, so stale tail
/// vertices from earlier frames are never issued and never need clearing.
pub struct GlyphBatch {
    verts: Vec<GlyphVertex>,
    quad_count: usize,
}

impl GlyphBatch {
    pub fn new() -> Self {
        Self {
            verts: vec![GlyphVertex::zeroed(); INITIAL_VERTEX_CAPACITY],
            quad_count: 0,
        }
    }

    /// Double the backing storage until `pending` more glyphs fit after the
    /// ones already batched this frame. Written vertex data survives growth.
    pub fn reserve(&mut self, pending: usize) {
        while self.verts.len() <= (self.quad_count + pending) * VERTS_PER_GLYPH {
            let new_len = self.verts.len() * 2;
            self.verts.resize(new_len, GlyphVertex::zeroed());
            debug!("Resized glyph batch capacity to {} vertices", new_len);
        }
    }

    /// Append one quad. `reserve` must have made room for it.
    pub fn push_quad(&mut self, quad: [GlyphVertex; VERTS_PER_GLYPH]) {
        let base = self.quad_count * VERTS_PER_GLYPH;
        debug_assert!(
            base + VERTS_PER_GLYPH <= self.verts.len(),
            "push_quad without reserving room: {} quads batched, capacity {} vertices",
            self.quad_count,
            self.verts.len()
        );
        self.verts[base..base + VERTS_PER_GLYPH].copy_from_slice(&quad);
        self.quad_count += 1;
    }

    pub fn quad_count(&self) -> usize {
        self.quad_count
    }

    pub fn capacity(&self) -> usize {
        self.verts.len()
    }

    /// The vertices batched this frame, exactly `quad_count * 6` of them.
    pub fn vertices(&self) -> &[GlyphVertex] {
        &self.verts[..self.quad_count * VERTS_PER_GLYPH]
    }

    pub fn reset(&mut self) {
        self.quad_count = 0;
    }
}

impl Default for GlyphBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-atlas batch buckets. Buckets appear lazily on the first glyph drawn
/// for an atlas and live for the rest of the process.
///
/// Single-threaded use only: concurrent draws into the same bucket map must
/// be serialized by the caller.
#[derive(Default)]
pub struct GlyphBatcher {
    buckets: HashMap<AtlasId, GlyphBatch>,
}

impl GlyphBatcher {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    pub fn bucket_mut(&mut self, atlas: AtlasId) -> &mut GlyphBatch {
        self.buckets.entry(atlas).or_default()
    }

    pub fn bucket(&self, atlas: AtlasId) -> Option<&GlyphBatch> {
        self.buckets.get(&atlas)
    }

    /// Zero every bucket's quad count; backing storage is retained.
    pub fn begin_frame(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(tag: f32) -> [GlyphVertex; VERTS_PER_GLYPH] {
        [GlyphVertex {
            position: [tag, 0.0, 0.0],
            uv: [0.0, 0.0],
            color: [1.0; 4],
        }; VERTS_PER_GLYPH]
    }

    #[test]
    fn growth_is_geometric_and_preserves_content() {
        let mut batch = GlyphBatch::new();
        let initial = batch.capacity();

        let n = initial / VERTS_PER_GLYPH + 10;
        for i in 0..n {
            batch.reserve(1);
            batch.push_quad(quad(i as f32));
        }

        assert!(batch.capacity() >= n * VERTS_PER_GLYPH);
        // Doubling from the initial length, never a linear bump.
        assert_eq!(batch.capacity() % initial, 0);
        assert!((batch.capacity() / initial).is_power_of_two());

        // Quads written before the regrow survive it.
        for i in 0..n {
            assert_eq!(
                batch.vertices()[i * VERTS_PER_GLYPH].position[0],
                i as f32
            );
        }
    }

    #[test]
    fn reserve_accounts_for_quads_already_batched() {
        let mut batch = GlyphBatch::new();
        let per_call = 10;
        for _ in 0..8 {
            batch.reserve(per_call);
            for _ in 0..per_call {
                batch.push_quad(quad(0.0));
            }
        }
        assert_eq!(batch.quad_count(), 80);
        assert!(batch.capacity() >= 80 * VERTS_PER_GLYPH);
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut batch = GlyphBatch::new();
        batch.reserve(100);
        let grown = batch.capacity();
        for _ in 0..100 {
            batch.push_quad(quad(1.0));
        }

        batch.reset();
        assert_eq!(batch.quad_count(), 0);
        assert!(batch.vertices().is_empty());
        assert_eq!(batch.capacity(), grown);
    }

    #[test]
    #[should_panic(expected = "push_quad without reserving room")]
    fn push_without_reserve_trips_the_capacity_check() {
        let mut batch = GlyphBatch::new();
        for i in 0.. {
            batch.push_quad(quad(i as f32));
        }
    }

    #[test]
    fn buckets_are_created_lazily_and_reset_per_frame() {
        let mut batcher = GlyphBatcher::new();
        assert!(batcher.bucket(AtlasId(0)).is_none());

        batcher.bucket_mut(AtlasId(0)).push_quad(quad(0.0));
        batcher.bucket_mut(AtlasId(1)).push_quad(quad(0.0));
        assert_eq!(batcher.bucket(AtlasId(0)).unwrap().quad_count(), 1);

        batcher.begin_frame();
        assert_eq!(batcher.bucket(AtlasId(0)).unwrap().quad_count(), 0);
        assert_eq!(batcher.bucket(AtlasId(1)).unwrap().quad_count(), 0);
    }
}
