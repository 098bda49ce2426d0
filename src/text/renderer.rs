use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use glam::Vec3;
use log::warn;
use wgpu::RenderPass;

use crate::{
    render::{Vertex, buffer::DynamicBuffer},
    text::{
        atlas::FontAtlas,
        batch::{GlyphBatcher, GlyphVertex, VERTS_PER_GLYPH},
        metrics::{AtlasId, MetricsProvider},
        placement,
    },
};

struct GpuBatch {
    buf: DynamicBuffer<GlyphVertex>,
    capacity: usize,
}

/// Owns the text pipeline, the loaded atlases and the per-atlas batches, and
/// turns each non-empty batch into exactly one draw call per frame.
///
/// Single-threaded by design: one thread drives
/// `begin_frame -> draw_text* -> end_frame*`.
pub struct TextRenderer {
    pipeline: wgpu::RenderPipeline,
    atlas_layout: wgpu::BindGroupLayout,
    metrics: MetricsProvider,
    batcher: GlyphBatcher,
    atlases: HashMap<AtlasId, FontAtlas>,
    gpu_batches: HashMap<AtlasId, GpuBatch>,
    next_atlas_id: u32,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl TextRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        globals_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let atlas_layout = FontAtlas::bind_group_layout(device);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("text_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../assets/shaders/text.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("text_pipeline_layout"),
            bind_group_layouts: &[globals_layout, &atlas_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("text_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GlyphVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            // Slightly overlapping characters would fight a depth buffer, so
            // text renders without one.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            atlas_layout,
            metrics: MetricsProvider::new(),
            batcher: GlyphBatcher::new(),
            atlases: HashMap::new(),
            gpu_batches: HashMap::new(),
            next_atlas_id: 0,
            device: device.clone(),
            queue: queue.clone(),
        }
    }

    /// Build the SDF atlas and metric tables for a font file. Fatal on
    /// failure; fonts only load at startup.
    pub fn load_font(&mut self, path: impl AsRef<Path>) -> Result<AtlasId> {
        let id = AtlasId(self.next_atlas_id);
        let atlas = FontAtlas::new(
            &self.device,
            &self.queue,
            &self.atlas_layout,
            &mut self.metrics,
            path,
            id,
        )?;
        self.next_atlas_id += 1;
        self.atlases.insert(id, atlas);
        Ok(id)
    }

    pub fn metrics(&self) -> &MetricsProvider {
        &self.metrics
    }

    pub fn loaded_atlases(&self) -> Vec<AtlasId> {
        self.atlases.keys().copied().collect()
    }

    /// Append `text` to the batch bucket for `atlas`. Pure CPU side effect;
    /// nothing reaches the GPU until `end_frame`.
    pub fn draw_text(
        &mut self,
        atlas: AtlasId,
        text: &str,
        position: Vec3,
        size: f32,
        color: [f32; 4],
        centered: bool,
    ) {
        placement::draw_text(
            &mut self.batcher,
            &self.metrics,
            atlas,
            text,
            position,
            size,
            color,
            centered,
        );
    }

    /// Zero every bucket's quad count. Backing storage is kept; the draw
    /// range in `end_frame` is bounded by the quad count, not buffer length.
    pub fn begin_frame(&mut self) {
        self.batcher.begin_frame();
    }

    /// Upload the batch for `atlas` and issue its single draw call. Skipping
    /// atlases that batched nothing this frame is fine.
    pub fn end_frame(
        &mut self,
        render_pass: &mut RenderPass<'_>,
        globals: &wgpu::BindGroup,
        atlas: AtlasId,
    ) {
        let Some(bucket) = self.batcher.bucket(atlas) else {
            return;
        };
        let vert_count = bucket.quad_count() * VERTS_PER_GLYPH;
        if vert_count == 0 {
            return;
        }
        let Some(font) = self.atlases.get(&atlas) else {
            warn!("end_frame for atlas {:?} with no loaded font", atlas);
            return;
        };

        let gpu = self
            .gpu_batches
            .entry(atlas)
            .or_insert_with(|| GpuBatch {
                buf: DynamicBuffer::new(&self.device, bucket.capacity(), wgpu::BufferUsages::VERTEX),
                capacity: bucket.capacity(),
            });
        if vert_count > gpu.capacity {
            let new_cap = vert_count.next_power_of_two();
            gpu.buf = DynamicBuffer::new(&self.device, new_cap, wgpu::BufferUsages::VERTEX);
            gpu.capacity = new_cap;
        }
        gpu.buf.update(&self.queue, bucket.vertices(), 0);

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, globals, &[]);
        render_pass.set_bind_group(1, &font.bind_group, &[]);
        render_pass.set_vertex_buffer(0, gpu.buf.buff.slice(..));
        render_pass.draw(0..vert_count as u32, 0..1);
    }
}
