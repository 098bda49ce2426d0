use std::path::Path;

use anyhow::{Context, Result};
use freetype::{Library, face::LoadFlag, face::KerningMode};
use log::info;

use crate::text::metrics::{AtlasId, FontMetrics, MetricsProvider, Rect, VerticalMetrics};

/// Edge length of the atlas texture in pixels.
pub const ATLAS_SIZE: u32 = 1024;

/// Rasterization size: one em maps to this many atlas pixels.
const RASTER_PX: u32 = 64;

/// Distance spread on each side of a glyph outline, in atlas pixels.
const SDF_SPREAD: i32 = 8;

/// Total distance range encoded in the field, used by the shader's
/// screen-px-range computation.
pub const SDF_PIXEL_RANGE: f32 = (SDF_SPREAD * 2) as f32;

// Printable ASCII.
const FIRST_CHAR: char = ' ';
const LAST_CHAR: char = '~';

/// One font's SDF texture plus the GPU bindings for its draw call. Building
/// it also populates the metric tables for its atlas id; a failure here is
/// fatal at startup, before any batching has happened.
pub struct FontAtlas {
    pub id: AtlasId,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub bind_group: wgpu::BindGroup,
}

struct RasterGlyph {
    code_point: char,
    // SDF bitmap, `width * height`, spread padding included.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    // Em-relative extents of the padded bitmap.
    quad: Rect,
}

impl FontAtlas {
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glyph_atlas_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Load `font_path`, rasterize the charset into a single SDF texture and
    /// populate every metric table for `id` in one go. The tables are
    /// read-only from here on.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        metrics: &mut MetricsProvider,
        font_path: impl AsRef<Path>,
        id: AtlasId,
    ) -> Result<Self> {
        let font_path = font_path.as_ref();
        let library = Library::init()?;
        let face = library
            .new_face(font_path, 0)
            .with_context(|| format!("failed to load font '{}'", font_path.display()))?;
        face.set_pixel_sizes(0, RASTER_PX)?;

        let px = RASTER_PX as f64;
        let mut font_metrics = FontMetrics::default();
        let mut glyphs = Vec::new();

        for c in FIRST_CHAR..=LAST_CHAR {
            let Some(glyph_index) = face.get_char_index(c as usize) else {
                continue;
            };
            face.load_glyph(glyph_index, LoadFlag::RENDER | LoadFlag::TARGET_NORMAL)?;
            let slot = face.glyph();

            font_metrics
                .advances
                .insert(c, slot.advance().x as f64 / 64.0 / px);

            let bitmap = slot.bitmap();
            let (width, height) = (bitmap.width() as u32, bitmap.rows() as u32);
            if width == 0 || height == 0 {
                // Whitespace: advance only, degenerate zero-size quad.
                font_metrics.uv_bounds.insert(c, Rect::default());
                font_metrics.quad_bounds.insert(c, Rect::default());
                continue;
            }

            let pixels = sdf_from_coverage(
                bitmap.buffer(),
                bitmap.pitch() as usize,
                width as i32,
                height as i32,
            );
            let padded_w = width + 2 * SDF_SPREAD as u32;
            let padded_h = height + 2 * SDF_SPREAD as u32;

            // Quad extents cover the padded bitmap so the distance field has
            // room around the outline.
            let left = slot.bitmap_left() - SDF_SPREAD;
            let top = slot.bitmap_top() + SDF_SPREAD;
            let quad = Rect {
                l: left as f32 / px as f32,
                r: (left + padded_w as i32) as f32 / px as f32,
                b: (top - padded_h as i32) as f32 / px as f32,
                t: top as f32 / px as f32,
            };

            glyphs.push(RasterGlyph {
                code_point: c,
                pixels,
                width: padded_w,
                height: padded_h,
                quad,
            });
        }

        if face.has_kerning() {
            for prev in FIRST_CHAR..=LAST_CHAR {
                let Some(prev_index) = face.get_char_index(prev as usize) else {
                    continue;
                };
                for c in FIRST_CHAR..=LAST_CHAR {
                    let Some(index) = face.get_char_index(c as usize) else {
                        continue;
                    };
                    let kern = face.get_kerning(prev_index, index, KerningMode::KerningDefault)?;
                    if kern.x != 0 {
                        font_metrics
                            .kerning
                            .insert((c, prev), kern.x as f64 / 64.0 / px);
                    }
                }
            }
        }

        if let Some(m) = face.size_metrics() {
            font_metrics.vertical = VerticalMetrics {
                line_height: (m.height >> 6) as f64 / px,
                ascender: (m.ascender >> 6) as f64 / px,
                descender: -((m.descender >> 6) as f64) / px,
            };
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph_atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // Shelf packing with a one-pixel gutter between glyphs.
        let mut cursor_x = 1u32;
        let mut cursor_y = 1u32;
        let mut row_h = 0u32;
        for glyph in &glyphs {
            if cursor_x + glyph.width + 1 > ATLAS_SIZE {
                cursor_x = 1;
                cursor_y += row_h + 1;
                row_h = 0;
            }
            anyhow::ensure!(
                cursor_y + glyph.height + 1 <= ATLAS_SIZE,
                "glyph atlas overflow while packing '{}'",
                font_path.display()
            );

            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: cursor_x,
                        y: cursor_y,
                        z: 0,
                    },
                },
                &glyph.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(glyph.width),
                    rows_per_image: Some(glyph.height),
                },
                wgpu::Extent3d {
                    width: glyph.width,
                    height: glyph.height,
                    depth_or_array_layers: 1,
                },
            );

            let s = ATLAS_SIZE as f32;
            font_metrics.uv_bounds.insert(
                glyph.code_point,
                Rect {
                    l: cursor_x as f32 / s,
                    r: (cursor_x + glyph.width) as f32 / s,
                    b: (cursor_y + glyph.height) as f32 / s,
                    t: cursor_y as f32 / s,
                },
            );
            font_metrics.quad_bounds.insert(glyph.code_point, glyph.quad);

            row_h = row_h.max(glyph.height);
            cursor_x += glyph.width + 1;
        }

        info!(
            "Loaded font '{}' as atlas {:?}: {} glyphs, {} kerning pairs",
            font_path.display(),
            id,
            glyphs.len(),
            font_metrics.kerning.len()
        );

        // All tables for this atlas land at once; rendering never sees a
        // partially populated font.
        metrics.insert(id, font_metrics);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph_atlas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph_atlas_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(Self {
            id,
            texture,
            view,
            sampler,
            bind_group,
        })
    }
}

/// Turn an 8-bit coverage bitmap into a single-channel SDF with `SDF_SPREAD`
/// pixels of padding on every side. 0.5 sits on the outline, inside is
/// above, outside below.
fn sdf_from_coverage(coverage: &[u8], pitch: usize, width: i32, height: i32) -> Vec<u8> {
    let spread = SDF_SPREAD;
    let out_w = width + 2 * spread;
    let out_h = height + 2 * spread;
    let inside = |x: i32, y: i32| -> bool {
        if x < 0 || y < 0 || x >= width || y >= height {
            return false;
        }
        coverage[y as usize * pitch + x as usize] >= 128
    };

    let mut out = vec![0u8; (out_w * out_h) as usize];
    for oy in 0..out_h {
        for ox in 0..out_w {
            let gx = ox - spread;
            let gy = oy - spread;
            let here = inside(gx, gy);

            // Nearest pixel of the opposite state within the spread window.
            let mut best_sq = (spread * spread * 2) as f32;
            for dy in -spread..=spread {
                for dx in -spread..=spread {
                    if inside(gx + dx, gy + dy) != here {
                        let d = (dx * dx + dy * dy) as f32;
                        if d < best_sq {
                            best_sq = d;
                        }
                    }
                }
            }
            let dist = best_sq.sqrt().min(spread as f32);
            let signed = if here { dist } else { -dist };
            // Map [-spread, spread] onto [0, 1] with the edge at 0.5.
            let normalized = signed / (2.0 * spread as f32) + 0.5;
            out[(oy * out_w + ox) as usize] = (normalized * 255.0).round() as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdf_marks_the_edge_at_half_intensity() {
        // 4x4 solid block, no pitch padding.
        let coverage = vec![255u8; 16];
        let sdf = sdf_from_coverage(&coverage, 4, 4, 4);
        let w = (4 + 2 * SDF_SPREAD) as usize;

        // Far-away corner is fully outside.
        assert!(sdf[0] < 96);
        // Block centre is inside.
        let cx = SDF_SPREAD as usize + 2;
        assert!(sdf[cx * w + cx] > 128);
        // A pixel just outside the block sits near, but below, the midpoint.
        let edge = sdf[(SDF_SPREAD as usize + 1) * w + SDF_SPREAD as usize - 1];
        assert!(edge < 128 && edge > 96);
    }

    #[test]
    fn sdf_output_is_padded_by_the_spread() {
        let coverage = vec![255u8; 4];
        let sdf = sdf_from_coverage(&coverage, 2, 2, 2);
        assert_eq!(
            sdf.len(),
            ((2 + 2 * SDF_SPREAD) * (2 + 2 * SDF_SPREAD)) as usize
        );
    }
}
