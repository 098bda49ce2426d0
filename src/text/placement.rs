use glam::Vec3;

use crate::text::{
    batch::{GlyphBatcher, GlyphVertex},
    layout,
    metrics::{AtlasId, MetricsProvider},
};

/// Placement pass: lay out `text` glyph by glyph and append the quads to the
/// bucket for `atlas`.
///
/// Runs the width pre-pass first (centering needs whole-line widths up
/// front), then walks the string once more placing each visible character at
/// the cursor. Kerning shifts the rendered quad of a character but never the
/// cursor: advances accumulate per-character pen movement only.
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    batcher: &mut GlyphBatcher,
    metrics: &MetricsProvider,
    atlas: AtlasId,
    text: &str,
    position: Vec3,
    size: f32,
    color: [f32; 4],
    centered: bool,
) {
    let bucket = batcher.bucket_mut(atlas);
    bucket.reserve(text.chars().count());

    let vertical = metrics.vertical_metrics(atlas);
    let line_height = vertical.line_height as f32;
    // Fixed vertical anchor: the baseline lands in the same place whatever
    // the font's metrics are.
    let y_offset = (vertical.descender - 1.0) as f32;

    let line_widths = layout::line_widths(text, atlas, metrics);

    let mut cursor = 0.0f64;
    let mut line = 0usize;
    let mut prev_char: Option<char> = None;

    for c in text.chars() {
        match c {
            '\n' => {
                line += 1;
                cursor = 0.0;
                continue;
            }
            '\r' => {
                cursor = 0.0;
                continue;
            }
            '\t' => {
                cursor = layout::next_tab_stop(cursor);
                continue;
            }
            _ => {}
        }

        let x_offset = if centered {
            (-line_widths[line] / 2.0) as f32
        } else {
            0.0
        };

        let uv = metrics.uv_bounds(atlas, c);
        let quad = metrics.quad_bounds(atlas, c, prev_char);

        let cx = cursor as f32 + x_offset;
        let cy = -(line as f32) * line_height + y_offset;
        let corner = |x: f32, y: f32, u: f32, v: f32| GlyphVertex {
            position: (position + size * Vec3::new(x + cx, y + cy, 0.0)).into(),
            uv: [u, v],
            color,
        };

        bucket.push_quad([
            corner(quad.l, quad.t, uv.l, uv.t), // lt
            corner(quad.r, quad.b, uv.r, uv.b), // rb
            corner(quad.l, quad.b, uv.l, uv.b), // lb
            corner(quad.l, quad.t, uv.l, uv.t), // lt
            corner(quad.r, quad.t, uv.r, uv.t), // rt
            corner(quad.r, quad.b, uv.r, uv.b), // rb
        ]);

        prev_char = Some(c);
        cursor += metrics.advance(atlas, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{
        batch::VERTS_PER_GLYPH,
        metrics::{FontMetrics, Rect, VerticalMetrics},
    };

    const ATLAS: AtlasId = AtlasId(7);

    fn provider() -> MetricsProvider {
        let mut font = FontMetrics::default();
        for (i, c) in ('a'..='z').enumerate() {
            font.advances.insert(c, 0.5 + i as f64 * 0.01);
            font.uv_bounds.insert(
                c,
                Rect {
                    l: 0.0,
                    r: 0.1,
                    b: 0.1,
                    t: 0.0,
                },
            );
            font.quad_bounds.insert(
                c,
                Rect {
                    l: 0.05,
                    r: 0.55,
                    b: -0.1,
                    t: 0.7,
                },
            );
        }
        font.kerning.insert(('b', 'a'), -0.07);
        font.vertical = VerticalMetrics {
            line_height: 1.2,
            ascender: 0.8,
            descender: 0.2,
        };
        let mut p = MetricsProvider::new();
        p.insert(ATLAS, font);
        p
    }

    fn draw(batcher: &mut GlyphBatcher, metrics: &MetricsProvider, text: &str, centered: bool) {
        draw_text(
            batcher,
            metrics,
            ATLAS,
            text,
            Vec3::ZERO,
            1.0,
            [1.0; 4],
            centered,
        );
    }

    #[test]
    fn one_quad_per_visible_character() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        draw(&mut batcher, &metrics, "hello", false);
        assert_eq!(batcher.bucket(ATLAS).unwrap().quad_count(), 5);

        // A second string in the same frame keeps appending.
        draw(&mut batcher, &metrics, "world", false);
        assert_eq!(batcher.bucket(ATLAS).unwrap().quad_count(), 10);
    }

    #[test]
    fn control_characters_consume_no_quad_slot() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        draw(&mut batcher, &metrics, "ab\n\tcd\re", false);
        assert_eq!(batcher.bucket(ATLAS).unwrap().quad_count(), 5);
    }

    #[test]
    fn form_feed_is_drawn_and_does_not_advance_the_line() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        // Form feed breaks a line in the width table only; the placement
        // pass renders it like any other (here unmapped) character.
        draw(&mut batcher, &metrics, "a\x0cb", true);
        let bucket = batcher.bucket(ATLAS).unwrap();
        assert_eq!(bucket.quad_count(), 3);

        let verts = bucket.vertices();
        let a = &verts[0];
        let b = &verts[2 * VERTS_PER_GLYPH];
        // 'b' stays on the first visual line.
        assert_eq!(b.position[1], a.position[1]);
        // Both center against the width table's first line.
        let widths = layout::line_widths("a\x0cb", ATLAS, &metrics);
        let quad_l = 0.05f64;
        assert!((a.position[0] as f64 - (quad_l - widths[0] / 2.0)).abs() < 1e-5);
    }

    #[test]
    fn newline_drops_one_line_height_and_resets_cursor() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        draw(&mut batcher, &metrics, "a\na", false);
        let verts = batcher.bucket(ATLAS).unwrap().vertices();

        let first = &verts[0];
        let second = &verts[VERTS_PER_GLYPH];
        assert_eq!(second.position[0], first.position[0]);
        assert!((second.position[1] - (first.position[1] - 1.2)).abs() < 1e-5);
    }

    #[test]
    fn kerning_shifts_quad_but_not_cursor() {
        let metrics = provider();

        let mut plain = GlyphBatcher::new();
        draw(&mut plain, &metrics, "cb", false);
        let mut kerned = GlyphBatcher::new();
        draw(&mut kerned, &metrics, "ab", false);

        let adv_a = metrics.advance(ATLAS, 'a');
        let adv_c = metrics.advance(ATLAS, 'c');

        // 'b' after 'a' has a kerning pair; 'b' after 'c' does not. The quad
        // shifts by kern plus the advance difference, nothing else.
        let plain_b = plain.bucket(ATLAS).unwrap().vertices()[VERTS_PER_GLYPH].position[0];
        let kerned_b = kerned.bucket(ATLAS).unwrap().vertices()[VERTS_PER_GLYPH].position[0];
        let expected = plain_b as f64 - adv_c + adv_a - 0.07;
        assert!((kerned_b as f64 - expected).abs() < 1e-5);

        // Cursor movement stays the plain advance sum: a third character
        // lands at adv(a) + adv(b) regardless of the pair.
        let mut three = GlyphBatcher::new();
        draw(&mut three, &metrics, "abc", false);
        let c_left = three.bucket(ATLAS).unwrap().vertices()[2 * VERTS_PER_GLYPH].position[0];
        let adv_b = metrics.advance(ATLAS, 'b');
        let quad_l = 0.05;
        assert!((c_left as f64 - (adv_a + adv_b + quad_l)).abs() < 1e-5);
    }

    #[test]
    fn centering_offsets_each_line_by_half_its_width() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        draw(&mut batcher, &metrics, "ab\nabcd", true);
        let verts = batcher.bucket(ATLAS).unwrap().vertices();

        let widths = layout::line_widths("ab\nabcd", ATLAS, &metrics);
        let quad_l = 0.05f64;

        let line0_first = verts[0].position[0];
        assert!((line0_first as f64 - (quad_l - widths[0] / 2.0)).abs() < 1e-5);

        let line1_first = verts[2 * VERTS_PER_GLYPH].position[0];
        assert!((line1_first as f64 - (quad_l - widths[1] / 2.0)).abs() < 1e-5);
    }

    #[test]
    fn uv_rect_lands_on_the_fixed_vertex_order() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        draw(&mut batcher, &metrics, "a", false);
        let v = batcher.bucket(ATLAS).unwrap().vertices();

        let (l, r, b, t) = (0.0, 0.1, 0.1, 0.0);
        assert_eq!(v[0].uv, [l, t]);
        assert_eq!(v[1].uv, [r, b]);
        assert_eq!(v[2].uv, [l, b]);
        assert_eq!(v[3].uv, [l, t]);
        assert_eq!(v[4].uv, [r, t]);
        assert_eq!(v[5].uv, [r, b]);
    }

    #[test]
    fn missing_glyphs_still_occupy_a_quad_slot() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        // '?' is unmapped: zero-size quad, zero advance, but a slot is used.
        draw(&mut batcher, &metrics, "a?b", false);
        assert_eq!(batcher.bucket(ATLAS).unwrap().quad_count(), 3);
    }

    #[test]
    fn size_and_base_position_scale_the_quads() {
        let metrics = provider();
        let mut batcher = GlyphBatcher::new();
        draw_text(
            &mut batcher,
            &metrics,
            ATLAS,
            "a",
            Vec3::new(10.0, 20.0, 0.0),
            4.0,
            [0.0, 1.0, 0.0, 1.0],
            false,
        );
        let v = batcher.bucket(ATLAS).unwrap().vertices();

        let y_offset = 0.2 - 1.0;
        assert!((v[0].position[0] - (10.0 + 4.0 * 0.05)).abs() < 1e-5);
        assert!((v[0].position[1] - (20.0 + 4.0 * (0.7 + y_offset as f32))).abs() < 1e-5);
        for vert in v {
            assert_eq!(vert.color, [0.0, 1.0, 0.0, 1.0]);
        }
    }
}
