use crate::text::metrics::{AtlasId, MetricsProvider};

/// Tab stops sit on multiples of this width, in em units.
pub const TAB_WIDTH_EMS: f64 = 2.0;

/// Advance `pos` to the next tab stop: the accumulated width is rounded down
/// to an integer em boundary before the tab width is added.
pub fn next_tab_stop(pos: f64) -> f64 {
    let rounded_down = pos.floor();
    rounded_down + TAB_WIDTH_EMS - rounded_down % TAB_WIDTH_EMS
}

/// Width pre-pass: cumulative advance width of every visual line in `text`.
///
/// Centering needs each line's total width before the first glyph of that
/// line is placed, so this must run to completion ahead of the placement
/// pass. It accumulates widths only and positions nothing.
pub fn line_widths(text: &str, atlas: AtlasId, metrics: &MetricsProvider) -> Vec<f64> {
    let mut widths = vec![0.0f64];
    for c in text.chars() {
        match c {
            // Carriage return restarts the current line in place.
            '\r' => *widths.last_mut().unwrap() = 0.0,
            '\n' | '\x0c' => widths.push(0.0),
            '\t' => {
                let width = widths.last_mut().unwrap();
                *width = next_tab_stop(*width);
            }
            _ => *widths.last_mut().unwrap() += metrics.advance(atlas, c),
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::metrics::FontMetrics;

    fn fixed_advance_provider(advance: f64) -> MetricsProvider {
        let mut font = FontMetrics::default();
        for c in 'a'..='z' {
            font.advances.insert(c, advance);
        }
        let mut provider = MetricsProvider::new();
        provider.insert(AtlasId(0), font);
        provider
    }

    #[test]
    fn one_entry_per_line_break() {
        let provider = fixed_advance_provider(1.0);
        let widths = line_widths("ab\ncd\nef", AtlasId(0), &provider);
        assert_eq!(widths, vec![2.0, 2.0, 2.0]);

        // Form feed counts as a line break for the width table.
        let widths = line_widths("ab\x0ccd", AtlasId(0), &provider);
        assert_eq!(widths.len(), 2);

        assert_eq!(line_widths("", AtlasId(0), &provider).len(), 1);
        assert_eq!(line_widths("\n", AtlasId(0), &provider).len(), 2);
    }

    #[test]
    fn carriage_return_resets_in_place() {
        let provider = fixed_advance_provider(0.75);
        let widths = line_widths("ab\rcd", AtlasId(0), &provider);
        assert_eq!(widths, vec![1.5]);
    }

    #[test]
    fn tab_stops_round_down_to_em_boundary() {
        assert_eq!(next_tab_stop(0.0), 2.0);
        assert_eq!(next_tab_stop(1.5), 2.0);
        assert_eq!(next_tab_stop(2.0), 4.0);
        assert_eq!(next_tab_stop(3.0), 4.0);
        assert_eq!(next_tab_stop(4.2), 6.0);
    }

    #[test]
    fn tab_advances_the_line_accumulator() {
        let provider = fixed_advance_provider(0.6);
        // 0.6 -> tab lands on 2.0, then one more glyph.
        let widths = line_widths("a\tb", AtlasId(0), &provider);
        assert_eq!(widths, vec![2.6]);
    }

    #[test]
    fn unmapped_glyphs_contribute_zero_width() {
        let provider = fixed_advance_provider(1.0);
        let widths = line_widths("a?b", AtlasId(0), &provider);
        assert_eq!(widths, vec![2.0]);
    }
}
