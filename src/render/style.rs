//! Palette, line styles and figure geometry.

use plotters::style::RGBColor;
use std::ops::Range;

// Font sizes
pub const TITLE_FONT_SIZE: u32 = 16;
pub const AXIS_LABEL_FONT_SIZE: u32 = 13;
pub const TICK_LABEL_FONT_SIZE: u32 = 11;
pub const LEGEND_FONT_SIZE: u32 = 14;
pub const ANNOTATION_FONT_SIZE: u32 = 11;

// Layout tuning (pixels)
pub const PANEL_WIDTH: u32 = 380;
pub const PANEL_HEIGHT: u32 = 300;
pub const LEGEND_WIDTH: u32 = 220;

pub const LINE_WIDTH: u32 = 2;
pub const ENHANCED_LINE_WIDTH: u32 = 4;
pub const BAND_OPACITY: f64 = 0.2;

/// Decades labelled on the logarithmic error axis.
pub const LOG_TICKS: [f64; 8] = [1e-3, 1e-2, 1e-1, 1e0, 1e1, 1e2, 1e3, 1e4];

/// Layer colors, cycled by layer index.
pub const PALETTE: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Stroke pattern of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    /// Dash length and gap in pixels.
    Dashed(u32, u32),
}

/// Patterns used once the palette wraps around.
pub const LINE_STYLES: &[LineStyle] = &[
    LineStyle::Solid,
    LineStyle::Dashed(8, 4),
    LineStyle::Dashed(2, 3),
];

/// Color and stroke for a layer position.
#[must_use]
pub fn layer_style(index: usize) -> (RGBColor, LineStyle) {
    let color = PALETTE[index % PALETTE.len()];
    let style = LINE_STYLES[(index / PALETTE.len()) % LINE_STYLES.len()];
    (color, style)
}

/// Pixel size of a figure with a `(rows, cols)` panel grid plus legend.
#[must_use]
pub const fn figure_size(grid: (usize, usize)) -> (u32, u32) {
    let rows = if grid.0 == 0 { 1 } else { grid.0 as u32 };
    let cols = if grid.1 == 0 { 1 } else { grid.1 as u32 };
    (cols * PANEL_WIDTH + LEGEND_WIDTH, rows * PANEL_HEIGHT)
}

/// Fixed decade ticks that fall inside a log axis range.
#[must_use]
pub fn log_key_points(range: &Range<f64>) -> Vec<f64> {
    let (lo, hi) = (range.start * (1.0 - 1e-9), range.end * (1.0 + 1e-9));
    LOG_TICKS
        .iter()
        .copied()
        .filter(|t| (lo..=hi).contains(t))
        .collect()
}

/// Label only exact powers of ten on log axes.
#[must_use]
pub fn format_log_tick(value: f64) -> String {
    if value <= 0.0 {
        return String::new();
    }
    let log10 = value.log10();
    let nearest = log10.round();
    if (log10 - nearest).abs() < 1e-6 && LOG_TICKS.iter().any(|t| (t.log10() - nearest).abs() < 1e-6) {
        format!("1e{nearest:.0}")
    } else {
        String::new()
    }
}

/// Compact number for axis labels and line annotations.
#[must_use]
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-2..1e4).contains(&magnitude) {
        format!("{value:.1e}")
    } else if magnitude >= 100.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps_into_dashed_styles() {
        assert_eq!(layer_style(0), (PALETTE[0], LineStyle::Solid));
        assert_eq!(layer_style(PALETTE.len() + 1), (PALETTE[1], LineStyle::Dashed(8, 4)));
    }

    #[test]
    fn figure_size_adds_legend_column() {
        assert_eq!(
            figure_size((2, 3)),
            (3 * PANEL_WIDTH + LEGEND_WIDTH, 2 * PANEL_HEIGHT)
        );
        assert_eq!(figure_size((0, 0)), (PANEL_WIDTH + LEGEND_WIDTH, PANEL_HEIGHT));
    }

    #[test]
    fn log_ticks_only_on_decades() {
        assert_eq!(format_log_tick(1e-3), "1e-3");
        assert_eq!(format_log_tick(100.0), "1e2");
        assert_eq!(format_log_tick(50.0), "");
        assert_eq!(format_log_tick(1e6), "");
        assert_eq!(format_log_tick(0.0), "");
    }

    #[test]
    fn log_key_points_are_the_decades_in_range() {
        assert_eq!(log_key_points(&(1e-3..1e4)), LOG_TICKS.to_vec());
        assert_eq!(log_key_points(&(0.05..20.0)), vec![1e-1, 1e0, 1e1]);
        assert!(log_key_points(&(2.0..5.0)).is_empty());
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(0.5), "0.50");
        assert_eq!(format_value(250.0), "250");
        assert_eq!(format_value(1e-4), "1.0e-4");
    }
}
