//! Figure rendering with `plotters`.
//!
//! Each figure of a [`PlotPlan`] becomes one image: a grid of panels (one
//! per row/column label pair) and a legend panel on the right. Every layer
//! draws its median curve, optionally over a shaded quantile band.

pub mod style;

use crate::aggregate::Aggregation;
use crate::config::{ImageFormat, PlotOptions};
use crate::error::{PlotError, Result};
use crate::layout::{FigurePlan, PanelPlan, PlotPlan};
use crate::model::{PlotType, SummaryStat};
use plotters::coord::Shift;
use plotters::coord::ranged1d::{AsRangedCoord, ValueFormatter};
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::register_font;
use serde::Serialize;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::OnceLock;
use style::{LineStyle, layer_style};
use tracing::{debug, info};

const FONT_FAMILY: &str = "sans-serif";
const FONT_PATH: &str = "assets/fonts/DejaVuSans.ttf";
static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Register the bundled sans-serif font with plotters once per process.
///
/// # Errors
///
/// Returns `Render` if the bundled font cannot be parsed.
pub fn register_fonts() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok());
    if ok {
        Ok(())
    } else {
        Err(PlotError::render(FONT_PATH, "bundled font could not be loaded"))
    }
}

/// Output settings for one render pass.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub out_dir: PathBuf,
    pub name: String,
    pub format: ImageFormat,
}

/// One written image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFigure {
    pub path: PathBuf,
    /// Data panels, legend excluded.
    pub panels: usize,
    /// Layers that had statistics to draw.
    pub layers_drawn: usize,
}

/// Everything the renderer produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub figures: Vec<RenderedFigure>,
}

impl RenderReport {
    /// Drawn panels including one legend panel per figure.
    #[must_use]
    pub fn total_panels(&self) -> usize {
        self.figures.iter().map(|f| f.panels + 1).sum()
    }
}

/// Output path for a figure: `<out_dir>/<name>[_<label>].<ext>`.
#[must_use]
pub fn figure_path(target: &RenderTarget, label: Option<&str>) -> PathBuf {
    let stem = label.map_or_else(
        || target.name.clone(),
        |label| format!("{}_{}", target.name, sanitize(label)),
    );
    target
        .out_dir
        .join(format!("{stem}.{}", target.format.extension()))
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '@' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Row-major index of a panel slot in a grid.
#[must_use]
pub const fn slot_index(slot: (usize, usize), grid: (usize, usize)) -> usize {
    slot.0 * grid.1 + slot.1
}

/// Panel title: column label, prefixed with the row label in the first column.
#[must_use]
pub fn panel_title(panel: &PanelPlan) -> String {
    if panel.slot.1 == 0 {
        format!("{} / {}", panel.row_label, panel.col_label)
    } else {
        panel.col_label.clone()
    }
}

/// Shared x range of a figure from `x_lim` or the data.
#[must_use]
pub fn x_range(stats: &[&SummaryStat], x_lim: Option<[f64; 2]>) -> Range<f64> {
    if let Some([lo, hi]) = x_lim.filter(|[lo, hi]| lo < hi) {
        return lo..hi;
    }
    let (lo, hi) = stats
        .iter()
        .flat_map(|s| s.ticks.iter().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t), hi.max(t))
        });
    if lo.is_finite() && hi > lo {
        0.0_f64.min(lo)..hi
    } else if hi.is_finite() {
        0.0..hi.max(1.0)
    } else {
        0.0..1.0
    }
}

/// y range: `y_lim`, else the fixed decade span on the log axis or the
/// padded data span in absolute mode.
#[must_use]
pub fn y_range(stats: &[&SummaryStat], options: &PlotOptions) -> Range<f64> {
    let positive = |[lo, hi]: &[f64; 2]| lo < hi && (options.absolute || *lo > 0.0);
    if let Some([lo, hi]) = options.y_lim.filter(positive) {
        return lo..hi;
    }
    if !options.absolute {
        return style::LOG_TICKS[0]..style::LOG_TICKS[style::LOG_TICKS.len() - 1];
    }

    let (mut lo, mut hi) = stats
        .iter()
        .flat_map(|s| {
            s.lower
                .iter()
                .chain(&s.upper)
                .copied()
                .chain(std::iter::once(s.lnz_true))
        })
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        lo = -1.0;
        hi = 1.0;
    }
    let pad = ((hi - lo) * 0.05).max(1e-3);
    lo -= pad;
    hi += pad;
    lo..hi
}

/// Render every figure of `plan`.
///
/// # Errors
///
/// Returns `Render` if the output directory or an image cannot be written.
pub fn render(
    plan: &PlotPlan,
    aggregation: &Aggregation,
    options: &PlotOptions,
    target: &RenderTarget,
) -> Result<RenderReport> {
    register_fonts()?;
    fs::create_dir_all(&target.out_dir).map_err(|e| PlotError::render(&target.out_dir, e))?;

    let mut report = RenderReport::default();
    for figure in &plan.figures {
        let path = figure_path(target, figure.label.as_deref());
        let size = style::figure_size(figure.grid);
        let legend_title = plan.layer_factor.as_str();

        let layers_drawn = match target.format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, size).into_drawing_area();
                draw_figure(&root, figure, legend_title, aggregation, options)
                    .map_err(|e| PlotError::render(&path, e))
            }
            ImageFormat::Png => {
                let root = BitMapBackend::new(&path, size).into_drawing_area();
                draw_figure(&root, figure, legend_title, aggregation, options)
                    .map_err(|e| PlotError::render(&path, e))
            }
        }?;

        info!(
            path = %path.display(),
            panels = figure.panels.len(),
            layers = layers_drawn,
            "Wrote figure"
        );
        report.figures.push(RenderedFigure {
            path,
            panels: figure.panels.len(),
            layers_drawn,
        });
    }
    Ok(report)
}

type DrawResult<T, DB> =
    std::result::Result<T, DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &FigurePlan,
    legend_title: &str,
    aggregation: &Aggregation,
    options: &PlotOptions,
) -> DrawResult<usize, DB> {
    root.fill(&WHITE)?;

    let (width, _) = root.dim_in_pixel();
    let grid_width = width.saturating_sub(style::LEGEND_WIDTH) as i32;
    let (grid_area, legend_area) = root.split_horizontally(grid_width);
    let cells = grid_area.split_evenly((figure.grid.0.max(1), figure.grid.1.max(1)));

    let figure_stats: Vec<&SummaryStat> = figure
        .panels
        .iter()
        .flat_map(|p| &p.layers)
        .filter_map(|l| aggregation.stat_for(l))
        .collect();
    let xs = x_range(&figure_stats, options.x_lim);
    let ys = y_range(&figure_stats, options);

    let mut drawn = 0;
    for panel in &figure.panels {
        let Some(cell) = cells.get(slot_index(panel.slot, figure.grid)) else {
            debug!(slot = ?panel.slot, "Panel outside grid");
            continue;
        };
        drawn += if options.absolute {
            draw_panel(cell, panel, aggregation, options, xs.clone(), ys.clone())?
        } else {
            let ticks = style::log_key_points(&ys);
            let ys = ys.clone().log_scale().with_key_points(ticks);
            draw_panel(cell, panel, aggregation, options, xs.clone(), ys)?
        };
    }

    draw_legend(&legend_area, figure, legend_title)?;
    root.present()?;
    Ok(drawn)
}

fn draw_panel<DB, Y>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelPlan,
    aggregation: &Aggregation,
    options: &PlotOptions,
    xs: Range<f64>,
    ys: Y,
) -> DrawResult<usize, DB>
where
    DB: DrawingBackend,
    Y: AsRangedCoord<Value = f64>,
    Y::CoordDescType: ValueFormatter<f64>,
{
    let (x0, x1) = (xs.start, xs.end);
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .x_label_area_size(36)
        .y_label_area_size(52)
        .caption(panel_title(panel), (FONT_FAMILY, style::TITLE_FONT_SIZE))
        .build_cartesian_2d(xs, ys)?;

    let y_desc = if options.absolute {
        "LML estimate"
    } else {
        options.error_metric.axis_label()
    };
    let log_axis = !options.absolute;
    let y_fmt = move |y: &f64| {
        if log_axis {
            style::format_log_tick(*y)
        } else {
            style::format_value(*y)
        }
    };
    let x_fmt = |x: &f64| style::format_value(*x);

    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .x_desc("Function evaluations")
        .y_desc(y_desc)
        .y_labels(8)
        .y_label_formatter(&y_fmt)
        .x_label_formatter(&x_fmt)
        .label_style((FONT_FAMILY, style::TICK_LABEL_FONT_SIZE))
        .axis_desc_style((FONT_FAMILY, style::AXIS_LABEL_FONT_SIZE))
        .draw()?;

    let reference = panel
        .layers
        .iter()
        .find_map(|l| aggregation.stat_for(l))
        .map(|s| if options.absolute { s.lnz_true } else { options.zero_floor });
    if let Some(y) = reference {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x0, y), (x1, y)],
            BLACK.mix(0.5),
        )))?;
    }

    let mut drawn = 0;
    for layer in &panel.layers {
        let Some(stat) = aggregation.stat_for(layer) else {
            continue;
        };
        if stat.ticks.is_empty() {
            continue;
        }
        let (color, line) = layer_style(layer.index);
        let width = if options.enhance == Some(layer.index) {
            style::ENHANCED_LINE_WIDTH
        } else {
            style::LINE_WIDTH
        };

        if options.plot_type == PlotType::Shaded && stat.ticks.len() > 1 {
            let band: Vec<(f64, f64)> = stat
                .ticks
                .iter()
                .copied()
                .zip(stat.upper.iter().copied())
                .chain(
                    stat.ticks
                        .iter()
                        .copied()
                        .zip(stat.lower.iter().copied())
                        .rev(),
                )
                .collect();
            chart.draw_series(std::iter::once(Polygon::new(
                band,
                color.mix(style::BAND_OPACITY).filled(),
            )))?;
        }

        let points: Vec<(f64, f64)> = stat
            .ticks
            .iter()
            .copied()
            .zip(stat.median.iter().copied())
            .collect();
        let stroke = color.stroke_width(width);
        match line {
            LineStyle::Solid => {
                chart.draw_series(LineSeries::new(points, stroke))?;
            }
            LineStyle::Dashed(size, spacing) => {
                chart.draw_series(DashedLineSeries::new(points, size, spacing, stroke))?;
            }
        }

        if options.annotate {
            if let (Some(&x), Some(y)) = (stat.ticks.last(), stat.final_median()) {
                chart.draw_series(std::iter::once(Text::new(
                    style::format_value(y),
                    (x, y),
                    (FONT_FAMILY, style::ANNOTATION_FONT_SIZE)
                        .into_font()
                        .color(&color),
                )))?;
            }
        }
        drawn += 1;
    }
    Ok(drawn)
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &FigurePlan,
    title: &str,
) -> DrawResult<(), DB> {
    let heading = figure
        .label
        .as_ref()
        .map_or_else(|| title.to_string(), |label| format!("{label}: {title}"));
    area.draw(&Text::new(
        heading,
        (12, 16),
        (FONT_FAMILY, style::LEGEND_FONT_SIZE)
            .into_font()
            .color(&BLACK),
    ))?;

    let indexed = figure
        .panels
        .first()
        .map(|p| p.layers.iter().map(|l| (l.index, l.label.as_str())).collect::<Vec<_>>())
        .unwrap_or_default();
    for (row, (index, label)) in indexed.into_iter().enumerate() {
        let y = 48 + row as i32 * 24;
        let (color, _) = layer_style(index);
        area.draw(&PathElement::new(
            vec![(12, y), (44, y)],
            color.stroke_width(style::LINE_WIDTH + 1),
        ))?;
        area.draw(&Text::new(
            label.to_string(),
            (52, y - 7),
            (FONT_FAMILY, style::LEGEND_FONT_SIZE)
                .into_font()
                .color(&BLACK),
        ))?;
    }
    Ok(())
}
