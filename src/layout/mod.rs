//! Factor expansion: turns six label lists and an axis assignment into the
//! figure / panel / layer iteration plan.
//!
//! Rows, columns and (optionally) figures each take one factor. Of the
//! remaining factors one becomes the layer axis (several lines per panel)
//! and the others are pinned to their first label. Empty labels are holes:
//! they are skipped without producing a figure, panel or layer.

use crate::config::AxisNames;
use crate::error::{PlotError, Result};
use crate::model::{Factor, FactorSet, Selection};
use serde::Serialize;
use tracing::{debug, warn};

/// Axis assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ordering {
    pub rows: Factor,
    pub cols: Factor,
    pub figs: Option<Factor>,
    /// Explicit layer factor; picked automatically when `None`.
    pub layers: Option<Factor>,
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            rows: Factor::Prob,
            cols: Factor::SubProb,
            figs: None,
            layers: None,
        }
    }
}

impl Ordering {
    /// Parse configured axis names.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFactor` for a name that is not a factor, or
    /// `InvalidLayout` if one factor is assigned twice.
    pub fn from_axes(axes: &AxisNames) -> Result<Self> {
        let ordering = Self {
            rows: axes.rows.parse()?,
            cols: axes.cols.parse()?,
            figs: axes.figs.as_deref().map(str::parse::<Factor>).transpose()?,
            layers: axes.layers.as_deref().map(str::parse::<Factor>).transpose()?,
        };
        ordering.validate()?;
        Ok(ordering)
    }

    fn validate(&self) -> Result<()> {
        if self.rows == self.cols {
            return Err(PlotError::layout(format!(
                "rows and columns both use '{}'",
                self.rows
            )));
        }
        if let Some(figs) = self.figs {
            if figs == self.rows || figs == self.cols {
                return Err(PlotError::layout(format!(
                    "figure factor '{figs}' is already used by rows or columns"
                )));
            }
        }
        if let Some(layers) = self.layers {
            if layers == self.rows || layers == self.cols || Some(layers) == self.figs {
                return Err(PlotError::layout(format!(
                    "layer factor '{layers}' is already assigned to an axis"
                )));
            }
        }
        Ok(())
    }

    fn is_assigned(&self, factor: Factor) -> bool {
        factor == self.rows || factor == self.cols || Some(factor) == self.figs
    }
}

/// One line inside a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerPlan {
    /// Position in the layer factor's label list (palette index).
    pub index: usize,
    pub label: String,
    pub selection: Selection,
    /// Composite cache key.
    pub key: String,
}

/// One subplot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelPlan {
    pub row_label: String,
    pub col_label: String,
    /// Grid position after any two-row re-flow.
    pub slot: (usize, usize),
    pub layers: Vec<LayerPlan>,
}

/// One output image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigurePlan {
    pub label: Option<String>,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub layers: Vec<String>,
    /// Drawn grid shape (rows, columns), legend panel excluded.
    pub grid: (usize, usize),
    pub panels: Vec<PanelPlan>,
}

/// Full iteration plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotPlan {
    pub ordering: Ordering,
    pub layer_factor: Factor,
    pub figures: Vec<FigurePlan>,
}

impl PlotPlan {
    /// Total number of (panel, layer) aggregation jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.figures
            .iter()
            .flat_map(|f| &f.panels)
            .map(|p| p.layers.len())
            .sum()
    }

    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.figures.iter().map(|f| f.panels.len()).sum()
    }
}

/// Build the composite cache key `row_col_layer` (prefixed by the figure
/// label when figures are split by a factor).
#[must_use]
pub fn composite_key(fig: Option<&str>, row: &str, col: &str, layer: &str) -> String {
    match fig {
        Some(fig) => format!("{fig}_{row}_{col}_{layer}"),
        None => format!("{row}_{col}_{layer}"),
    }
}

fn non_empty(labels: &[String]) -> Vec<(usize, String)> {
    labels
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.is_empty())
        .map(|(i, l)| (i, l.clone()))
        .collect()
}

/// Pick the layer factor: explicit choice, else the first unassigned factor
/// (canonical order) with more than one label, else the first unassigned one
/// that has any label at all.
fn choose_layer_factor(factors: &FactorSet, ordering: &Ordering) -> Factor {
    if let Some(layers) = ordering.layers {
        return layers;
    }
    let unassigned: Vec<Factor> = Factor::ALL
        .into_iter()
        .filter(|f| !ordering.is_assigned(*f))
        .collect();

    unassigned
        .iter()
        .copied()
        .find(|f| non_empty(factors.get(*f)).len() > 1)
        .or_else(|| {
            unassigned
                .iter()
                .copied()
                .find(|f| !non_empty(factors.get(*f)).is_empty())
        })
        .or_else(|| unassigned.first().copied())
        .unwrap_or(Factor::Alg)
}

/// Expand factors into a plot plan.
///
/// # Errors
///
/// Returns `InvalidLayout` if the same factor is assigned to two axes.
pub fn expand(factors: &FactorSet, ordering: &Ordering, two_rows: bool) -> Result<PlotPlan> {
    ordering.validate()?;

    let layer_factor = choose_layer_factor(factors, ordering);

    let mut base = Selection::default();
    for factor in Factor::ALL {
        if ordering.is_assigned(factor) || factor == layer_factor {
            continue;
        }
        let labels = non_empty(factors.get(factor));
        if labels.len() > 1 {
            warn!(
                factor = %factor,
                using = %labels[0].1,
                ignored = labels.len() - 1,
                "Unassigned factor has several labels; only the first is plotted"
            );
        }
        base.set(factor, factors.first(factor));
    }

    let rows = non_empty(factors.get(ordering.rows));
    let cols = non_empty(factors.get(ordering.cols));
    let layers = non_empty(factors.get(layer_factor));

    let figure_labels: Vec<Option<String>> = match ordering.figs {
        Some(figs) => non_empty(factors.get(figs))
            .into_iter()
            .map(|(_, l)| Some(l))
            .collect(),
        None => vec![None],
    };

    let grid = if two_rows && rows.len() == 1 && cols.len() > 1 {
        (2, cols.len().div_ceil(2))
    } else {
        (rows.len(), cols.len())
    };

    let mut figures = Vec::with_capacity(figure_labels.len());
    for fig_label in figure_labels {
        let mut panels = Vec::with_capacity(rows.len() * cols.len());
        for (r, (_, row_label)) in rows.iter().enumerate() {
            for (c, (_, col_label)) in cols.iter().enumerate() {
                let slot = if grid.0 == rows.len() {
                    (r, c)
                } else {
                    (c / grid.1, c % grid.1)
                };

                let panel_layers = layers
                    .iter()
                    .map(|(index, layer_label)| {
                        let mut selection = base.clone();
                        selection.set(ordering.rows, row_label);
                        selection.set(ordering.cols, col_label);
                        selection.set(layer_factor, layer_label);
                        if let (Some(figs), Some(fig)) = (ordering.figs, fig_label.as_deref()) {
                            selection.set(figs, fig);
                        }
                        LayerPlan {
                            index: *index,
                            label: layer_label.clone(),
                            selection,
                            key: composite_key(
                                fig_label.as_deref(),
                                row_label,
                                col_label,
                                layer_label,
                            ),
                        }
                    })
                    .collect();

                panels.push(PanelPlan {
                    row_label: row_label.clone(),
                    col_label: col_label.clone(),
                    slot,
                    layers: panel_layers,
                });
            }
        }

        debug!(
            figure = fig_label.as_deref().unwrap_or("-"),
            panels = panels.len(),
            layers = layers.len(),
            "Expanded figure"
        );

        figures.push(FigurePlan {
            label: fig_label,
            rows: rows.iter().map(|(_, l)| l.clone()).collect(),
            cols: cols.iter().map(|(_, l)| l.clone()).collect(),
            layers: layers.iter().map(|(_, l)| l.clone()).collect(),
            grid,
            panels,
        });
    }

    Ok(PlotPlan {
        ordering: *ordering,
        layer_factor,
        figures,
    })
}
