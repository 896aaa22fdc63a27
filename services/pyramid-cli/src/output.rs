//! Rendering of built tile matrix sets.

use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;
use tile_matrix::TileMatrixSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human readable table
    #[default]
    Table,
    Json,
    Yaml,
}

/// Compact description of one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub identifier: String,
    pub scale: f64,
    pub matrix_size: Vec<u64>,
    pub tile_size: Vec<u32>,
    pub upper_left_corner: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PyramidSummary {
    pub identifier: String,
    pub crs: String,
    /// Coarsest level first.
    pub levels: Vec<LevelSummary>,
}

impl PyramidSummary {
    pub fn from_set(set: &TileMatrixSet) -> Result<Self> {
        let levels = set
            .coarse_to_fine()
            .map(|matrix| {
                Ok(LevelSummary {
                    identifier: matrix.identifier().to_string(),
                    scale: matrix.scale(),
                    matrix_size: matrix.matrix_size(),
                    tile_size: matrix.tile_size().to_vec(),
                    upper_left_corner: matrix.upper_left_corner()?.coordinates().to_vec(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            identifier: set.identifier().to_string(),
            crs: set.crs().to_string(),
            levels,
        })
    }
}

/// Render `set` in the requested format. `full` dumps every tiling scheme.
pub fn render(set: &TileMatrixSet, format: OutputFormat, full: bool) -> Result<String> {
    if full {
        return match format {
            OutputFormat::Yaml => serde_yaml::to_string(set).context("Failed to encode YAML"),
            _ => serde_json::to_string_pretty(set).context("Failed to encode JSON"),
        };
    }

    let summary = PyramidSummary::from_set(set)?;
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&summary).context("Failed to encode JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(&summary).context("Failed to encode YAML"),
        OutputFormat::Table => Ok(table(&summary)),
    }
}

fn table(summary: &PyramidSummary) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["id", "scale", "tiles", "tile size", "upper left"]);

    for level in &summary.levels {
        table.add_row(vec![
            level.identifier.clone(),
            format!("{:.9}", level.scale),
            join(&level.matrix_size),
            join(&level.tile_size),
            format!("{:?}", level.upper_left_corner),
        ]);
    }

    format!("{} ({})\n{}", summary.identifier, summary.crs, table)
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("x")
}
