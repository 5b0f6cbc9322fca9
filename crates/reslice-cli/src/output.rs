// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table and JSON rendering shared by the subcommands.

use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{presets, Cell, Table};
use reslice_core::SliceUpdate;
use reslice_math::Mat4;
use serde::Serialize;

/// How results are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable tables.
    Table,
    /// Pretty-printed JSON.
    Json,
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

pub fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table
}

/// Row-major rendering of a 4×4 matrix.
pub fn matrix_table(m: &Mat4) -> Table {
    let mut table = new_table();
    table.set_header(vec!["", "x", "y", "z", "t"]);
    for (row, label) in m.to_rows().iter().zip(["x", "y", "z", "w"]) {
        let mut cells = vec![Cell::new(label)];
        cells.extend(row.iter().map(|v| Cell::new(format_number(*v))));
        table.add_row(cells);
    }
    table
}

/// Fixed six-decimal rendering with negative zero folded to zero.
pub fn format_number(v: f64) -> String {
    format!("{:.6}", v + 0.0)
}

/// Compact `x, y, z` rendering.
pub fn format_vec(v: [f64; 3]) -> String {
    v.iter()
        .map(|c| format!("{:.3}", c + 0.0))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stable lower-case label for an update outcome.
pub fn update_label(update: &SliceUpdate) -> &'static str {
    match update {
        SliceUpdate::Committed(_) => "committed",
        SliceUpdate::Unchanged => "unchanged",
        SliceUpdate::NoPose => "no-pose",
        SliceUpdate::DriverInvalid => "driver-invalid",
        SliceUpdate::Unbound => "unbound",
    }
}
