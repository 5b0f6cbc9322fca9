// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `reslice compose`: one driver snapshot in, one slice matrix out.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use reslice_core::{
    compose, extract_pose, orthonormalize, DriverNode, LineLandmark, PointLandmark, RigidFrame,
    SliceConfig, SliceMode,
};
use reslice_math::{Mat4, Vec3};
use serde::Serialize;
use tracing::warn;

use crate::output::{format_number, matrix_table, new_table, to_json, Format};

#[derive(Args, Debug)]
pub struct ComposeArgs {
    #[command(flatten)]
    driver: DriverArgs,
    /// Slice mode: none, axial, sagittal, coronal, inplane, inplane90, transverse
    #[arg(long, default_value = "axial")]
    mode: SliceMode,
    /// In-plane rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotation: f64,
    /// Mirror the slice
    #[arg(long)]
    flip: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct DriverArgs {
    /// Rigid frame at `x,y,z` with identity orientation
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    translate: Option<Vec3>,
    /// Rigid frame given as 16 comma-separated row-major values
    #[arg(long, value_parser = parse_mat4, allow_hyphen_values = true)]
    frame: Option<Mat4>,
    /// Line landmark `x1,y1,z1:x2,y2,z2`
    #[arg(long, value_parser = parse_line, allow_hyphen_values = true)]
    line: Option<LineArg>,
    /// Point landmark at `x,y,z`
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    point: Option<Vec3>,
    /// Driver snapshot as JSON (any variant, including volumetric images)
    #[arg(long)]
    driver_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
struct LineArg(Vec3, Vec3);

#[derive(Serialize)]
struct ComposeReport {
    driver: &'static str,
    config: SliceConfig,
    corrected: bool,
    driver_to_world: Mat4,
    slice_to_world: Option<Mat4>,
}

pub fn run(args: &ComposeArgs, format: Format) -> Result<String> {
    let node = args.driver.to_node()?;
    let config = SliceConfig {
        mode: args.mode,
        rotation_deg: args.rotation,
        flip: args.flip,
    };

    let raw = extract_pose(&node).ok_or_else(|| anyhow!("{} driver has no pose", node.kind()))?;
    let repaired = orthonormalize(&raw);
    if repaired.was_corrected() {
        warn!(kind = node.kind(), "driver pose is not orthonormal; using nearest orthonormal pose");
    }
    let report = ComposeReport {
        driver: node.kind(),
        config,
        corrected: repaired.was_corrected(),
        driver_to_world: repaired.pose,
        slice_to_world: compose(&repaired.pose, &config),
    };

    match format {
        Format::Json => to_json(&report),
        Format::Table => Ok(render_table(&report)),
    }
}

fn render_table(report: &ComposeReport) -> String {
    let mut summary = new_table();
    summary.set_header(vec!["driver", "mode", "rotation", "flip", "corrected"]);
    summary.add_row(vec![
        report.driver.to_string(),
        report.config.mode.to_string(),
        format_number(report.config.rotation_deg),
        report.config.flip.to_string(),
        report.corrected.to_string(),
    ]);
    match &report.slice_to_world {
        Some(m) => format!("{summary}\nslice to world\n{}", matrix_table(m)),
        None => format!("{summary}\nmode none: slice left unchanged"),
    }
}

impl DriverArgs {
    fn to_node(&self) -> Result<DriverNode> {
        if let Some(t) = self.translate {
            return Ok(RigidFrame::transform(Some(Mat4::from_translation(t))).into());
        }
        if let Some(m) = self.frame {
            return Ok(RigidFrame::transform(Some(m)).into());
        }
        if let Some(LineArg(p1, p2)) = self.line {
            return Ok(LineLandmark::ruler(p1, p2).into());
        }
        if let Some(p) = self.point {
            return Ok(PointLandmark::at(p).into());
        }
        if let Some(path) = &self.driver_file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("invalid driver snapshot in {}", path.display()));
        }
        Err(anyhow!("no driver given"))
    }
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("{part:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    <[f64; N]>::try_from(values.as_slice())
        .map_err(|_| format!("expected {N} comma-separated numbers, got {}", values.len()))
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    parse_numbers::<3>(s).map(Vec3::from)
}

fn parse_mat4(s: &str) -> Result<Mat4, String> {
    let v = parse_numbers::<16>(s)?;
    Ok(Mat4::from_rows([
        [v[0], v[1], v[2], v[3]],
        [v[4], v[5], v[6], v[7]],
        [v[8], v[9], v[10], v[11]],
        [v[12], v[13], v[14], v[15]],
    ]))
}

fn parse_line(s: &str) -> Result<LineArg, String> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| "expected `x1,y1,z1:x2,y2,z2`".to_string())?;
    Ok(LineArg(parse_vec3(a)?, parse_vec3(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vectors_and_lines() {
        assert_eq!(parse_vec3("1, -2,3.5"), Ok(Vec3::new(1.0, -2.0, 3.5)));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,2,x").is_err());
        let line = parse_line("0,0,0:1,0,0");
        assert!(matches!(line, Ok(LineArg(a, b)) if a == Vec3::ZERO && b == Vec3::UNIT_X));
    }

    #[test]
    fn parses_row_major_frames() {
        let m = parse_mat4("1,0,0,4, 0,1,0,5, 0,0,1,6, 0,0,0,1");
        assert_eq!(m, Ok(Mat4::translation(4.0, 5.0, 6.0)));
    }
}
