// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `reslice replay`: run a scene script through the dispatcher.
//!
//! A script declares slices, nodes and persisted slice attributes, then a
//! list of steps. Attaching to the scene restores bindings from the
//! attributes; each step then goes through [`ResliceLogic`] exactly as a
//! host application would drive it.
//!
//! ```json
//! {
//!   "slices": ["Red"],
//!   "nodes": { "Frame": { "RigidFrame": { "to_world": [[1,0,0,5],[0,1,0,0],[0,0,1,0],[0,0,0,1]] } } },
//!   "steps": [
//!     { "set_mode": { "slice": "Red", "mode": "axial" } },
//!     { "set_driver": { "slice": "Red", "driver": "Frame" } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use reslice_core::{
    DispatchReport, DriverAssignment, DriverEvent, DriverNode, NodeId, ResliceLogic, SceneEvent,
    SliceConfig, SliceId, SliceMode, SliceOutcome, SliceUpdate,
};
use reslice_math::Mat4;
use serde::{Deserialize, Serialize};

use crate::output::{format_number, format_vec, new_table, to_json, update_label, Format};
use crate::scene::DocumentScene;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Scene script (JSON)
    script: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default)]
    slices: Vec<SliceId>,
    #[serde(default)]
    nodes: BTreeMap<NodeId, DriverNode>,
    #[serde(default)]
    unsupported: Vec<NodeId>,
    #[serde(default)]
    attributes: BTreeMap<SliceId, BTreeMap<String, String>>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum Step {
    SetDriver {
        slice: SliceId,
        #[serde(default)]
        driver: Option<NodeId>,
    },
    SetMode {
        slice: SliceId,
        mode: SliceMode,
    },
    SetRotation {
        slice: SliceId,
        degrees: f64,
    },
    SetFlip {
        slice: SliceId,
        flip: bool,
    },
    /// Replace a node's data; observers hear about it only through a later `event`.
    UpdateNode {
        node: NodeId,
        driver: DriverNode,
    },
    /// Announce the removal, then drop the node.
    RemoveNode {
        node: NodeId,
    },
    Event {
        node: NodeId,
        event: DriverEvent,
    },
    Scene(SceneEvent),
    Batch(Vec<Step>),
}

impl Step {
    fn action(&self) -> &'static str {
        match self {
            Self::SetDriver { .. } => "set_driver",
            Self::SetMode { .. } => "set_mode",
            Self::SetRotation { .. } => "set_rotation",
            Self::SetFlip { .. } => "set_flip",
            Self::UpdateNode { .. } => "update_node",
            Self::RemoveNode { .. } => "remove_node",
            Self::Event { .. } => "event",
            Self::Scene(_) => "scene",
            Self::Batch(_) => "batch",
        }
    }
}

#[derive(Serialize)]
struct OutcomeRecord {
    slice: SliceId,
    update: &'static str,
    slice_to_world: Option<Mat4>,
}

#[derive(Serialize)]
struct StepRecord {
    index: usize,
    action: &'static str,
    outcomes: Vec<OutcomeRecord>,
}

#[derive(Serialize)]
struct SliceRecord {
    slice: SliceId,
    driver: Option<NodeId>,
    config: SliceConfig,
    commits: usize,
    notifications: usize,
    slice_to_world: Mat4,
}

#[derive(Serialize)]
struct ReplayOutput {
    steps: Vec<StepRecord>,
    slices: Vec<SliceRecord>,
    observed: Vec<NodeId>,
    #[serde(skip)]
    summary: String,
}

pub fn run(args: &ReplayArgs, format: Format) -> Result<String> {
    let text = fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&text)
        .with_context(|| format!("invalid scene script {}", args.script.display()))?;
    let output = replay(script)?;
    match format {
        Format::Json => to_json(&output),
        Format::Table => Ok(render_table(&output)),
    }
}

fn replay(script: Script) -> Result<ReplayOutput> {
    let mut scene = DocumentScene::default();
    for slice in script.slices {
        scene.add_slice(slice);
    }
    for (slice, attributes) in script.attributes {
        scene.add_slice(slice).attributes.extend(attributes);
    }
    for (id, node) in script.nodes {
        scene.insert_driver(id, node);
    }
    for id in script.unsupported {
        scene.insert_unsupported(id);
    }

    let mut logic = ResliceLogic::attach(scene);
    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let report = run_step(&mut logic, step)
            .with_context(|| format!("step {index} ({}) failed", step.action()))?;
        steps.push(StepRecord {
            index,
            action: step.action(),
            outcomes: report.outcomes.iter().map(outcome_record).collect(),
        });
    }

    let summary = logic.registry().to_string();
    let slices = logic
        .scene()
        .slices()
        .map(|(id, state)| SliceRecord {
            slice: id.clone(),
            driver: logic.registry().driver_of(id).cloned(),
            config: logic.slice_config(id),
            commits: state.commits,
            notifications: state.notifications,
            slice_to_world: state.slice_to_world,
        })
        .collect();
    let observed = logic.scene().subscribed().cloned().collect();
    Ok(ReplayOutput {
        steps,
        slices,
        observed,
        summary,
    })
}

fn run_step(logic: &mut ResliceLogic<DocumentScene>, step: &Step) -> Result<DispatchReport> {
    let single = |slice: &SliceId, update: SliceUpdate| DispatchReport {
        outcomes: vec![SliceOutcome {
            slice: slice.clone(),
            update,
        }],
    };
    Ok(match step {
        Step::SetDriver { slice, driver } => {
            match logic.set_driver_for_slice(driver.as_ref(), slice)? {
                DriverAssignment::Bound { update, .. } => single(slice, update),
                DriverAssignment::Detached => single(slice, SliceUpdate::Unbound),
            }
        }
        Step::SetMode { slice, mode } => single(slice, logic.set_mode_for_slice(*mode, slice)?),
        Step::SetRotation { slice, degrees } => {
            single(slice, logic.set_rotation_for_slice(*degrees, slice)?)
        }
        Step::SetFlip { slice, flip } => single(slice, logic.set_flip_for_slice(*flip, slice)?),
        Step::UpdateNode { node, driver } => {
            logic.scene_mut().insert_driver(node.clone(), driver.clone());
            DispatchReport::default()
        }
        Step::RemoveNode { node } => {
            let report = logic.handle_scene_event(&SceneEvent::NodeRemoved(node.clone()));
            logic.scene_mut().remove_node(node);
            report
        }
        Step::Event { node, event } => logic.handle_driver_event(node, *event),
        Step::Scene(event) => logic.handle_scene_event(event),
        Step::Batch(steps) => logic.batch(|logic| -> Result<DispatchReport> {
            let mut merged = DispatchReport::default();
            for step in steps {
                merged.outcomes.extend(run_step(logic, step)?.outcomes);
            }
            Ok(merged)
        })?,
    })
}

fn outcome_record(outcome: &SliceOutcome) -> OutcomeRecord {
    OutcomeRecord {
        slice: outcome.slice.clone(),
        update: update_label(&outcome.update),
        slice_to_world: outcome.update.committed().copied(),
    }
}

fn render_table(output: &ReplayOutput) -> String {
    let mut steps = new_table();
    steps.set_header(vec!["#", "action", "slice", "outcome"]);
    for record in &output.steps {
        if record.outcomes.is_empty() {
            steps.add_row(vec![record.index.to_string(), record.action.to_string()]);
        }
        for outcome in &record.outcomes {
            steps.add_row(vec![
                record.index.to_string(),
                record.action.to_string(),
                outcome.slice.to_string(),
                outcome.update.to_string(),
            ]);
        }
    }

    let mut slices = new_table();
    slices.set_header(vec![
        "slice", "driver", "mode", "rotation", "flip", "commits", "origin", "normal",
    ]);
    for record in &output.slices {
        let m = &record.slice_to_world;
        slices.add_row(vec![
            record.slice.to_string(),
            record
                .driver
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            record.config.mode.to_string(),
            format_number(record.config.rotation_deg),
            record.config.flip.to_string(),
            record.commits.to_string(),
            format_vec(m.translation_part().to_array()),
            format_vec(m.column(2).to_array()),
        ]);
    }

    format!("{steps}\n{slices}\n{}", output.summary.trim_end())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Script {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn steps_deserialize_in_snake_case() {
        let script = parse(
            r#"{
                "slices": ["Red"],
                "steps": [
                    { "set_driver": { "slice": "Red" } },
                    { "event": { "node": "Frame", "event": "PointModified" } },
                    { "scene": "EndBatchProcess" },
                    { "scene": { "NodeRemoved": "Frame" } },
                    { "batch": [ { "set_flip": { "slice": "Red", "flip": true } } ] }
                ]
            }"#,
        );
        let actions: Vec<_> = script.steps.iter().map(Step::action).collect();
        assert_eq!(actions, vec!["set_driver", "event", "scene", "scene", "batch"]);
    }

    #[test]
    fn replay_commits_and_reports() {
        let script = parse(
            r#"{
                "slices": ["Red", "Green"],
                "nodes": { "Frame": { "RigidFrame": { "to_world":
                    [[1,0,0,5],[0,1,0,0],[0,0,1,0],[0,0,0,1]] } } },
                "steps": [
                    { "set_mode": { "slice": "Red", "mode": "transverse" } },
                    { "set_driver": { "slice": "Red", "driver": "Frame" } },
                    { "set_driver": { "slice": "Green", "driver": "Frame" } }
                ]
            }"#,
        );
        let out = replay(script).unwrap();
        assert_eq!(out.steps[1].outcomes[0].update, "committed");
        assert_eq!(out.steps[2].outcomes[0].update, "unchanged");
        assert_eq!(out.observed, vec![NodeId::new("Frame")]);
        let red = out
            .slices
            .iter()
            .find(|s| s.slice == SliceId::new("Red"))
            .unwrap();
        assert_eq!(red.slice_to_world, Mat4::translation(5.0, 0.0, 0.0));
        assert_eq!(red.notifications, 1);
    }

    #[test]
    fn batch_merges_outcomes() {
        let script = parse(
            r#"{
                "slices": ["Red"],
                "nodes": { "P": { "PointLandmark": { "control_points": [[1,2,3]] } } },
                "steps": [
                    { "batch": [
                        { "set_mode": { "slice": "Red", "mode": "axial" } },
                        { "set_driver": { "slice": "Red", "driver": "P" } },
                        { "set_rotation": { "slice": "Red", "degrees": 90 } }
                    ] }
                ]
            }"#,
        );
        let out = replay(script).unwrap();
        assert_eq!(out.steps[0].outcomes.len(), 3);
        assert_eq!(out.slices[0].commits, 2);
        assert_eq!(out.slices[0].notifications, 1);
    }
}
