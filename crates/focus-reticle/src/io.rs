//! JSON replay configuration and report helpers.
//!
//! A replay drives a [`ReticleController`] through a scripted session
//! against the in-memory reference hosts: planes appear and disappear at
//! fixed times while a camera follows a list of keyframes.

use std::{
    fs,
    path::{Path, PathBuf},
};

use focus_reticle_core::{
    CameraPose, Plane, PlaneSet, Projection, ReticlePose, SceneTree, SurfaceKind, TrackingState,
    WriteCounters,
};
use focus_reticle_style::{StyleConfig, StylePalette, StyleVariant, Visual};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{Frame, ReticleController, ReticleError, ReticleEvent, ReticleParams};

#[derive(thiserror::Error, Debug)]
pub enum ReplayIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("keyframe {index} at {timestamp}s has no view direction")]
    DegenerateKeyframe { index: usize, timestamp: f64 },
}

/// A plane that exists during `[appear_at, disappear_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedPlane {
    pub plane: Plane,
    #[serde(default)]
    pub appear_at: f64,
    #[serde(default)]
    pub disappear_at: Option<f64>,
}

impl TimedPlane {
    pub fn is_live(&self, t: f64) -> bool {
        t >= self.appear_at && self.disappear_at.is_none_or(|end| t < end)
    }
}

/// Camera keyframe. The camera sits at `eye` looking at `target` with `+Y`
/// up; a vertical view keeps world `-Z` at the top of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub timestamp: f64,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
}

impl ReplayFrame {
    pub fn camera(&self) -> CameraPose {
        CameraPose::looking_at(self.eye, self.target, Vector3::y())
    }

    /// `eye` and `target` are finite and apart.
    pub fn has_view_direction(&self) -> bool {
        let dir = self.target - self.eye;
        dir.iter().all(|v| v.is_finite()) && dir.norm() > 1e-6
    }
}

/// Palette change applied before the first frame at or after `at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedPalette {
    pub at: f64,
    pub palette: StylePalette,
}

/// Scripted session for the replay tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub params: ReticleParams,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub projection: Projection,
    #[serde(default)]
    pub planes: Vec<TimedPlane>,
    #[serde(default)]
    pub restyle: Vec<TimedPalette>,
    pub frames: Vec<ReplayFrame>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl ReplayConfig {
    /// Load a JSON config from disk and check its keyframes.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReplayIoError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReplayIoError> {
        match self
            .frames
            .iter()
            .enumerate()
            .find(|(_, f)| !f.has_view_direction())
        {
            Some((index, f)) => Err(ReplayIoError::DegenerateKeyframe {
                index,
                timestamp: f.timestamp,
            }),
            None => Ok(()),
        }
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReplayIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("focus_reticle_replay.json"))
    }

    /// Planes live at time `t`.
    pub fn surfaces_at(&self, t: f64) -> PlaneSet {
        self.planes
            .iter()
            .filter(|p| p.is_live(t))
            .map(|p| p.plane.clone())
            .collect()
    }
}

/// One replayed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub timestamp: f64,
    pub state: TrackingState,
    pub hit_kind: Option<SurfaceKind>,
    pub pose: ReticlePose,
    pub visual: Option<Visual>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub style: StyleVariant,
    pub generation: u64,
    pub frames: Vec<FrameRecord>,
    pub events: Vec<ReticleEvent>,
    pub final_state: TrackingState,
    /// Scene writes issued over the whole session.
    pub writes: WriteCounters,
    /// Nodes left in the scene after detach, besides the root.
    pub leaked_nodes: usize,
}

impl ReplayReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReplayIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReplayIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Replay `config` against a fresh [`SceneTree`].
pub fn run_replay(config: &ReplayConfig) -> Result<ReplayReport, ReticleError> {
    let mut scene = SceneTree::new();
    let mut reticle = ReticleController::new(config.params.clone());
    reticle.attach(&mut scene, SceneTree::ROOT, config.style.clone())?;

    let mut restyles: Vec<&TimedPalette> = config.restyle.iter().collect();
    restyles.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut pending = restyles.into_iter().peekable();

    let mut frames = Vec::with_capacity(config.frames.len());
    for keyframe in &config.frames {
        while let Some(change) = pending.next_if(|c| c.at <= keyframe.timestamp) {
            log::debug!("restyle at {:.3}s", change.at);
            reticle.restyle(&mut scene, &change.palette)?;
        }

        let surfaces = config.surfaces_at(keyframe.timestamp);
        let frame = Frame::new(keyframe.timestamp, keyframe.camera(), &surfaces)
            .with_projection(config.projection);
        let Some(summary) = reticle.update(&mut scene, &frame) else {
            continue;
        };
        frames.push(FrameRecord {
            timestamp: keyframe.timestamp,
            state: summary.state,
            hit_kind: summary.hit.map(|h| h.kind),
            pose: summary.pose,
            visual: reticle.visual(),
        });
    }

    let style = config.style.variant();
    let generation = reticle.generation();
    let final_state = reticle.state();
    let events = reticle.drain_events();
    reticle.detach(&mut scene);
    let leaked_nodes = scene.len().saturating_sub(1);
    log::info!(
        "replayed {} frames, final state {:?}, {} transitions",
        frames.len(),
        final_state,
        events.len()
    );

    Ok(ReplayReport {
        style,
        generation,
        frames,
        events,
        final_state,
        writes: scene.writes(),
        leaked_nodes,
    })
}
