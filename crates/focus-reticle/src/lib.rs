//! High-level facade crate for the `focus-reticle-*` workspace.
//!
//! This crate provides:
//! - [`ReticleController`], the object an AR host owns and ticks once per
//!   frame;
//! - stable re-exports of the underlying crates;
//! - JSON replay helpers used by the `focus-reticle` CLI.
//!
//! ## Quickstart
//!
//! ```
//! use focus_reticle::core::{CameraPose, Plane, PlaneSet, SceneTree, TrackingState};
//! use focus_reticle::style::StyleConfig;
//! use focus_reticle::{Frame, ReticleController, ReticleParams};
//! use nalgebra::{Point3, Vector3};
//!
//! # fn main() -> Result<(), focus_reticle::ReticleError> {
//! let mut scene = SceneTree::new();
//! let floor = PlaneSet::new(vec![Plane::horizontal(Point3::origin())]);
//! let camera = CameraPose::looking_at(
//!     Point3::new(0.0, 1.5, 0.0),
//!     Point3::new(0.0, 0.0, -1.0),
//!     Vector3::y(),
//! );
//!
//! let mut reticle = ReticleController::new(ReticleParams::default());
//! reticle.attach(&mut scene, SceneTree::ROOT, StyleConfig::colored())?;
//! reticle.update(&mut scene, &Frame::new(0.0, camera, &floor));
//! assert_eq!(reticle.state(), TrackingState::OnSurface);
//! reticle.detach(&mut scene);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `focus_reticle::core`: math types, host seams, reference hosts, ray queries.
//! - `focus_reticle::tracking`: tracking state machine and pose smoothing.
//! - `focus_reticle::style`: style configs, meshes, materials, renderers.
//! - `focus_reticle::io`: replay config and report.

pub use focus_reticle_core as core;
pub use focus_reticle_style as style;
pub use focus_reticle_tracking as tracking;

mod controller;
mod error;
pub mod io;

pub use controller::{
    Frame, FrameSummary, ReticleController, ReticleEvent, ReticleEventKind, ReticleParams,
};
pub use error::ReticleError;
pub use focus_reticle_core::{ReticlePose, TrackingState};
pub use focus_reticle_style::{StyleConfig, StylePalette};
