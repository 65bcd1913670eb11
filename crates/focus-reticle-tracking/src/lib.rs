//! Per-frame tracking logic for the focus reticle.
//!
//! Two small pieces sit between the ray query and the renderer:
//! 1. [`TrackingStateMachine`] turns the frame's query result into the
//!    authoritative `TrackingState`.
//! 2. [`PoseSmoother`] damps the raw hit into a stable `ReticlePose`, faster
//!    while locked onto a surface than while searching, and holds the pose
//!    when nothing is hit.
//!
//! Neither piece knows about styles or scene graphs.

mod smoothing;
mod state;

pub use smoothing::{
    distance_scale, frame_blend, surface_orientation, target_scale, PoseSmoother, ScaleParams,
    SmoothingParams, SmoothingParamsError,
};
pub use state::{Transition, TrackingStateMachine};
