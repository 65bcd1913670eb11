//! Core types and host seams for the AR focus reticle.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about a concrete AR session or renderer: the host plugs in through
//! [`SurfaceModel`] (ray queries against detected planes) and [`SceneGraph`]
//! (the nodes the reticle draws into). [`PlaneSet`] and [`SceneTree`] are
//! in-memory implementations of both.

mod logger;
mod raycast;
mod resource;
mod scene;
mod surface;
mod types;

pub use raycast::{select_nearest, viewport_ray, RaycastAdapter, RaycastParams};
pub use resource::{Material, MaterialColor, MeshResource, ResourceError, Rgba, TextureResource};
pub use scene::{NodeId, SceneError, SceneGraph, SceneNode, SceneTree, WriteCounters};
pub use surface::{NoSurfaces, Plane, PlaneSet, SurfaceModel};
pub use types::{CameraPose, Projection, Ray, ReticlePose, SurfaceHit, SurfaceKind, TrackingState};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_filter, init_with_level, LogFilter, LogFilterError, LOG_ENV};
