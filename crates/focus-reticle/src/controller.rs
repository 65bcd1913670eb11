//! The host-facing reticle object.

use std::collections::VecDeque;

use focus_reticle_core::{
    CameraPose, NodeId, Projection, RaycastAdapter, RaycastParams, ReticlePose, SceneGraph,
    SurfaceHit, SurfaceModel, TrackingState,
};
use focus_reticle_style::{Renderer, StyleConfig, StylePalette, StyleRenderer, Visual};
use focus_reticle_tracking::{PoseSmoother, SmoothingParams, TrackingStateMachine, Transition};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::ReticleError;

/// Tunables of a [`ReticleController`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReticleParams {
    pub raycast: RaycastParams,
    pub smoothing: SmoothingParams,
}

/// Everything the host supplies for one frame.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    /// Seconds, monotonically increasing across frames.
    pub timestamp: f64,
    pub camera: CameraPose,
    pub projection: Projection,
    pub surfaces: &'a dyn SurfaceModel,
}

impl<'a> Frame<'a> {
    pub fn new(timestamp: f64, camera: CameraPose, surfaces: &'a dyn SurfaceModel) -> Self {
        Self {
            timestamp,
            camera,
            projection: Projection::default(),
            surfaces,
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// Lifecycle notification, tagged with the attach generation it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReticleEvent {
    pub generation: u64,
    pub kind: ReticleEventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReticleEventKind {
    StateChanged {
        from: TrackingState,
        to: TrackingState,
    },
}

/// What one [`ReticleController::update`] call did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub state: TrackingState,
    pub transition: Option<Transition>,
    pub hit: Option<SurfaceHit>,
    pub pose: ReticlePose,
    pub pose_changed: bool,
}

/// Tracks the surface under the screen center and keeps a reticle node in
/// the host scene in sync with it.
///
/// The controller owns the tracking state, the smoothed pose and the style
/// renderer. The host owns the scene and the surfaces and passes them in on
/// every call.
#[derive(Debug)]
pub struct ReticleController {
    params: ReticleParams,
    adapter: RaycastAdapter,
    tracking: TrackingStateMachine,
    smoother: PoseSmoother,
    renderer: Option<Renderer>,
    parent: Option<NodeId>,
    generation: u64,
    events: VecDeque<ReticleEvent>,
}

impl ReticleController {
    pub fn new(params: ReticleParams) -> Self {
        Self {
            adapter: RaycastAdapter::new(params.raycast.clone()),
            smoother: PoseSmoother::new(params.smoothing.clone()),
            params,
            tracking: TrackingStateMachine::new(),
            renderer: None,
            parent: None,
            generation: 0,
            events: VecDeque::new(),
        }
    }

    #[inline]
    pub fn params(&self) -> &ReticleParams {
        &self.params
    }

    /// Attach under `parent` with `style`.
    ///
    /// Smoothing parameters and style assets are validated before anything
    /// is touched; on failure the controller keeps its previous attachment. Otherwise any previous node
    /// is released, tracking starts over from `Initializing` and the new node
    /// receives its initial visual and pose. If the host rejects `parent`
    /// the controller ends up detached.
    pub fn attach(
        &mut self,
        scene: &mut dyn SceneGraph,
        parent: NodeId,
        style: StyleConfig,
    ) -> Result<(), ReticleError> {
        self.params.smoothing.validate()?;
        let mut renderer = Renderer::from_config(style).map_err(ReticleError::from)?;

        self.detach(scene);
        self.tracking.reset();
        self.smoother.reset();

        renderer.attach(scene, parent)?;
        self.generation += 1;
        renderer.on_state_changed(scene, self.tracking.state());
        renderer.on_pose_changed(scene, &self.smoother.pose());
        log::debug!(
            "attached {:?} reticle under {:?} (generation {})",
            renderer.config().variant(),
            parent,
            self.generation
        );
        self.renderer = Some(renderer);
        self.parent = Some(parent);
        Ok(())
    }

    /// Run one frame: query, state, smoothing, then style.
    ///
    /// Returns `None` without touching anything while detached.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, scene, frame), fields(t = frame.timestamp))
    )]
    pub fn update(&mut self, scene: &mut dyn SceneGraph, frame: &Frame<'_>) -> Option<FrameSummary> {
        let Some(renderer) = self.renderer.as_mut() else {
            log::trace!("update at {:.3}s ignored: not attached", frame.timestamp);
            return None;
        };

        let hit = self
            .adapter
            .query(&frame.camera, &frame.projection, frame.surfaces);
        let transition = self.tracking.advance(hit.as_ref());
        let state = self.tracking.state();
        let pose_changed = self.smoother.update(
            hit.as_ref(),
            state.is_on_surface(),
            &frame.camera,
            frame.timestamp,
        );
        let pose = self.smoother.pose();

        if let Some(Transition { from, to }) = transition {
            renderer.on_state_changed(scene, to);
            self.events.push_back(ReticleEvent {
                generation: self.generation,
                kind: ReticleEventKind::StateChanged { from, to },
            });
        }
        if pose_changed {
            renderer.on_pose_changed(scene, &pose);
        }

        Some(FrameSummary {
            state,
            transition,
            hit,
            pose,
            pose_changed,
        })
    }

    /// Release the reticle node and drop pending events. Safe to call twice.
    pub fn detach(&mut self, scene: &mut dyn SceneGraph) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.detach(scene);
            log::debug!("detached reticle (generation {})", self.generation);
        }
        self.parent = None;
        self.events.clear();
    }

    /// Recolor the attached style. Meshes and the variant stay fixed.
    pub fn restyle(
        &mut self,
        scene: &mut dyn SceneGraph,
        palette: &StylePalette,
    ) -> Result<(), ReticleError> {
        let renderer = self.renderer.as_mut().ok_or(ReticleError::NotAttached)?;
        renderer.restyle(scene, palette)?;
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> TrackingState {
        self.tracking.state()
    }

    /// Last applied pose.
    #[inline]
    pub fn pose(&self) -> ReticlePose {
        self.smoother.pose()
    }

    #[inline]
    pub fn is_on_surface(&self) -> bool {
        self.state().is_on_surface()
    }

    /// Active style, including any restyle, while attached.
    pub fn style(&self) -> Option<StyleConfig> {
        self.renderer.as_ref().map(Renderer::config)
    }

    /// What is currently shown on the reticle node.
    pub fn visual(&self) -> Option<Visual> {
        self.renderer.as_ref().and_then(|r| r.visual())
    }

    /// The reticle node while attached.
    pub fn node(&self) -> Option<NodeId> {
        self.renderer.as_ref().and_then(|r| r.node())
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.renderer.is_some()
    }

    /// Incremented on every successful attach.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Take all events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<ReticleEvent> {
        self.events.drain(..).collect()
    }
}

impl Default for ReticleController {
    fn default() -> Self {
        Self::new(ReticleParams::default())
    }
}
