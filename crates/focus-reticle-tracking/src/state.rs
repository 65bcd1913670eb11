use focus_reticle_core::{SurfaceHit, TrackingState};
use serde::{Deserialize, Serialize};

/// A state change produced by one [`TrackingStateMachine::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TrackingState,
    pub to: TrackingState,
}

/// Owns the authoritative [`TrackingState`].
///
/// Transitions:
/// - `Initializing -> OnSurface` on the first horizontal/vertical hit,
/// - `OnSurface -> OffSurface` on no hit or an `Unknown` hit,
/// - `OffSurface -> OnSurface` on the next horizontal/vertical hit.
///
/// `Initializing` never leaves for `OffSurface`: without a real hit there is
/// nothing to be "off" of.
#[derive(Clone, Debug, Default)]
pub struct TrackingStateMachine {
    state: TrackingState,
    seen_surface: bool,
}

impl TrackingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    /// Whether a real surface hit was ever observed.
    #[inline]
    pub fn has_seen_surface(&self) -> bool {
        self.seen_surface
    }

    /// Next state for `hit`, without mutating the machine.
    pub fn next_state(&self, hit: Option<&SurfaceHit>) -> TrackingState {
        match hit {
            Some(h) if h.kind.is_known() => TrackingState::OnSurface,
            _ if self.seen_surface => TrackingState::OffSurface,
            _ => TrackingState::Initializing,
        }
    }

    /// Consume this frame's query result.
    pub fn advance(&mut self, hit: Option<&SurfaceHit>) -> Option<Transition> {
        let next = self.next_state(hit);
        if next == TrackingState::OnSurface {
            self.seen_surface = true;
        }
        let from = self.state;
        if from == next {
            return None;
        }
        self.state = next;
        log::debug!("tracking {:?} -> {:?}", from, next);
        Some(Transition { from, to: next })
    }

    /// Back to `Initializing` with no hit history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
