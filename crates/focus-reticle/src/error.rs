use focus_reticle_core::SceneError;
use focus_reticle_style::{StyleError, StyleVariant};
use focus_reticle_tracking::SmoothingParamsError;

/// Errors returned by [`crate::ReticleController`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ReticleError {
    /// A mesh or texture of the requested style failed validation.
    /// Nothing was spawned.
    #[error("reticle asset unavailable: {0}")]
    AssetUnavailable(#[source] StyleError),
    #[error("invalid smoothing parameters: {0}")]
    InvalidParams(#[from] SmoothingParamsError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("cannot restyle a {active:?} reticle with a {requested:?} palette")]
    StyleMismatch {
        active: StyleVariant,
        requested: StyleVariant,
    },
    #[error("reticle is not attached")]
    NotAttached,
}

impl From<StyleError> for ReticleError {
    fn from(err: StyleError) -> Self {
        match err {
            StyleError::StyleMismatch { active, requested } => {
                ReticleError::StyleMismatch { active, requested }
            }
            err @ StyleError::AssetUnavailable { .. } => ReticleError::AssetUnavailable(err),
        }
    }
}
