//! Rendering styles for the focus reticle.
//!
//! A [`StyleConfig`] selects one of two strategies:
//! - `Classic`: unlit corner brackets that close into a square once the
//!   reticle locks onto a surface;
//! - `Colored`: a flat plane whose material encodes the tracking state.
//!
//! The chosen [`Renderer`] spawns and owns a single scene node and only
//! writes to it when the desired visual differs from what is already there.
//!
//! ```
//! use focus_reticle_core::{SceneTree, TrackingState};
//! use focus_reticle_style::{Renderer, StyleConfig, StyleRenderer};
//!
//! let mut scene = SceneTree::new();
//! let mut renderer = Renderer::from_config(StyleConfig::colored()).unwrap();
//! renderer.attach(&mut scene, SceneTree::ROOT).unwrap();
//! renderer.on_state_changed(&mut scene, TrackingState::Initializing);
//! assert!(renderer.visual().is_some());
//! renderer.detach(&mut scene);
//! assert_eq!(scene.len(), 1);
//! ```

mod config;
mod material;
pub mod mesh;
mod renderer;

pub use config::{
    ClassicStyle, ColoredStyle, StyleConfig, StyleError, StylePalette, StyleVariant,
};
pub use material::{
    classic_material, colored_material, COLORED_EMISSIVE_INTENSITY, TEXTURE_BASE_ALPHA,
};
pub use renderer::{
    BracketShape, ClassicRenderer, ColoredRenderer, Renderer, StyleRenderer, Visual,
    RETICLE_NODE_NAME,
};
