use focus_reticle_core::{
    Material, MeshResource, NodeId, ReticlePose, Rgba, SceneError, SceneGraph, TrackingState,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::config::{ClassicStyle, ColoredStyle, StyleConfig, StyleError, StylePalette};
use crate::material::{classic_material, colored_material};

/// Name of the node every renderer spawns under the host parent.
pub const RETICLE_NODE_NAME: &str = "focus_reticle";

/// Geometry shown by the classic style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketShape {
    /// Four corner brackets.
    Open,
    /// Filled square.
    Closed,
}

impl BracketShape {
    pub fn for_state(state: TrackingState) -> Self {
        if state.is_on_surface() {
            BracketShape::Closed
        } else {
            BracketShape::Open
        }
    }
}

/// What a renderer currently has on its node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Visual {
    Classic {
        shape: BracketShape,
        mesh: String,
        color: Rgba,
    },
    Colored {
        mesh: String,
        material: Material,
    },
}

/// Strategy that maps tracking state and pose onto the nodes it owns.
pub trait StyleRenderer {
    /// Spawn this style's node under `parent`, releasing any previous one.
    fn attach(&mut self, scene: &mut dyn SceneGraph, parent: NodeId) -> Result<(), SceneError>;
    fn on_state_changed(&mut self, scene: &mut dyn SceneGraph, state: TrackingState);
    fn on_pose_changed(&mut self, scene: &mut dyn SceneGraph, pose: &ReticlePose);
    /// Despawn everything this renderer spawned. Idempotent.
    fn detach(&mut self, scene: &mut dyn SceneGraph);
    fn node(&self) -> Option<NodeId>;
    /// Visual currently applied, `None` before the first state.
    fn visual(&self) -> Option<Visual>;
}

/// Bookkeeping shared by both styles: the owned node and what was last
/// written to it.
#[derive(Clone, Debug, Default)]
struct NodeSlot {
    node: Option<NodeId>,
    mesh: Option<MeshResource>,
    material: Option<Material>,
    pose: Option<ReticlePose>,
}

impl NodeSlot {
    fn spawn(&mut self, scene: &mut dyn SceneGraph, parent: NodeId) -> Result<(), SceneError> {
        self.release(scene);
        let node = scene.spawn(parent, RETICLE_NODE_NAME)?;
        log::debug!("spawned reticle node {:?} under {:?}", node, parent);
        self.node = Some(node);
        Ok(())
    }

    fn release(&mut self, scene: &mut dyn SceneGraph) {
        if let Some(node) = self.node.take() {
            scene.despawn(node);
            log::debug!("despawned reticle node {:?}", node);
        }
        *self = Self::default();
    }

    fn write_mesh(&mut self, scene: &mut dyn SceneGraph, mesh: &MeshResource) {
        let Some(node) = self.node else { return };
        if self.mesh.as_ref() == Some(mesh) {
            return;
        }
        scene.set_mesh(node, mesh);
        self.mesh = Some(mesh.clone());
    }

    fn mesh_name(&self) -> Option<String> {
        self.mesh.as_ref().map(|m| m.name.clone())
    }

    fn write_material(&mut self, scene: &mut dyn SceneGraph, material: Material) {
        let Some(node) = self.node else { return };
        if self.material.as_ref() == Some(&material) {
            return;
        }
        scene.set_material(node, material.clone());
        self.material = Some(material);
    }

    fn write_pose(&mut self, scene: &mut dyn SceneGraph, pose: &ReticlePose) {
        let Some(node) = self.node else { return };
        if self.pose.as_ref() == Some(pose) {
            return;
        }
        scene.set_transform(node, pose);
        self.pose = Some(*pose);
    }
}

/// Open brackets while searching, closed square while locked.
#[derive(Clone, Debug)]
pub struct ClassicRenderer {
    style: ClassicStyle,
    slot: NodeSlot,
    shape: Option<BracketShape>,
}

impl ClassicRenderer {
    pub fn new(style: ClassicStyle) -> Self {
        Self {
            style,
            slot: NodeSlot::default(),
            shape: None,
        }
    }

    pub fn style(&self) -> &ClassicStyle {
        &self.style
    }

    /// Change the bracket color; geometry stays as is.
    pub fn recolor(&mut self, scene: &mut dyn SceneGraph, color: Rgba) {
        self.style = self.style.recolored(color);
        if self.shape.is_some() {
            self.slot.write_material(scene, classic_material(color));
        }
    }
}

impl StyleRenderer for ClassicRenderer {
    fn attach(&mut self, scene: &mut dyn SceneGraph, parent: NodeId) -> Result<(), SceneError> {
        self.shape = None;
        self.slot.spawn(scene, parent)
    }

    fn on_state_changed(&mut self, scene: &mut dyn SceneGraph, state: TrackingState) {
        if self.slot.node.is_none() {
            return;
        }
        let shape = BracketShape::for_state(state);
        let mesh = match shape {
            BracketShape::Open => &self.style.open_mesh,
            BracketShape::Closed => &self.style.closed_mesh,
        };
        self.slot.write_mesh(scene, mesh);
        self.slot
            .write_material(scene, classic_material(self.style.color));
        self.shape = Some(shape);
    }

    fn on_pose_changed(&mut self, scene: &mut dyn SceneGraph, pose: &ReticlePose) {
        self.slot.write_pose(scene, pose);
    }

    fn detach(&mut self, scene: &mut dyn SceneGraph) {
        self.slot.release(scene);
        self.shape = None;
    }

    fn node(&self) -> Option<NodeId> {
        self.slot.node
    }

    fn visual(&self) -> Option<Visual> {
        let shape = self.shape?;
        Some(Visual::Classic {
            shape,
            mesh: self.slot.mesh_name()?,
            color: self.style.color,
        })
    }
}

/// Flat plane recolored per state.
#[derive(Clone, Debug)]
pub struct ColoredRenderer {
    style: ColoredStyle,
    slot: NodeSlot,
    state: Option<TrackingState>,
}

impl ColoredRenderer {
    pub fn new(style: ColoredStyle) -> Self {
        Self {
            style,
            slot: NodeSlot::default(),
            state: None,
        }
    }

    pub fn style(&self) -> &ColoredStyle {
        &self.style
    }

    /// Material for `state`, built in full before it touches the node.
    pub fn material_for(&self, state: TrackingState) -> Material {
        let color = match state {
            TrackingState::Initializing => &self.style.non_tracking_color,
            TrackingState::OnSurface => &self.style.on_color,
            TrackingState::OffSurface => &self.style.off_color,
        };
        colored_material(color)
    }

    /// Swap in a recolored style and refresh the node if a state is shown.
    pub fn recolor(&mut self, scene: &mut dyn SceneGraph, style: ColoredStyle) {
        self.style = style;
        if let Some(state) = self.state {
            let material = self.material_for(state);
            self.slot.write_material(scene, material);
        }
    }
}

impl StyleRenderer for ColoredRenderer {
    fn attach(&mut self, scene: &mut dyn SceneGraph, parent: NodeId) -> Result<(), SceneError> {
        self.state = None;
        self.slot.spawn(scene, parent)?;
        self.slot.write_mesh(scene, &self.style.plane_mesh);
        Ok(())
    }

    fn on_state_changed(&mut self, scene: &mut dyn SceneGraph, state: TrackingState) {
        if self.slot.node.is_none() {
            return;
        }
        let material = self.material_for(state);
        self.slot.write_material(scene, material);
        self.state = Some(state);
    }

    fn on_pose_changed(&mut self, scene: &mut dyn SceneGraph, pose: &ReticlePose) {
        self.slot.write_pose(scene, pose);
    }

    fn detach(&mut self, scene: &mut dyn SceneGraph) {
        self.slot.release(scene);
        self.state = None;
    }

    fn node(&self) -> Option<NodeId> {
        self.slot.node
    }

    fn visual(&self) -> Option<Visual> {
        self.state?;
        Some(Visual::Colored {
            mesh: self.slot.mesh_name()?,
            material: self.slot.material.clone()?,
        })
    }
}

/// The style strategy selected by a [`StyleConfig`].
#[derive(Clone, Debug)]
pub enum Renderer {
    Classic(ClassicRenderer),
    Colored(ColoredRenderer),
}

impl Renderer {
    /// Build the renderer for `config` after validating its assets.
    pub fn from_config(config: StyleConfig) -> Result<Self, StyleError> {
        if let Err(err) = config.validate() {
            log::warn!("rejected {:?} style: {}", config.variant(), err);
            return Err(err);
        }
        Ok(match config {
            StyleConfig::Classic(s) => Renderer::Classic(ClassicRenderer::new(s)),
            StyleConfig::Colored(s) => Renderer::Colored(ColoredRenderer::new(s)),
        })
    }

    /// Snapshot of the active config, including any restyle.
    pub fn config(&self) -> StyleConfig {
        match self {
            Renderer::Classic(r) => StyleConfig::Classic(r.style.clone()),
            Renderer::Colored(r) => StyleConfig::Colored(r.style.clone()),
        }
    }

    /// Recolor the active style. A palette for the other variant is
    /// rejected and nothing is written.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn restyle(
        &mut self,
        scene: &mut dyn SceneGraph,
        palette: &StylePalette,
    ) -> Result<(), StyleError> {
        match (self, palette) {
            (Renderer::Classic(r), StylePalette::Classic { color }) => {
                r.recolor(scene, *color);
                Ok(())
            }
            (
                Renderer::Colored(r),
                StylePalette::Colored {
                    on_color,
                    off_color,
                    non_tracking_color,
                },
            ) => {
                let next = r
                    .style
                    .recolored(on_color, off_color, non_tracking_color)?;
                r.recolor(scene, next);
                Ok(())
            }
            (active, palette) => Err(StyleError::StyleMismatch {
                active: active.config().variant(),
                requested: palette.variant(),
            }),
        }
    }

    fn inner(&self) -> &dyn StyleRenderer {
        match self {
            Renderer::Classic(r) => r,
            Renderer::Colored(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn StyleRenderer {
        match self {
            Renderer::Classic(r) => r,
            Renderer::Colored(r) => r,
        }
    }
}

impl StyleRenderer for Renderer {
    fn attach(&mut self, scene: &mut dyn SceneGraph, parent: NodeId) -> Result<(), SceneError> {
        self.inner_mut().attach(scene, parent)
    }

    fn on_state_changed(&mut self, scene: &mut dyn SceneGraph, state: TrackingState) {
        self.inner_mut().on_state_changed(scene, state)
    }

    fn on_pose_changed(&mut self, scene: &mut dyn SceneGraph, pose: &ReticlePose) {
        self.inner_mut().on_pose_changed(scene, pose)
    }

    fn detach(&mut self, scene: &mut dyn SceneGraph) {
        self.inner_mut().detach(scene)
    }

    fn node(&self) -> Option<NodeId> {
        self.inner().node()
    }

    fn visual(&self) -> Option<Visual> {
        self.inner().visual()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StyleVariant;
    use focus_reticle_core::{MaterialColor, SceneTree};
    use nalgebra::Point3;

    fn attached(config: StyleConfig) -> (SceneTree, Renderer) {
        let mut scene = SceneTree::new();
        let mut r = Renderer::from_config(config).expect("valid style");
        r.attach(&mut scene, SceneTree::ROOT).expect("attach");
        (scene, r)
    }

    #[test]
    fn classic_shape_follows_state() {
        let (mut scene, mut r) = attached(StyleConfig::classic());
        assert_eq!(r.visual(), None);

        r.on_state_changed(&mut scene, TrackingState::Initializing);
        let node = r.node().expect("node");
        assert_eq!(
            scene.node(node).and_then(|n| n.mesh.clone()).as_deref(),
            Some("classic_open")
        );

        r.on_state_changed(&mut scene, TrackingState::OnSurface);
        assert!(matches!(
            r.visual(),
            Some(Visual::Classic {
                shape: BracketShape::Closed,
                ..
            })
        ));
        assert_eq!(
            scene.node(node).and_then(|n| n.mesh.clone()).as_deref(),
            Some("classic_closed")
        );

        r.on_state_changed(&mut scene, TrackingState::OffSurface);
        assert!(matches!(
            r.visual(),
            Some(Visual::Classic {
                shape: BracketShape::Open,
                ..
            })
        ));
        assert_eq!(
            scene.node(node).and_then(|n| n.material.clone()),
            Some(Material::unlit(Rgba::FOCUS_YELLOW))
        );
    }

    #[test]
    fn colored_material_follows_state() {
        let (mut scene, mut r) = attached(StyleConfig::colored());
        let node = r.node().expect("node");
        for (state, color) in [
            (TrackingState::Initializing, Rgba::RED),
            (TrackingState::OnSurface, Rgba::GREEN),
            (TrackingState::OffSurface, Rgba::YELLOW),
        ] {
            r.on_state_changed(&mut scene, state);
            let on_node = scene.node(node).and_then(|n| n.material.clone());
            assert_eq!(
                on_node,
                Some(colored_material(&color.with_alpha(0.5).into()))
            );
        }
    }

    #[test]
    fn identical_states_do_not_rewrite() {
        let (mut scene, mut r) = attached(StyleConfig::colored());
        r.on_state_changed(&mut scene, TrackingState::OnSurface);
        let before = scene.writes();
        for _ in 0..10 {
            r.on_state_changed(&mut scene, TrackingState::OnSurface);
        }
        assert_eq!(scene.writes(), before);

        let (mut scene, mut r) = attached(StyleConfig::classic());
        r.on_state_changed(&mut scene, TrackingState::Initializing);
        let before = scene.writes();
        // both map to the open brackets
        r.on_state_changed(&mut scene, TrackingState::OffSurface);
        assert_eq!(scene.writes(), before);
    }

    #[test]
    fn same_named_meshes_still_swap() {
        let square = crate::mesh::classic_closed();
        let style = ClassicStyle {
            open_mesh: MeshResource {
                name: "reticle".into(),
                ..crate::mesh::classic_open()
            },
            closed_mesh: MeshResource {
                name: "reticle".into(),
                ..square.clone()
            },
            ..ClassicStyle::default()
        };
        let mut scene = SceneTree::new();
        let mut r = ClassicRenderer::new(style);
        r.attach(&mut scene, SceneTree::ROOT).expect("attach");
        r.on_state_changed(&mut scene, TrackingState::Initializing);
        let before = scene.writes().meshes;

        r.on_state_changed(&mut scene, TrackingState::OnSurface);
        assert_eq!(scene.writes().meshes, before + 1);
        assert!(matches!(
            r.visual(),
            Some(Visual::Classic {
                shape: BracketShape::Closed,
                ..
            })
        ));
        assert_eq!(r.slot.mesh.as_ref().map(|m| &m.positions), Some(&square.positions));

        r.on_state_changed(&mut scene, TrackingState::OffSurface);
        assert_eq!(scene.writes().meshes, before + 2);
    }

    #[test]
    fn pose_writes_are_deduplicated() {
        let (mut scene, mut r) = attached(StyleConfig::classic());
        let pose = ReticlePose::from_position(Point3::new(0.0, 0.0, -1.0));
        r.on_pose_changed(&mut scene, &pose);
        r.on_pose_changed(&mut scene, &pose);
        assert_eq!(scene.writes().transforms, 1);
        let node = r.node().expect("node");
        assert_eq!(scene.node(node).map(|n| n.transform), Some(pose));
    }

    #[test]
    fn reattach_leaves_one_node() {
        let (mut scene, mut r) = attached(StyleConfig::classic());
        r.attach(&mut scene, SceneTree::ROOT).expect("re-attach");
        assert_eq!(scene.find_by_name(RETICLE_NODE_NAME).len(), 1);
        r.detach(&mut scene);
        r.detach(&mut scene);
        assert_eq!(scene.len(), 1);
        assert_eq!(r.node(), None);
    }

    #[test]
    fn attach_to_missing_parent_spawns_nothing() {
        let mut scene = SceneTree::new();
        let mut r = Renderer::from_config(StyleConfig::colored()).expect("valid");
        assert_eq!(
            r.attach(&mut scene, NodeId(7)),
            Err(SceneError::UnknownNode(NodeId(7)))
        );
        assert_eq!(scene.len(), 1);
        r.on_state_changed(&mut scene, TrackingState::OnSurface);
        assert_eq!(scene.writes().materials, 0);
    }

    #[test]
    fn restyle_rewrites_current_state_only() {
        let (mut scene, mut r) = attached(StyleConfig::colored());
        r.on_state_changed(&mut scene, TrackingState::OnSurface);
        let white = MaterialColor::from(Rgba::WHITE);
        r.restyle(
            &mut scene,
            &StylePalette::Colored {
                on_color: white.clone(),
                off_color: Rgba::BLACK.into(),
                non_tracking_color: Rgba::BLACK.into(),
            },
        )
        .expect("same variant");
        let node = r.node().expect("node");
        assert_eq!(
            scene.node(node).and_then(|n| n.material.clone()),
            Some(colored_material(&white))
        );
        assert_eq!(scene.node(node).and_then(|n| n.mesh.clone()).as_deref(), Some("colored_plane"));
    }

    #[test]
    fn restyle_with_other_variant_is_rejected() {
        let (mut scene, mut r) = attached(StyleConfig::classic());
        r.on_state_changed(&mut scene, TrackingState::Initializing);
        let before = scene.writes();
        let err = r
            .restyle(
                &mut scene,
                &StylePalette::Colored {
                    on_color: Rgba::WHITE.into(),
                    off_color: Rgba::WHITE.into(),
                    non_tracking_color: Rgba::WHITE.into(),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StyleError::StyleMismatch {
                active: StyleVariant::Classic,
                requested: StyleVariant::Colored
            }
        ));
        assert_eq!(scene.writes(), before);
    }

    #[test]
    fn invalid_assets_are_rejected_before_attach() {
        let config = StyleConfig::Colored(ColoredStyle {
            plane_mesh: MeshResource::new("plane", Vec::new(), Vec::new()),
            ..ColoredStyle::default()
        });
        assert!(matches!(
            Renderer::from_config(config),
            Err(StyleError::AssetUnavailable {
                asset: "plane_mesh",
                ..
            })
        ));
    }
}
