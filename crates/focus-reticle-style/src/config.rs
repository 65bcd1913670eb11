use focus_reticle_core::{MaterialColor, MeshResource, ResourceError, Rgba};
use serde::{Deserialize, Serialize};

use crate::mesh;

/// Which renderer a [`StyleConfig`] selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleVariant {
    Classic,
    Colored,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("style asset `{asset}` is unavailable: {source}")]
    AssetUnavailable {
        asset: &'static str,
        #[source]
        source: ResourceError,
    },
    #[error("cannot restyle a {active:?} reticle with a {requested:?} palette")]
    StyleMismatch {
        active: StyleVariant,
        requested: StyleVariant,
    },
}

fn check(asset: &'static str, result: Result<(), ResourceError>) -> Result<(), StyleError> {
    result.map_err(|source| StyleError::AssetUnavailable { asset, source })
}

/// Bracket style: open corners while searching, a closed square when locked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassicStyle {
    pub open_mesh: MeshResource,
    pub closed_mesh: MeshResource,
    pub color: Rgba,
}

impl ClassicStyle {
    pub fn validate(&self) -> Result<(), StyleError> {
        check("open_mesh", self.open_mesh.validate())?;
        check("closed_mesh", self.closed_mesh.validate())
    }

    pub fn recolored(&self, color: Rgba) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }
}

impl Default for ClassicStyle {
    fn default() -> Self {
        Self {
            open_mesh: mesh::classic_open(),
            closed_mesh: mesh::classic_closed(),
            color: Rgba::FOCUS_YELLOW,
        }
    }
}

/// Flat plane whose material follows the tracking state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColoredStyle {
    pub on_color: MaterialColor,
    pub off_color: MaterialColor,
    pub non_tracking_color: MaterialColor,
    pub plane_mesh: MeshResource,
}

impl ColoredStyle {
    pub fn validate(&self) -> Result<(), StyleError> {
        check("on_color", self.on_color.validate())?;
        check("off_color", self.off_color.validate())?;
        check("non_tracking_color", self.non_tracking_color.validate())?;
        check("plane_mesh", self.plane_mesh.validate())
    }

    /// Same plane with new state colors, validated before it is returned.
    pub fn recolored(
        &self,
        on_color: &MaterialColor,
        off_color: &MaterialColor,
        non_tracking_color: &MaterialColor,
    ) -> Result<Self, StyleError> {
        let next = Self {
            on_color: on_color.clone(),
            off_color: off_color.clone(),
            non_tracking_color: non_tracking_color.clone(),
            plane_mesh: self.plane_mesh.clone(),
        };
        next.validate()?;
        Ok(next)
    }
}

impl Default for ColoredStyle {
    fn default() -> Self {
        Self {
            on_color: Rgba::GREEN.with_alpha(0.5).into(),
            off_color: Rgba::YELLOW.with_alpha(0.5).into(),
            non_tracking_color: Rgba::RED.with_alpha(0.5).into(),
            plane_mesh: mesh::colored_plane(),
        }
    }
}

/// Style chosen for one attach lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum StyleConfig {
    Classic(ClassicStyle),
    Colored(ColoredStyle),
}

impl StyleConfig {
    pub fn classic() -> Self {
        StyleConfig::Classic(ClassicStyle::default())
    }

    pub fn colored() -> Self {
        StyleConfig::Colored(ColoredStyle::default())
    }

    pub fn variant(&self) -> StyleVariant {
        match self {
            StyleConfig::Classic(_) => StyleVariant::Classic,
            StyleConfig::Colored(_) => StyleVariant::Colored,
        }
    }

    /// Check every asset the style references.
    pub fn validate(&self) -> Result<(), StyleError> {
        match self {
            StyleConfig::Classic(s) => s.validate(),
            StyleConfig::Colored(s) => s.validate(),
        }
    }

    /// Replace the colors of the active variant, keeping its meshes.
    ///
    /// On error the config is left untouched.
    pub fn apply_palette(&mut self, palette: &StylePalette) -> Result<(), StyleError> {
        match (self, palette) {
            (StyleConfig::Classic(s), StylePalette::Classic { color }) => {
                *s = s.recolored(*color);
                Ok(())
            }
            (
                StyleConfig::Colored(s),
                StylePalette::Colored {
                    on_color,
                    off_color,
                    non_tracking_color,
                },
            ) => {
                *s = s.recolored(on_color, off_color, non_tracking_color)?;
                Ok(())
            }
            (active, palette) => Err(StyleError::StyleMismatch {
                active: active.variant(),
                requested: palette.variant(),
            }),
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::classic()
    }
}

/// New colors for an attached style; meshes are fixed at attach.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum StylePalette {
    Classic {
        color: Rgba,
    },
    Colored {
        on_color: MaterialColor,
        off_color: MaterialColor,
        non_tracking_color: MaterialColor,
    },
}

impl StylePalette {
    pub fn variant(&self) -> StyleVariant {
        match self {
            StylePalette::Classic { .. } => StyleVariant::Classic,
            StylePalette::Colored { .. } => StyleVariant::Colored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_reticle_core::TextureResource;

    #[test]
    fn defaults_validate() {
        assert!(StyleConfig::classic().validate().is_ok());
        assert!(StyleConfig::colored().validate().is_ok());
        assert_eq!(StyleConfig::default().variant(), StyleVariant::Classic);
    }

    #[test]
    fn missing_mesh_names_the_asset() {
        let style = StyleConfig::Classic(ClassicStyle {
            closed_mesh: MeshResource::new("gone", Vec::new(), Vec::new()),
            ..ClassicStyle::default()
        });
        match style.validate() {
            Err(StyleError::AssetUnavailable { asset, source }) => {
                assert_eq!(asset, "closed_mesh");
                assert_eq!(
                    source,
                    ResourceError::EmptyMesh {
                        name: "gone".into()
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn palette_swaps_colors_but_keeps_meshes() {
        let mut style = StyleConfig::colored();
        style
            .apply_palette(&StylePalette::Colored {
                on_color: Rgba::WHITE.into(),
                off_color: Rgba::BLACK.into(),
                non_tracking_color: Rgba::RED.into(),
            })
            .expect("same variant");
        let StyleConfig::Colored(s) = &style else {
            panic!("variant changed");
        };
        assert_eq!(s.on_color, MaterialColor::Color(Rgba::WHITE));
        assert_eq!(s.plane_mesh, mesh::colored_plane());
    }

    #[test]
    fn palette_of_other_variant_is_rejected() {
        let mut style = StyleConfig::classic();
        let before = style.clone();
        let err = style
            .apply_palette(&StylePalette::Colored {
                on_color: Rgba::WHITE.into(),
                off_color: Rgba::WHITE.into(),
                non_tracking_color: Rgba::WHITE.into(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            StyleError::StyleMismatch {
                active: StyleVariant::Classic,
                requested: StyleVariant::Colored
            }
        );
        assert_eq!(style, before);
    }

    #[test]
    fn bad_texture_in_palette_leaves_style_untouched() {
        let mut style = StyleConfig::colored();
        let before = style.clone();
        let result = style.apply_palette(&StylePalette::Colored {
            on_color: MaterialColor::Texture(TextureResource::new("grid", 0, 0)),
            off_color: Rgba::WHITE.into(),
            non_tracking_color: Rgba::WHITE.into(),
        });
        assert!(matches!(
            result,
            Err(StyleError::AssetUnavailable {
                asset: "on_color",
                ..
            })
        ));
        assert_eq!(style, before);
    }

    #[test]
    fn config_json_is_tagged_by_variant() {
        let json = serde_json::to_value(StyleConfig::colored()).expect("serialize");
        assert_eq!(json["variant"], "colored");
        let back: StyleConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.variant(), StyleVariant::Colored);
    }
}
