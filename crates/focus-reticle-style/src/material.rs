//! Material construction. Materials are built here in full and only then
//! handed to the scene graph.

use focus_reticle_core::{Material, MaterialColor, Rgba};

/// Emissive intensity used for flat colors of the colored style.
pub const COLORED_EMISSIVE_INTENSITY: f32 = 2.0;

/// Base alpha for textured materials.
pub const TEXTURE_BASE_ALPHA: f32 = 0.9999;

/// Material of the colored style for one state color.
///
/// A flat color is rendered as emission over a black tint that carries the
/// color's alpha. A texture is rendered on a near-opaque white base.
pub fn colored_material(color: &MaterialColor) -> Material {
    match color {
        MaterialColor::Color(c) => Material {
            base_color: Rgba::BLACK.with_alpha(c.a),
            base_texture: None,
            emissive: *c,
            emissive_intensity: COLORED_EMISSIVE_INTENSITY,
            unlit: false,
        },
        MaterialColor::Texture(tex) => Material {
            base_color: Rgba::WHITE.with_alpha(TEXTURE_BASE_ALPHA),
            base_texture: Some(tex.clone()),
            emissive: Rgba::CLEAR,
            emissive_intensity: 0.0,
            unlit: false,
        },
    }
}

/// Material of the classic style.
pub fn classic_material(color: Rgba) -> Material {
    Material::unlit(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_reticle_core::TextureResource;

    #[test]
    fn flat_color_is_emissive_over_black() {
        let m = colored_material(&Rgba::GREEN.with_alpha(0.5).into());
        assert_eq!(m.base_color, Rgba::new(0.0, 0.0, 0.0, 0.5));
        assert_eq!(m.emissive, Rgba::GREEN.with_alpha(0.5));
        assert_eq!(m.emissive_intensity, 2.0);
        assert!(m.base_texture.is_none());
        assert!(!m.unlit);
    }

    #[test]
    fn texture_sits_on_white_base() {
        let tex = TextureResource::new("grid", 64, 64);
        let m = colored_material(&MaterialColor::Texture(tex.clone()));
        assert_eq!(m.base_color, Rgba::WHITE.with_alpha(0.9999));
        assert_eq!(m.base_texture, Some(tex));
        assert_eq!(m.emissive_intensity, 0.0);
    }

    #[test]
    fn classic_is_unlit() {
        let m = classic_material(Rgba::FOCUS_YELLOW);
        assert!(m.unlit);
        assert_eq!(m.base_color, Rgba::FOCUS_YELLOW);
    }
}
