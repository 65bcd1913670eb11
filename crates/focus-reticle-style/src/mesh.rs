//! Built-in reticle geometry.
//!
//! All meshes lie flat in the local XZ plane, centered on the origin, with
//! triangles wound counter-clockwise when seen from `+Y`.

use focus_reticle_core::MeshResource;

/// Side length of the classic reticle, metres.
pub const CLASSIC_SIZE: f32 = 0.17;
/// Bar thickness of the classic brackets, metres.
pub const CLASSIC_THICKNESS: f32 = 0.018;
/// Side length of the colored fill plane, metres.
pub const COLORED_PLANE_SIZE: f32 = 0.2;

fn push_rect(mesh: &mut MeshResource, x0: f32, x1: f32, z0: f32, z1: f32) {
    let (x0, x1) = (x0.min(x1), x0.max(x1));
    let (z0, z1) = (z0.min(z1), z0.max(z1));
    let base = mesh.positions.len() as u32;
    mesh.positions.extend_from_slice(&[
        [x0, 0.0, z0],
        [x1, 0.0, z0],
        [x1, 0.0, z1],
        [x0, 0.0, z1],
    ]);
    mesh.indices
        .extend_from_slice(&[base, base + 3, base + 2, base, base + 2, base + 1]);
}

/// Flat `width` x `depth` rectangle.
pub fn plane(name: &str, width: f32, depth: f32) -> MeshResource {
    let mut mesh = MeshResource::new(name, Vec::with_capacity(4), Vec::with_capacity(6));
    push_rect(&mut mesh, -width * 0.5, width * 0.5, -depth * 0.5, depth * 0.5);
    mesh
}

/// Closed reticle: a filled square.
pub fn filled_square(name: &str, size: f32) -> MeshResource {
    plane(name, size, size)
}

/// Open reticle: four L-shaped brackets on the corners of a `size` square.
///
/// Each bracket has two arms of length `arm` and width `thickness`.
pub fn corner_brackets(name: &str, size: f32, thickness: f32, arm: f32) -> MeshResource {
    let half = size * 0.5;
    let arm = arm.min(half);
    let thickness = thickness.min(arm);
    let mut mesh = MeshResource::new(name, Vec::with_capacity(32), Vec::with_capacity(48));
    for (sx, sz) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        let cx = sx * half;
        let cz = sz * half;
        // arm along X
        push_rect(&mut mesh, cx, cx - sx * arm, cz, cz - sz * thickness);
        // arm along Z
        push_rect(&mut mesh, cx, cx - sx * thickness, cz, cz - sz * arm);
    }
    mesh
}

/// Default open-bracket mesh of the classic style.
pub fn classic_open() -> MeshResource {
    corner_brackets(
        "classic_open",
        CLASSIC_SIZE,
        CLASSIC_THICKNESS,
        CLASSIC_SIZE * 0.35,
    )
}

/// Default closed-square mesh of the classic style.
pub fn classic_closed() -> MeshResource {
    filled_square("classic_closed", CLASSIC_SIZE)
}

/// Default fill plane of the colored style.
pub fn colored_plane() -> MeshResource {
    plane("colored_plane", COLORED_PLANE_SIZE, COLORED_PLANE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector2, Vector3};

    fn face_normals(mesh: &MeshResource) -> Vec<Vector3<f32>> {
        mesh.indices
            .chunks(3)
            .map(|tri| {
                let p = |i: u32| Vector3::from(mesh.positions[i as usize]);
                let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
                (b - a).cross(&(c - a))
            })
            .collect()
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane("p", 0.4, 0.2);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.footprint(), Vector2::new(0.4, 0.2));
        assert!(face_normals(&mesh).iter().all(|n| n.y > 0.0));
    }

    #[test]
    fn brackets_have_eight_arms_inside_the_square() {
        let mesh = classic_open();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangle_count(), 16);
        assert_eq!(mesh.vertex_count(), 32);
        let half = CLASSIC_SIZE * 0.5 + 1e-6;
        assert!(mesh
            .positions
            .iter()
            .all(|p| p[0].abs() <= half && p[2].abs() <= half));
        assert!(face_normals(&mesh).iter().all(|n| n.y > 0.0));
    }

    #[test]
    fn brackets_leave_the_center_open() {
        let mesh = classic_open();
        let inner = CLASSIC_SIZE * 0.5 - CLASSIC_SIZE * 0.35;
        let center_covered = mesh.positions.iter().any(|p| p[0].abs() < inner && p[2].abs() < inner);
        assert!(!center_covered);
    }

    #[test]
    fn oversized_arms_are_clamped() {
        let mesh = corner_brackets("b", 0.1, 0.5, 1.0);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.footprint(), Vector2::new(0.1, 0.1));
    }
}
