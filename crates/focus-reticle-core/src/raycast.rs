//! Viewport ray construction and nearest-surface queries.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::{CameraPose, Projection, Ray, SurfaceHit, SurfaceKind, SurfaceModel};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters of the per-frame surface query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastParams {
    /// Normalized viewport point (`[0, 0]` top-left, `[1, 1]` bottom-right).
    pub viewport_point: [f32; 2],
    /// Hits farther than this along the ray are ignored, metres.
    pub max_distance: f32,
    /// Hits below this confidence are downgraded to [`SurfaceKind::Unknown`].
    pub min_confidence: f32,
}

impl Default for RaycastParams {
    fn default() -> Self {
        Self {
            viewport_point: [0.5, 0.5],
            max_distance: 10.0,
            min_confidence: 0.5,
        }
    }
}

/// Ray from the camera through the normalized viewport point `point`.
pub fn viewport_ray(camera: &CameraPose, projection: &Projection, point: [f32; 2]) -> Ray {
    let half_h = (projection.vertical_fov * 0.5).tan();
    let half_w = half_h * projection.aspect_ratio;
    let ndc_x = 2.0 * point[0] - 1.0;
    let ndc_y = 1.0 - 2.0 * point[1];
    let local = Vector3::new(ndc_x * half_w, ndc_y * half_h, -1.0);
    let world = camera.orientation * local;
    let direction = Unit::try_new(world, 1e-9).unwrap_or_else(|| Unit::new_unchecked(camera.forward()));
    Ray::new(camera.position, direction)
}

/// Pick the nearest hit in front of the ray origin and within `max_distance`.
///
/// The distance is recomputed from the hit position, so hosts do not have
/// to fill [`SurfaceHit::distance`]. Ties keep the first hit returned.
pub fn select_nearest(ray: &Ray, hits: Vec<SurfaceHit>, max_distance: f32) -> Option<SurfaceHit> {
    let mut best: Option<SurfaceHit> = None;
    for mut hit in hits {
        let depth = ray.depth_of(&hit.position);
        if !depth.is_finite() || depth < 0.0 || depth > max_distance {
            continue;
        }
        hit.distance = depth;
        match &best {
            Some(b) if b.distance <= depth => {}
            _ => best = Some(hit),
        }
    }
    best
}

/// Turns the camera pose into a single surface candidate per frame.
#[derive(Clone, Debug, Default)]
pub struct RaycastAdapter {
    params: RaycastParams,
}

impl RaycastAdapter {
    pub fn new(params: RaycastParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &RaycastParams {
        &self.params
    }

    /// World ray for the configured viewport point.
    pub fn ray(&self, camera: &CameraPose, projection: &Projection) -> Ray {
        viewport_ray(camera, projection, self.params.viewport_point)
    }

    /// Query the host's surfaces for the nearest acceptable hit.
    ///
    /// Low-confidence hits are returned with `kind = Unknown`: they may move
    /// the reticle but never lock it onto a surface.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, surfaces), fields(max_distance = self.params.max_distance))
    )]
    pub fn query(
        &self,
        camera: &CameraPose,
        projection: &Projection,
        surfaces: &dyn SurfaceModel,
    ) -> Option<SurfaceHit> {
        let ray = self.ray(camera, projection);
        let mut hit = select_nearest(&ray, surfaces.raycast(&ray), self.params.max_distance)?;
        if hit.kind.is_known() && !(hit.confidence >= self.params.min_confidence) {
            log::trace!(
                "downgrading {:?} hit at {:.3} m (confidence {:.2})",
                hit.kind,
                hit.distance,
                hit.confidence
            );
            hit.kind = SurfaceKind::Unknown;
        }
        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoSurfaces, Plane, PlaneSet};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn eye_level_camera() -> CameraPose {
        CameraPose::looking_at(
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Vector3::y(),
        )
    }

    #[test]
    fn center_ray_follows_camera_forward() {
        let cam = eye_level_camera();
        let ray = viewport_ray(&cam, &Projection::default(), [0.5, 0.5]);
        assert_relative_eq!(ray.direction.into_inner(), cam.forward(), epsilon = 1e-6);
        assert_eq!(ray.origin, cam.position);
    }

    #[test]
    fn off_center_point_tilts_ray() {
        let cam = CameraPose::default();
        let proj = Projection {
            vertical_fov: std::f32::consts::FRAC_PI_2,
            aspect_ratio: 1.0,
        };
        let ray = viewport_ray(&cam, &proj, [1.0, 0.5]);
        let expected = Vector3::new(1.0, 0.0, -1.0).normalize();
        assert_relative_eq!(ray.direction.into_inner(), expected, epsilon = 1e-6);

        let top = viewport_ray(&cam, &proj, [0.5, 0.0]);
        assert!(top.direction.y > 0.0);
    }

    #[test]
    fn nearest_hit_wins() {
        let surfaces = PlaneSet::new(vec![
            Plane::horizontal(Point3::new(0.0, 0.0, 0.0)),
            Plane::horizontal(Point3::new(0.0, 0.5, 0.0)),
        ]);
        let adapter = RaycastAdapter::default();
        let hit = adapter
            .query(&eye_level_camera(), &Projection::default(), &surfaces)
            .expect("hit");
        assert_relative_eq!(hit.position.y, 0.5, epsilon = 1e-6);
        assert_relative_eq!(hit.position.z, -0.5, epsilon = 1e-6);
    }

    #[test]
    fn hits_beyond_range_are_dropped() {
        let far_floor = PlaneSet::new(vec![Plane::horizontal(Point3::new(0.0, -20.0, 0.0))]);
        let adapter = RaycastAdapter::default();
        assert!(adapter
            .query(&eye_level_camera(), &Projection::default(), &far_floor)
            .is_none());
        assert!(adapter
            .query(&eye_level_camera(), &Projection::default(), &NoSurfaces)
            .is_none());
    }

    #[test]
    fn low_confidence_hit_is_unknown() {
        let floor = PlaneSet::new(vec![Plane::horizontal(Point3::origin()).with_confidence(0.2)]);
        let adapter = RaycastAdapter::default();
        let hit = adapter
            .query(&eye_level_camera(), &Projection::default(), &floor)
            .expect("degraded hit still reported");
        assert_eq!(hit.kind, SurfaceKind::Unknown);
    }

    #[test]
    fn hits_behind_camera_are_ignored() {
        let ray = Ray::new(Point3::origin(), Unit::new_unchecked(-Vector3::z()));
        let behind = SurfaceHit::new(Point3::new(0.0, 0.0, 1.0), Vector3::z(), SurfaceKind::Vertical);
        let ahead = SurfaceHit::new(Point3::new(0.0, 0.0, -3.0), Vector3::z(), SurfaceKind::Vertical);
        let hit = select_nearest(&ray, vec![behind, ahead], 10.0).expect("hit");
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-6);
    }
}
