//! Surface model seam and a plane-set reference implementation.

use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::{Ray, SurfaceHit, SurfaceKind};

/// Host-owned live surface representation.
pub trait SurfaceModel {
    /// Every intersection of `ray` with the host's surfaces, in any order.
    fn raycast(&self, ray: &Ray) -> Vec<SurfaceHit>;
}

impl<T: SurfaceModel + ?Sized> SurfaceModel for &T {
    fn raycast(&self, ray: &Ray) -> Vec<SurfaceHit> {
        (**self).raycast(ray)
    }
}

/// Surface model with nothing in it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSurfaces;

impl SurfaceModel for NoSurfaces {
    fn raycast(&self, _ray: &Ray) -> Vec<SurfaceHit> {
        Vec::new()
    }
}

fn default_confidence() -> f32 {
    1.0
}

/// A detected (or estimated) plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub center: Point3<f32>,
    pub normal: Vector3<f32>,
    pub kind: SurfaceKind,
    /// Width/depth along the plane's local X/Z axes; `None` means unbounded.
    #[serde(default)]
    pub extent: Option<Vector2<f32>>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl Plane {
    pub fn new(center: Point3<f32>, normal: Vector3<f32>, kind: SurfaceKind) -> Self {
        Self {
            center,
            normal,
            kind,
            extent: None,
            confidence: 1.0,
        }
    }

    /// Horizontal plane (floor/table) at height `y`.
    pub fn horizontal(center: Point3<f32>) -> Self {
        Self::new(center, Vector3::y(), SurfaceKind::Horizontal)
    }

    /// Vertical plane (wall) facing `normal`.
    pub fn vertical(center: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self::new(center, normal, SurfaceKind::Vertical)
    }

    pub fn with_extent(mut self, width: f32, depth: f32) -> Self {
        self.extent = Some(Vector2::new(width, depth));
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Rotation taking local `+Y` to the plane normal.
    fn local_frame(&self, normal: &Vector3<f32>) -> UnitQuaternion<f32> {
        UnitQuaternion::rotation_between(&Vector3::y(), normal).unwrap_or_else(|| {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
        })
    }

    /// Intersect `ray` with this plane, honoring its extent.
    pub fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let normal = self.normal.try_normalize(1e-6)?;
        let denom = normal.dot(&*ray.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = normal.dot(&(self.center - ray.origin)) / denom;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        let position = ray.point_at(t);

        if let Some(extent) = self.extent {
            let frame = self.local_frame(&normal);
            let local = frame.inverse() * (position - self.center);
            if local.x.abs() > extent.x * 0.5 || local.z.abs() > extent.y * 0.5 {
                return None;
            }
        }

        Some(SurfaceHit {
            position,
            normal,
            kind: self.kind,
            distance: t,
            confidence: self.confidence,
            extent: self.extent,
        })
    }
}

/// In-memory surface model made of planes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneSet {
    planes: Vec<Plane>,
}

impl PlaneSet {
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    pub fn push(&mut self, plane: Plane) {
        self.planes.push(plane);
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [Plane] {
        &mut self.planes
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}

impl FromIterator<Plane> for PlaneSet {
    fn from_iter<I: IntoIterator<Item = Plane>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl SurfaceModel for PlaneSet {
    fn raycast(&self, ray: &Ray) -> Vec<SurfaceHit> {
        self.planes.iter().filter_map(|p| p.intersect(ray)).collect()
    }
}
