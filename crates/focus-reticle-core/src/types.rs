use nalgebra::{Point3, Unit, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Classification of the surface under a ray.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Horizontal,
    Vertical,
    /// Extrapolated or low-confidence estimate.
    #[default]
    Unknown,
}

impl SurfaceKind {
    /// `true` for surfaces the reticle may lock onto.
    #[inline]
    pub fn is_known(self) -> bool {
        !matches!(self, SurfaceKind::Unknown)
    }
}

fn default_confidence() -> f32 {
    1.0
}

/// A single ray-surface intersection for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub kind: SurfaceKind,
    /// Distance from the ray origin along the ray direction.
    #[serde(default)]
    pub distance: f32,
    /// Host-reported estimate quality in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// Width/depth of the detected plane, when the host knows it.
    #[serde(default)]
    pub extent: Option<Vector2<f32>>,
}

impl SurfaceHit {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, kind: SurfaceKind) -> Self {
        Self {
            position,
            normal,
            kind,
            distance: 0.0,
            confidence: 1.0,
            extent: None,
        }
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_extent(mut self, width: f32, depth: f32) -> Self {
        self.extent = Some(Vector2::new(width, depth));
        self
    }

    /// Normalized surface normal; degenerate normals fall back to `+Y`.
    pub fn unit_normal(&self) -> Unit<Vector3<f32>> {
        Unit::try_new(self.normal, 1e-6).unwrap_or_else(Vector3::y_axis)
    }
}

/// Authoritative tracking state of the reticle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// No real surface has been seen yet.
    #[default]
    Initializing,
    /// Locked onto a horizontal or vertical surface.
    OnSurface,
    /// A surface was seen before but is not under the ray now.
    OffSurface,
}

impl TrackingState {
    #[inline]
    pub fn is_on_surface(self) -> bool {
        matches!(self, TrackingState::OnSurface)
    }
}

/// Smoothed transform applied to the rendered reticle node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReticlePose {
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl ReticlePose {
    pub fn new(
        position: Point3<f32>,
        orientation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            position,
            orientation,
            scale,
        }
    }

    pub fn from_position(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for ReticlePose {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }
}

/// Camera pose supplied by the host every frame.
///
/// The camera looks down its local `-Z` axis with `+Y` up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl CameraPose {
    pub fn new(position: Point3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Camera at `eye` looking at `target`.
    ///
    /// When `up` is parallel to the view direction, world `-Z` (or `+Y` for
    /// a view along Z) is used instead. Coincident points give the identity
    /// orientation.
    pub fn looking_at(eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Self {
        let Some(forward) = (target - eye).try_normalize(1e-6) else {
            return Self::new(eye, UnitQuaternion::identity());
        };
        let up = [up, -Vector3::z(), Vector3::y()]
            .into_iter()
            .find(|u| forward.cross(u).norm() > 1e-4 * u.norm())
            .unwrap_or_else(Vector3::y);
        Self {
            position: eye,
            orientation: UnitQuaternion::face_towards(&-forward, &up),
        }
    }

    /// Unit view direction in world space.
    pub fn forward(&self) -> Vector3<f32> {
        self.orientation * -Vector3::z()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.orientation * Vector3::y()
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// Pinhole projection used to turn viewport points into rays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Vertical field of view, radians.
    pub vertical_fov: f32,
    /// Viewport width divided by height.
    pub aspect_ratio: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            vertical_fov: std::f32::consts::FRAC_PI_3,
            aspect_ratio: 0.75,
        }
    }
}

/// World-space ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Unit<Vector3<f32>>) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.into_inner() * t
    }

    /// Signed distance of `p` projected onto the ray.
    #[inline]
    pub fn depth_of(&self, p: &Point3<f32>) -> f32 {
        (p - self.origin).dot(&*self.direction)
    }
}
