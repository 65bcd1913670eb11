//! Frame-to-frame damping of the reticle pose.
//!
//! Rates are expressed per frame at `reference_rate` Hz and rescaled by the
//! measured frame interval, so the same session replayed at a different
//! frame rate converges over the same wall-clock time. Everything is a pure
//! function of the input sequence: replaying identical hits and timestamps
//! reproduces identical poses bit for bit.

use focus_reticle_core::{CameraPose, ReticlePose, SurfaceHit};
use nalgebra::{Rotation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How the reticle scale follows the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParams {
    /// Uniform scale at 0.7 m from the camera.
    pub base: f32,
    /// Grow with camera distance so the on-screen size stays comparable.
    pub with_distance: bool,
    /// Grow with the detected plane extent.
    pub fit_extent: bool,
    /// Plane size (shorter side, metres) that maps to a factor of 1.
    pub reference_extent: f32,
    pub max_extent_scale: f32,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            base: 1.0,
            with_distance: true,
            fit_extent: false,
            reference_extent: 0.2,
            max_extent_scale: 4.0,
        }
    }
}

/// Pose smoothing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Fraction of the remaining offset consumed per reference frame while locked.
    pub alpha_locked: f32,
    /// Same, while searching (degraded or not-yet-promoted hits).
    pub alpha_searching: f32,
    /// Frame rate the alphas are defined at, Hz.
    pub reference_rate: f32,
    /// Longer frame intervals are clamped to this, seconds.
    pub max_frame_interval: f64,
    /// Yaw the reticle so its `-Z` axis points away from the camera.
    pub face_camera: bool,
    pub scale: ScaleParams,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            alpha_locked: 0.8,
            alpha_searching: 0.35,
            reference_rate: 60.0,
            max_frame_interval: 0.25,
            face_camera: true,
            scale: ScaleParams::default(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SmoothingParamsError {
    #[error("`{name}` must lie in [0, 1], got {value}")]
    Alpha { name: &'static str, value: f32 },
    #[error("`reference_rate` must be positive and finite, got {0}")]
    ReferenceRate(f32),
    #[error("`max_frame_interval` must be non-negative, got {0}")]
    MaxFrameInterval(f64),
    #[error("scale `{name}` must be finite and positive, got {value}")]
    Scale { name: &'static str, value: f32 },
}

impl SmoothingParams {
    /// Reject values that would stall or corrupt the pose.
    pub fn validate(&self) -> Result<(), SmoothingParamsError> {
        for (name, value) in [
            ("alpha_locked", self.alpha_locked),
            ("alpha_searching", self.alpha_searching),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SmoothingParamsError::Alpha { name, value });
            }
        }
        if !(self.reference_rate.is_finite() && self.reference_rate > 0.0) {
            return Err(SmoothingParamsError::ReferenceRate(self.reference_rate));
        }
        // +inf is allowed and disables the clamp
        if self.max_frame_interval.is_nan() || self.max_frame_interval < 0.0 {
            return Err(SmoothingParamsError::MaxFrameInterval(
                self.max_frame_interval,
            ));
        }
        self.scale.validate()
    }
}

impl ScaleParams {
    fn validate(&self) -> Result<(), SmoothingParamsError> {
        if !(self.base.is_finite() && self.base > 0.0) {
            return Err(SmoothingParamsError::Scale {
                name: "base",
                value: self.base,
            });
        }
        if !(self.reference_extent.is_finite() && self.reference_extent >= 0.0) {
            return Err(SmoothingParamsError::Scale {
                name: "reference_extent",
                value: self.reference_extent,
            });
        }
        if !(self.max_extent_scale.is_finite() && self.max_extent_scale > 0.0) {
            return Err(SmoothingParamsError::Scale {
                name: "max_extent_scale",
                value: self.max_extent_scale,
            });
        }
        Ok(())
    }
}

/// Blend factor for one frame of length `dt` seconds.
///
/// `alpha` is the per-reference-frame rate; `dt == 0` gives `0`.
pub fn frame_blend(alpha: f32, dt: f64, reference_rate: f32) -> f32 {
    let alpha = f64::from(alpha.clamp(0.0, 1.0));
    let frames = dt.max(0.0) * f64::from(reference_rate);
    (1.0 - (1.0 - alpha).powf(frames)) as f32
}

/// On-screen size compensation for a reticle `distance` metres away.
pub fn distance_scale(distance: f32) -> f32 {
    if distance < 0.7 {
        distance / 0.7
    } else {
        0.25 * distance + 0.825
    }
}

/// Rotation placing local `+Y` along `normal`.
///
/// With `view` given, the reticle is also yawed about the normal so its
/// local `-Z` follows the view direction projected onto the surface.
pub fn surface_orientation(
    normal: &Unit<Vector3<f32>>,
    view: Option<&Vector3<f32>>,
) -> UnitQuaternion<f32> {
    let align = UnitQuaternion::rotation_between(&Vector3::y(), normal).unwrap_or_else(|| {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
    });
    let Some(view) = view else {
        return align;
    };

    let n = normal.into_inner();
    let projected = view - n * view.dot(&n);
    let Some(forward) = projected.try_normalize(1e-4) else {
        return align;
    };
    let z = -forward;
    let x = n.cross(&z).normalize();
    let basis = Rotation3::from_basis_unchecked(&[x, n, z]);
    UnitQuaternion::from_rotation_matrix(&basis)
}

/// Scale the reticle should settle at for `hit`.
pub fn target_scale(params: &ScaleParams, hit: &SurfaceHit, camera: &CameraPose) -> Vector3<f32> {
    let mut s = params.base;
    if params.with_distance {
        s *= distance_scale((hit.position - camera.position).norm());
    }
    if params.fit_extent && params.reference_extent > 0.0 {
        if let Some(extent) = hit.extent {
            let shorter = extent.x.min(extent.y);
            if shorter.is_finite() {
                let upper = params.max_extent_scale.max(1.0);
                s *= (shorter / params.reference_extent).clamp(1.0, upper);
            }
        }
    }
    Vector3::repeat(s)
}

/// Keeps the last applied pose and damps it toward each frame's target.
#[derive(Clone, Debug, Default)]
pub struct PoseSmoother {
    params: SmoothingParams,
    pose: ReticlePose,
    last_timestamp: Option<f64>,
}

impl PoseSmoother {
    pub fn new(params: SmoothingParams) -> Self {
        Self {
            params,
            pose: ReticlePose::default(),
            last_timestamp: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &SmoothingParams {
        &self.params
    }

    /// Last applied pose (copied out).
    #[inline]
    pub fn pose(&self) -> ReticlePose {
        self.pose
    }

    /// Back to the default pose with no frame history.
    pub fn reset(&mut self) {
        self.pose = ReticlePose::default();
        self.last_timestamp = None;
    }

    /// Seconds since the previous frame, never negative or NaN.
    fn frame_interval(&mut self, timestamp: f64) -> f64 {
        let rate = f64::from(self.params.reference_rate);
        let dt = match self.last_timestamp {
            None if rate.is_finite() && rate > 0.0 => rate.recip(),
            None => 0.0,
            Some(prev) => {
                let dt = timestamp - prev;
                if dt.is_nan() || dt <= 0.0 {
                    0.0
                } else {
                    dt.min(self.params.max_frame_interval.max(0.0))
                }
            }
        };
        self.last_timestamp = Some(timestamp);
        dt
    }

    /// Advance one frame. Returns `true` when the pose changed.
    ///
    /// Without a hit the pose is held as is. `locked` selects the locked
    /// rate over the searching rate.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, hit, camera)))]
    pub fn update(
        &mut self,
        hit: Option<&SurfaceHit>,
        locked: bool,
        camera: &CameraPose,
        timestamp: f64,
    ) -> bool {
        let dt = self.frame_interval(timestamp);
        let Some(hit) = hit else {
            return false;
        };

        let alpha = if locked {
            self.params.alpha_locked
        } else {
            self.params.alpha_searching
        };
        let t = frame_blend(alpha, dt, self.params.reference_rate);
        if t.is_nan() || t <= 0.0 {
            return false;
        }

        let view = camera.forward();
        let target_orientation = surface_orientation(
            &hit.unit_normal(),
            self.params.face_camera.then_some(&view),
        );
        let target_scale = target_scale(&self.params.scale, hit, camera);

        let prev = self.pose;
        let position = prev.position + (hit.position - prev.position) * t;
        let orientation = prev
            .orientation
            .try_slerp(&target_orientation, t, 1e-6)
            .unwrap_or(target_orientation);
        let scale = prev.scale + (target_scale - prev.scale) * t;

        self.pose = ReticlePose {
            position,
            orientation,
            scale,
        };
        self.pose != prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use focus_reticle_core::SurfaceKind;
    use nalgebra::Point3;

    fn floor_hit(x: f32, z: f32) -> SurfaceHit {
        SurfaceHit::new(Point3::new(x, 0.0, z), Vector3::y(), SurfaceKind::Horizontal)
    }

    #[test]
    fn blend_is_zero_for_zero_interval() {
        assert_eq!(frame_blend(0.8, 0.0, 60.0), 0.0);
        assert_relative_eq!(frame_blend(0.8, 1.0 / 60.0, 60.0), 0.8, epsilon = 1e-5);
        assert_relative_eq!(frame_blend(0.8, 2.0 / 60.0, 60.0), 0.96, epsilon = 1e-5);
    }

    #[test]
    fn default_params_validate() {
        assert_eq!(SmoothingParams::default().validate(), Ok(()));
        let unclamped = SmoothingParams {
            max_frame_interval: f64::INFINITY,
            ..SmoothingParams::default()
        };
        assert_eq!(unclamped.validate(), Ok(()));
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        let base = SmoothingParams::default;
        assert_eq!(
            SmoothingParams {
                max_frame_interval: -1.0,
                ..base()
            }
            .validate(),
            Err(SmoothingParamsError::MaxFrameInterval(-1.0))
        );
        assert!(matches!(
            SmoothingParams {
                max_frame_interval: f64::NAN,
                ..base()
            }
            .validate(),
            Err(SmoothingParamsError::MaxFrameInterval(_))
        ));
        assert_eq!(
            SmoothingParams {
                reference_rate: 0.0,
                ..base()
            }
            .validate(),
            Err(SmoothingParamsError::ReferenceRate(0.0))
        );
        assert_eq!(
            SmoothingParams {
                alpha_locked: 1.5,
                ..base()
            }
            .validate(),
            Err(SmoothingParamsError::Alpha {
                name: "alpha_locked",
                value: 1.5
            })
        );
        let scale = ScaleParams {
            base: 0.0,
            ..ScaleParams::default()
        };
        assert!(matches!(
            SmoothingParams { scale, ..base() }.validate(),
            Err(SmoothingParamsError::Scale { name: "base", .. })
        ));
    }

    #[test]
    fn bad_intervals_never_panic_or_poison_the_pose() {
        let cam = CameraPose::default();
        let hit = floor_hit(0.0, -1.0);
        for params in [
            SmoothingParams {
                max_frame_interval: -1.0,
                ..SmoothingParams::default()
            },
            SmoothingParams {
                max_frame_interval: f64::NAN,
                ..SmoothingParams::default()
            },
            SmoothingParams {
                reference_rate: 0.0,
                ..SmoothingParams::default()
            },
        ] {
            let mut smoother = PoseSmoother::new(params);
            for i in 0..5 {
                smoother.update(Some(&hit), true, &cam, i as f64 / 60.0);
            }
            let p = smoother.pose().position;
            assert!(p.coords.iter().all(|v| v.is_finite()), "{p:?}");
        }
    }

    #[test]
    fn distance_scale_is_continuous() {
        assert_relative_eq!(distance_scale(0.7), 1.0, epsilon = 1e-6);
        assert_relative_eq!(distance_scale(0.6999), 1.0, epsilon = 1e-3);
        assert_relative_eq!(distance_scale(0.35), 0.5, epsilon = 1e-6);
        assert_relative_eq!(distance_scale(3.0), 1.575, epsilon = 1e-6);
    }

    #[test]
    fn converges_monotonically() {
        let mut smoother = PoseSmoother::new(SmoothingParams::default());
        let hit = floor_hit(0.0, -1.0);
        let cam = CameraPose::default();
        let mut prev = (smoother.pose().position - hit.position).norm();
        let mut settled_at = None;
        for frame in 0..30 {
            smoother.update(Some(&hit), true, &cam, frame as f64 / 60.0);
            let dist = (smoother.pose().position - hit.position).norm();
            if settled_at.is_none() {
                assert!(dist < prev, "frame {frame}: {dist} !< {prev}");
                if dist < 1e-4 {
                    settled_at = Some(frame);
                }
            }
            prev = dist;
        }
        assert!(settled_at.is_some());
    }

    #[test]
    fn holds_pose_without_hit() {
        let mut smoother = PoseSmoother::new(SmoothingParams::default());
        let cam = CameraPose::default();
        smoother.update(Some(&floor_hit(0.3, -1.0)), true, &cam, 0.0);
        let held = smoother.pose();
        for i in 1..10 {
            assert!(!smoother.update(None, false, &cam, i as f64 / 60.0));
            assert_eq!(smoother.pose(), held);
        }
    }

    #[test]
    fn repeated_timestamp_does_not_move() {
        let mut smoother = PoseSmoother::new(SmoothingParams::default());
        let cam = CameraPose::default();
        let hit = floor_hit(0.0, -1.0);
        smoother.update(Some(&hit), true, &cam, 0.5);
        let first = smoother.pose();
        assert!(!smoother.update(Some(&hit), true, &cam, 0.5));
        assert_eq!(smoother.pose(), first);
    }

    #[test]
    fn searching_is_slower_than_locked() {
        let cam = CameraPose::default();
        let hit = floor_hit(0.0, -1.0);
        let mut locked = PoseSmoother::new(SmoothingParams::default());
        let mut searching = PoseSmoother::new(SmoothingParams::default());
        locked.update(Some(&hit), true, &cam, 0.0);
        searching.update(Some(&hit), false, &cam, 0.0);
        let d_locked = (locked.pose().position - hit.position).norm();
        let d_search = (searching.pose().position - hit.position).norm();
        assert!(d_locked < d_search);
    }

    #[test]
    fn identical_inputs_reproduce_identical_poses() {
        let cam = CameraPose::looking_at(
            Point3::new(0.0, 1.4, 0.2),
            Point3::new(0.1, 0.0, -1.0),
            Vector3::y(),
        );
        let hits = [
            None,
            Some(floor_hit(0.1, -1.0)),
            Some(floor_hit(0.12, -1.05)),
            None,
            Some(floor_hit(0.4, -0.8)),
        ];
        let run = || {
            let mut smoother = PoseSmoother::new(SmoothingParams::default());
            hits.iter()
                .enumerate()
                .map(|(i, h)| {
                    smoother.update(h.as_ref(), i > 1, &cam, i as f64 / 30.0);
                    smoother.pose()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn orientation_follows_wall_normal() {
        let normal = Vector3::z_axis();
        let q = surface_orientation(&normal, None);
        assert_relative_eq!(q * Vector3::y(), Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn orientation_faces_away_from_camera() {
        let view = Vector3::new(1.0, -1.0, 0.0);
        let q = surface_orientation(&Vector3::y_axis(), Some(&view));
        assert_relative_eq!(q * Vector3::y(), Vector3::y(), epsilon = 1e-6);
        assert_relative_eq!(q * -Vector3::z(), Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn scale_grows_toward_larger_plane() {
        let params = SmoothingParams {
            scale: ScaleParams {
                with_distance: false,
                fit_extent: true,
                ..ScaleParams::default()
            },
            ..SmoothingParams::default()
        };
        let mut smoother = PoseSmoother::new(params);
        let cam = CameraPose::default();
        let small = floor_hit(0.0, -1.0).with_extent(0.2, 0.2);
        for i in 0..20 {
            smoother.update(Some(&small), true, &cam, i as f64 / 60.0);
        }
        assert_relative_eq!(smoother.pose().scale.x, 1.0, epsilon = 1e-5);

        let grown = floor_hit(0.0, -1.0).with_extent(0.8, 0.6);
        smoother.update(Some(&grown), true, &cam, 20.0 / 60.0);
        let s = smoother.pose().scale.x;
        assert!(s > 1.0 && s < 3.0, "scale should animate, got {s}");
        for i in 21..60 {
            smoother.update(Some(&grown), true, &cam, i as f64 / 60.0);
        }
        assert_relative_eq!(smoother.pose().scale.x, 3.0, epsilon = 1e-4);
    }
}
