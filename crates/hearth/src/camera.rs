//! # Camera Poses
//!
//! Location plus Euler rotation in degrees, with the camera looking down its
//! local -Z axis. Rotation is applied X first, then Z.

use hearth_state::BoundingBox;
use serde::{Deserialize, Serialize};

/// Half of the camera's view cone, in degrees.
pub const HALF_FOV_DEG: f64 = 19.8;

/// Number of distances tried by `topview_pose`.
const DISTANCE_SAMPLES: usize = 500;

/// A camera placement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// World position.
    pub location: [f64; 3],
    /// Euler rotation (X, Y, Z) in degrees.
    pub rotation_deg: [f64; 3],
}

impl CameraPose {
    /// Unit view direction.
    #[must_use]
    pub fn forward(&self) -> [f64; 3] {
        let a = self.rotation_deg[0].to_radians();
        let b = self.rotation_deg[2].to_radians();
        [-a.sin() * b.sin(), a.sin() * b.cos(), -a.cos()]
    }

    /// Returns true if `point` lies inside the view cone.
    #[must_use]
    pub fn sees(&self, point: [f64; 3]) -> bool {
        let f = self.forward();
        let v = [
            point[0] - self.location[0],
            point[1] - self.location[1],
            point[2] - self.location[2],
        ];
        let depth = v[0] * f[0] + v[1] * f[1] + v[2] * f[2];
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        depth > 0.0 && depth / len >= HALF_FOV_DEG.to_radians().cos()
    }
}

/// Corners of a box.
#[must_use]
pub fn corners(b: &BoundingBox) -> [[f64; 3]; 8] {
    let mut out = [[0.0; 3]; 8];
    for (i, corner) in out.iter_mut().enumerate() {
        *corner = [
            if i & 1 == 0 { b.min[0] } else { b.max[0] },
            if i & 2 == 0 { b.min[1] } else { b.max[1] },
            if i & 4 == 0 { b.min[2] } else { b.max[2] },
        ];
    }
    out
}

/// Pose looking at the centre of `bbox` from the nearest distance at which
/// the whole box is in view.
///
/// Distances are sampled as `exp(t)` for `t` evenly spaced over `[1, 5]`;
/// if none fits, the farthest is used.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn topview_pose(bbox: &BoundingBox, rot_x_deg: f64, rot_z_deg: f64) -> CameraPose {
    let center = bbox.center();
    let mut pose = CameraPose {
        location: center,
        rotation_deg: [rot_x_deg, 0.0, rot_z_deg],
    };
    let f = pose.forward();
    let points = corners(bbox);

    for i in 0..DISTANCE_SAMPLES {
        let t = 1.0 + 4.0 * i as f64 / (DISTANCE_SAMPLES - 1) as f64;
        let d = t.exp();
        pose.location = [center[0] - d * f[0], center[1] - d * f[1], center[2] - d * f[2]];
        if points.iter().all(|p| pose.sees(*p)) {
            break;
        }
    }
    pose
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_down() {
        let pose = CameraPose {
            location: [0.0, 0.0, 10.0],
            rotation_deg: [0.0; 3],
        };
        let f = pose.forward();
        assert!((f[2] + 1.0).abs() < 1e-9);
        assert!(pose.sees([0.0, 0.0, 0.0]));
        assert!(!pose.sees([0.0, 0.0, 20.0]));
    }

    #[test]
    fn test_topview_frames_whole_box() {
        let house = BoundingBox::new([0.0, 0.0, 0.0], [12.0, 5.0, 2.8]);
        let pose = topview_pose(&house, 30.0, 45.0);
        assert!(corners(&house).iter().all(|p| pose.sees(*p)));
        assert!(pose.location[2] > house.max[2]);
    }

    #[test]
    fn test_topview_picks_nearest_fit() {
        let small = BoundingBox::new([0.0; 3], [1.0, 1.0, 1.0]);
        let large = BoundingBox::new([0.0; 3], [20.0, 20.0, 1.0]);
        let a = topview_pose(&small, 0.0, 0.0);
        let b = topview_pose(&large, 0.0, 0.0);
        assert!(a.location[2] < b.location[2]);
    }
}
