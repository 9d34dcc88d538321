//! Minimal vector / rotation math for the turn-to task.
//!
//! Angles are in degrees. Only what the tasks need is here; the host owns
//! real transforms.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Wrap an angle into (-180, 180].
pub fn normalize_axis(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn from_yaw(yaw: f32) -> Self {
        Self::new(0.0, yaw, 0.0)
    }

    /// Rotation that looks along `direction`. Roll is always zero.
    pub fn look_along(direction: Vec3) -> Self {
        if direction.length_squared() <= f32::EPSILON {
            return Rotator::ZERO;
        }
        let yaw = direction.y.atan2(direction.x).to_degrees();
        let planar = (direction.x * direction.x + direction.y * direction.y).sqrt();
        let pitch = direction.z.atan2(planar).to_degrees();
        Rotator::new(pitch, yaw, 0.0)
    }

    pub fn normalized(self) -> Self {
        Rotator::new(
            normalize_axis(self.pitch),
            normalize_axis(self.yaw),
            normalize_axis(self.roll),
        )
    }

    pub fn add(self, other: Rotator) -> Self {
        Rotator::new(
            self.pitch + other.pitch,
            self.yaw + other.yaw,
            self.roll + other.roll,
        )
    }

    /// Signed yaw change (shortest way round) to reach `target`.
    pub fn delta_yaw_to(self, target: Rotator) -> f32 {
        normalize_axis(target.yaw - self.yaw)
    }

    /// Shortest-path interpolation; `alpha` is clamped to [0, 1].
    pub fn lerp_to(self, target: Rotator, alpha: f32) -> Rotator {
        let a = alpha.clamp(0.0, 1.0);
        Rotator::new(
            self.pitch + normalize_axis(target.pitch - self.pitch) * a,
            self.yaw + normalize_axis(target.yaw - self.yaw) * a,
            self.roll + normalize_axis(target.roll - self.roll) * a,
        )
        .normalized()
    }

    pub fn approx_eq(self, other: Rotator, tolerance: f32) -> bool {
        normalize_axis(self.pitch - other.pitch).abs() <= tolerance
            && normalize_axis(self.yaw - other.yaw).abs() <= tolerance
            && normalize_axis(self.roll - other.roll).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::inside(90.0, 90.0)]
    #[case::wrap_positive(270.0, -90.0)]
    #[case::wrap_negative(-270.0, 90.0)]
    #[case::half_turn(-180.0, 180.0)]
    fn normalize_axis_wraps(#[case] input: f32, #[case] expected: f32) {
        assert!((normalize_axis(input) - expected).abs() < 1e-4);
    }

    #[test]
    fn lerp_takes_shortest_path() {
        let from = Rotator::from_yaw(170.0);
        let to = Rotator::from_yaw(-170.0);
        let mid = from.lerp_to(to, 0.5);
        assert!((mid.yaw.abs() - 180.0).abs() < 1e-3);
        assert!((from.delta_yaw_to(to) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn look_along_axes() {
        let r = Rotator::look_along(Vec3::new(0.0, 1.0, 0.0));
        assert!((r.yaw - 90.0).abs() < 1e-4);
        assert_eq!(Rotator::look_along(Vec3::ZERO), Rotator::ZERO);
    }
}
