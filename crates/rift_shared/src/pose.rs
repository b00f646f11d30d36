use glam::{Mat4, Quat, Vec3};

/// Position, orientation, and scale of an entity in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Pose {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            scale: Vec3::ONE,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::{Quat, Vec3};

    use super::Pose;

    #[test]
    fn model_matrix_places_origin_at_position() {
        let pose = Pose::from_position(Vec3::new(1.0, 2.0, 3.0));
        let mapped = pose.model_matrix().transform_point3(Vec3::ZERO);
        assert!(mapped.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn model_matrix_rotates_before_translating() {
        let pose = Pose::new(
            Vec3::new(5.0, 0.0, 0.0),
            Quat::from_rotation_y(FRAC_PI_2),
        );
        let mapped = pose.model_matrix().transform_point3(Vec3::new(0.0, 0.0, -1.0));
        assert!(mapped.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn scale_applies_in_local_space() {
        let pose = Pose::from_position(Vec3::new(0.0, 1.0, 0.0)).with_scale(Vec3::new(2.0, 1.0, 1.0));
        let mapped = pose.model_matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(mapped.abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-6));
    }
}
