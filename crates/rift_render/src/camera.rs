use glam::{Mat4, Quat, Vec3};
use rift_shared::pose::Pose;

/// A camera derived per recursion level. The root camera is built from a
/// pose; cameras seen through portals carry an explicit view-matrix
/// override computed by the portal camera builder.
#[derive(Debug, Clone)]
pub struct VirtualCamera {
    pub pose: Pose,
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    view_override: Option<Mat4>,
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self {
            pose: Pose::from_position(Vec3::new(0.0, 1.6, 5.0)),
            fovy: 70.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            view_override: None,
        }
    }
}

impl VirtualCamera {
    pub fn new(pose: Pose, fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            pose,
            fovy,
            aspect,
            near,
            far,
            view_override: None,
        }
    }

    /// Replaces the pose-derived view matrix. The pose is rebuilt from the
    /// matrix so eye queries stay consistent with what will be rendered.
    pub fn set_view_matrix(&mut self, view: Mat4) {
        let inverse = view.inverse();
        self.pose.position = inverse.w_axis.truncate();
        self.pose.orientation = Quat::from_mat4(&inverse);
        self.pose.scale = Vec3::ONE;
        self.view_override = Some(view);
    }

    pub fn with_view_matrix(mut self, view: Mat4) -> Self {
        self.set_view_matrix(view);
        self
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy,
            self.aspect.max(0.0001),
            self.near.max(0.0001),
            self.far.max(self.near + 0.0001),
        )
    }

    pub fn view(&self) -> Mat4 {
        match self.view_override {
            Some(view) => view,
            None => Mat4::from_rotation_translation(self.pose.orientation, self.pose.position)
                .inverse(),
        }
    }

    pub fn inverse_view(&self) -> Mat4 {
        self.view().inverse()
    }

    pub fn eye_position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn eye_orientation(&self) -> Quat {
        self.pose.orientation
    }
}
