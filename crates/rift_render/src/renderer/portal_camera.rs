use std::f32::consts::PI;

use glam::Mat4;
use rift_shared::pose::Pose;

use crate::camera::VirtualCamera;

/// Derives the camera seen through a portal: the outer view is carried into
/// the destination frame, flipped half a turn about the up axis because the
/// two portal faces are mirror-oriented. Field of view and aspect must match
/// the viewer's real optics, so they are copied unchanged. The near plane is
/// pushed out to the portal's distance from the eye so geometry between the
/// destination frame and its virtual near plane cannot leak into the view.
pub fn build_portal_camera(
    outer: &VirtualCamera,
    portal: &Pose,
    destination: &Pose,
) -> VirtualCamera {
    let rotate_180 = Mat4::from_rotation_y(PI);
    let dest_view = outer.view()
        * Mat4::from_rotation_translation(portal.orientation, portal.position)
        * rotate_180
        * Mat4::from_rotation_translation(destination.orientation, destination.position).inverse();

    let near = (portal.position - outer.eye_position()).length();

    VirtualCamera::new(Pose::default(), outer.fovy, outer.aspect, near, outer.far)
        .with_view_matrix(dest_view)
}
