use std::cell::Cell;
use std::sync::Arc;

use glam::Mat4;
use rift_shared::mesh::Mesh;

use crate::camera::VirtualCamera;

/// Snapshot of one portal being looked through, taken at push time. The
/// silhouette mesh and transform feed the stencil intersection test and the
/// depth-only portal pass.
#[derive(Debug, Clone)]
pub struct ActivePortalRecord {
    pub mesh: Arc<Mesh>,
    pub transform: Mat4,
}

/// Per-frame traversal state: parallel stacks of projection, view, and
/// inverse-view matrices plus the chain of portals currently being rendered
/// through. Entry 0 of the matrix stacks is the root camera; entry i (i >= 1)
/// is the camera as seen through the first i active portals, so the matrix
/// stacks stay exactly one longer than the portal chain at every stable
/// point. Owned by the renderer and reset at the start of every frame.
#[derive(Debug)]
pub struct RenderContext {
    proj_stack: Vec<Mat4>,
    view_stack: Vec<Mat4>,
    inv_view_stack: Vec<Mat4>,
    active_portals: Vec<ActivePortalRecord>,
    max_depth: usize,
    time_s: f32,
    proj_dirty: Cell<bool>,
    view_dirty: Cell<bool>,
}

impl RenderContext {
    pub fn new(max_depth: usize) -> Self {
        Self {
            proj_stack: Vec::new(),
            view_stack: Vec::new(),
            inv_view_stack: Vec::new(),
            active_portals: Vec::new(),
            max_depth,
            time_s: 0.0,
            proj_dirty: Cell::new(true),
            view_dirty: Cell::new(true),
        }
    }

    pub fn reset(&mut self, camera: &VirtualCamera, time_s: f32) {
        self.proj_stack.clear();
        self.view_stack.clear();
        self.inv_view_stack.clear();
        self.active_portals.clear();
        self.proj_stack.push(camera.projection());
        self.view_stack.push(camera.view());
        self.inv_view_stack.push(camera.inverse_view());
        self.time_s = time_s;
        self.proj_dirty.set(true);
        self.view_dirty.set(true);
    }

    /// Pushes a derived camera for one nesting level deeper.
    pub fn push_camera(&mut self, camera: &VirtualCamera) {
        self.proj_stack.push(camera.projection());
        self.view_stack.push(camera.view());
        self.inv_view_stack.push(camera.inverse_view());
        self.proj_dirty.set(true);
        self.view_dirty.set(true);
    }

    /// Pushes a bare view matrix, duplicating the current projection. Used
    /// by the stencil pass to re-render ancestor silhouettes under the view
    /// they were originally seen from.
    pub fn push_view(&mut self, view: Mat4) {
        let proj = *self.current_proj();
        self.proj_stack.push(proj);
        self.view_stack.push(view);
        self.inv_view_stack.push(view.inverse());
        self.proj_dirty.set(true);
        self.view_dirty.set(true);
    }

    pub fn pop_view(&mut self) {
        assert!(self.view_stack.len() > 1, "view stack underflow");
        self.proj_stack.pop();
        self.view_stack.pop();
        self.inv_view_stack.pop();
        self.proj_dirty.set(true);
        self.view_dirty.set(true);
    }

    pub fn push_portal(&mut self, record: ActivePortalRecord) {
        self.active_portals.push(record);
    }

    pub fn pop_portal(&mut self) {
        self.active_portals
            .pop()
            .expect("active portal stack underflow");
    }

    pub fn current_proj(&self) -> &Mat4 {
        self.proj_stack
            .last()
            .expect("render context used before reset")
    }

    pub fn current_view(&self) -> &Mat4 {
        self.view_stack
            .last()
            .expect("render context used before reset")
    }

    pub fn current_inv_view(&self) -> &Mat4 {
        self.inv_view_stack
            .last()
            .expect("render context used before reset")
    }

    pub fn view_at(&self, level: usize) -> &Mat4 {
        &self.view_stack[level]
    }

    pub fn proj_at(&self, level: usize) -> &Mat4 {
        &self.proj_stack[level]
    }

    /// `None` means the walk is at the root level, outside any portal.
    pub fn current_portal(&self) -> Option<&ActivePortalRecord> {
        self.active_portals.last()
    }

    pub fn portal_chain(&self) -> &[ActivePortalRecord] {
        &self.active_portals
    }

    /// Number of portals between the root camera and the current level.
    pub fn depth(&self) -> usize {
        self.active_portals.len()
    }

    pub fn view_depth(&self) -> usize {
        self.view_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn time_seconds(&self) -> f32 {
        self.time_s
    }

    pub fn consume_proj_dirty(&self) -> bool {
        self.proj_dirty.replace(false)
    }

    pub fn consume_view_dirty(&self) -> bool {
        self.view_dirty.replace(false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Mat4;
    use rift_shared::mesh::Mesh;

    use crate::camera::VirtualCamera;

    use super::{ActivePortalRecord, RenderContext};

    fn fresh_context() -> RenderContext {
        let mut ctx = RenderContext::new(4);
        ctx.reset(&VirtualCamera::default(), 0.0);
        ctx
    }

    fn record() -> ActivePortalRecord {
        ActivePortalRecord {
            mesh: Arc::new(Mesh::unit_quad()),
            transform: Mat4::IDENTITY,
        }
    }

    #[test]
    fn reset_leaves_the_root_level_only() {
        let ctx = fresh_context();
        assert_eq!(ctx.view_depth(), 1);
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.current_portal().is_none());
    }

    #[test]
    fn push_and_pop_restore_stack_lengths() {
        let mut ctx = fresh_context();
        let camera = VirtualCamera::default();
        ctx.push_portal(record());
        ctx.push_camera(&camera);
        assert_eq!(ctx.view_depth(), 2);
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.current_portal().is_some());
        ctx.pop_view();
        ctx.pop_portal();
        assert_eq!(ctx.view_depth(), 1);
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn push_view_duplicates_the_projection() {
        let mut ctx = fresh_context();
        let proj = *ctx.current_proj();
        ctx.push_view(Mat4::from_translation(glam::Vec3::new(0.0, 0.0, -1.0)));
        assert!(ctx.current_proj().abs_diff_eq(proj, 1e-6));
        ctx.pop_view();
    }

    #[test]
    fn dirty_flags_set_on_push_and_consumed_once() {
        let ctx = fresh_context();
        assert!(ctx.consume_proj_dirty());
        assert!(!ctx.consume_proj_dirty());
        assert!(ctx.consume_view_dirty());
        assert!(!ctx.consume_view_dirty());
    }

    #[test]
    #[should_panic(expected = "view stack underflow")]
    fn popping_the_root_view_is_fatal() {
        let mut ctx = fresh_context();
        ctx.pop_view();
    }

    #[test]
    #[should_panic(expected = "active portal stack underflow")]
    fn popping_an_empty_portal_chain_is_fatal() {
        let mut ctx = fresh_context();
        ctx.pop_portal();
    }
}
