pub mod soft;

use std::ops::{Deref, DerefMut};

use bitflags::bitflags;
use glam::Mat4;
use rift_shared::mesh::Mesh;
use rift_shared::rect::ScreenRect;

use crate::assets::{Material, Shader};
use crate::context::RenderContext;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearTarget: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Comparison applied to the stored stencil value against `reference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilFunc {
    Never,
    Always,
    Equal,
    AtLeast,
}

/// Saturating 8-bit stencil update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Incr,
    Decr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilMode {
    pub func: StencilFunc,
    pub reference: u8,
    /// Applied where the stencil test fails.
    pub fail_op: StencilOp,
    /// Applied where the stencil test passes.
    pub pass_op: StencilOp,
}

impl StencilMode {
    /// Marks every covered pixel, regardless of the stored value.
    pub fn write_everywhere() -> Self {
        Self {
            func: StencilFunc::Never,
            reference: 0,
            fail_op: StencilOp::Incr,
            pass_op: StencilOp::Keep,
        }
    }

    /// Raises covered pixels that are already marked; untouched pixels stay.
    pub fn raise_marked() -> Self {
        Self {
            func: StencilFunc::Equal,
            reference: 0,
            fail_op: StencilOp::Incr,
            pass_op: StencilOp::Keep,
        }
    }

    /// Lowers every covered pixel, saturating at zero.
    pub fn lower_everywhere() -> Self {
        Self {
            func: StencilFunc::Never,
            reference: 0,
            fail_op: StencilOp::Decr,
            pass_op: StencilOp::Keep,
        }
    }

    /// Non-mutating test passing only inside the finished mask.
    pub fn pass_inside_mask() -> Self {
        Self {
            func: StencilFunc::AtLeast,
            reference: 1,
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
        }
    }

    pub fn mutates(&self) -> bool {
        self.fail_op != StencilOp::Keep || self.pass_op != StencilOp::Keep
    }
}

/// Ambient draw state every recursion level mutates and must hand back
/// unchanged to its caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub color_write: bool,
    pub depth_write: bool,
    pub stencil: Option<StencilMode>,
    pub scissor: ScreenRect,
}

/// The external graphics machine: one mutable state record plus a draw
/// submission sink. Draw calls read the context's current top-of-stack
/// view and projection; a `None` material selects a flat untextured fill.
pub trait Device {
    fn viewport_size(&self) -> (u32, u32);

    fn color_write(&self) -> bool;
    fn set_color_write(&mut self, enabled: bool);

    fn depth_write(&self) -> bool;
    fn set_depth_write(&mut self, enabled: bool);

    fn stencil_mode(&self) -> Option<StencilMode>;
    fn set_stencil_mode(&mut self, mode: Option<StencilMode>);

    fn scissor(&self) -> ScreenRect;
    fn set_scissor(&mut self, rect: ScreenRect);

    /// Clears the selected buffers within the current scissor rectangle.
    fn clear(&mut self, targets: ClearTarget);

    fn draw_mesh(
        &mut self,
        ctx: &RenderContext,
        shader: &Shader,
        model: Mat4,
        mesh: &Mesh,
        material: Option<&Material>,
    );

    fn draw_state(&self) -> DrawState {
        DrawState {
            color_write: self.color_write(),
            depth_write: self.depth_write(),
            stencil: self.stencil_mode(),
            scissor: self.scissor(),
        }
    }

    fn restore_state(&mut self, state: DrawState) {
        self.set_color_write(state.color_write);
        self.set_depth_write(state.depth_write);
        self.set_stencil_mode(state.stencil);
        self.set_scissor(state.scissor);
    }
}

/// Scoped save of the full draw state; the captured state is put back when
/// the scope drops, on every exit path.
pub struct StateScope<'a, D: Device + ?Sized> {
    device: &'a mut D,
    saved: DrawState,
}

impl<'a, D: Device + ?Sized> StateScope<'a, D> {
    pub fn capture(device: &'a mut D) -> Self {
        let saved = device.draw_state();
        Self { device, saved }
    }
}

impl<D: Device + ?Sized> Drop for StateScope<'_, D> {
    fn drop(&mut self) {
        let saved = self.saved;
        self.device.restore_state(saved);
    }
}

impl<D: Device + ?Sized> Deref for StateScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: Device + ?Sized> DerefMut for StateScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}

/// Scoped override of the color/depth write masks only.
pub struct WriteMaskScope<'a, D: Device + ?Sized> {
    device: &'a mut D,
    prev_color: bool,
    prev_depth: bool,
}

impl<'a, D: Device + ?Sized> WriteMaskScope<'a, D> {
    pub fn new(device: &'a mut D, color: bool, depth: bool) -> Self {
        let prev_color = device.color_write();
        let prev_depth = device.depth_write();
        device.set_color_write(color);
        device.set_depth_write(depth);
        Self {
            device,
            prev_color,
            prev_depth,
        }
    }
}

impl<D: Device + ?Sized> Drop for WriteMaskScope<'_, D> {
    fn drop(&mut self) {
        self.device.set_color_write(self.prev_color);
        self.device.set_depth_write(self.prev_depth);
    }
}

impl<D: Device + ?Sized> Deref for WriteMaskScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: Device + ?Sized> DerefMut for WriteMaskScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}
