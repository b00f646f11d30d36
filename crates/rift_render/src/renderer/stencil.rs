use crate::assets::{AssetError, Assets, FLAT_FILL_SHADER};
use crate::context::{ActivePortalRecord, RenderContext};
use crate::gfx::{ClearTarget, Device, StencilMode, WriteMaskScope};
use crate::stats::FrameStats;

/// Builds the stencil mask selecting exactly the pixels inside the
/// silhouette of every portal in the active chain, as a running
/// intersection over the chain rather than a per-pair recomputation.
///
/// Each chain entry i is rasterized under the view it was originally seen
/// from (`view_stack[i]`): the outermost silhouette seeds the mask with an
/// unconditional increment, then every deeper entry raises pixels the
/// running mask already covers and the previous entry lowers its own
/// footprint back out, leaving >= 1 exactly on the intersection so far.
///
/// On return the stencil test is left at "pass where >= 1, keep" for the
/// entity pass of this level; color and depth write masks are restored.
pub fn apply<D: Device + ?Sized>(
    ctx: &mut RenderContext,
    device: &mut D,
    assets: &Assets,
    stats: &mut FrameStats,
) -> Result<(), AssetError> {
    let records: Vec<ActivePortalRecord> = ctx.portal_chain().to_vec();
    if records.is_empty() {
        return Ok(());
    }
    let shader = assets.shader(FLAT_FILL_SHADER)?.clone();

    let mut scope = WriteMaskScope::new(device, false, false);
    scope.clear(ClearTarget::STENCIL);

    scope.set_stencil_mode(Some(StencilMode::write_everywhere()));
    let outer_view = *ctx.view_at(0);
    ctx.push_view(outer_view);
    scope.draw_mesh(ctx, &shader, records[0].transform, &records[0].mesh, None);
    ctx.pop_view();
    stats.stencil_draws += 1;

    for level in 1..records.len() {
        scope.set_stencil_mode(Some(StencilMode::raise_marked()));
        let view = *ctx.view_at(level);
        ctx.push_view(view);
        scope.draw_mesh(
            ctx,
            &shader,
            records[level].transform,
            &records[level].mesh,
            None,
        );
        ctx.pop_view();

        scope.set_stencil_mode(Some(StencilMode::lower_everywhere()));
        let previous_view = *ctx.view_at(level - 1);
        ctx.push_view(previous_view);
        scope.draw_mesh(
            ctx,
            &shader,
            records[level - 1].transform,
            &records[level - 1].mesh,
            None,
        );
        ctx.pop_view();
        stats.stencil_draws += 2;
    }

    scope.set_stencil_mode(Some(StencilMode::pass_inside_mask()));
    Ok(())
}
