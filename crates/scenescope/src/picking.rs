//! Pick queries: render the pick pass, read one pixel back and feed the
//! decoded index to the selection state machine.

use scenescope_core::{color_to_index, Context, Result, ScenescopeError, Selection};
use scenescope_render::{FrameParams, RenderEngine};

/// Per-frame render parameters derived from the context.
pub(crate) fn frame_params(ctx: &Context) -> FrameParams {
    FrameParams {
        background: ctx.options.background_color,
        length_scale: ctx.extent().length_scale,
        point_radius: ctx.options.point_radius,
        debug_pick: ctx.options.debug_draw_pick_buffer,
    }
}

/// Resolves the device pixel `(x, y)` to a selection.
///
/// Blocks until the GPU has finished the pick pass. On success the selection
/// state holds the result (`None` for background); on error the selection is
/// left unchanged.
pub(crate) fn query(
    engine: &mut RenderEngine,
    ctx: &mut Context,
    x: u32,
    y: u32,
    is_double_click: bool,
) -> Result<Option<Selection>> {
    let params = FrameParams {
        debug_pick: false,
        ..frame_params(ctx)
    };
    engine.render_pick_pass(ctx.structures_mut(), params)?;

    let [r, g, b, _] = engine.read_pick_pixel(x, y)?;
    let index = color_to_index([r, g, b]).ok_or_else(|| {
        ScenescopeError::GpuResource(format!(
            "pick buffer pixel ({x}, {y}) holds no valid index: ({r}, {g}, {b})"
        ))
    })?;
    log::debug!("pick at ({x}, {y}) -> index {index}");

    Ok(ctx.apply_pick_index(index, is_double_click).cloned())
}
