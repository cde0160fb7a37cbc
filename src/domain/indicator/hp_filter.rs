//! Recursive Hodrick-Prescott style smoother.
//!
//! HP[i] = (4λ·HP[i-1] + 2·x[i] - 2λ·HP[i-2]) / (2 + 2λ), passing the
//! source through while fewer than three samples exist.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::overlay_on;
use crate::domain::series::SeriesId;

pub const DEFAULT_LAMBDA: f64 = 1600.0;

pub fn hp_filter(ctx: &mut Context, source: SeriesId, lambda: f64) -> Result<SeriesId, EngineError> {
    let name = format!("HPF({}, {})", ctx.name_of(source), lambda);
    let tags = overlay_on(ctx, source);
    ctx.scope("HPF", |ctx| {
        let out = ctx.series(&name, source, tags)?;
        let x = ctx.current(source);
        let value = if ctx.index() < 2 {
            x
        } else {
            let (h1, h2) = (ctx.prev(out, 1), ctx.prev(out, 2));
            (4.0 * lambda * h1 + 2.0 * x - 2.0 * lambda * h2) / (2.0 + 2.0 * lambda)
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
