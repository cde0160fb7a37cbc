//! Exponential Moving Average.
//!
//! EMA[i] = (2·x[i] + (n-1)·EMA[i-1]) / (n+1), seeded with x at the first
//! bar (and again whenever the previous output is NaN).

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::overlay_on;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn ema(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "EMA", source, &[period]);
    let tags = overlay_on(ctx, source);
    ema_as(ctx, source, period, &name, tags)
}

pub(crate) fn ema_as(
    ctx: &mut Context,
    source: SeriesId,
    period: usize,
    name: &str,
    tags: Tags,
) -> Result<SeriesId, EngineError> {
    ctx.scope("EMA", |ctx| {
        let out = ctx.series(name, source, tags)?;
        let x = ctx.current(source);
        let previous = ctx.prev(out, 1);
        let n = period.max(1) as f64;
        let value = if previous.is_nan() {
            x
        } else {
            (2.0 * x + (n - 1.0) * previous) / (n + 1.0)
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
