//! Simple Moving Average: SUM(x, n) / min(i + 1, n).
//!
//! The first n-1 bars average over the samples seen so far.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::overlay_on;
use crate::domain::nan_policy::div;
use crate::domain::rolling::{self, label};
use crate::domain::series::{SeriesId, Tags};

pub fn sma(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "SMA", source, &[period]);
    let tags = overlay_on(ctx, source);
    sma_as(ctx, source, period, &name, tags)
}

/// SMA written to a series with the caller's name and tags.
pub(crate) fn sma_as(
    ctx: &mut Context,
    source: SeriesId,
    period: usize,
    name: &str,
    tags: Tags,
) -> Result<SeriesId, EngineError> {
    ctx.scope("SMA", |ctx| {
        let total = rolling::sum(ctx, source, period)?;
        let out = ctx.series(name, source, tags)?;
        let count = (ctx.index() + 1).min(period);
        let value = div(ctx.current(total), count as f64);
        ctx.write(out, value)?;
        Ok(out)
    })
}
