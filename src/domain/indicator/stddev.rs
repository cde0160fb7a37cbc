//! Rolling population standard deviation: sqrt(SMA(x²) - SMA(x)²).
//!
//! A period of 0 or 1 gives exactly 0. Float error that pushes the
//! variance slightly below zero is clamped.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::sma::sma_as;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn stddev(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "STD", source, &[period]);
    stddev_as(ctx, source, period, &name, Tags::oscillator())
}

pub(crate) fn stddev_as(
    ctx: &mut Context,
    source: SeriesId,
    period: usize,
    name: &str,
    tags: Tags,
) -> Result<SeriesId, EngineError> {
    ctx.scope("STD", |ctx| {
        let squared = square(ctx, source)?;
        let mean_name = label(ctx, "SMA", source, &[period]);
        let mean = sma_as(ctx, source, period, &mean_name, Tags::hidden())?;
        let mean_sq_name = label(ctx, "SMA", squared, &[period]);
        let mean_sq = sma_as(ctx, squared, period, &mean_sq_name, Tags::hidden())?;

        let out = ctx.series(name, source, tags)?;
        let value = if period <= 1 {
            0.0
        } else {
            let m = ctx.current(mean);
            let variance = ctx.current(mean_sq) - m * m;
            if variance.is_nan() {
                f64::NAN
            } else {
                variance.max(0.0).sqrt()
            }
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}

fn square(ctx: &mut Context, source: SeriesId) -> Result<SeriesId, EngineError> {
    ctx.scope("SQR", |ctx| {
        let name = format!("SQR({})", ctx.name_of(source));
        let out = ctx.series(&name, source, Tags::hidden())?;
        let x = ctx.current(source);
        ctx.write(out, x * x)?;
        Ok(out)
    })
}
