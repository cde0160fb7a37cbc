//! Lag and crossing helpers.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

/// REF(x, n): the value n bars ago, NaN before that exists.
pub fn lagged(ctx: &mut Context, source: SeriesId, lag: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "REF", source, &[lag]);
    ctx.scope("REF", |ctx| {
        let out = ctx.series(&name, source, Tags::hidden())?;
        let value = ctx.prev(source, lag);
        ctx.write(out, value)?;
        Ok(out)
    })
}

/// 1 on the bar where `fast` moves from at-or-below `slow` to above it, else 0.
pub fn cross_over(ctx: &mut Context, fast: SeriesId, slow: SeriesId) -> Result<SeriesId, EngineError> {
    crossing(ctx, "CROSS_OVER", fast, slow, true)
}

/// 1 on the bar where `fast` moves from at-or-above `slow` to below it, else 0.
pub fn cross_under(ctx: &mut Context, fast: SeriesId, slow: SeriesId) -> Result<SeriesId, EngineError> {
    crossing(ctx, "CROSS_UNDER", fast, slow, false)
}

fn crossing(
    ctx: &mut Context,
    op: &str,
    fast: SeriesId,
    slow: SeriesId,
    upward: bool,
) -> Result<SeriesId, EngineError> {
    let name = format!("{}({}, {})", op, ctx.name_of(fast), ctx.name_of(slow));
    let (upper, lower) = if upward { (fast, slow) } else { (slow, fast) };
    ctx.scope(op, |ctx| {
        let out = ctx.series(&name, fast, Tags::hidden())?;
        let above_now = ctx.current(upper) > ctx.current(lower);
        let at_or_below_before = ctx.prev(upper, 1) <= ctx.prev(lower, 1);
        ctx.write(out, if above_now && at_or_below_before { 1.0 } else { 0.0 })?;
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{assert_series, bars, run, run_close};

    const NAN: f64 = f64::NAN;

    #[test]
    fn ref_lags_by_n() {
        let out = run_close(&[1.0, 2.0, 3.0], |ctx, c| lagged(ctx, c, 2));
        assert_series(&out, &[NAN, NAN, 1.0]);
    }

    #[test]
    fn crossings_fire_once() {
        let out = run(&bars(&[1.0, 3.0, 4.0, 1.0, 0.5]), |ctx, inputs| {
            let level = ctx.scope("LEVEL", |ctx| {
                let level = ctx.series("LEVEL", inputs.close, Tags::hidden())?;
                ctx.write(level, 2.0)?;
                Ok(level)
            })?;
            Ok(vec![
                cross_over(ctx, inputs.close, level)?,
                cross_under(ctx, inputs.close, level)?,
            ])
        });
        assert_series(&out[0], &[0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_series(&out[1], &[0.0, 0.0, 0.0, 1.0, 0.0]);
    }
}
