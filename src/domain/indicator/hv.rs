//! Historical volatility: rolling standard deviation of log returns
//! ln(C[i] / C[i-1]).
//!
//! The first bar has no return, so the output stays NaN until `period`
//! returns exist.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::stddev::stddev_as;
use crate::domain::nan_policy::div;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn hv(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "HV", source, &[period]);
    ctx.scope("HV", |ctx| {
        let returns_name = format!("LR({})", ctx.name_of(source));
        let returns = ctx.series(&returns_name, source, Tags::hidden())?;
        let ratio = div(ctx.current(source), ctx.prev(source, 1));
        ctx.write(returns, ratio.ln())?;

        let std_name = label(ctx, "STD", returns, &[period]);
        let deviation = stddev_as(ctx, returns, period, &std_name, Tags::hidden())?;
        let out = ctx.series(&name, source, Tags::oscillator())?;
        let value = if ctx.index() < period {
            f64::NAN
        } else {
            ctx.current(deviation)
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
