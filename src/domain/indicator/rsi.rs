//! Relative Strength Index.
//!
//! U = max(x[i] - x[i-1], 0), D = max(x[i-1] - x[i], 0), both EMA-smoothed;
//! RSI = 100·EMA(U) / (EMA(U) + EMA(D)). A flat stretch (0/0) is NaN.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::ema::ema_as;
use crate::domain::nan_policy::div;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn rsi(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "RSI", source, &[period]);
    ctx.scope("RSI", |ctx| {
        let base = ctx.name_of(source).to_string();
        let up = ctx.series(&format!("RSI.U({})", base), source, Tags::hidden())?;
        let down = ctx.series(&format!("RSI.D({})", base), source, Tags::hidden())?;
        let change = ctx.current(source) - ctx.prev(source, 1);
        ctx.write(up, if change > 0.0 { change } else { 0.0 })?;
        ctx.write(down, if change < 0.0 { -change } else { 0.0 })?;

        let up_name = label(ctx, "EMA", up, &[period]);
        let avg_up = ema_as(ctx, up, period, &up_name, Tags::hidden())?;
        let down_name = label(ctx, "EMA", down, &[period]);
        let avg_down = ema_as(ctx, down, period, &down_name, Tags::hidden())?;

        let out = ctx.series(&name, source, Tags::oscillator())?;
        let u = ctx.current(avg_up);
        let value = 100.0 * div(u, u + ctx.current(avg_down));
        ctx.write(out, value)?;
        Ok(out)
    })
}
