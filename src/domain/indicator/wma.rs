//! Weighted Moving Average.
//!
//! WMA(n) = (1·x[i-n+1] + 2·x[i-n+2] + ... + n·x[i]) / (n(n+1)/2), over
//! the samples available while the window fills. O(1) per step: the
//! weighted sum drops the whole previous window sum and gains n·x[i].

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::overlay_on;
use crate::domain::nan_policy::{div, or_zero};
use crate::domain::rolling::label;
use crate::domain::series::SeriesId;

#[derive(Debug, Default)]
struct Window {
    weighted: f64,
    plain: f64,
}

pub fn wma(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "WMA", source, &[period]);
    let tags = overlay_on(ctx, source);
    ctx.scope("WMA", |ctx| {
        let out = ctx.series(&name, source, tags)?;
        let state = ctx.cell(Window::default)?;
        let i = ctx.index();
        let x = or_zero(ctx.current(source));
        let value = if period == 0 {
            f64::NAN
        } else {
            let mut w = state.borrow_mut();
            if i < period {
                w.weighted += (i + 1) as f64 * x;
                w.plain += x;
            } else {
                w.weighted += period as f64 * x - w.plain;
                w.plain += x - or_zero(ctx.value(source, i - period));
            }
            let m = (i + 1).min(period) as f64;
            div(w.weighted, m * (m + 1.0) / 2.0)
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
