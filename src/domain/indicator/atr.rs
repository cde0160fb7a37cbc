//! Average True Range.
//!
//! TR[i] = max(|H-L|, |H-C[i-1]|, |L-C[i-1]|). On the first bar the two
//! lag terms are -∞ so TR reduces to H-L. ATR = SMA(TR, n).

use crate::domain::context::{Context, Inputs};
use crate::domain::error::EngineError;
use crate::domain::indicator::sma::sma_as;
use crate::domain::series::{SeriesId, Tags};

pub fn atr(ctx: &mut Context, inputs: Inputs, period: usize) -> Result<SeriesId, EngineError> {
    ctx.scope("ATR", |ctx| {
        let tr = true_range(ctx, inputs)?;
        sma_as(ctx, tr, period, &format!("ATR({})", period), Tags::oscillator())
    })
}

pub fn true_range(ctx: &mut Context, inputs: Inputs) -> Result<SeriesId, EngineError> {
    ctx.scope("TR", |ctx| {
        let out = ctx.series("TR", inputs.close, Tags::hidden())?;
        let high = ctx.current(inputs.high);
        let low = ctx.current(inputs.low);
        let (from_high, from_low) = if ctx.index() == 0 {
            (f64::NEG_INFINITY, f64::NEG_INFINITY)
        } else {
            let prev_close = ctx.prev(inputs.close, 1);
            ((high - prev_close).abs(), (low - prev_close).abs())
        };
        ctx.write(out, (high - low).abs().max(from_high).max(from_low))?;
        Ok(out)
    })
}
