//! On-Balance Volume.
//!
//! OBV[0] = volume[0]; then volume is added on an up close, subtracted on
//! a down close, and the total is carried on an unchanged close.

use crate::domain::context::{Context, Inputs};
use crate::domain::error::EngineError;
use crate::domain::series::{SeriesId, Tags};

pub fn obv(ctx: &mut Context, inputs: Inputs) -> Result<SeriesId, EngineError> {
    ctx.scope("OBV", |ctx| {
        let out = ctx.series("OBV", inputs.close, Tags::oscillator())?;
        let volume = ctx.current(inputs.volume);
        let value = if ctx.index() == 0 {
            volume
        } else {
            let total = ctx.prev(out, 1);
            let (close, prev_close) = (ctx.current(inputs.close), ctx.prev(inputs.close, 1));
            if close > prev_close {
                total + volume
            } else if close < prev_close {
                total - volume
            } else {
                total
            }
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
