//! Commodity Channel Index.
//!
//! TP = (H+L+C)/3, MA = SMA(TP, n), MD = SMA(|TP - MA|, n),
//! CCI = (TP - MA) / (0.015·MD). Zero deviation gives NaN.

use crate::domain::context::{Context, Inputs};
use crate::domain::error::EngineError;
use crate::domain::indicator::sma::sma_as;
use crate::domain::nan_policy::div;
use crate::domain::series::{SeriesId, Tags};

const LAMBERT: f64 = 0.015;

pub fn cci(ctx: &mut Context, inputs: Inputs, period: usize) -> Result<SeriesId, EngineError> {
    ctx.scope("CCI", |ctx| {
        let tp = ctx.series("TP", inputs.close, Tags::hidden())?;
        let typical = (ctx.current(inputs.high) + ctx.current(inputs.low) + ctx.current(inputs.close)) / 3.0;
        ctx.write(tp, typical)?;

        let ma = sma_as(ctx, tp, period, &format!("SMA(TP, {})", period), Tags::hidden())?;
        let dev = ctx.series("CCI.DEV", inputs.close, Tags::hidden())?;
        let offset = typical - ctx.current(ma);
        ctx.write(dev, offset.abs())?;
        let md = sma_as(ctx, dev, period, &format!("CCI.MD({})", period), Tags::hidden())?;

        let out = ctx.series(&format!("CCI({})", period), inputs.close, Tags::oscillator())?;
        let value = div(offset, LAMBERT * ctx.current(md));
        ctx.write(out, value)?;
        Ok(out)
    })
}
