//! MACD.
//!
//! DIF = EMA(x, fast) - EMA(x, slow), DEA = EMA(DIF, signal),
//! histogram = DIF - DEA.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::ema::ema_as;
use crate::domain::rolling::label;
use crate::domain::series::{Display, SeriesId, Tags};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macd {
    pub dif: SeriesId,
    pub dea: SeriesId,
    pub histogram: SeriesId,
}

pub fn macd(
    ctx: &mut Context,
    source: SeriesId,
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<Macd, EngineError> {
    ctx.scope("MACD", |ctx| {
        let fast_name = label(ctx, "EMA", source, &[fast]);
        let fast_ema = ema_as(ctx, source, fast, &fast_name, Tags::hidden())?;
        let slow_name = label(ctx, "EMA", source, &[slow]);
        let slow_ema = ema_as(ctx, source, slow, &slow_name, Tags::hidden())?;

        let suffix = format!("({}, {}, {}, {})", ctx.name_of(source), fast, slow, signal);
        let dif = ctx.series(&format!("MACD.DIF{}", suffix), source, Tags::oscillator())?;
        let spread = ctx.current(fast_ema) - ctx.current(slow_ema);
        ctx.write(dif, spread)?;

        let dea = ema_as(ctx, dif, signal, &format!("MACD.DEA{}", suffix), Tags::oscillator())?;
        let histogram = ctx.series(
            &format!("MACD.HIST{}", suffix),
            source,
            Tags::oscillator().display(Display::Hist),
        )?;
        let bar = spread - ctx.current(dea);
        ctx.write(histogram, bar)?;
        Ok(Macd {
            dif,
            dea,
            histogram,
        })
    })
}
