//! KDJ stochastic oscillator.
//!
//! RSV = (C - MIN(L, n)) / (MAX(H, n) - MIN(L, n))·100
//! K[i] = (2·K[i-1] + RSV[i]) / 3, D[i] = (2·D[i-1] + K[i]) / 3, both
//! seeded with 50 when there is no previous value; J = 3D - 2K.

use crate::domain::context::{Context, Inputs};
use crate::domain::error::EngineError;
use crate::domain::nan_policy::div;
use crate::domain::rolling;
use crate::domain::series::{SeriesId, Tags};

pub const DEFAULT_PERIOD: usize = 9;
const SEED: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kdj {
    pub k: SeriesId,
    pub d: SeriesId,
    pub j: SeriesId,
}

fn smooth(previous: f64, input: f64) -> f64 {
    let previous = if previous.is_nan() { SEED } else { previous };
    (2.0 * previous + input) / 3.0
}

pub fn kdj(ctx: &mut Context, inputs: Inputs, period: usize) -> Result<Kdj, EngineError> {
    ctx.scope("KDJ", |ctx| {
        let lowest = rolling::min(ctx, inputs.low, period)?;
        let highest = rolling::max(ctx, inputs.high, period)?;
        let rsv = ctx.series(&format!("RSV({})", period), inputs.close, Tags::hidden())?;
        let k = ctx.series(&format!("KDJ.K({})", period), inputs.close, Tags::oscillator())?;
        let d = ctx.series(&format!("KDJ.D({})", period), inputs.close, Tags::oscillator())?;
        let j = ctx.series(&format!("KDJ.J({})", period), inputs.close, Tags::oscillator())?;

        let low = ctx.current(lowest);
        let raw = 100.0 * div(ctx.current(inputs.close) - low, ctx.current(highest) - low);
        let k_value = smooth(ctx.prev(k, 1), raw);
        let d_value = smooth(ctx.prev(d, 1), k_value);
        ctx.write(rsv, raw)?;
        ctx.write(k, k_value)?;
        ctx.write(d, d_value)?;
        ctx.write(j, 3.0 * d_value - 2.0 * k_value)?;
        Ok(Kdj { k, d, j })
    })
}
