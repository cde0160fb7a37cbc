//! Rate of Change: (x[i] - x[i-n]) / x[i-n]·100.
//! NaN until n bars of history exist and when x[i-n] is zero.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::nan_policy::div;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn roc(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    let name = label(ctx, "ROC", source, &[period]);
    ctx.scope("ROC", |ctx| {
        let out = ctx.series(&name, source, Tags::oscillator())?;
        let base = ctx.prev(source, period);
        let value = 100.0 * div(ctx.current(source) - base, base);
        ctx.write(out, value)?;
        Ok(out)
    })
}
