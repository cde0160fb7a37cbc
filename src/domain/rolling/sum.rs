//! Rolling sum.
//!
//! S[i] = x[i] + S[i-1] - x[i-period], O(1) per step. NaN samples count
//! as zero both when they enter and when they leave the window.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::nan_policy::or_zero;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn sum(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    ctx.scope("SUM", |ctx| {
        let name = label(ctx, "SUM", source, &[period]);
        let out = ctx.series(&name, source, Tags::hidden())?;
        let i = ctx.index();
        let leaving = if i >= period {
            or_zero(ctx.value(source, i - period))
        } else {
            0.0
        };
        let value = or_zero(ctx.current(source)) + or_zero(ctx.prev(out, 1)) - leaving;
        ctx.write(out, value)?;
        Ok(out)
    })
}
