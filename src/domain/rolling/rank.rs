//! Rolling rank: 1 + how many of the previous `period - 1` samples are
//! strictly below the current one. Direct O(period) scan.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn rank(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    ctx.scope("RANK", |ctx| {
        let name = label(ctx, "RANK", source, &[period]);
        let out = ctx.series(&name, source, Tags::hidden())?;
        let current = ctx.current(source);
        let value = if period == 0 || current.is_nan() {
            f64::NAN
        } else {
            let lookback = (period - 1).min(ctx.index());
            let below = (1..=lookback)
                .filter(|&lag| ctx.prev(source, lag) < current)
                .count();
            (below + 1) as f64
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
