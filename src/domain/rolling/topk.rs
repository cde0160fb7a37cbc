//! Rolling top-K: the k-th largest non-zero sample of the trailing window.
//!
//! Only signal samples (finite, non-zero) are tracked. The window is
//! re-sorted when a sample enters or leaves it; on quiet steps the
//! previous output is repeated. `k` is 1-based and clamped to the number
//! of tracked samples.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::nan_policy::is_signal;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};
use std::collections::VecDeque;

pub fn topk(
    ctx: &mut Context,
    source: SeriesId,
    k: usize,
    period: usize,
) -> Result<SeriesId, EngineError> {
    ctx.scope("TOPK", |ctx| {
        let name = label(ctx, "TOPK", source, &[k, period]);
        let out = ctx.series(&name, source, Tags::hidden())?;
        let tracked = ctx.cell(VecDeque::<usize>::new)?;

        let i = ctx.index();
        let value = {
            let mut window = tracked.borrow_mut();
            let mut changed = false;
            if is_signal(ctx.current(source)) {
                window.push_back(i);
                changed = true;
            }
            while window.front().is_some_and(|&front| front + period <= i) {
                window.pop_front();
                changed = true;
            }
            if changed {
                let mut values: Vec<f64> = window.iter().map(|&j| ctx.value(source, j)).collect();
                values.sort_by(|a, b| b.total_cmp(a));
                if values.is_empty() {
                    f64::NAN
                } else {
                    values[k.clamp(1, values.len()) - 1]
                }
            } else {
                ctx.prev(out, 1)
            }
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
