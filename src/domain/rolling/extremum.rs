//! Rolling MAX/MIN over a monotonic deque of indices.
//!
//! The deque holds candidate indices whose values decrease (MAX) or
//! increase (MIN) from front to back. Each step evicts indices that left
//! the window from the front, pops dominated candidates from the back and
//! pushes the new index; the front is the extremum. Every index is pushed
//! and popped at most once, so a step is amortized O(1).
//!
//! NaN samples never enter the deque. A window holding only NaN yields NaN.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Max,
    Min,
}

impl Extremum {
    fn op(self) -> &'static str {
        match self {
            Extremum::Max => "MAX",
            Extremum::Min => "MIN",
        }
    }

    /// Whether `incoming` makes the candidate holding `resident` useless.
    fn dominates(self, incoming: f64, resident: f64) -> bool {
        match self {
            Extremum::Max => incoming >= resident,
            Extremum::Min => incoming <= resident,
        }
    }
}

pub fn max(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    rolling_extremum(ctx, source, period, Extremum::Max)
}

pub fn min(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    rolling_extremum(ctx, source, period, Extremum::Min)
}

fn rolling_extremum(
    ctx: &mut Context,
    source: SeriesId,
    period: usize,
    kind: Extremum,
) -> Result<SeriesId, EngineError> {
    ctx.scope(kind.op(), |ctx| {
        let name = label(ctx, kind.op(), source, &[period]);
        let out = ctx.series(&name, source, Tags::hidden())?;
        let candidates = ctx.cell(VecDeque::<usize>::new)?;

        let i = ctx.index();
        let incoming = ctx.current(source);
        let value = {
            let mut deque = candidates.borrow_mut();
            while deque.front().is_some_and(|&front| front + period <= i) {
                deque.pop_front();
            }
            if period > 0 && !incoming.is_nan() {
                while deque
                    .back()
                    .is_some_and(|&back| kind.dominates(incoming, ctx.value(source, back)))
                {
                    deque.pop_back();
                }
                deque.push_back(i);
            }
            deque.front().map_or(f64::NAN, |&front| ctx.value(source, front))
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
