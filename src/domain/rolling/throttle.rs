//! Throttle: let a signal through, then hold the output at NaN for
//! `period` bars.
//!
//! One persistent field, `open_index`. Before it the output is NaN. When
//! the previous source sample was a signal, it is carried into the
//! previous index with a carry-correction write (so a signal suppressed
//! at `open_index - 1` still lands there), the gate closes until
//! `i + period` and the current output is NaN. Otherwise the current
//! sample passes through.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::nan_policy::is_signal;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub fn throttle(ctx: &mut Context, source: SeriesId, period: usize) -> Result<SeriesId, EngineError> {
    ctx.scope("THROTTLE", |ctx| {
        let name = label(ctx, "THROTTLE", source, &[period]);
        let out = ctx.series(&name, source, Tags::hidden())?;
        let open_index = ctx.cell(|| 0usize)?;

        let i = ctx.index();
        let value = if i < *open_index.borrow() {
            f64::NAN
        } else if i > 0 && is_signal(ctx.prev(source, 1)) {
            let carried = ctx.prev(source, 1);
            ctx.correct(out, i - 1, carried)?;
            *open_index.borrow_mut() = i + period;
            f64::NAN
        } else {
            ctx.current(source)
        };
        ctx.write(out, value)?;
        Ok(out)
    })
}
