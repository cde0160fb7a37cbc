//! Negative and Positive Volume Index.
//!
//! A running index seeded at 100 moves by |C[i] / C[i-1]| only on bars
//! where volume fell (NVI) or rose (PVI), and is carried forward
//! otherwise. The published value is the EMA of that index.

use crate::domain::context::{Context, Inputs};
use crate::domain::error::EngineError;
use crate::domain::indicator::ema::ema_as;
use crate::domain::nan_policy::div;
use crate::domain::series::{SeriesId, Tags};

const SEED: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Falling,
    Rising,
}

impl Direction {
    fn op(self) -> &'static str {
        match self {
            Direction::Falling => "NVI",
            Direction::Rising => "PVI",
        }
    }

    fn qualifies(self, volume: f64, prev_volume: f64) -> bool {
        match self {
            Direction::Falling => volume < prev_volume,
            Direction::Rising => volume > prev_volume,
        }
    }
}

pub fn nvi(ctx: &mut Context, inputs: Inputs, period: usize) -> Result<SeriesId, EngineError> {
    volume_index(ctx, inputs, period, Direction::Falling)
}

pub fn pvi(ctx: &mut Context, inputs: Inputs, period: usize) -> Result<SeriesId, EngineError> {
    volume_index(ctx, inputs, period, Direction::Rising)
}

fn volume_index(
    ctx: &mut Context,
    inputs: Inputs,
    period: usize,
    direction: Direction,
) -> Result<SeriesId, EngineError> {
    ctx.scope(direction.op(), |ctx| {
        let raw_name = format!("{}.RAW", direction.op());
        let raw = ctx.series(&raw_name, inputs.close, Tags::hidden())?;
        let previous = ctx.prev(raw, 1);
        let value = if ctx.index() == 0 || previous.is_nan() {
            SEED
        } else if direction.qualifies(ctx.current(inputs.volume), ctx.prev(inputs.volume, 1)) {
            let ratio = div(ctx.current(inputs.close), ctx.prev(inputs.close, 1)).abs();
            if ratio.is_nan() { previous } else { previous * ratio }
        } else {
            previous
        };
        ctx.write(raw, value)?;

        let name = format!("{}({})", direction.op(), period);
        ema_as(ctx, raw, period, &name, Tags::oscillator())
    })
}
