//! ZigZag pivots.
//!
//! A bar that makes the `period` high (MAX of H) while tracking an up leg
//! extends the leg; a bar that makes the `period` low instead confirms
//! the leg's extreme as a pivot and starts a down leg, and vice versa.
//! The high is tested first, so an outside bar that is both the period
//! high and the period low turns a down leg upward. The first leg opens
//! on a low, or on a high above the first bar's high.
//! Three outputs: the running extreme of the current leg, the last
//! confirmed pivot and the one before it. Past values are never revised.

use crate::domain::context::{Context, Inputs};
use crate::domain::error::EngineError;
use crate::domain::indicator::overlay_on;
use crate::domain::rolling;
use crate::domain::series::SeriesId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Undecided,
    Up,
    Down,
}

#[derive(Debug)]
struct Pivots {
    leg: Leg,
    anchor: f64,
    extreme: f64,
    last: f64,
    second_last: f64,
}

impl Default for Pivots {
    fn default() -> Self {
        Self {
            leg: Leg::Undecided,
            anchor: f64::NAN,
            extreme: f64::NAN,
            last: f64::NAN,
            second_last: f64::NAN,
        }
    }
}

impl Pivots {
    fn confirm(&mut self, leg: Leg, start: f64) {
        self.second_last = self.last;
        self.last = self.extreme;
        self.leg = leg;
        self.extreme = start;
    }

    fn step(&mut self, high: f64, low: f64, new_high: bool, new_low: bool) {
        match self.leg {
            Leg::Undecided if self.anchor.is_nan() => self.anchor = high,
            Leg::Undecided => {
                if new_high {
                    if high > self.anchor {
                        self.leg = Leg::Up;
                        self.extreme = high;
                    }
                } else if new_low {
                    self.leg = Leg::Down;
                    self.extreme = low;
                }
            }
            Leg::Up => {
                if new_high {
                    self.extreme = self.extreme.max(high);
                } else if new_low {
                    self.confirm(Leg::Down, low);
                }
            }
            Leg::Down => {
                if new_high {
                    self.confirm(Leg::Up, high);
                } else if new_low {
                    self.extreme = self.extreme.min(low);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZigZag {
    pub current: SeriesId,
    pub last: SeriesId,
    pub second_last: SeriesId,
}

pub fn zigzag(ctx: &mut Context, inputs: Inputs, period: usize) -> Result<ZigZag, EngineError> {
    let tags = overlay_on(ctx, inputs.close);
    ctx.scope("ZIGZAG", |ctx| {
        let highest = rolling::max(ctx, inputs.high, period)?;
        let lowest = rolling::min(ctx, inputs.low, period)?;
        let current = ctx.series(&format!("ZIGZAG({})", period), inputs.close, tags.clone())?;
        let last = ctx.series(&format!("ZIGZAG.LAST({})", period), inputs.close, tags.clone())?;
        let second_last = ctx.series(&format!("ZIGZAG.PREV({})", period), inputs.close, tags)?;
        let state = ctx.cell(Pivots::default)?;

        let (high, low) = (ctx.current(inputs.high), ctx.current(inputs.low));
        let new_high = high >= ctx.current(highest);
        let new_low = low <= ctx.current(lowest);
        let (extreme, pivot, earlier) = {
            let mut pivots = state.borrow_mut();
            pivots.step(high, low, new_high, new_low);
            (pivots.extreme, pivots.last, pivots.second_last)
        };
        ctx.write(current, extreme)?;
        ctx.write(last, pivot)?;
        ctx.write(second_last, earlier)?;
        Ok(ZigZag {
            current,
            last,
            second_last,
        })
    })
}
