//! Computation instance: a computation graph bound to its own context.
//!
//! The engine owns the [`Context`] and drives one full cycle per pushed
//! bar. Any error raised while the graph evaluates poisons the instance
//! and nothing from the failed cycle is committed.

use crate::domain::context::{Context, CycleState};
use crate::domain::error::EngineError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::{Series, SeriesId};
use crate::ports::param_port::ParamPort;

/// The composition function evaluated once per cycle.
pub trait Computation {
    fn evaluate(&mut self, ctx: &mut Context) -> Result<(), EngineError>;
}

impl<F> Computation for F
where
    F: FnMut(&mut Context) -> Result<(), EngineError>,
{
    fn evaluate(&mut self, ctx: &mut Context) -> Result<(), EngineError> {
        self(ctx)
    }
}

pub struct Engine<C> {
    computation: C,
    ctx: Context,
}

impl<C: Computation> Engine<C> {
    pub fn new(computation: C, params: Box<dyn ParamPort>) -> Self {
        Self {
            computation,
            ctx: Context::new(params),
        }
    }

    /// Append `bar` to the inputs and run one cycle over it.
    pub fn push_bar(&mut self, bar: &OhlcvBar) -> Result<(), EngineError> {
        self.ctx.append_bar(bar)?;
        self.ctx.begin_cycle()?;
        if let Err(err) = self.computation.evaluate(&mut self.ctx) {
            if self.ctx.state() != CycleState::Poisoned {
                tracing::error!(index = self.ctx.index(), error = %err, "evaluation failed, computation poisoned");
                self.ctx.poison();
            }
            return Err(err);
        }
        self.ctx.end_cycle()
    }

    /// Push every bar in order. Returns the number of cycles run.
    pub fn replay(&mut self, bars: &[OhlcvBar]) -> Result<usize, EngineError> {
        for bar in bars {
            self.push_bar(bar)?;
        }
        Ok(bars.len())
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn computation(&self) -> &C {
        &self.computation
    }

    pub fn series(&self, id: SeriesId) -> &Series {
        self.ctx.get(id)
    }

    pub fn find_series(&self, name: &str) -> Option<SeriesId> {
        self.ctx.series_store().find_by_name(name)
    }

    /// Tear the instance down. Returns how many cleanups ran.
    pub fn dispose(&mut self) -> usize {
        self.ctx.teardown()
    }
}
