//! Standard indicator panel with a golden-cross rule.
//!
//! Evaluates a list of indicators (or a default set sized by parameters)
//! and watches for the EMA crossing over the SMA. Crossings are throttled
//! by `cooldown` bars and recorded as [`RuleEvent`]s.

use crate::domain::cell::Shared;
use crate::domain::context::Context;
use crate::domain::engine::Computation;
use crate::domain::error::EngineError;
use crate::domain::indicator::ema::ema_as;
use crate::domain::indicator::sma::sma_as;
use crate::domain::indicator::{self, IndicatorType, bollinger, kdj};
use crate::domain::nan_policy::is_signal;
use crate::domain::rolling::{self, label};
use crate::domain::series::Tags;
use std::cell::RefCell;
use std::rc::Rc;

pub const GOLDEN_CROSS: &str = "golden_cross";

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvent {
    pub rule: String,
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Default)]
pub struct StandardPanel {
    indicators: Vec<IndicatorType>,
    events: Shared<Vec<RuleEvent>>,
}

impl StandardPanel {
    pub fn new(indicators: Vec<IndicatorType>) -> Self {
        Self {
            indicators,
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn indicators(&self) -> &[IndicatorType] {
        &self.indicators
    }

    /// Rule firings recorded so far, oldest first.
    pub fn events(&self) -> Vec<RuleEvent> {
        self.events.borrow().clone()
    }

    fn default_set(ctx: &mut Context) -> Vec<IndicatorType> {
        let boll_mult = ctx.param_number("boll_mult", bollinger::DEFAULT_MULTIPLIER);
        vec![
            IndicatorType::Sma(ctx.param_period("ma_period", 20)),
            IndicatorType::Ema(ctx.param_period("ema_period", 10)),
            IndicatorType::Rsi(ctx.param_period("rsi_period", 14)),
            IndicatorType::Kdj(ctx.param_period("kdj_period", kdj::DEFAULT_PERIOD)),
            IndicatorType::Atr(ctx.param_period("atr_period", 14)),
            IndicatorType::Bollinger {
                period: ctx.param_period("boll_period", bollinger::DEFAULT_PERIOD),
                mult_x100: (boll_mult.max(0.0) * 100.0).round() as u32,
            },
        ]
    }

    fn golden_cross(&self, ctx: &mut Context) -> Result<(), EngineError> {
        let ma_period = ctx.param_period("ma_period", 20);
        let ema_period = ctx.param_period("ema_period", 10);
        let cooldown = ctx.param_period("cooldown", 5);
        let close = ctx.inputs().close;
        let events = Rc::clone(&self.events);

        ctx.scope(GOLDEN_CROSS, |ctx| {
            let slow_name = label(ctx, "SMA", close, &[ma_period]);
            let slow = sma_as(ctx, close, ma_period, &slow_name, Tags::hidden())?;
            let fast_name = label(ctx, "EMA", close, &[ema_period]);
            let fast = ema_as(ctx, close, ema_period, &fast_name, Tags::hidden())?;
            let crossed = indicator::cross_over(ctx, fast, slow)?;
            let signal = rolling::throttle(ctx, crossed, cooldown)?;

            let index = ctx.index();
            let level = ctx.current(signal);
            ctx.rule(
                GOLDEN_CROSS,
                level,
                move |store| is_signal(store.read(signal, index)),
                move |store| {
                    let value = store.read(fast, index);
                    tracing::info!(rule = GOLDEN_CROSS, index, value, "rule fired");
                    events.borrow_mut().push(RuleEvent {
                        rule: GOLDEN_CROSS.to_string(),
                        index,
                        value,
                    });
                    None
                },
            )
        })
    }
}

impl Computation for StandardPanel {
    fn evaluate(&mut self, ctx: &mut Context) -> Result<(), EngineError> {
        let inputs = ctx.inputs();
        let indicators = if self.indicators.is_empty() {
            Self::default_set(ctx)
        } else {
            self.indicators.clone()
        };
        for kind in &indicators {
            kind.evaluate(ctx, inputs)?;
        }
        self.golden_cross(ctx)
    }
}
