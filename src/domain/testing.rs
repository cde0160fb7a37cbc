//! Helpers shared by the unit tests of the rolling and indicator modules.

use crate::adapters::static_param_adapter::DefaultParams;
use crate::domain::context::{Context, Inputs};
use crate::domain::engine::Engine;
use crate::domain::error::EngineError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::SeriesId;
use chrono::{Days, NaiveDate};
use std::cell::RefCell;
use std::rc::Rc;

/// One bar per row of `(open, high, low, close, volume)`, on consecutive days.
pub(crate) fn ohlcv(rows: &[(f64, f64, f64, f64, f64)]) -> Vec<OhlcvBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close, volume))| OhlcvBar {
            code: "TEST".into(),
            exchange: "TEST".into(),
            date: start + Days::new(i as u64),
            open,
            high,
            low,
            close,
            volume,
        })
        .collect()
}

/// Flat bars where every price field equals the close.
pub(crate) fn bars(closes: &[f64]) -> Vec<OhlcvBar> {
    let rows: Vec<_> = closes.iter().map(|&c| (c, c, c, c, 1000.0)).collect();
    ohlcv(&rows)
}

/// Replay `input` through `graph` and return the values of the series it
/// reports on the last cycle.
pub(crate) fn run(
    input: &[OhlcvBar],
    mut graph: impl FnMut(&mut Context, Inputs) -> Result<Vec<SeriesId>, EngineError> + 'static,
) -> Vec<Vec<f64>> {
    let outputs = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&outputs);
    let mut engine = Engine::new(
        move |ctx: &mut Context| {
            let inputs = ctx.inputs();
            *sink.borrow_mut() = graph(ctx, inputs)?;
            Ok(())
        },
        Box::new(DefaultParams),
    );
    engine.replay(input).unwrap();
    let ids = outputs.borrow().clone();
    ids.into_iter()
        .map(|id| engine.series(id).values().to_vec())
        .collect()
}

/// Single-output shorthand over the close series.
pub(crate) fn run_close(
    closes: &[f64],
    mut graph: impl FnMut(&mut Context, SeriesId) -> Result<SeriesId, EngineError> + 'static,
) -> Vec<f64> {
    run(&bars(closes), move |ctx, inputs| Ok(vec![graph(ctx, inputs.close)?]))
        .remove(0)
}

/// Element-wise comparison where NaN only matches NaN.
pub(crate) fn assert_series(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length of {actual:?}");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if e.is_nan() {
            assert!(a.is_nan(), "index {i}: expected NaN, got {a} in {actual:?}");
        } else {
            assert!(
                approx::abs_diff_eq!(*a, *e, epsilon = 1e-3),
                "index {i}: expected {e}, got {a} in {actual:?}"
            );
        }
    }
}
