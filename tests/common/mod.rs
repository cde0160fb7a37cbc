#![allow(dead_code)]

use barflow::adapters::static_param_adapter::DefaultParams;
use barflow::domain::context::{Context, Inputs};
use barflow::domain::engine::Engine;
use barflow::domain::error::EngineError;
pub use barflow::domain::ohlcv::OhlcvBar;
use barflow::domain::series::SeriesId;
use chrono::{Days, NaiveDate};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: "BHP".to_string(),
        exchange: "ASX".to_string(),
        date,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// One bar per close on consecutive days from 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + Days::new(i as u64), c))
        .collect()
}

/// A deterministic zig-zagging price path.
pub fn generate_bars(count: usize, base: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| base + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
        .collect();
    let mut bars = bars_from_closes(&closes);
    for (i, bar) in bars.iter_mut().enumerate() {
        bar.volume = 1000.0 + ((i * 37) % 11) as f64 * 100.0;
    }
    bars
}

/// Replay `bars` through `graph` and return the values of the series it
/// reported on the final cycle.
pub fn replay_values(
    bars: &[OhlcvBar],
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
    engine.replay(bars).unwrap();
    let ids = outputs.borrow().clone();
    ids.into_iter()
        .map(|id| engine.series(id).values().to_vec())
        .collect()
}

/// Single output over the close series.
pub fn replay_close(
    closes: &[f64],
    mut graph: impl FnMut(&mut Context, SeriesId) -> Result<SeriesId, EngineError> + 'static,
) -> Vec<f64> {
    replay_values(&bars_from_closes(closes), move |ctx, inputs| {
        Ok(vec![graph(ctx, inputs.close)?])
    })
    .remove(0)
}

/// Write `bars` as `{code}_{exchange}.csv` under `dir`.
pub fn write_csv(dir: &Path, code: &str, exchange: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{}_{}.csv", code, exchange)), content).unwrap();
}

/// Equal bit patterns, so NaN matches NaN.
pub fn bit_identical(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}
