//! Indicator library.
//!
//! Every indicator is a composition function: it runs as a named graph
//! node, builds on the rolling algorithms and other indicators, and tags
//! its own outputs for presentation:
//! - overlays (SMA, EMA, WMA, BOLL, HPF, ZIGZAG) are charted on their source
//! - oscillators get a chart of their own
//! - intermediate series are hidden
//!
//! `IndicatorType` names an indicator with its parameters (parsed from
//! strings such as `SMA(20)` or `MACD(12,26,9)`) and evaluates it over the
//! input series.

pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod hp_filter;
pub mod hv;
pub mod kdj;
pub mod lag;
pub mod macd;
pub mod obv;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod volume_index;
pub mod wma;
pub mod zigzag;

pub use atr::atr;
pub use bollinger::bollinger;
pub use cci::cci;
pub use ema::ema;
pub use hp_filter::hp_filter;
pub use hv::hv;
pub use kdj::kdj;
pub use lag::{cross_over, cross_under, lagged};
pub use macd::macd;
pub use obv::obv;
pub use roc::roc;
pub use rsi::rsi;
pub use sma::sma;
pub use stddev::stddev;
pub use volume_index::{nvi, pvi};
pub use wma::wma;
pub use zigzag::zigzag;

use crate::domain::context::{Context, Inputs};
use crate::domain::error::EngineError;
use crate::domain::series::{SeriesId, Tags};
use std::fmt;
use std::str::FromStr;

/// Tags for a line drawn over `source`'s chart.
pub(crate) fn overlay_on(ctx: &Context, source: SeriesId) -> Tags {
    Tags::overlay(ctx.series_id_of(source))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Wma(usize),
    Std(usize),
    Bollinger { period: usize, mult_x100: u32 },
    Rsi(usize),
    Kdj(usize),
    Atr(usize),
    Cci(usize),
    Hv(usize),
    Nvi(usize),
    Pvi(usize),
    Hpf { lambda: u32 },
    Macd { fast: usize, slow: usize, signal: usize },
    Roc(usize),
    Obv,
    ZigZag(usize),
}

impl IndicatorType {
    /// Evaluate over the close (or full OHLCV) inputs. Returns the
    /// published output series.
    pub fn evaluate(&self, ctx: &mut Context, inputs: Inputs) -> Result<Vec<SeriesId>, EngineError> {
        let close = inputs.close;
        Ok(match *self {
            IndicatorType::Sma(n) => vec![sma(ctx, close, n)?],
            IndicatorType::Ema(n) => vec![ema(ctx, close, n)?],
            IndicatorType::Wma(n) => vec![wma(ctx, close, n)?],
            IndicatorType::Std(n) => vec![stddev(ctx, close, n)?],
            IndicatorType::Bollinger { period, mult_x100 } => {
                let b = bollinger(ctx, close, period, mult_x100 as f64 / 100.0)?;
                vec![b.upper, b.middle, b.lower]
            }
            IndicatorType::Rsi(n) => vec![rsi(ctx, close, n)?],
            IndicatorType::Kdj(n) => {
                let k = kdj(ctx, inputs, n)?;
                vec![k.k, k.d, k.j]
            }
            IndicatorType::Atr(n) => vec![atr(ctx, inputs, n)?],
            IndicatorType::Cci(n) => vec![cci(ctx, inputs, n)?],
            IndicatorType::Hv(n) => vec![hv(ctx, close, n)?],
            IndicatorType::Nvi(n) => vec![nvi(ctx, inputs, n)?],
            IndicatorType::Pvi(n) => vec![pvi(ctx, inputs, n)?],
            IndicatorType::Hpf { lambda } => vec![hp_filter(ctx, close, lambda as f64)?],
            IndicatorType::Macd { fast, slow, signal } => {
                let m = macd(ctx, close, fast, slow, signal)?;
                vec![m.dif, m.dea, m.histogram]
            }
            IndicatorType::Roc(n) => vec![roc(ctx, close, n)?],
            IndicatorType::Obv => vec![obv(ctx, inputs)?],
            IndicatorType::ZigZag(n) => {
                let z = zigzag(ctx, inputs, n)?;
                vec![z.current, z.last, z.second_last]
            }
        })
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(n) => write!(f, "SMA({})", n),
            IndicatorType::Ema(n) => write!(f, "EMA({})", n),
            IndicatorType::Wma(n) => write!(f, "WMA({})", n),
            IndicatorType::Std(n) => write!(f, "STD({})", n),
            IndicatorType::Bollinger { period, mult_x100 } => {
                write!(f, "BOLL({},{})", period, *mult_x100 as f64 / 100.0)
            }
            IndicatorType::Rsi(n) => write!(f, "RSI({})", n),
            IndicatorType::Kdj(n) => write!(f, "KDJ({})", n),
            IndicatorType::Atr(n) => write!(f, "ATR({})", n),
            IndicatorType::Cci(n) => write!(f, "CCI({})", n),
            IndicatorType::Hv(n) => write!(f, "HV({})", n),
            IndicatorType::Nvi(n) => write!(f, "NVI({})", n),
            IndicatorType::Pvi(n) => write!(f, "PVI({})", n),
            IndicatorType::Hpf { lambda } => write!(f, "HPF({})", lambda),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Roc(n) => write!(f, "ROC({})", n),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::ZigZag(n) => write!(f, "ZIGZAG({})", n),
        }
    }
}

/// Parsed `NAME(a, b, ...)` with arguments defaulted by position.
struct Call {
    args: Vec<f64>,
}

impl Call {
    fn number(&self, index: usize, default: f64) -> f64 {
        self.args.get(index).copied().unwrap_or(default)
    }

    fn count(&self, index: usize, default: usize) -> Option<usize> {
        let v = self.number(index, default as f64);
        (v.is_finite() && v >= 0.0 && v.fract() == 0.0).then_some(v as usize)
    }
}

impl FromStr for IndicatorType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || EngineError::UnknownIndicator { spec: s.to_string() };
        let text = s.trim().to_ascii_uppercase();
        let (name, args) = match text.split_once('(') {
            Some((name, rest)) => {
                let inner = rest.strip_suffix(')').ok_or_else(unknown)?.trim();
                let args = if inner.is_empty() {
                    Vec::new()
                } else {
                    inner
                        .split(',')
                        .map(|a| a.trim().parse::<f64>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| unknown())?
                };
                (name.trim().to_string(), args)
            }
            None => (text.clone(), Vec::new()),
        };

        let max_args = match name.as_str() {
            "OBV" => 0,
            "BOLL" => 2,
            "MACD" => 3,
            _ => 1,
        };
        if args.len() > max_args {
            return Err(unknown());
        }
        let call = Call { args };
        let period = |default| call.count(0, default).ok_or_else(unknown);

        Ok(match name.as_str() {
            "SMA" => IndicatorType::Sma(period(20)?),
            "EMA" => IndicatorType::Ema(period(20)?),
            "WMA" => IndicatorType::Wma(period(20)?),
            "STD" => IndicatorType::Std(period(20)?),
            "BOLL" => {
                let mult = call.number(1, bollinger::DEFAULT_MULTIPLIER);
                if !(mult.is_finite() && mult >= 0.0) {
                    return Err(unknown());
                }
                IndicatorType::Bollinger {
                    period: period(bollinger::DEFAULT_PERIOD)?,
                    mult_x100: (mult * 100.0).round() as u32,
                }
            }
            "RSI" => IndicatorType::Rsi(period(14)?),
            "KDJ" => IndicatorType::Kdj(period(kdj::DEFAULT_PERIOD)?),
            "ATR" => IndicatorType::Atr(period(14)?),
            "CCI" => IndicatorType::Cci(period(20)?),
            "HV" => IndicatorType::Hv(period(20)?),
            "NVI" => IndicatorType::Nvi(period(255)?),
            "PVI" => IndicatorType::Pvi(period(255)?),
            "HPF" => {
                let lambda = call.count(0, hp_filter::DEFAULT_LAMBDA as usize).ok_or_else(unknown)?;
                IndicatorType::Hpf {
                    lambda: u32::try_from(lambda).map_err(|_| unknown())?,
                }
            }
            "MACD" => IndicatorType::Macd {
                fast: call.count(0, macd::DEFAULT_FAST).ok_or_else(unknown)?,
                slow: call.count(1, macd::DEFAULT_SLOW).ok_or_else(unknown)?,
                signal: call.count(2, macd::DEFAULT_SIGNAL).ok_or_else(unknown)?,
            },
            "ROC" => IndicatorType::Roc(period(12)?),
            "OBV" => IndicatorType::Obv,
            "ZIGZAG" => IndicatorType::ZigZag(period(10)?),
            _ => return Err(unknown()),
        })
    }
}
