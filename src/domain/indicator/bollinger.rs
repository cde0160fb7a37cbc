//! Bollinger Bands.
//!
//! Middle = SMA(x, n); Upper/Lower = Middle ± mult·STD(x, n), with the
//! population standard deviation.

use crate::domain::context::Context;
use crate::domain::error::EngineError;
use crate::domain::indicator::overlay_on;
use crate::domain::indicator::sma::sma_as;
use crate::domain::indicator::stddev::stddev_as;
use crate::domain::rolling::label;
use crate::domain::series::{SeriesId, Tags};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bands {
    pub upper: SeriesId,
    pub middle: SeriesId,
    pub lower: SeriesId,
}

pub fn bollinger(
    ctx: &mut Context,
    source: SeriesId,
    period: usize,
    multiplier: f64,
) -> Result<Bands, EngineError> {
    ctx.scope("BOLL", |ctx| {
        let base = ctx.name_of(source).to_string();
        let middle_name = format!("BOLL.MID({}, {})", base, period);
        let upper_name = format!("BOLL.UP({}, {}, {})", base, period, multiplier);
        let lower_name = format!("BOLL.DN({}, {}, {})", base, period, multiplier);

        let tags = overlay_on(ctx, source);
        let middle = sma_as(ctx, source, period, &middle_name, tags.clone())?;
        let std_name = label(ctx, "STD", source, &[period]);
        let deviation = stddev_as(ctx, source, period, &std_name, Tags::hidden())?;

        let upper = ctx.series(&upper_name, source, tags.clone())?;
        let lower = ctx.series(&lower_name, source, tags)?;
        let mid = ctx.current(middle);
        let width = multiplier * ctx.current(deviation);
        ctx.write(upper, mid + width)?;
        ctx.write(lower, mid - width)?;
        Ok(Bands {
            upper,
            middle,
            lower,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{assert_series, bars, run};

    #[test]
    fn bands_are_symmetric_around_the_mean() {
        let out = run(&bars(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), |ctx, inputs| {
            let b = bollinger(ctx, inputs.close, 8, 2.0)?;
            Ok(vec![b.upper, b.middle, b.lower])
        });
        assert!((out[1][7] - 5.0).abs() < 1e-9);
        assert!((out[0][7] - 9.0).abs() < 1e-9);
        assert!((out[2][7] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_prices_collapse_the_bands() {
        let out = run(&bars(&[3.0; 4]), |ctx, inputs| {
            let b = bollinger(ctx, inputs.close, DEFAULT_PERIOD, DEFAULT_MULTIPLIER)?;
            Ok(vec![b.upper, b.lower])
        });
        assert_series(&out[0], &[3.0; 4]);
        assert_series(&out[1], &[3.0; 4]);
    }
}
