//! Rolling-window algorithms over a driving series.
//!
//! Each function runs as its own graph node, keeps whatever window state it
//! needs in reference cells, and appends exactly one value per cycle to its
//! output series. Outputs are helper series (`display=none`); indicators
//! built on top of them tag their own outputs.

pub mod extremum;
pub mod rank;
pub mod sum;
pub mod throttle;
pub mod topk;

pub use extremum::{max, min};
pub use rank::rank;
pub use sum::sum;
pub use throttle::throttle;
pub use topk::topk;

use crate::domain::context::Context;
use crate::domain::series::SeriesId;

/// Display name such as `SUM(C, 3)`.
pub(crate) fn label(ctx: &Context, op: &str, source: SeriesId, args: &[usize]) -> String {
    let mut name = format!("{}({}", op, ctx.name_of(source));
    for arg in args {
        name.push_str(&format!(", {}", arg));
    }
    name.push(')');
    name
}
