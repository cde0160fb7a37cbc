//! Report port: consumers of committed series.

use crate::domain::error::EngineError;
use crate::domain::series::SeriesStore;
use std::path::Path;

pub trait ReportPort {
    /// Write every displayed series in `store` to `output_path`.
    fn write(&self, store: &SeriesStore, output_path: &Path) -> Result<(), EngineError>;
}
