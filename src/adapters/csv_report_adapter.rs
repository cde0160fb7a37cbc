//! CSV report adapter: one row per bar, one column per displayed series.
//! NaN cells are written empty.

use crate::domain::error::EngineError;
use crate::domain::series::{SeriesId, SeriesStore};
use crate::ports::report_port::ReportPort;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    /// Series written as columns: the close input plus every displayed series.
    pub fn columns(store: &SeriesStore) -> Vec<SeriesId> {
        store
            .iter()
            .filter(|(_, s)| s.name() == "C" || s.tags().is_displayed())
            .map(|(id, _)| id)
            .collect()
    }

    /// Write the report to any writer.
    pub fn write_to<W: Write>(&self, store: &SeriesStore, out: W) -> Result<(), EngineError> {
        let columns = Self::columns(store);
        let rows = columns.iter().map(|&id| store.len(id)).max().unwrap_or(0);
        let time = store.find("input:T");

        let mut wtr = csv::Writer::from_writer(out);
        let mut header = vec!["index".to_string(), "time".to_string()];
        header.extend(columns.iter().map(|&id| store.get(id).name().to_string()));
        wtr.write_record(&header).map_err(csv_error)?;

        for i in 0..rows {
            let mut record = vec![i.to_string()];
            record.push(format_cell(time.map_or(f64::NAN, |t| store.read(t, i))));
            record.extend(columns.iter().map(|&id| format_cell(store.read(id, i))));
            wtr.write_record(&record).map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn csv_error(e: csv::Error) -> EngineError {
    EngineError::Data {
        reason: format!("CSV write error: {}", e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, store: &SeriesStore, output_path: &Path) -> Result<(), EngineError> {
        let file = std::fs::File::create(output_path)?;
        self.write_to(store, file)
    }
}
