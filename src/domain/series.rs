//! Series store: append-only numeric sequences held in an arena.
//!
//! A [`Series`] is addressed by its [`SeriesId`] handle. Its `parent` is a
//! non-owning back-reference to the series whose growth drives it; the
//! store pads a series with NaN so its length follows the root of that
//! parent chain.
//!
//! Two write modes exist and both are explicit:
//! - [`WriteMode::Append`] writes index `len` (the normal path).
//! - [`WriteMode::CarryCorrection`] rewrites index `len - 1`. Only the
//!   handful of indicators that carry a value forward by one step
//!   (THROTTLE) use it.

use crate::domain::error::EngineError;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(usize);

impl SeriesId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    CarryCorrection,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Append => write!(f, "append"),
            WriteMode::CarryCorrection => write!(f, "carry-correction"),
        }
    }
}

/// Presentation hint stored under the `display` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Line,
    Hist,
    None,
}

impl Display {
    pub fn as_str(self) -> &'static str {
        match self {
            Display::Line => "line",
            Display::Hist => "hist",
            Display::None => "none",
        }
    }
}

pub const TAG_DISPLAY: &str = "display";
pub const TAG_CHART: &str = "chart";
pub const CHART_NEW: &str = "new";

/// String metadata attached to a series. Only presentation layers read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Helper series that should not be drawn.
    pub fn hidden() -> Self {
        Self::new().display(Display::None)
    }

    /// A line drawn on its own chart.
    pub fn oscillator() -> Self {
        Self::new().display(Display::Line).chart(CHART_NEW)
    }

    /// A line drawn on top of `series_id`'s chart.
    pub fn overlay(series_id: &str) -> Self {
        Self::new().display(Display::Line).chart(series_id)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn display(self, display: Display) -> Self {
        self.with(TAG_DISPLAY, display.as_str())
    }

    pub fn chart(self, chart: &str) -> Self {
        self.with(TAG_CHART, chart)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True unless the series is explicitly tagged `display=none`.
    pub fn is_displayed(&self) -> bool {
        self.get(TAG_DISPLAY) != Some(Display::None.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    series_id: String,
    tags: Tags,
    parent: Option<SeriesId>,
    values: Vec<f64>,
}

impl Series {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn parent(&self) -> Option<SeriesId> {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, NaN when out of range.
    pub fn at(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(f64::NAN)
    }

    /// Value `lag` steps before `index`, NaN when that reaches before the start.
    pub fn lag(&self, index: usize, lag: usize) -> f64 {
        index.checked_sub(lag).map_or(f64::NAN, |i| self.at(i))
    }

    /// Newest committed value, NaN when empty.
    pub fn last(&self) -> f64 {
        self.values.last().copied().unwrap_or(f64::NAN)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[derive(Debug, Default)]
pub struct SeriesStore {
    series: Vec<Series>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        name: &str,
        series_id: String,
        parent: Option<SeriesId>,
        tags: Tags,
    ) -> SeriesId {
        let id = SeriesId(self.series.len());
        self.series.push(Series {
            name: name.to_string(),
            series_id,
            tags,
            parent,
            values: Vec::new(),
        });
        id
    }

    /// # Panics
    /// If `id` was not minted by this store.
    pub fn get(&self, id: SeriesId) -> &Series {
        &self.series[id.0]
    }

    pub fn count(&self) -> usize {
        self.series.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeriesId, &Series)> {
        self.series.iter().enumerate().map(|(i, s)| (SeriesId(i), s))
    }

    pub fn find(&self, series_id: &str) -> Option<SeriesId> {
        self.iter()
            .find(|(_, s)| s.series_id == series_id)
            .map(|(id, _)| id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<SeriesId> {
        self.iter().find(|(_, s)| s.name == name).map(|(id, _)| id)
    }

    pub fn len(&self, id: SeriesId) -> usize {
        self.get(id).len()
    }

    pub fn read(&self, id: SeriesId, index: usize) -> f64 {
        self.get(id).at(index)
    }

    pub fn lag(&self, id: SeriesId, index: usize, lag: usize) -> f64 {
        self.get(id).lag(index, lag)
    }

    /// Root of the parent chain (the series itself when it has no parent).
    pub fn root_of(&self, id: SeriesId) -> SeriesId {
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            current = parent;
        }
        current
    }

    pub fn write(
        &mut self,
        id: SeriesId,
        index: usize,
        value: f64,
        mode: WriteMode,
    ) -> Result<(), EngineError> {
        let series = &mut self.series[id.0];
        let len = series.values.len();
        match mode {
            WriteMode::Append if index == len => {
                series.values.push(value);
                Ok(())
            }
            WriteMode::CarryCorrection if len > 0 && index == len - 1 => {
                tracing::trace!(series = %series.name, index, value, "carry correction");
                series.values[index] = value;
                Ok(())
            }
            _ => Err(EngineError::InvalidWrite {
                series: series.name.clone(),
                index,
                len,
                mode,
            }),
        }
    }

    /// Pad `id` with NaN up to `len` elements. Never shrinks.
    pub fn pad_to(&mut self, id: SeriesId, len: usize) {
        let values = &mut self.series[id.0].values;
        if values.len() < len {
            values.resize(len, f64::NAN);
        }
    }

    /// Pad every series to `len`. Called when a cycle commits.
    pub fn commit_all(&mut self, len: usize) {
        for series in &mut self.series {
            if series.values.len() < len {
                series.values.resize(len, f64::NAN);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_root() -> (SeriesStore, SeriesId) {
        let mut store = SeriesStore::new();
        let root = store.create("T", "input:T".into(), None, Tags::hidden());
        (store, root)
    }

    #[test]
    fn append_only_at_length() {
        let (mut store, root) = store_with_root();
        store.write(root, 0, 1.0, WriteMode::Append).unwrap();
        store.write(root, 1, 2.0, WriteMode::Append).unwrap();
        assert_eq!(store.get(root).values(), &[1.0, 2.0]);

        let err = store.write(root, 5, 3.0, WriteMode::Append).unwrap_err();
        assert!(matches!(err, EngineError::InvalidWrite { index: 5, len: 2, .. }));
        let err = store.write(root, 0, 3.0, WriteMode::Append).unwrap_err();
        assert!(matches!(err, EngineError::InvalidWrite { index: 0, .. }));
    }

    #[test]
    fn carry_correction_only_rewrites_previous_index() {
        let (mut store, root) = store_with_root();
        assert!(store.write(root, 0, 1.0, WriteMode::CarryCorrection).is_err());

        store.write(root, 0, 1.0, WriteMode::Append).unwrap();
        store.write(root, 1, 2.0, WriteMode::Append).unwrap();
        store.write(root, 1, 9.0, WriteMode::CarryCorrection).unwrap();
        assert_eq!(store.get(root).values(), &[1.0, 9.0]);

        let err = store.write(root, 0, 7.0, WriteMode::CarryCorrection).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidWrite {
                mode: WriteMode::CarryCorrection,
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_reads_are_nan() {
        let (mut store, root) = store_with_root();
        store.write(root, 0, 4.0, WriteMode::Append).unwrap();
        assert_eq!(store.read(root, 0), 4.0);
        assert!(store.read(root, 1).is_nan());
        assert!(store.lag(root, 0, 1).is_nan());
        assert_eq!(store.lag(root, 0, 0), 4.0);
    }

    #[test]
    fn root_of_follows_parent_chain() {
        let (mut store, root) = store_with_root();
        let close = store.create("C", "input:C".into(), Some(root), Tags::hidden());
        let sma = store.create("SMA", "root/SMA#0".into(), Some(close), Tags::new());
        assert_eq!(store.root_of(sma), root);
        assert_eq!(store.root_of(root), root);
    }

    #[test]
    fn commit_pads_with_nan_and_never_shrinks() {
        let (mut store, root) = store_with_root();
        let child = store.create("X", "x".into(), Some(root), Tags::new());
        store.write(root, 0, 1.0, WriteMode::Append).unwrap();
        store.write(root, 1, 1.0, WriteMode::Append).unwrap();
        store.commit_all(2);
        assert_eq!(store.len(child), 2);
        assert!(store.read(child, 1).is_nan());

        store.pad_to(root, 1);
        assert_eq!(store.len(root), 2);
    }

    #[test]
    fn tags_display_helpers() {
        assert!(!Tags::hidden().is_displayed());
        assert!(Tags::new().is_displayed());
        let overlay = Tags::overlay("input:C");
        assert_eq!(overlay.get(TAG_DISPLAY), Some("line"));
        assert_eq!(overlay.get(TAG_CHART), Some("input:C"));
        assert_eq!(Tags::oscillator().get(TAG_CHART), Some(CHART_NEW));
        let hist = Tags::oscillator().display(Display::Hist);
        assert_eq!(hist.get(TAG_DISPLAY), Some("hist"));
    }

    #[test]
    fn find_by_id_and_name() {
        let (store, root) = store_with_root();
        assert_eq!(store.find("input:T"), Some(root));
        assert_eq!(store.find_by_name("T"), Some(root));
        assert_eq!(store.find("missing"), None);
    }
}
