//! Evaluation context: drives one cycle per new bar.
//!
//! A cycle is `begin_cycle` → the computation visits its slots (series,
//! cells, memos, effects) inside named scopes → `end_cycle` runs the
//! effects whose dependencies changed and commits every series to the
//! root length.
//!
//! Slots are addressed by `(scope, position)`. Scopes are explicit graph
//! nodes (see [`Context::scope`]), so only the call order *inside* one
//! node has to be stable from cycle to cycle. Visiting a slot as a
//! different kind than it was created with poisons the instance; it must
//! then be torn down and rebuilt.

use crate::domain::cell::{CellStore, MemoCell, ScopeId, Shared, SlotKey, SlotKind, Visit};
use crate::domain::effect::{Cleanup, Deps, EffectFn, EffectHandle, EffectScheduler};
use crate::domain::error::EngineError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::{Series, SeriesId, SeriesStore, Tags, WriteMode};
use crate::ports::param_port::{ParamPort, ParamSchema, ParamValue};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Handles to the input series filled by the data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inputs {
    pub time: SeriesId,
    pub open: SeriesId,
    pub high: SeriesId,
    pub low: SeriesId,
    pub close: SeriesId,
    pub volume: SeriesId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
    Poisoned,
    Disposed,
}

struct Frame {
    scope: ScopeId,
    cursor: u32,
    occurrences: HashMap<String, u32>,
}

impl Frame {
    fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            cursor: 0,
            occurrences: HashMap::new(),
        }
    }
}

pub struct Context {
    series: SeriesStore,
    cells: CellStore,
    effects: EffectScheduler,
    params: Box<dyn ParamPort>,
    param_cache: BTreeMap<String, ParamValue>,
    param_schema: BTreeMap<String, ParamSchema>,
    frames: Vec<Frame>,
    state: CycleState,
    inputs: Inputs,
    committed: usize,
}

impl Context {
    pub fn new(params: Box<dyn ParamPort>) -> Self {
        let mut series = SeriesStore::new();
        let time = series.create("T", "input:T".into(), None, Tags::hidden());
        let mut input = |name: &str| {
            series.create(name, format!("input:{name}"), Some(time), Tags::hidden())
        };
        let open = input("O");
        let high = input("H");
        let low = input("L");
        let close = input("C");
        let volume = input("VOL");
        Self {
            series,
            cells: CellStore::new(),
            effects: EffectScheduler::new(),
            params,
            param_cache: BTreeMap::new(),
            param_schema: BTreeMap::new(),
            frames: Vec::new(),
            state: CycleState::Idle,
            inputs: Inputs {
                time,
                open,
                high,
                low,
                close,
                volume,
            },
            committed: 0,
        }
    }

    pub fn inputs(&self) -> Inputs {
        self.inputs
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Number of committed cycles.
    pub fn cycles(&self) -> usize {
        self.committed
    }

    pub fn series_store(&self) -> &SeriesStore {
        &self.series
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    pub fn effects(&self) -> &EffectScheduler {
        &self.effects
    }

    fn check_usable(&self) -> Result<(), EngineError> {
        match self.state {
            CycleState::Poisoned => Err(EngineError::Poisoned),
            CycleState::Disposed => Err(EngineError::Disposed),
            _ => Ok(()),
        }
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        self.check_usable()?;
        if self.state != CycleState::Running {
            return Err(EngineError::NotInCycle);
        }
        Ok(())
    }

    /// Mark the instance unusable and drop any queued effects.
    pub fn poison(&mut self) {
        if self.state == CycleState::Disposed {
            return;
        }
        self.state = CycleState::Poisoned;
        self.effects.discard_due();
        self.frames.clear();
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        tracing::error!(error = %err, "structural violation, computation poisoned");
        self.poison();
        err
    }

    // --- Input feed ---

    /// Append one bar to the input series. Only allowed between cycles.
    pub fn append_bar(&mut self, bar: &OhlcvBar) -> Result<(), EngineError> {
        self.check_usable()?;
        if self.state == CycleState::Running {
            return Err(EngineError::Reentrant);
        }
        let index = self.series.len(self.inputs.time);
        let Inputs {
            time,
            open,
            high,
            low,
            close,
            volume,
        } = self.inputs;
        for (id, value) in [
            (time, bar.timestamp()),
            (open, bar.open),
            (high, bar.high),
            (low, bar.low),
            (close, bar.close),
            (volume, bar.volume),
        ] {
            self.series.write(id, index, value, WriteMode::Append)?;
        }
        Ok(())
    }

    // --- Cycle ---

    pub fn begin_cycle(&mut self) -> Result<(), EngineError> {
        self.check_usable()?;
        if self.state == CycleState::Running {
            return Err(self.fail(EngineError::Reentrant));
        }
        let found = self.series.len(self.inputs.time);
        let expected = self.committed + 1;
        if found != expected {
            return Err(EngineError::CycleGrowth { expected, found });
        }
        self.state = CycleState::Running;
        self.frames.clear();
        self.frames.push(Frame::new(ScopeId::ROOT));
        Ok(())
    }

    pub fn end_cycle(&mut self) -> Result<(), EngineError> {
        self.ensure_running()?;
        let ran = self.effects.run_due(&self.series);
        let len = self.series.len(self.inputs.time);
        self.series.commit_all(len);
        self.frames.clear();
        self.state = CycleState::Idle;
        self.committed += 1;
        tracing::trace!(index = len - 1, effects = ran, "cycle committed");
        Ok(())
    }

    /// Index being computed in the current cycle (the newest bar).
    pub fn index(&self) -> usize {
        self.series.len(self.inputs.time).saturating_sub(1)
    }

    /// Return the slot at the current position for `kind`, creating it on
    /// first visit, and advance the cursor.
    pub fn visit_slot(&mut self, kind: SlotKind) -> Result<Visit, EngineError> {
        self.ensure_running()?;
        let frame = self.frames.last_mut().ok_or(EngineError::NotInCycle)?;
        let key = SlotKey::new(frame.scope, frame.cursor);
        frame.cursor += 1;
        match self.cells.kind_of(key) {
            None => {
                self.cells.reserve(key, kind);
                tracing::debug!(slot = %self.cells.describe(key), %kind, "slot created");
                Ok(Visit { key, fresh: true })
            }
            Some(found) if found == kind => Ok(Visit { key, fresh: false }),
            Some(expected) => {
                let slot = self.cells.describe(key);
                Err(self.fail(EngineError::SlotKindMismatch {
                    slot,
                    expected,
                    found: kind,
                }))
            }
        }
    }

    fn payload<T: 'static>(&mut self, key: SlotKey) -> Result<&mut T, EngineError> {
        if !self.cells.holds::<T>(key) {
            let slot = self.cells.describe(key);
            return Err(self.fail(EngineError::SlotTypeMismatch { slot }));
        }
        self.cells
            .payload_mut::<T>(key)
            .ok_or_else(|| EngineError::SlotTypeMismatch {
                slot: key.to_string(),
            })
    }

    /// Run `body` as the graph node `name`. The node's identity is its name
    /// plus how many same-named siblings precede it in the parent node.
    pub fn scope<T>(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        self.ensure_running()?;
        let parent = self.frames.last_mut().ok_or(EngineError::NotInCycle)?;
        let occurrence = parent.occurrences.entry(name.to_string()).or_insert(0);
        let nth = *occurrence;
        *occurrence += 1;
        let parent_scope = parent.scope;
        let scope = self.cells.child_scope(parent_scope, name, nth);

        self.frames.push(Frame::new(scope));
        let result = body(self);
        if self.state == CycleState::Running {
            self.frames.pop();
        }
        result
    }

    // --- Series ---

    /// Create (first cycle) or revisit a derived series, padded so that
    /// the current index is the next append.
    pub fn series(&mut self, name: &str, parent: SeriesId, tags: Tags) -> Result<SeriesId, EngineError> {
        let visit = self.visit_slot(SlotKind::Series)?;
        let id = if visit.fresh {
            let series_id = format!(
                "{}@{}",
                self.cells.scope_path(visit.key.scope),
                visit.key.position
            );
            let id = self.series.create(name, series_id, Some(parent), tags);
            self.cells.fill(visit.key, Box::new(id));
            tracing::debug!(series = name, "series created");
            id
        } else {
            *self.payload::<SeriesId>(visit.key)?
        };
        let target = self.series.len(self.series.root_of(id)).saturating_sub(1);
        self.series.pad_to(id, target);
        Ok(id)
    }

    pub fn get(&self, id: SeriesId) -> &Series {
        self.series.get(id)
    }

    pub fn name_of(&self, id: SeriesId) -> &str {
        self.series.get(id).name()
    }

    pub fn series_id_of(&self, id: SeriesId) -> &str {
        self.series.get(id).series_id()
    }

    pub fn value(&self, id: SeriesId, index: usize) -> f64 {
        self.series.read(id, index)
    }

    /// Value at the current index.
    pub fn current(&self, id: SeriesId) -> f64 {
        self.series.read(id, self.index())
    }

    /// Value `lag` bars before the current index.
    pub fn prev(&self, id: SeriesId, lag: usize) -> f64 {
        self.series.lag(id, self.index(), lag)
    }

    /// Append `value` at the current index.
    pub fn write(&mut self, id: SeriesId, value: f64) -> Result<(), EngineError> {
        self.ensure_running()?;
        let index = self.index();
        self.series.write(id, index, value, WriteMode::Append)
    }

    /// Rewrite the newest committed element of `id` (carry correction).
    pub fn correct(&mut self, id: SeriesId, index: usize, value: f64) -> Result<(), EngineError> {
        self.ensure_running()?;
        self.series.write(id, index, value, WriteMode::CarryCorrection)
    }

    // --- Cells ---

    /// A mutable reference cell that keeps its identity across cycles.
    pub fn cell<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Result<Shared<T>, EngineError> {
        let visit = self.visit_slot(SlotKind::Ref)?;
        if visit.fresh {
            let shared = Rc::new(RefCell::new(init()));
            self.cells.fill(visit.key, Box::new(Rc::clone(&shared)));
            return Ok(shared);
        }
        Ok(Rc::clone(self.payload::<Shared<T>>(visit.key)?))
    }

    /// Cached value, recomputed only when `deps` differ from last cycle.
    pub fn memo<D: Deps, T: Clone + 'static>(
        &mut self,
        deps: D,
        compute: impl FnOnce() -> T,
    ) -> Result<T, EngineError> {
        let visit = self.visit_slot(SlotKind::Memo)?;
        if visit.fresh {
            let value = compute();
            self.cells.fill(
                visit.key,
                Box::new(MemoCell {
                    deps,
                    value: value.clone(),
                }),
            );
            return Ok(value);
        }
        let key = visit.key;
        let cell = self.payload::<MemoCell<D, T>>(key)?;
        let (previous, current) = (cell.deps.arity(), deps.arity());
        if previous != current {
            let slot = self.cells.describe(key);
            return Err(self.fail(EngineError::DependencyArityChanged {
                slot,
                previous,
                current,
            }));
        }
        if cell.deps != deps {
            cell.value = compute();
            cell.deps = deps;
        }
        Ok(cell.value.clone())
    }

    // --- Effects ---

    /// Register an effect that runs at the end of the cycle when `deps`
    /// changed since its last run.
    pub fn effect<D: Deps>(
        &mut self,
        deps: D,
        run: impl FnOnce(&SeriesStore) -> Option<Cleanup> + 'static,
    ) -> Result<(), EngineError> {
        self.register_effect(Some(deps), Box::new(run))
    }

    /// Register an effect that runs at the end of every cycle.
    pub fn effect_always(
        &mut self,
        run: impl FnOnce(&SeriesStore) -> Option<Cleanup> + 'static,
    ) -> Result<(), EngineError> {
        self.register_effect::<()>(None, Box::new(run))
    }

    /// A named rule: `condition` and `effect` are evaluated at most once
    /// per cycle and skipped while `deps` is unchanged.
    pub fn rule<D: Deps>(
        &mut self,
        name: &str,
        deps: D,
        condition: impl FnOnce(&SeriesStore) -> bool + 'static,
        effect: impl FnOnce(&SeriesStore) -> Option<Cleanup> + 'static,
    ) -> Result<(), EngineError> {
        let label = name.to_string();
        self.scope(name, move |ctx| {
            ctx.effect(deps, move |store| {
                if condition(store) {
                    tracing::debug!(rule = %label, "rule fired");
                    effect(store)
                } else {
                    None
                }
            })
        })
    }

    fn register_effect<D: Deps>(&mut self, deps: Option<D>, run: EffectFn) -> Result<(), EngineError> {
        let visit = self.visit_slot(SlotKind::Effect)?;
        let handle = if visit.fresh {
            let handle = self.effects.register(visit.key);
            self.cells.fill(visit.key, Box::new(handle));
            handle
        } else {
            *self.payload::<EffectHandle>(visit.key)?
        };
        match self.effects.schedule(handle, deps, run) {
            Ok(_) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    // --- Parameters ---

    /// Resolve a parameter through the injected port. The first resolved
    /// value is kept for the lifetime of the instance.
    pub fn param(&mut self, key: &str, schema: ParamSchema) -> ParamValue {
        if let Some(value) = self.param_cache.get(key) {
            return value.clone();
        }
        let value = self.params.get_parameter(key, &schema);
        let value = if value.matches(&schema) {
            value
        } else {
            schema.default_value()
        };
        self.param_schema.insert(key.to_string(), schema);
        self.param_cache.insert(key.to_string(), value.clone());
        value
    }

    pub fn param_number(&mut self, key: &str, default: f64) -> f64 {
        self.param(key, ParamSchema::Number { default })
            .as_number()
            .unwrap_or(default)
    }

    /// A non-negative integer parameter, e.g. a window length.
    pub fn param_period(&mut self, key: &str, default: usize) -> usize {
        let value = self.param_number(key, default as f64);
        if value.is_finite() && value >= 0.0 {
            value.round() as usize
        } else {
            default
        }
    }

    pub fn param_bool(&mut self, key: &str, default: bool) -> bool {
        self.param(key, ParamSchema::Boolean { default })
            .as_bool()
            .unwrap_or(default)
    }

    pub fn param_string(&mut self, key: &str, default: &str) -> String {
        match self.param(
            key,
            ParamSchema::String {
                default: default.to_string(),
            },
        ) {
            ParamValue::String(s) => s,
            _ => default.to_string(),
        }
    }

    /// Every parameter consumed so far, with its schema.
    pub fn param_schema(&self) -> &BTreeMap<String, ParamSchema> {
        &self.param_schema
    }

    // --- Teardown ---

    /// Run the last cleanup of every effect (newest first) and discard all
    /// state. Further use fails with [`EngineError::Disposed`].
    pub fn teardown(&mut self) -> usize {
        if self.state == CycleState::Disposed {
            return 0;
        }
        let invoked = self.effects.teardown();
        self.cells.clear();
        self.frames.clear();
        self.state = CycleState::Disposed;
        tracing::debug!(cleanups = invoked, "computation disposed");
        invoked
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.teardown();
    }
}
