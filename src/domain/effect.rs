//! Effect scheduler: dependency-gated side effects, at most once per cycle.
//!
//! An effect is registered at a slot. Each cycle the caller presents its
//! current dependencies; when they differ from the snapshot taken on the
//! last run (or the effect is registered as "always"), the closure is
//! queued and runs when the cycle ends, after the previous run's cleanup.

use crate::domain::cell::SlotKey;
use crate::domain::error::EngineError;
use crate::domain::series::SeriesStore;
use std::any::Any;

pub type Cleanup = Box<dyn FnOnce()>;
pub type EffectFn = Box<dyn FnOnce(&SeriesStore) -> Option<Cleanup>>;

/// A typed dependency list compared element-wise against the previous cycle.
pub trait Deps: PartialEq + 'static {
    /// Number of elements. Changing it between cycles is a structural error.
    fn arity(&self) -> usize;
}

impl Deps for () {
    fn arity(&self) -> usize {
        0
    }
}

impl<T: PartialEq + 'static> Deps for Vec<T> {
    fn arity(&self) -> usize {
        self.len()
    }
}

impl<T: PartialEq + 'static, const N: usize> Deps for [T; N] {
    fn arity(&self) -> usize {
        N
    }
}

macro_rules! scalar_deps {
    ($($t:ty),*) => {
        $(impl Deps for $t {
            fn arity(&self) -> usize {
                1
            }
        })*
    };
}

scalar_deps!(bool, i32, i64, u32, u64, usize, f64, String, &'static str);

macro_rules! tuple_deps {
    ($n:expr; $($name:ident),+) => {
        impl<$($name: PartialEq + 'static),+> Deps for ($($name,)+) {
            fn arity(&self) -> usize {
                $n
            }
        }
    };
}

tuple_deps!(1; A);
tuple_deps!(2; A, B);
tuple_deps!(3; A, B, C);
tuple_deps!(4; A, B, C, D);
tuple_deps!(5; A, B, C, D, E);
tuple_deps!(6; A, B, C, D, E, F);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectHandle(usize);

struct Registration {
    key: SlotKey,
    last_deps: Option<Box<dyn Any>>,
    cleanup: Option<Cleanup>,
    runs: u64,
}

#[derive(Default)]
pub struct EffectScheduler {
    registrations: Vec<Registration>,
    due: Vec<(EffectHandle, EffectFn)>,
}

impl EffectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: SlotKey) -> EffectHandle {
        let handle = EffectHandle(self.registrations.len());
        self.registrations.push(Registration {
            key,
            last_deps: None,
            cleanup: None,
            runs: 0,
        });
        handle
    }

    /// Queue `run` if `deps` changed (`None` means "always"). Returns
    /// whether it was queued.
    pub fn schedule<D: Deps>(
        &mut self,
        handle: EffectHandle,
        deps: Option<D>,
        run: EffectFn,
    ) -> Result<bool, EngineError> {
        let reg = &mut self.registrations[handle.0];
        let due = match (&deps, reg.last_deps.as_ref()) {
            (Some(current), Some(previous)) => {
                let previous = previous.downcast_ref::<D>().ok_or_else(|| {
                    EngineError::SlotTypeMismatch {
                        slot: reg.key.to_string(),
                    }
                })?;
                if previous.arity() != current.arity() {
                    return Err(EngineError::DependencyArityChanged {
                        slot: reg.key.to_string(),
                        previous: previous.arity(),
                        current: current.arity(),
                    });
                }
                previous != current
            }
            _ => true,
        };
        if due {
            reg.last_deps = deps.map(|d| Box::new(d) as Box<dyn Any>);
            self.due.push((handle, run));
        }
        Ok(due)
    }

    pub fn pending(&self) -> usize {
        self.due.len()
    }

    /// Run queued effects in queue order. Each one first runs the cleanup
    /// left by its previous run.
    pub fn run_due(&mut self, store: &SeriesStore) -> usize {
        let due = std::mem::take(&mut self.due);
        let count = due.len();
        for (handle, run) in due {
            let reg = &mut self.registrations[handle.0];
            if let Some(cleanup) = reg.cleanup.take() {
                cleanup();
            }
            reg.cleanup = run(store);
            reg.runs += 1;
            tracing::trace!(slot = %reg.key, runs = reg.runs, "effect ran");
        }
        count
    }

    /// Drop queued work without running it (aborted cycle).
    pub fn discard_due(&mut self) {
        self.due.clear();
    }

    pub fn runs(&self, handle: EffectHandle) -> u64 {
        self.registrations[handle.0].runs
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run every outstanding cleanup once, newest registration first.
    pub fn teardown(&mut self) -> usize {
        self.due.clear();
        let mut invoked = 0;
        for reg in self.registrations.iter_mut().rev() {
            if let Some(cleanup) = reg.cleanup.take() {
                cleanup();
                invoked += 1;
            }
        }
        self.registrations.clear();
        invoked
    }
}
