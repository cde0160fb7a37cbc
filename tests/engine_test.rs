//! Engine lifecycle: determinism, teardown, structural errors.

mod common;

use barflow::adapters::static_param_adapter::{DefaultParams, StaticParams};
use barflow::domain::context::{Context, CycleState};
use barflow::domain::effect::Cleanup;
use barflow::domain::engine::Engine;
use barflow::domain::error::EngineError;
use barflow::domain::indicator::IndicatorType;
use barflow::domain::panel::StandardPanel;
use barflow::domain::series::Tags;
use common::*;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

fn all_indicators() -> Vec<IndicatorType> {
    [
        "SMA(5)", "EMA(5)", "WMA(5)", "STD(5)", "BOLL(5,2)", "RSI(5)", "KDJ(5)", "ATR(5)",
        "CCI(5)", "HV(5)", "NVI(5)", "PVI(5)", "HPF(100)", "MACD(3,6,4)", "ROC(3)", "OBV",
        "ZIGZAG(4)",
    ]
    .iter()
    .map(|s| s.parse().unwrap())
    .collect()
}

fn snapshot(engine: &Engine<StandardPanel>) -> Vec<(String, Vec<f64>)> {
    engine
        .context()
        .series_store()
        .iter()
        .map(|(_, s)| (s.series_id().to_string(), s.values().to_vec()))
        .collect()
}

mod determinism {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn replays_are_bit_identical(count in 1usize..80, base in 10.0..200.0f64) {
            let bars = generate_bars(count, base);
            let mut first = Engine::new(StandardPanel::new(all_indicators()), Box::new(DefaultParams));
            let mut second = Engine::new(StandardPanel::new(all_indicators()), Box::new(DefaultParams));
            first.replay(&bars).unwrap();
            second.replay(&bars).unwrap();

            let a = snapshot(&first);
            let b = snapshot(&second);
            prop_assert_eq!(a.len(), b.len());
            for ((id_a, values_a), (id_b, values_b)) in a.iter().zip(&b) {
                prop_assert_eq!(id_a, id_b);
                prop_assert!(bit_identical(values_a, values_b), "{} diverged", id_a);
            }
            prop_assert_eq!(first.computation().events(), second.computation().events());
        }
    }

    #[test]
    fn every_series_tracks_the_driving_length() {
        let bars = generate_bars(25, 50.0);
        let mut engine = Engine::new(StandardPanel::new(all_indicators()), Box::new(DefaultParams));
        engine.replay(&bars).unwrap();
        for (_, series) in engine.context().series_store().iter() {
            assert_eq!(series.len(), 25, "{}", series.name());
        }
    }

    #[test]
    fn series_ids_are_stable_paths() {
        let mut engine = Engine::new(
            StandardPanel::new(vec![IndicatorType::Sma(3), IndicatorType::Sma(3)]),
            Box::new(DefaultParams),
        );
        engine.replay(&bars_from_closes(&[1.0, 2.0])).unwrap();
        let store = engine.context().series_store();
        let ids: Vec<&str> = store
            .iter()
            .filter(|(_, s)| s.name() == "SMA(C, 3)" && s.tags().is_displayed())
            .map(|(_, s)| s.series_id())
            .collect();
        assert_eq!(ids, vec!["root/SMA@0", "root/SMA#1@0"]);
    }
}

mod teardown {
    use super::*;

    #[test]
    fn cleanups_run_once_in_reverse_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let computation = move |ctx: &mut Context| {
            for name in ["a", "b", "c"] {
                let sink = Rc::clone(&sink);
                ctx.scope(name, move |ctx| {
                    ctx.effect((), move |_| Some(Box::new(move || sink.borrow_mut().push(name)) as Cleanup))
                })?;
            }
            Ok(())
        };
        let mut engine = Engine::new(computation, Box::new(DefaultParams));
        engine.replay(&bars_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        assert!(log.borrow().is_empty());

        assert_eq!(engine.dispose(), 3);
        assert_eq!(*log.borrow(), vec!["c", "b", "a"]);
        assert_eq!(engine.dispose(), 0);
        assert_eq!(log.borrow().len(), 3);
        assert!(matches!(
            engine.push_bar(&make_bar(date(2024, 2, 1), 1.0)),
            Err(EngineError::Disposed)
        ));
    }

    #[test]
    fn dropping_the_engine_runs_cleanups() {
        let cleaned = Rc::new(RefCell::new(0));
        {
            let counter = Rc::clone(&cleaned);
            let computation = move |ctx: &mut Context| {
                let counter = Rc::clone(&counter);
                ctx.effect((), move |_| Some(Box::new(move || *counter.borrow_mut() += 1) as Cleanup))
            };
            let mut engine = Engine::new(computation, Box::new(DefaultParams));
            engine.replay(&bars_from_closes(&[1.0])).unwrap();
        }
        assert_eq!(*cleaned.borrow(), 1);
    }

    #[test]
    fn rerun_cleans_up_previous_run_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let computation = move |ctx: &mut Context| {
            let index = ctx.index();
            let sink = Rc::clone(&sink);
            ctx.effect(index / 2, move |_| {
                sink.borrow_mut().push(format!("run {index}"));
                let sink = Rc::clone(&sink);
                Some(Box::new(move || sink.borrow_mut().push(format!("clean {index}"))) as Cleanup)
            })
        };
        let mut engine = Engine::new(computation, Box::new(DefaultParams));
        engine.replay(&bars_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        engine.dispose();
        assert_eq!(*log.borrow(), vec!["run 0", "clean 0", "run 2", "clean 2"]);
    }
}

mod structural_errors {
    use super::*;

    #[test]
    fn conditional_slot_kind_change_poisons() {
        let computation = |ctx: &mut Context| {
            if ctx.index() == 0 {
                ctx.cell(|| 0.0f64)?;
            } else {
                ctx.memo((), || 0.0f64)?;
            }
            Ok(())
        };
        let mut engine = Engine::new(computation, Box::new(DefaultParams));
        let bars = bars_from_closes(&[1.0, 2.0, 3.0]);
        engine.push_bar(&bars[0]).unwrap();
        let err = engine.push_bar(&bars[1]).unwrap_err();
        assert!(matches!(err, EngineError::SlotKindMismatch { .. }));
        assert!(err.is_structural());
        assert_eq!(engine.context().state(), CycleState::Poisoned);
        assert!(matches!(engine.push_bar(&bars[2]), Err(EngineError::Poisoned)));
    }

    #[test]
    fn conditional_call_in_one_node_does_not_disturb_siblings() {
        let computation = |ctx: &mut Context| {
            let close = ctx.inputs().close;
            let odd = ctx.index() % 2 == 1;
            ctx.scope("sometimes", |ctx| {
                if odd {
                    ctx.cell(|| 1u8)?;
                }
                Ok(())
            })?;
            ctx.scope("always", |ctx| {
                let out = ctx.series("X", close, Tags::new())?;
                let v = ctx.current(close);
                ctx.write(out, v)
            })
        };
        let mut engine = Engine::new(computation, Box::new(DefaultParams));
        engine.replay(&bars_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        let x = engine.find_series("X").unwrap();
        assert_eq!(engine.series(x).values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn effect_dependency_arity_change_poisons() {
        let computation = |ctx: &mut Context| {
            let deps = vec![0.0; ctx.index() + 1];
            ctx.effect(deps, |_| None)
        };
        let mut engine = Engine::new(computation, Box::new(DefaultParams));
        let bars = bars_from_closes(&[1.0, 2.0]);
        engine.push_bar(&bars[0]).unwrap();
        assert!(matches!(
            engine.push_bar(&bars[1]),
            Err(EngineError::DependencyArityChanged { previous: 1, current: 2, .. })
        ));
        assert_eq!(engine.context().state(), CycleState::Poisoned);
    }

    #[test]
    fn nothing_commits_from_a_failed_cycle() {
        let computation = |ctx: &mut Context| {
            let close = ctx.inputs().close;
            let out = ctx.series("Y", close, Tags::new())?;
            let v = ctx.current(close);
            ctx.write(out, v)?;
            if ctx.index() == 1 {
                ctx.write(out, v)?;
            }
            Ok(())
        };
        let mut engine = Engine::new(computation, Box::new(DefaultParams));
        let bars = bars_from_closes(&[1.0, 2.0]);
        engine.push_bar(&bars[0]).unwrap();
        assert!(matches!(engine.push_bar(&bars[1]), Err(EngineError::InvalidWrite { .. })));
        assert_eq!(engine.context().cycles(), 1);
    }
}

mod parameters {
    use super::*;

    #[test]
    fn parameters_are_read_once_per_instance() {
        let params = StaticParams::new().with_number("period", 4.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let computation = move |ctx: &mut Context| {
            sink.borrow_mut().push(ctx.param_period("period", 10));
            Ok(())
        };
        let mut engine = Engine::new(computation, Box::new(params));
        engine.replay(&bars_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(*seen.borrow(), vec![4, 4, 4]);
        assert_eq!(engine.context().param_schema().len(), 1);
    }
}
