//! Integration tests for the orchestration public API.

use std::sync::{Arc, Mutex};

use cadence::context::RunContext;
use cadence::error::{CadenceError, Result};
use cadence::plan::{Label, Registry, RunOutcome, Sequence, Step, StepDescription};
use cadence::plugins::PluginLoader;
use cadence::status::{MemorySink, TaskStatus};

/// A step that records its tag into a shared log when executed.
struct Recorded {
    sequence: Sequence,
    description: StepDescription,
    label: Option<Label>,
    weight: Option<f64>,
    fail: bool,
    tag: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    fn boxed(sequence: Sequence, tag: &str, log: &Arc<Mutex<Vec<String>>>) -> Box<Recorded> {
        Box::new(Recorded {
            sequence,
            description: StepDescription::plain(tag),
            label: None,
            weight: Some(1.0),
            fail: false,
            tag: tag.to_string(),
            log: Arc::clone(log),
        })
    }
}

impl Step for Recorded {
    fn sequence(&self) -> Option<Sequence> {
        Some(self.sequence.clone())
    }

    fn description(&self) -> StepDescription {
        self.description.clone()
    }

    fn label(&self) -> Option<Label> {
        self.label.clone()
    }

    fn weight(&self, _ctx: &RunContext) -> Option<f64> {
        self.weight
    }

    fn execute(&self, _ctx: &RunContext) -> Result<()> {
        if self.fail {
            return Err(CadenceError::StepFailed {
                step: self.tag.clone(),
                message: format!("{} blew up", self.tag),
            });
        }
        self.log.lock().unwrap().push(self.tag.clone());
        Ok(())
    }
}

fn shared_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn plugin_driven_population_runs_steps_in_key_order() {
    let log = shared_log();

    let mut loader = PluginLoader::new();
    let hook_log = Arc::clone(&log);
    loader.add("inventory", move |registry: &mut Registry| {
        registry.register(Recorded::boxed(Sequence::At(300), "third", &hook_log));
        registry.register(Recorded::boxed(Sequence::At(100), "first", &hook_log));
        Ok(())
    });
    let hook_log = Arc::clone(&log);
    loader.add("forecast", move |registry: &mut Registry| {
        registry.register(Recorded::boxed(Sequence::At(200), "second", &hook_log));
        Ok(())
    });

    let modules: Vec<String> = ["inventory", "forecast", "not_installed"]
        .iter()
        .map(|m| m.to_string())
        .collect();

    let mut registry = Registry::new();
    registry.populate(&loader, &modules).unwrap();

    let outcome = registry.run(&RunContext::new(), None).unwrap();
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn parallel_lanes_interleave_but_both_complete() {
    let log = shared_log();
    let mut registry = Registry::new();

    registry.register(Recorded::boxed(Sequence::At(100), "before", &log));
    registry.register(Recorded::boxed(
        Sequence::lane(200, "odd", 201),
        "odd",
        &log,
    ));
    registry.register(Recorded::boxed(
        Sequence::lane(200, "even", 202),
        "even",
        &log,
    ));
    registry.register(Recorded::boxed(Sequence::At(300), "after", &log));
    registry.sort();

    registry.run(&RunContext::new(), None).unwrap();

    let ran = log.lock().unwrap().clone();
    assert_eq!(ran.len(), 4);
    assert_eq!(ran.first().unwrap(), "before");
    assert_eq!(ran.last().unwrap(), "after");
    assert!(ran.contains(&"odd".to_string()));
    assert!(ran.contains(&"even".to_string()));
}

#[test]
fn parallel_slot_weighs_as_its_longest_lane() {
    let log = shared_log();
    let mut registry = Registry::new();

    registry.register(Box::new(Recorded {
        sequence: Sequence::lane(100, "short", 101),
        description: StepDescription::plain("short lane"),
        label: None,
        weight: Some(3.0),
        fail: false,
        tag: "short".into(),
        log: Arc::clone(&log),
    }));
    registry.register(Box::new(Recorded {
        sequence: Sequence::lane(100, "long", 102),
        description: StepDescription::plain("long lane"),
        label: None,
        weight: Some(5.0),
        fail: false,
        tag: "long".into(),
        log: Arc::clone(&log),
    }));
    registry.register(Recorded::boxed(Sequence::At(200), "tail", &log));

    // Critical path: max(3, 5) for the parallel slot, plus 1 for the tail.
    assert_eq!(registry.total_weight(&RunContext::new()), 6.0);
}

#[test]
fn failing_lane_does_not_stop_its_sibling() {
    let log = shared_log();
    let mut registry = Registry::new();

    registry.register(Box::new(Recorded {
        sequence: Sequence::lane(100, "a", 101),
        description: StepDescription::plain("lane a"),
        label: None,
        weight: Some(1.0),
        fail: true,
        tag: "lane-a".into(),
        log: Arc::clone(&log),
    }));
    registry.register(Recorded::boxed(
        Sequence::lane(100, "b", 102),
        "lane-b",
        &log,
    ));
    registry.sort();

    let err = registry.run(&RunContext::new(), None).unwrap_err();

    // Lane B's side effect is observed, and the surfaced error is lane A's.
    assert!(log.lock().unwrap().contains(&"lane-b".to_string()));
    assert!(err.to_string().contains("lane-a"));
}

#[test]
fn hot_swap_takes_the_latest_registration() {
    let log = shared_log();
    let mut registry = Registry::new();
    registry.register(Recorded::boxed(Sequence::At(100), "v1", &log));
    registry.register(Recorded::boxed(Sequence::At(100), "v2", &log));
    registry.sort();

    registry.run(&RunContext::new(), None).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["v2"]);
}

#[test]
fn unregistered_step_is_gone_and_never_runs() {
    let log = shared_log();
    let mut registry = Registry::new();
    registry.register(Recorded::boxed(Sequence::At(100), "kept", &log));
    registry.register(Recorded::boxed(Sequence::At(200), "dropped", &log));

    let duplicate = Recorded::boxed(Sequence::At(200), "dropped", &log);
    registry.unregister(duplicate.as_ref());

    assert!(registry.get_step(&Sequence::At(200)).is_none());
    registry.sort();
    registry.run(&RunContext::new(), None).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["kept"]);
}

#[test]
fn canceling_sink_stops_the_run_before_any_step() {
    let log = shared_log();
    let mut registry = Registry::new();
    registry.register(Recorded::boxed(Sequence::At(100), "never", &log));
    registry.sort();

    let mut sink = MemorySink::with_status(TaskStatus::Canceling);
    let inspect = sink.clone();
    let outcome = registry.run(&RunContext::new(), Some(&mut sink)).unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(inspect.record().unwrap().status, TaskStatus::Cancelled);
}

#[test]
fn progress_messages_follow_step_descriptions() {
    let log = shared_log();
    let mut registry = Registry::new();
    registry.register(Recorded::boxed(Sequence::At(100), "load data", &log));
    registry.register(Recorded::boxed(Sequence::At(200), "generate plan", &log));
    registry.sort();

    let mut sink = MemorySink::new();
    let inspect = sink.clone();
    registry.run(&RunContext::new(), Some(&mut sink)).unwrap();

    let updates = inspect.updates();
    assert_eq!(updates[0].status, TaskStatus::Progress(0));
    assert_eq!(updates[0].message, "load data");
    assert_eq!(updates[1].status, TaskStatus::Progress(50));
    assert_eq!(updates[1].message, "generate plan");
    assert_eq!(updates.last().unwrap().status, TaskStatus::Done);
}

#[test]
fn labels_are_gathered_across_lanes() {
    let log = shared_log();
    let mut registry = Registry::new();
    registry.register(Box::new(Recorded {
        sequence: Sequence::lane(100, "odd", 101),
        description: StepDescription::plain("odd clusters"),
        label: Some(Label::new("plan", "Generate plan")),
        weight: Some(1.0),
        fail: false,
        tag: "odd".into(),
        log: Arc::clone(&log),
    }));
    registry.register(Box::new(Recorded {
        sequence: Sequence::lane(100, "even", 102),
        description: StepDescription::plain("even clusters"),
        label: Some(Label::new("plan", "Generate plan")),
        weight: Some(1.0),
        fail: false,
        tag: "even".into(),
        log: Arc::clone(&log),
    }));

    let labels = registry.labels();
    assert_eq!(labels, vec![Label::new("plan", "Generate plan")]);
}

#[test]
fn context_parameters_reach_every_step() {
    struct ParamSensitive {
        log: Arc<Mutex<Vec<String>>>,
    }
    impl Step for ParamSensitive {
        fn sequence(&self) -> Option<Sequence> {
            Some(Sequence::At(100))
        }
        fn description(&self) -> StepDescription {
            StepDescription::plain("conditional")
        }
        fn weight(&self, ctx: &RunContext) -> Option<f64> {
            // Skipped entirely unless the run asks for it.
            ctx.param("enabled")
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
                .then_some(1.0)
        }
        fn execute(&self, ctx: &RunContext) -> Result<()> {
            self.log.lock().unwrap().push(ctx.database.clone());
            Ok(())
        }
    }

    let log = shared_log();
    let mut registry = Registry::new();
    registry.register(Box::new(ParamSensitive {
        log: Arc::clone(&log),
    }));
    registry.sort();

    let off = RunContext::new().with_database("scenario1");
    registry.run(&off, None).unwrap();
    assert!(log.lock().unwrap().is_empty());

    let on = RunContext::new()
        .with_database("scenario1")
        .with_param("enabled", serde_json::json!(true));
    registry.run(&on, None).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["scenario1"]);
}
