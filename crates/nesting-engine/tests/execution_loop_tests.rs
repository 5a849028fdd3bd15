//! 执行循环集成测试
//!
//! 在后台线程运行状态机，通过 `MachineHandle` 从测试线程控制。

use nesting_engine::{
    ChannelPublisher, EngineError, MachineState, StateEntry, StateMachineBuilder, StateRegistry,
    TransitionObserver, TransitionRules,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Cycle {
    Idle,
    Running,
    Paused,
    Finished,
}

impl MachineState for Cycle {
    fn name(&self) -> &'static str {
        match self {
            Cycle::Idle => "IDLE",
            Cycle::Running => "RUNNING",
            Cycle::Paused => "PAUSED",
            Cycle::Finished => "FINISHED",
        }
    }
}

const ALL: [Cycle; 4] = [Cycle::Idle, Cycle::Running, Cycle::Paused, Cycle::Finished];

fn rules() -> TransitionRules<Cycle> {
    TransitionRules::new()
        .allow(Cycle::Idle, Cycle::Running)
        .allow_all(Cycle::Running, [Cycle::Paused, Cycle::Finished])
        .allow_all(Cycle::Paused, [Cycle::Running, Cycle::Finished])
}

#[derive(Default)]
struct RecordingObserver {
    transitions: Mutex<Vec<(Cycle, Cycle)>>,
}

impl TransitionObserver<Cycle> for RecordingObserver {
    fn on_transition(&self, from: Cycle, to: Cycle) {
        self.transitions.lock().unwrap().push((from, to));
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// RUNNING 状态一直停留，直到控制线程请求转换
fn looping_registry(ticks: Arc<AtomicUsize>) -> StateRegistry<Cycle, ()> {
    let mut registry = StateRegistry::new();
    registry.register(StateEntry::new(Cycle::Idle).with_handler(|_| Some(Cycle::Running)));
    registry.register(StateEntry::new(Cycle::Running).with_handler(move |_| {
        ticks.fetch_add(1, Ordering::SeqCst);
        None
    }));
    registry.register(StateEntry::new(Cycle::Paused).with_handler(|_| None));
    registry
}

#[test]
fn test_requested_transitions_are_applied_between_ticks() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let (publisher, messages) = ChannelPublisher::new();
    let observer = Arc::new(RecordingObserver::default());

    let builder = StateMachineBuilder::new();
    let handle = builder.handle();
    let mut machine = builder
        .with_initial_state(Cycle::Idle)
        .with_transition_rules(rules())
        .with_state_registry(looping_registry(ticks.clone()))
        .with_context(())
        .with_message_broker(Arc::new(publisher))
        .with_state_topic("CYCLE_STATE")
        .with_observer(observer.clone())
        .build()
        .unwrap();

    let worker = thread::spawn(move || {
        machine.start_execution(Duration::from_millis(1)).unwrap();
        machine
    });

    assert!(wait_until(Duration::from_secs(2), || {
        handle.current_state() == Some(Cycle::Running) && ticks.load(Ordering::SeqCst) > 2
    }));

    handle.request_transition(Cycle::Paused).unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        handle.current_state() == Some(Cycle::Paused)
    }));

    // PAUSED → IDLE 非法：状态保持不变
    handle.request_transition(Cycle::Idle).unwrap();
    handle.request_transition(Cycle::Finished).unwrap();

    // FINISHED 没有 handler，循环自行结束
    let machine = worker.join().unwrap();
    assert_eq!(machine.current_state(), Cycle::Finished);
    assert!(!handle.is_running());

    let published: Vec<(String, String)> =
        messages.try_iter().map(|m| (m.topic, m.payload)).collect();
    assert_eq!(
        published,
        vec![
            ("CYCLE_STATE".to_string(), "RUNNING".to_string()),
            ("CYCLE_STATE".to_string(), "PAUSED".to_string()),
            ("CYCLE_STATE".to_string(), "FINISHED".to_string()),
        ]
    );
    assert_eq!(
        *observer.transitions.lock().unwrap(),
        vec![
            (Cycle::Idle, Cycle::Running),
            (Cycle::Running, Cycle::Paused),
            (Cycle::Paused, Cycle::Finished),
        ]
    );
}

#[test]
fn test_stop_execution_from_another_thread() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let builder = StateMachineBuilder::new();
    let handle = builder.handle();
    let mut machine = builder
        .with_initial_state(Cycle::Idle)
        .with_transition_rules(rules())
        .with_state_registry(looping_registry(ticks.clone()))
        .with_context(())
        .build()
        .unwrap();

    let worker = thread::spawn(move || machine.start_execution(Duration::from_millis(1)));

    assert!(wait_until(Duration::from_secs(2), || handle.is_running()));
    handle.stop_execution();
    assert_eq!(worker.join().unwrap(), Ok(()));

    // 停止后不再有节拍
    let after_stop = ticks.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(10));
    assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    assert_eq!(handle.current_state(), Some(Cycle::Running));
}

#[test]
fn test_request_after_machine_dropped() {
    let builder = StateMachineBuilder::<Cycle, ()>::new();
    let handle = builder.handle();
    let machine = builder
        .with_initial_state(Cycle::Idle)
        .with_transition_rules(rules())
        .with_state_registry(StateRegistry::new())
        .with_context(())
        .build()
        .unwrap();
    drop(machine);

    assert_eq!(
        handle.request_transition(Cycle::Running),
        Err(EngineError::ChannelClosed)
    );
}

proptest! {
    /// 任意 (from, to)：transition 成功当且仅当规则允许
    #[test]
    fn prop_transition_matches_rules(from_idx in 0usize..4, to_idx in 0usize..4) {
        let (from, to) = (ALL[from_idx], ALL[to_idx]);
        let mut registry = StateRegistry::new();
        for state in ALL {
            registry.register(StateEntry::<Cycle, ()>::new(state));
        }
        let mut machine = StateMachineBuilder::new()
            .with_initial_state(from)
            .with_transition_rules(rules())
            .with_state_registry(registry)
            .with_context(())
            .build()
            .unwrap();

        let allowed = rules().allows(from, to);
        let result = machine.transition(to);
        prop_assert_eq!(result.is_ok(), allowed);
        prop_assert_eq!(machine.current_state(), if allowed { to } else { from });
    }
}
