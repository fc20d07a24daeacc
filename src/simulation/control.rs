//! Worker thread that runs one engine. Control calls update a gate under
//! its mutex and wake the worker through the condition variable, which also
//! times the inter-tick delay.

use super::observer::Observer;
use super::SimulationEngine;
use crate::animal::lineage::ObservedReport;
use crate::animal::AnimalId;
use crate::error::ControlError;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Paused,
    Running,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Observe(AnimalId, bool),
}

#[derive(Debug, Default)]
struct Gate {
    running: bool,
    terminate: bool,
    finished: bool,
    commands: VecDeque<Command>,
}

impl Gate {
    fn state(&self) -> EngineState {
        if self.finished || self.terminate {
            EngineState::Terminated
        } else if self.running {
            EngineState::Running
        } else {
            EngineState::Paused
        }
    }
}

#[derive(Debug)]
struct Shared {
    gate: Mutex<Gate>,
    wake: Condvar,
    report: watch::Sender<Option<ObservedReport>>,
}

impl Shared {
    fn new(report: Option<ObservedReport>) -> Self {
        let (report, _) = watch::channel(report);
        Self {
            gate: Mutex::new(Gate::default()),
            wake: Condvar::new(),
            report,
        }
    }

    fn publish_report(&self, engine: &SimulationEngine) {
        self.report.send_replace(engine.observed_report());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub tick_delay: Duration,
    pub max_days: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick_delay: Duration::from_millis(300),
            max_days: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineControl {
    shared: Arc<Shared>,
}

impl EngineControl {
    pub fn state(&self) -> EngineState {
        self.shared.gate.lock().state()
    }

    pub fn start(&self) -> Result<(), ControlError> {
        self.set_running(true)
    }

    pub fn stop(&self) -> Result<(), ControlError> {
        self.set_running(false)
    }

    fn set_running(&self, running: bool) -> Result<(), ControlError> {
        let mut gate = self.shared.gate.lock();
        if gate.state() == EngineState::Terminated {
            return Err(ControlError::Terminated);
        }
        if gate.running != running {
            log::info!("Simulation {}", if running { "started" } else { "paused" });
        }
        gate.running = running;
        self.shared.wake.notify_all();
        Ok(())
    }

    pub fn request_termination(&self) {
        let mut gate = self.shared.gate.lock();
        gate.terminate = true;
        self.shared.wake.notify_all();
    }

    // Queues a lineage toggle. Only accepted while paused; the worker
    // applies it and refreshes the observed report.
    pub fn set_observed(&self, id: AnimalId, observed: bool) -> Result<(), ControlError> {
        let mut gate = self.shared.gate.lock();
        match gate.state() {
            EngineState::Terminated => Err(ControlError::Terminated),
            EngineState::Running => Err(ControlError::NotPaused),
            EngineState::Paused => {
                gate.commands.push_back(Command::Observe(id, observed));
                self.shared.wake.notify_all();
                Ok(())
            }
        }
    }

    pub fn observed_report(&self) -> Option<ObservedReport> {
        self.shared.report.borrow().clone()
    }

    pub fn subscribe_observed(&self) -> watch::Receiver<Option<ObservedReport>> {
        self.shared.report.subscribe()
    }
}

pub struct EngineHandle {
    control: EngineControl,
    worker: JoinHandle<SimulationEngine>,
}

impl EngineHandle {
    pub fn spawn<O>(engine: SimulationEngine, observer: O, options: RunOptions) -> std::io::Result<Self>
    where
        O: Observer + Send + 'static,
    {
        let shared = Arc::new(Shared::new(engine.observed_report()));
        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name(format!("engine-{}", engine.boundary()))
            .spawn(move || run_engine(engine, observer, options, &worker_shared))?;

        Ok(Self {
            control: EngineControl { shared },
            worker,
        })
    }

    pub fn control(&self) -> EngineControl {
        self.control.clone()
    }

    pub fn start(&self) -> Result<(), ControlError> {
        self.control.start()
    }

    pub fn stop(&self) -> Result<(), ControlError> {
        self.control.stop()
    }

    pub fn request_termination(&self) {
        self.control.request_termination()
    }

    pub fn state(&self) -> EngineState {
        self.control.state()
    }

    pub fn join(self) -> thread::Result<SimulationEngine> {
        self.worker.join()
    }
}

enum Step {
    Commands(VecDeque<Command>),
    Tick,
    Exit,
}

fn run_engine<O: Observer>(
    mut engine: SimulationEngine,
    mut observer: O,
    options: RunOptions,
    shared: &Shared,
) -> SimulationEngine {
    log::info!("{} engine ready on day {}", engine.boundary(), engine.day());

    loop {
        match next_step(shared) {
            Step::Exit => break,
            Step::Commands(commands) => {
                for command in commands {
                    apply(&mut engine, command);
                }
                // no tick completed, so the observer is not called
                shared.publish_report(&engine);
            }
            Step::Tick => {
                if !engine.tick() {
                    break;
                }
                observer.show(&engine.snapshot());
                shared.publish_report(&engine);

                if options.max_days.is_some_and(|max| engine.day() >= max) {
                    log::info!("{} engine reached day {}", engine.boundary(), engine.day());
                    break;
                }
                if wait_for_next_tick(shared, options.tick_delay) {
                    break;
                }
            }
        }
    }

    engine.request_termination();
    let mut gate = shared.gate.lock();
    gate.finished = true;
    gate.running = false;
    gate.commands.clear();
    engine
}

fn next_step(shared: &Shared) -> Step {
    let mut gate = shared.gate.lock();
    loop {
        if gate.terminate {
            return Step::Exit;
        }
        if !gate.commands.is_empty() {
            return Step::Commands(std::mem::take(&mut gate.commands));
        }
        if gate.running {
            return Step::Tick;
        }
        shared.wake.wait(&mut gate);
    }
}

fn wait_for_next_tick(shared: &Shared, delay: Duration) -> bool {
    let deadline = Instant::now() + delay;
    let mut gate = shared.gate.lock();
    while !gate.terminate {
        if shared.wake.wait_until(&mut gate, deadline).timed_out() {
            break;
        }
        log::debug!("Inter-tick wait interrupted, resuming");
    }
    gate.terminate
}

fn apply(engine: &mut SimulationEngine, command: Command) {
    match command {
        Command::Observe(id, observed) => {
            if let Err(e) = engine.set_observed(id, observed) {
                log::warn!("Could not change observation of animal {}: {}", id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::simulation::Snapshot;
    use crate::world::Boundary;
    use std::sync::mpsc;

    fn wait_for_report(control: &EngineControl, expected: Option<AnimalId>) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if control.observed_report().map(|report| report.id) == expected {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn spawn(delay_ms: u64, max_days: Option<u64>) -> (EngineHandle, mpsc::Receiver<Snapshot>) {
        let engine = SimulationEngine::new(&Config::default(), Boundary::Wrap, Some(8));
        let (tx, rx) = mpsc::channel();
        let observer = move |snapshot: &Snapshot| {
            let _ = tx.send(snapshot.clone());
        };
        let options = RunOptions {
            tick_delay: Duration::from_millis(delay_ms),
            max_days,
        };
        (EngineHandle::spawn(engine, observer, options).unwrap(), rx)
    }

    #[test]
    fn test_worker_starts_paused() {
        let (handle, rx) = spawn(0, None);
        assert_eq!(handle.state(), EngineState::Paused);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        handle.request_termination();
        let engine = handle.join().unwrap();
        assert_eq!(engine.day(), 0);
        assert!(engine.is_terminated());
    }

    #[test]
    fn test_start_publishes_consecutive_days() {
        let (handle, rx) = spawn(1, None);
        handle.start().unwrap();
        assert_eq!(handle.state(), EngineState::Running);

        let days: Vec<u64> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap().metrics.day)
            .collect();
        assert_eq!(days, vec![1, 2, 3]);

        handle.request_termination();
        assert_eq!(handle.state(), EngineState::Terminated);
        let engine = handle.join().unwrap();
        assert!(engine.day() >= 3);
    }

    #[test]
    fn test_stop_halts_ticks() {
        let (handle, rx) = spawn(1, None);
        handle.start().unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        handle.stop().unwrap();
        // drain what was published before the pause took effect
        while rx.recv_timeout(Duration::from_millis(50)).is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        handle.start().unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        handle.request_termination();
        handle.join().unwrap();
    }

    #[test]
    fn test_termination_interrupts_long_delay() {
        let (handle, rx) = spawn(60_000, None);
        handle.start().unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let started = Instant::now();
        handle.request_termination();
        let engine = handle.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(engine.day(), 1);
    }

    #[test]
    fn test_max_days_ends_run() {
        let (handle, rx) = spawn(0, Some(4));
        let control = handle.control();
        control.start().unwrap();

        let engine = handle.join().unwrap();
        assert_eq!(engine.day(), 4);
        assert_eq!(rx.try_iter().count(), 4);
        assert_eq!(control.state(), EngineState::Terminated);
        assert_eq!(control.start(), Err(ControlError::Terminated));
    }

    #[test]
    fn test_observe_requires_pause() {
        let (handle, rx) = spawn(1, None);
        let control = handle.control();

        assert!(control.observed_report().is_none());
        control.set_observed(0, true).unwrap();
        assert!(wait_for_report(&control, Some(0)));

        control.start().unwrap();
        let snapshot = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(snapshot.metrics.day, 1);
        assert_eq!(snapshot.observed.map(|report| report.id), Some(0));
        assert_eq!(control.set_observed(0, false), Err(ControlError::NotPaused));

        control.request_termination();
        assert_eq!(control.set_observed(0, false), Err(ControlError::Terminated));
        handle.join().unwrap();
    }

    #[test]
    fn test_observation_changes_do_not_reach_observer() {
        let (handle, rx) = spawn(1, None);
        let control = handle.control();
        let mut changes = control.subscribe_observed();

        control.set_observed(0, true).unwrap();
        control.set_observed(0, false).unwrap();
        control.set_observed(1, true).unwrap();
        assert!(wait_for_report(&control, Some(1)));
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().as_ref().map(|report| report.id), Some(1));

        control.request_termination();
        let engine = handle.join().unwrap();
        assert_eq!(engine.day(), 0);
        assert_eq!(rx.try_iter().count(), 0);
    }
}
