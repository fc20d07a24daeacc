use crate::simulation::control::{EngineControl, EngineState};
use crate::simulation::observer::Observer;
use crate::simulation::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;

pub struct WatchObserver {
    sender: watch::Sender<Arc<Snapshot>>,
}

impl WatchObserver {
    pub fn new(initial: Snapshot) -> (Self, watch::Receiver<Arc<Snapshot>>) {
        let (sender, receiver) = watch::channel(Arc::new(initial));
        (Self { sender }, receiver)
    }
}

impl Observer for WatchObserver {
    fn show(&mut self, snapshot: &Snapshot) {
        // send_replace keeps working after every receiver is gone
        self.sender.send_replace(Arc::new(snapshot.clone()));
    }
}

#[derive(Clone)]
pub struct EngineStream {
    pub control: EngineControl,
    snapshots: watch::Receiver<Arc<Snapshot>>,
}

impl EngineStream {
    pub fn new(control: EngineControl, snapshots: watch::Receiver<Arc<Snapshot>>) -> Self {
        Self { control, snapshots }
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> EngineState {
        self.control.state()
    }
}

#[derive(Clone, Default)]
pub struct StateStream {
    engines: Vec<EngineStream>,
}

impl StateStream {
    pub fn new(engines: Vec<EngineStream>) -> Self {
        Self { engines }
    }

    pub fn engines(&self) -> &[EngineStream] {
        &self.engines
    }

    pub fn engine(&self, index: usize) -> Option<&EngineStream> {
        self.engines.get(index)
    }

    pub fn select(&self, index: Option<usize>) -> Vec<(usize, &EngineStream)> {
        match index {
            Some(index) => self.engine(index).map(|engine| (index, engine)).into_iter().collect(),
            None => self.engines.iter().enumerate().collect(),
        }
    }
}
