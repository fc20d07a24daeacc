use super::Snapshot;

/// Receives a snapshot after every completed day.
pub trait Observer {
    fn show(&mut self, snapshot: &Snapshot);
}

impl<F> Observer for F
where
    F: FnMut(&Snapshot),
{
    fn show(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

pub struct LogObserver {
    interval_days: u64,
}

impl LogObserver {
    pub fn new(interval_days: u64) -> Self {
        Self {
            interval_days: interval_days.max(1),
        }
    }

    fn should_log(&self, snapshot: &Snapshot) -> bool {
        snapshot.metrics.population == 0 || snapshot.metrics.day % self.interval_days == 0
    }
}

impl Observer for LogObserver {
    fn show(&mut self, snapshot: &Snapshot) {
        if !self.should_log(snapshot) {
            return;
        }

        let metrics = &snapshot.metrics;
        log::info!(
            "[{}] Day: {} | Animals: {} | Grass: {} | Avg Energy: {:.2} | Avg Lifetime: {:.2} | Avg Children: {:.2} | Magic: {}",
            snapshot.boundary,
            metrics.day,
            metrics.population,
            metrics.grass,
            metrics.avg_energy,
            metrics.avg_lifetime,
            metrics.avg_children,
            metrics.magic_born
        );
        if let Some(genome) = &snapshot.dominant_genome {
            log::debug!("[{}] Dominant genotype: {}", snapshot.boundary, genome);
        }
        if let Some(report) = &snapshot.observed {
            log::info!(
                "[{}] Observed animal {}: {} children, {} descendants, death day: {}",
                snapshot.boundary,
                report.id,
                report.children_since_observed,
                report.descendants,
                report.fate
            );
        }
    }
}

#[derive(Default)]
pub struct Fanout {
    observers: Vec<Box<dyn Observer + Send>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl Observer + Send + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for Fanout {
    fn show(&mut self, snapshot: &Snapshot) {
        for observer in &mut self.observers {
            observer.show(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::simulation::SimulationEngine;
    use crate::world::Boundary;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn snapshot() -> Snapshot {
        SimulationEngine::new(&Config::default(), Boundary::Wrap, Some(3)).snapshot()
    }

    #[test]
    fn test_closure_observer() {
        let mut days = Vec::new();
        {
            let mut observer = |snapshot: &Snapshot| days.push(snapshot.metrics.day);
            observer.show(&snapshot());
        }
        assert_eq!(days, vec![0]);
    }

    #[test]
    fn test_fanout_reaches_every_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = seen.clone();
        let second = seen.clone();

        let mut fanout = Fanout::new()
            .with(move |s: &Snapshot| first.lock().push(("first", s.metrics.population)))
            .with(move |s: &Snapshot| second.lock().push(("second", s.metrics.population)));
        assert_eq!(fanout.len(), 2);

        fanout.show(&snapshot());
        assert_eq!(*seen.lock(), vec![("first", 20), ("second", 20)]);
    }

    #[test]
    fn test_log_observer_interval() {
        let observer = LogObserver::new(10);
        let mut snapshot = snapshot();

        snapshot.metrics.day = 10;
        assert!(observer.should_log(&snapshot));
        snapshot.metrics.day = 11;
        assert!(!observer.should_log(&snapshot));
        snapshot.metrics.population = 0;
        assert!(observer.should_log(&snapshot));
    }
}
