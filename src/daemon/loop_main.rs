//! The monitoring loop: probe, classify, dispatch, persist, sleep, repeat.
//!
//! The scheduler owns every part it touches and receives all of them at
//! construction. One cycle walks the tracked services in list order; a
//! service whose probe fails is skipped for that cycle and the loop moves
//! on. Alert delivery for a service happens before its stored state is
//! overwritten, so a crash between the two re-alerts rather than staying
//! silent.
//!
//! Shutdown is a channel: `recv_timeout` doubles as the inter-cycle sleep,
//! and a `try_recv` between per-service checks keeps long service lists
//! responsive to signals.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::logger::AlertRecord;
use crate::logger::dual::DualLogger;
use crate::logger::jsonl::{EventKind, LogEvent};
use crate::monitor::probe::{self, UnitQuery};
use crate::monitor::transition::classify_transition;
use crate::notify::Dispatcher;
use crate::state::StateStore;

/// Loop parameters fixed at construction.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Sleep between checking cycles.
    pub interval: Duration,
    /// Tracked units, in check order.
    pub services: Vec<String>,
}

/// Tally of one checking cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Services probed this cycle.
    pub checked: usize,
    /// Alerts produced.
    pub alerts: usize,
    /// Probes that failed because the manager could not be queried.
    pub probe_faults: usize,
    /// State-file writes that failed.
    pub store_faults: usize,
    /// The cycle was cut short by a shutdown request.
    pub interrupted: bool,
}

/// Drives probe, classify, dispatch, and persist on a fixed interval.
pub struct MonitorScheduler {
    settings: SchedulerSettings,
    query: Box<dyn UnitQuery>,
    store: StateStore,
    dispatcher: Dispatcher,
    log: DualLogger,
    shutdown: Receiver<()>,
}

impl MonitorScheduler {
    /// Assemble a scheduler from explicit parts. Nothing in the loop reads
    /// ambient state; everything it touches arrives here.
    #[must_use]
    pub fn new(
        settings: SchedulerSettings,
        query: Box<dyn UnitQuery>,
        store: StateStore,
        dispatcher: Dispatcher,
        log: DualLogger,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            settings,
            query,
            store,
            dispatcher,
            log,
            shutdown,
        }
    }

    /// The live state map, for callers inspecting the loop's progress.
    #[must_use]
    pub const fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run until a shutdown request arrives (or the shutdown channel
    /// disconnects). Steady-state faults are logged, never fatal.
    pub fn run(&mut self) {
        self.log.event(&LogEvent::now(
            EventKind::MonitorStarted,
            None,
            format!(
                "monitoring {} service(s) every {}s",
                self.settings.services.len(),
                self.settings.interval.as_secs()
            ),
        ));

        let mut interrupted = self.initial_sweep().interrupted;
        while !interrupted {
            interrupted = match self.shutdown.recv_timeout(self.settings.interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
                Err(RecvTimeoutError::Timeout) => self.run_cycle().interrupted,
            };
        }

        self.log.event(&LogEvent::now(
            EventKind::MonitorStopped,
            None,
            "shutdown requested",
        ));
    }

    /// Startup sweep: a normal checking cycle that additionally journals
    /// every service's starting status. Services never seen before get a
    /// silent baseline; services whose state changed while the watchdog was
    /// down alert here, once.
    pub fn initial_sweep(&mut self) -> CycleReport {
        self.check_services(true)
    }

    /// One checking cycle over all tracked services.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.check_services(false)
    }

    fn check_services(&mut self, sweep: bool) -> CycleReport {
        let mut report = CycleReport::default();

        for unit in &self.settings.services {
            match self.shutdown.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => {
                    report.interrupted = true;
                    return report;
                }
                Err(TryRecvError::Empty) => {}
            }

            report.checked += 1;
            let current = match probe::probe(self.query.as_ref(), unit) {
                Ok(state) => state,
                Err(e) => {
                    // Skip the store update: a stale state beats a wrong one,
                    // and the next successful probe classifies against it.
                    report.probe_faults += 1;
                    self.log
                        .event(&LogEvent::now(EventKind::ProbeFault, Some(unit), e.to_string()));
                    continue;
                }
            };

            let previous = self.store.get(unit);

            if sweep {
                let (kind, detail) = match previous {
                    Some(prev) => (
                        EventKind::StartingStatus,
                        format!("last known {prev}, observed {current}"),
                    ),
                    None => (EventKind::Baseline, format!("baseline {current}")),
                };
                self.log.event(&LogEvent::now(kind, Some(unit), detail));
            }

            if let Some(alert) = classify_transition(unit, previous, current) {
                report.alerts += 1;
                let delivery = self.dispatcher.dispatch(&alert);
                self.log.alert(&AlertRecord::from_event(&alert, &delivery));
                if !delivery.delivered() {
                    self.log.event(&LogEvent::now(
                        EventKind::DispatchFault,
                        Some(unit),
                        delivery.failures.join("; "),
                    ));
                }
            }

            if let Err(e) = self.store.set(unit, current) {
                report.store_faults += 1;
                self.log
                    .event(&LogEvent::now(EventKind::StoreFault, Some(unit), e.to_string()));
            }
        }

        report
    }
}
