//! Idle recovery: reseed the grid when nothing has forked for a while.

use std::{
    io,
    sync::{Arc, atomic::Ordering::Relaxed},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use bytecode::programs;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::{Anchor, Machine, install_program};

#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// Where fresh programs are installed.
    pub anchor: Anchor,
    pub interval: Duration,
    /// Side of the square the seeded replicator copies itself into.
    pub spawn_span: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            anchor: Anchor::new(512, 512),
            interval: Duration::from_secs(10),
            spawn_span: 1024,
        }
    }
}

pub struct Watchdog {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub fn spawn(machine: Arc<Machine>, config: WatchdogConfig) -> io::Result<Self> {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let stop2 = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("watchdog".to_string())
            .spawn(move || {
                let (ref mx, ref cv) = *stop2;
                let mut stopped = mx.lock();
                loop {
                    let deadline = Instant::now() + config.interval;
                    while !*stopped {
                        if cv.wait_until(&mut stopped, deadline).timed_out() {
                            break;
                        }
                    }
                    if *stopped {
                        break;
                    }
                    MutexGuard::unlocked(&mut stopped, || Self::check(&machine, &config));
                }
                log::debug!("watchdog stopped");
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// One watchdog round. Returns whether a new executor was started.
    pub fn check(machine: &Arc<Machine>, config: &WatchdogConfig) -> bool {
        if machine.counters.forks.swap(0, Relaxed) != 0 {
            return false;
        }
        log::info!(
            "no forks in the last {:?}, spawning new program at {}",
            config.interval,
            config.anchor
        );
        let program = programs::replicator(config.spawn_span);
        if let Err(err) = install_program(machine, config.anchor, &program) {
            log::warn!("could not seed {}: {err}", config.anchor);
            return false;
        }
        machine.fork(config.anchor)
    }

    pub fn stop(&self) {
        let (ref mx, ref cv) = *self.stop;
        *mx.lock() = true;
        cv.notify_all();
    }

    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("watchdog thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Collaborators, MachineCreateInfo};
    use bytecode::Slot;

    fn setup() -> (Arc<Machine>, WatchdogConfig) {
        let machine = Machine::with_collaborators(
            MachineCreateInfo {
                width: 64,
                height: 64,
                offset_region: 16,
                ..Default::default()
            },
            Collaborators::silent(),
        )
        .unwrap();
        let config = WatchdogConfig {
            anchor: Anchor::new(32, 32),
            interval: Duration::from_millis(10),
            spawn_span: 64,
        };
        (machine, config)
    }

    #[test]
    fn recent_forks_suppress_seeding() {
        let (m, config) = setup();
        m.counters.forks.store(3, Relaxed);
        assert!(!Watchdog::check(&m, &config));
        assert_eq!(m.counters.forks.load(Relaxed), 0);
        assert_eq!(m.read_radius(config.anchor, Slot::ProgramBase.radius()), Ok(0));
    }

    #[test]
    fn quiet_window_installs_and_forks() {
        let (m, config) = setup();
        // keep the seeded program from actually running
        let _held = m.admission.try_start(config.anchor).unwrap();

        assert!(!Watchdog::check(&m, &config));
        let program = programs::replicator(config.spawn_span);
        assert_eq!(
            m.read_radius(config.anchor, Slot::ProgramBase.radius()),
            Ok(program.words()[0])
        );
        assert_eq!(m.read_slot(config.anchor, Slot::StackPointer), Ok(program.stack_base()));
        // the refused fork still counts as activity
        assert_eq!(m.counters.forks.load(Relaxed), 1);
        assert!(!Watchdog::check(&m, &config));
        assert_eq!(m.counters.forks.load(Relaxed), 0);
    }

    #[test]
    fn seeding_off_grid_is_reported_not_fatal() {
        let (m, mut config) = setup();
        config.anchor = Anchor::new(0, 0);
        assert!(!Watchdog::check(&m, &config));
        assert_eq!(m.counters.started.load(Relaxed), 0);
    }

    #[test]
    fn stops_promptly() {
        let (m, config) = setup();
        let _held = m.admission.try_start(config.anchor).unwrap();
        let watchdog = Watchdog::spawn(m.clone(), config).unwrap();
        thread::sleep(Duration::from_millis(50));
        watchdog.stop();
        watchdog.join();
        assert_eq!(m.counters.started.load(Relaxed), 0);
    }
}
