//! Opportunistic rendering and stats reporting.
//!
//! There is no render thread. Between cycles every executor polls the clock
//! without blocking, and whichever one wins a tick does that tick's work.

use std::{
    sync::atomic::{AtomicU64, Ordering::Relaxed},
    thread,
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;

use crate::{Machine, PixelMemory};

/// Presents the pixel buffer somewhere. Best effort, never fails the caller.
pub trait Renderer: Send {
    fn present(&mut self, memory: &PixelMemory);
}

/// One report-tick worth of statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Report {
    /// Frames presented since the previous report.
    pub frames: u64,
    /// Executors running right now.
    pub active: usize,
    /// Executors started since the previous report.
    pub started: u64,
}

pub trait StatsSink: Send {
    fn report(&mut self, report: &Report);
}

/// Writes reports to the `log` facade.
#[derive(Debug, Default)]
pub struct LogStats;

impl StatsSink for LogStats {
    fn report(&mut self, report: &Report) {
        log::info!(
            "FPS: {} Current executions: {} Started: {}",
            report.frames,
            report.active,
            report.started
        );
    }
}

/// Two periodic signals. The machine owns the one clock every executor
/// polls, so each tick is taken by exactly one of them. Not `Clone`: a cloned
/// tick receiver would run a ticker of its own.
#[derive(Debug)]
pub struct Clock {
    render: Receiver<Instant>,
    report: Receiver<Instant>,
}

impl Clock {
    pub fn new(render_interval: Duration, report_interval: Duration) -> Self {
        Self {
            render: channel::tick(render_interval),
            report: channel::tick(report_interval),
        }
    }

    /// Drive the clock by hand.
    pub fn from_receivers(render: Receiver<Instant>, report: Receiver<Instant>) -> Self {
        Self { render, report }
    }

    /// A clock that never ticks.
    pub fn never() -> Self {
        Self {
            render: channel::never(),
            report: channel::never(),
        }
    }
}

/// What a poll ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Render,
    Report,
    Idle,
}

pub struct Rendezvous {
    clock: Clock,
    renderer: Mutex<Box<dyn Renderer>>,
    stats: Mutex<Box<dyn StatsSink>>,
    frames: AtomicU64,
    idle_sleep: Duration,
}

impl Rendezvous {
    pub fn new(
        clock: Clock,
        renderer: Box<dyn Renderer>,
        stats: Box<dyn StatsSink>,
        idle_sleep: Duration,
    ) -> Self {
        Self {
            clock,
            renderer: Mutex::new(renderer),
            stats: Mutex::new(stats),
            frames: AtomicU64::new(0),
            idle_sleep,
        }
    }

    /// Take at most one pending tick; yield briefly if there is none.
    pub fn poll(&self, machine: &Machine) -> Tick {
        crossbeam::select! {
            recv(self.clock.render) -> _ => {
                self.frames.fetch_add(1, Relaxed);
                // a slow presenter must not stall other executors
                if let Some(mut renderer) = self.renderer.try_lock() {
                    renderer.present(&machine.memory);
                }
                Tick::Render
            }
            recv(self.clock.report) -> _ => {
                let report = Report {
                    frames: self.frames.swap(0, Relaxed),
                    active: machine.admission.active(),
                    started: machine.counters.started.swap(0, Relaxed),
                };
                self.stats.lock().report(&report);
                Tick::Report
            }
            default => {
                thread::sleep(self.idle_sleep);
                Tick::Idle
            }
        }
    }

    /// Frames counted since the last report.
    pub fn frames(&self) -> u64 {
        self.frames.load(Relaxed)
    }
}

impl std::fmt::Debug for Rendezvous {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rendezvous")
            .field("clock", &self.clock)
            .field("frames", &self.frames)
            .field("idle_sleep", &self.idle_sleep)
            .finish_non_exhaustive()
    }
}
