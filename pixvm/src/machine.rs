use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering::Relaxed},
    },
    thread,
    time::Duration,
};

use bytecode::Slot;

use crate::{
    AddressSpace, Admission, Anchor, Clock, ConfigError, Fault, Interpreter, Location, LogStats,
    MAX_REGION, NotAddressable, NullRenderer, OffsetTable, PixelMemory, Renderer, Rendezvous,
    StatsSink, Tick,
};

/// Largest grid side a 12-bit coordinate can name.
pub const MAX_GRID_SIDE: u32 = 1 << 12;

#[derive(Debug, Clone)]
pub struct MachineCreateInfo {
    pub width: u32,
    pub height: u32,
    /// Half-size of the square the offset table is walked over.
    pub offset_region: u32,
    pub max_executors: usize,
    pub render_interval: Duration,
    pub report_interval: Duration,
    /// How long an executor naps between cycles when no tick is pending.
    pub idle_sleep: Duration,
}

impl Default for MachineCreateInfo {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            offset_region: 1024,
            max_executors: 100,
            render_interval: Duration::from_millis(16),
            report_interval: Duration::from_secs(1),
            idle_sleep: Duration::from_nanos(100),
        }
    }
}

impl MachineCreateInfo {
    fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        if width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge { width, height });
        }
        if self.offset_region < 2 {
            return Err(ConfigError::RegionTooSmall(self.offset_region));
        }
        if self.offset_region > MAX_REGION {
            return Err(ConfigError::RegionTooLarge {
                got: self.offset_region,
                max: MAX_REGION,
            });
        }
        if self.max_executors == 0 {
            return Err(ConfigError::NoExecutors);
        }
        Ok(())
    }
}

/// Everything outside the core the machine talks to.
pub struct Collaborators {
    pub clock: Clock,
    pub renderer: Box<dyn Renderer>,
    pub stats: Box<dyn StatsSink>,
}

impl Collaborators {
    /// Real clock, no display, stats to the log.
    pub fn headless(info: &MachineCreateInfo) -> Self {
        Self {
            clock: Clock::new(info.render_interval, info.report_interval),
            renderer: Box::new(NullRenderer::new()),
            stats: Box::new(LogStats),
        }
    }

    /// A clock that never ticks.
    pub fn silent() -> Self {
        Self {
            clock: Clock::never(),
            renderer: Box::new(NullRenderer::new()),
            stats: Box::new(LogStats),
        }
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    /// Executors started since the last stats report.
    pub started: AtomicU64,
    /// Fork requests since the watchdog last looked, refused ones included.
    pub forks: AtomicU64,
}

/// The runtime context every executor shares.
#[derive(Debug)]
pub struct Machine {
    pub memory: PixelMemory,
    pub space: AddressSpace,
    pub admission: Arc<Admission>,
    pub counters: Counters,
    rendezvous: Rendezvous,
}

impl Machine {
    pub fn new(info: MachineCreateInfo) -> Result<Arc<Self>, ConfigError> {
        let collaborators = Collaborators::headless(&info);
        Self::with_collaborators(info, collaborators)
    }

    pub fn with_collaborators(
        info: MachineCreateInfo,
        collaborators: Collaborators,
    ) -> Result<Arc<Self>, ConfigError> {
        info.validate()?;
        let offsets = OffsetTable::generate(info.offset_region);
        let Collaborators {
            clock,
            renderer,
            stats,
        } = collaborators;

        Ok(Arc::new(Self {
            memory: PixelMemory::new(info.width, info.height),
            space: AddressSpace::new(offsets, info.width, info.height),
            admission: Arc::new(Admission::new(info.width, info.height, info.max_executors)),
            counters: Counters::default(),
            rendezvous: Rendezvous::new(clock, renderer, stats, info.idle_sleep),
        }))
    }

    #[inline]
    pub fn resolve(&self, anchor: Anchor, radius: u32) -> Result<Location, NotAddressable> {
        self.space.resolve(anchor, radius)
    }

    pub fn read_radius(&self, anchor: Anchor, radius: u32) -> Result<u32, NotAddressable> {
        self.resolve(anchor, radius).map(|loc| self.memory.read(loc))
    }

    pub fn write_radius(
        &self,
        anchor: Anchor,
        radius: u32,
        value: u32,
    ) -> Result<(), NotAddressable> {
        self.resolve(anchor, radius).map(|loc| self.memory.write(loc, value))
    }

    pub fn read_slot(&self, anchor: Anchor, slot: Slot) -> Result<u32, NotAddressable> {
        self.read_radius(anchor, slot.radius())
    }

    pub fn write_slot(
        &self,
        anchor: Anchor,
        slot: Slot,
        value: u32,
    ) -> Result<(), NotAddressable> {
        self.write_radius(anchor, slot.radius(), value)
    }

    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }

    /// Non-blocking check of the shared clock.
    pub fn poll_clock(&self) -> Tick {
        self.rendezvous.poll(self)
    }

    /// Ask for a new executor at `anchor`.
    ///
    /// Never blocks and never fails loudly: a refused or unspawnable fork is
    /// dropped and `false` returned.
    pub fn fork(self: &Arc<Self>, anchor: Anchor) -> bool {
        self.counters.forks.fetch_add(1, Relaxed);
        let guard = match self.admission.try_start(anchor) {
            Ok(guard) => guard,
            Err(err) => {
                log::trace!("fork at {anchor} dropped: {err}");
                return false;
            }
        };
        self.counters.started.fetch_add(1, Relaxed);

        let machine = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("exec-{}-{}", anchor.x, anchor.y))
            .spawn(move || {
                let _guard = guard;
                log::trace!("executor {anchor} started");
                let mut interpreter = Interpreter::new(machine, anchor);
                let fault = interpreter.run();
                let cycles = interpreter.cycles();
                if let Fault::UnknownInstruction(_) = fault {
                    log::warn!("executor {anchor} stopped after {cycles} cycles: {fault}");
                } else {
                    log::debug!("executor {anchor} stopped after {cycles} cycles: {fault}");
                }
            });

        // a failed spawn drops the closure, and the guard with it
        if let Err(err) = spawned {
            log::warn!("could not spawn executor at {anchor}: {err}");
            return false;
        }
        true
    }
}
