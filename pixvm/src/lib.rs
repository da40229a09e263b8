mod address;
mod admission;
mod error;
mod image;
mod interpreter;
mod machine;
mod memory;
mod offsets;
mod render;
mod rendezvous;
mod watchdog;

pub use address::{AddressSpace, Anchor};
pub use admission::{Admission, ExecutorGuard};
pub use error::{AdmissionError, ConfigError, Fault, InstallError, NotAddressable};
pub use image::{ImageWriter, install_program};
pub use interpreter::Interpreter;
pub use machine::{Collaborators, Counters, MAX_GRID_SIDE, Machine, MachineCreateInfo};
pub use memory::{CHANNELS, Location, PixelMemory};
pub use offsets::{MAX_REGION, Offset, OffsetTable};
pub use render::{NullRenderer, TerminalRenderer, restore_terminal};
pub use rendezvous::{Clock, LogStats, Renderer, Rendezvous, Report, StatsSink, Tick};
pub use watchdog::{Watchdog, WatchdogConfig};
