//! An instruction-level Atari 2600 core: a 6507/6502 CPU interpreter, a TIA
//! scanline renderer, and the memory bus that couples them.

pub mod bit_utils;
pub mod bus;
pub mod console;
pub mod cpu;
pub mod error;
pub mod logging;
pub mod riot;
pub mod tia;

pub use bus::Atari2600Bus;
pub use console::Console;
pub use cpu::{Cpu, Memory6502};
pub use error::{Atari2600Error, CpuError};
pub use tia::{Rgba, Tia, TiaSettings};
