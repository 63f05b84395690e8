//! The console: wires the CPU to the bus and drives the CPU/TIA step loop.

use std::collections::HashSet;

use crate::bus::Atari2600Bus;
use crate::cpu::Cpu;
use crate::error::Atari2600Error;
use crate::log;
use crate::logging::{LogCategory, LogLevel};
use crate::tia::{Rgba, TiaSettings};

pub struct Console {
    cpu: Cpu<Atari2600Bus>,
    breakpoints: HashSet<u16>,
    last_breakpoint_hit: bool,
}

impl Console {
    pub fn new() -> Self {
        Console {
            cpu: Cpu::new(Atari2600Bus::new()),
            breakpoints: HashSet::new(),
            last_breakpoint_hit: false,
        }
    }

    pub fn load_rom<R: std::io::Read>(&mut self, input: R) -> std::io::Result<()> {
        self.cpu.memory.load_rom(input)?;
        self.cpu.reset();
        Ok(())
    }

    pub fn load_palette<R: std::io::Read>(&mut self, input: R) -> std::io::Result<()> {
        self.cpu.memory.tia.load_palette(input)
    }

    pub fn add_breakpoint(&mut self, pc: u16) {
        self.breakpoints.insert(pc);
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoint_hit(&self) -> bool {
        self.last_breakpoint_hit
    }

    /// Step the CPU N times, advancing the TIA by 3 pixel cycles per CPU
    /// cycle, stopping early on a breakpoint. Always syncs pending pixels
    /// before returning, even on an early stop or a faulted instruction.
    pub fn exec_instructions(&mut self, n: u32) -> Result<(), Atari2600Error> {
        self.last_breakpoint_hit = false;
        let mut result = Ok(());
        for _ in 0..n {
            match self.cpu.exec_one() {
                Ok(cycles) => {
                    self.cpu.memory.tia.advance_pixels(cycles * 3);
                }
                Err(err) => {
                    log!(LogCategory::Cpu, LogLevel::Error, "{}", err);
                    result = Err(err.into());
                    break;
                }
            }
            if self.breakpoints.contains(&self.cpu.pc) {
                self.last_breakpoint_hit = true;
                break;
            }
        }
        self.cpu.memory.tia.sync_pixels();
        result
    }

    pub fn cpu(&self) -> &Cpu<Atari2600Bus> {
        &self.cpu
    }

    pub fn ram(&self) -> &[u8] {
        &self.cpu.memory.ram
    }

    pub fn tia_active_settings(&self) -> &TiaSettings {
        self.cpu.memory.tia.active_settings()
    }

    pub fn tia_scan_position(&self) -> (i32, i32) {
        (self.cpu.memory.tia.scan_x(), self.cpu.memory.tia.scan_y())
    }

    pub fn display(&self) -> &[Rgba] {
        self.cpu.memory.tia.display()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_reset_vector(lo: u8, hi: u8) -> Vec<u8> {
        let mut rom = vec![0u8; crate::bus::ROM_SIZE];
        rom[0x0FFC] = lo;
        rom[0x0FFD] = hi;
        rom
    }

    #[test]
    fn reset_vector_scenario_s1() {
        let mut console = Console::new();
        console.load_rom(&rom_with_reset_vector(0x34, 0x12)[..]).unwrap();
        console.exec_instructions(1).unwrap();
        assert_eq!(console.cpu().pc, 0x1234);
    }

    #[test]
    fn breakpoint_stops_the_loop_early() {
        let mut rom = rom_with_reset_vector(0x00, 0x10);
        rom[0x0000] = 0xEA; // NOP at $1000
        rom[0x0001] = 0xEA; // NOP at $1001
        let mut console = Console::new();
        console.load_rom(&rom[..]).unwrap();
        console.add_breakpoint(0x1001);
        console.exec_instructions(1).unwrap(); // consume the reset step
        console.exec_instructions(5).unwrap();
        assert_eq!(console.cpu().pc, 0x1001);
        assert!(console.breakpoint_hit());
    }

    #[test]
    fn invalid_opcode_surfaces_as_error_without_panicking() {
        let mut rom = rom_with_reset_vector(0x00, 0x10);
        rom[0x0000] = 0x02; // unpopulated opcode
        let mut console = Console::new();
        console.load_rom(&rom[..]).unwrap();
        console.exec_instructions(1).unwrap(); // reset
        let result = console.exec_instructions(1);
        assert!(result.is_err());
    }

    #[test]
    fn stepping_one_at_a_time_matches_a_single_bulk_call() {
        let mut rom = rom_with_reset_vector(0x00, 0x10);
        for (offset, byte) in [0xA9u8, 0x01, 0xA9, 0x02, 0xEA, 0xEA, 0xEA, 0xEA].iter().enumerate() {
            rom[offset] = *byte;
        }

        let mut one_by_one = Console::new();
        one_by_one.load_rom(&rom[..]).unwrap();
        for _ in 0..6 {
            one_by_one.exec_instructions(1).unwrap();
        }

        let mut bulk = Console::new();
        bulk.load_rom(&rom[..]).unwrap();
        bulk.exec_instructions(6).unwrap();

        assert_eq!(one_by_one.cpu().pc, bulk.cpu().pc);
        assert_eq!(one_by_one.cpu().cycle_count, bulk.cpu().cycle_count);
        assert_eq!(one_by_one.tia_scan_position(), bulk.tia_scan_position());
        assert_eq!(one_by_one.display(), bulk.display());
    }
}
