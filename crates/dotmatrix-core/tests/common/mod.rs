#![allow(dead_code)]

use dotmatrix_core::bus::Bus;
use dotmatrix_core::cpu::Cpu;
use dotmatrix_core::gameboy::GameBoy;

pub const WRAM_BASE: u16 = 0xC000;

/// Minimal valid 32 KiB ROM-only image. The body is all NOPs.
pub fn test_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0104] = 0xCE; // first logo byte, checked by the loader
    rom[0x0134..0x0138].copy_from_slice(b"TEST");
    rom
}

/// Booted machine with the test ROM installed.
pub fn boot() -> GameBoy {
    let mut gb = GameBoy::new();
    gb.load_rom(&test_rom()).expect("test ROM should load");
    gb
}

/// Booted machine about to execute `code` from work RAM.
pub fn boot_at(code: &[u8]) -> GameBoy {
    let mut gb = boot();
    for (i, &byte) in code.iter().enumerate() {
        gb.bus.write_byte(WRAM_BASE + i as u16, byte);
    }
    gb.cpu.regs.pc = WRAM_BASE;
    gb
}

/// Bare CPU and bus (no cartridge) with `code` in work RAM.
pub fn cpu_at(code: &[u8]) -> (Cpu, Bus) {
    let mut bus = Bus::new();
    for (i, &byte) in code.iter().enumerate() {
        bus.write_byte(WRAM_BASE + i as u16, byte);
    }
    let mut cpu = Cpu::new();
    cpu.regs.pc = WRAM_BASE;
    (cpu, bus)
}

/// Step once and return the cycles the whole machine advanced.
pub fn step_cycles(gb: &mut GameBoy) -> u64 {
    let before = gb.stats().total_cycles;
    gb.step().expect("step should not fault");
    gb.stats().total_cycles - before
}
