use crate::bus::Bus;
use crate::cartridge::{Cartridge, CartridgeError};
use crate::cpu::{Cpu, CpuError};
use crate::joypad::Button;
use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Cycles per 59.7 Hz frame: 154 scanlines of 456 cycles.
pub const CYCLES_PER_FRAME: u32 = 70224;

// Safety bound on the frame loop: if the PPU still has not completed a
// frame after twice the frame budget, abort the loop with a warning.
const FRAME_WATCHDOG_CYCLES: u64 = 2 * CYCLES_PER_FRAME as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Cycles the whole machine has advanced, HALT idling included.
    pub total_cycles: u64,
    /// Cycles the CPU spent executing instructions and servicing interrupts.
    pub cpu_cycles: u64,
    pub ly: u8,
    pub ppu_mode: u8,
    pub running: bool,
}

pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: Bus,
    total_cycles: u64,
    running: bool,
}

impl GameBoy {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(),
            total_cycles: 0,
            running: false,
        }
    }

    /// Validate `bytes` as a ROM-only cartridge, install it and reset the
    /// machine to the post-boot state.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<(), CartridgeError> {
        let cart = Cartridge::load(bytes.to_vec())?;
        self.load_cart(cart);
        Ok(())
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        core_debug!(target: "gameboy", "loaded \"{}\"", cart.title);
        self.bus.load_cart(cart);
        self.cpu = Cpu::new();
        self.bus.apply_post_boot();
        self.total_cycles = 0;
        self.running = true;
    }

    /// Run one CPU step and bring the PPU and timers up to date. After an
    /// illegal instruction the machine stays paused; construct a fresh core
    /// to recover.
    pub fn step(&mut self) -> Result<(), CpuError> {
        if !self.running {
            return Ok(());
        }
        match self.cpu.step(&mut self.bus) {
            Ok(cycles) => {
                self.total_cycles += cycles as u64;
                self.bus.ppu.step(cycles, &mut self.bus.if_reg);
                self.bus.timer.step(cycles, &mut self.bus.if_reg);
                Ok(())
            }
            Err(err) => {
                core_warn!(target: "gameboy", "CPU fault: {err}");
                self.running = false;
                Err(err)
            }
        }
    }

    /// Step until one frame's worth of cycles has elapsed and the PPU has
    /// delivered a completed frame.
    pub fn run_frame(&mut self) -> Result<(), CpuError> {
        self.bus.ppu.clear_frame_flag();
        let mut frame_cycles = 0u64;
        while self.running
            && (frame_cycles < CYCLES_PER_FRAME as u64 || !self.bus.ppu.frame_ready())
        {
            let before = self.total_cycles;
            self.step()?;
            frame_cycles += self.total_cycles - before;
            if frame_cycles >= FRAME_WATCHDOG_CYCLES {
                core_warn!(
                    target: "gameboy",
                    "frame watchdog tripped after {frame_cycles} cycles without a completed frame"
                );
                break;
            }
        }
        Ok(())
    }

    /// Shade indices (0..3), row-major 160x144.
    pub fn framebuffer(&self) -> &[u8; SCREEN_WIDTH * SCREEN_HEIGHT] {
        self.bus.ppu.framebuffer()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.bus.joypad.set_button(button, pressed, &mut self.bus.if_reg);
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total_cycles: self.total_cycles,
            cpu_cycles: self.cpu.cycles,
            ly: self.bus.ppu.ly(),
            ppu_mode: self.bus.ppu.mode(),
            running: self.running,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
