//! APU register sink (0xFF10-0xFF3F).
//!
//! The core routes sound-register traffic here so games can program the
//! channels and read their settings back; no audio is synthesized. The
//! backing store covers NR10-NR52, the unused gap behind them, and wave RAM.

const APU_BASE: u16 = 0xFF10;
const APU_REGS: usize = 0x30;

// Post-boot register values from gbdev.io/pandocs/Power_Up_State.html.
const POST_BOOT_REGS: [(u16, u8); 21] = [
    (0xFF10, 0x80), // NR10
    (0xFF11, 0xBF), // NR11
    (0xFF12, 0xF3), // NR12
    (0xFF13, 0xFF), // NR13
    (0xFF14, 0xBF), // NR14
    (0xFF16, 0x3F), // NR21
    (0xFF17, 0x00), // NR22
    (0xFF18, 0xFF), // NR23
    (0xFF19, 0xBF), // NR24
    (0xFF1A, 0x7F), // NR30
    (0xFF1B, 0xFF), // NR31
    (0xFF1C, 0x9F), // NR32
    (0xFF1D, 0xFF), // NR33
    (0xFF1E, 0xBF), // NR34
    (0xFF20, 0xFF), // NR41
    (0xFF21, 0x00), // NR42
    (0xFF22, 0x00), // NR43
    (0xFF23, 0xBF), // NR44
    (0xFF24, 0x77), // NR50
    (0xFF25, 0xF3), // NR51
    (0xFF26, 0xF1), // NR52
];

pub struct Apu {
    regs: [u8; APU_REGS],
}

impl Apu {
    pub fn new() -> Self {
        Self { regs: [0; APU_REGS] }
    }

    /// Reset every register to its post-boot value. Wave RAM is left alone.
    pub fn apply_post_boot(&mut self) {
        for &(addr, val) in &POST_BOOT_REGS {
            self.write_reg(addr, val);
        }
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        self.regs[(addr - APU_BASE) as usize]
    }

    pub fn write_reg(&mut self, addr: u16, val: u8) {
        self.regs[(addr - APU_BASE) as usize] = val;
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_hold_what_was_written() {
        let mut apu = Apu::new();
        apu.write_reg(0xFF12, 0x8F);
        apu.write_reg(0xFF3F, 0x5A); // last wave RAM byte
        assert_eq!(apu.read_reg(0xFF12), 0x8F);
        assert_eq!(apu.read_reg(0xFF3F), 0x5A);
    }

    #[test]
    fn post_boot_state_matches_the_table() {
        let mut apu = Apu::new();
        apu.write_reg(0xFF30, 0x12);
        apu.apply_post_boot();
        assert_eq!(apu.read_reg(0xFF26), 0xF1); // NR52
        assert_eq!(apu.read_reg(0xFF24), 0x77); // NR50
        assert_eq!(apu.read_reg(0xFF30), 0x12); // wave RAM untouched
    }
}
