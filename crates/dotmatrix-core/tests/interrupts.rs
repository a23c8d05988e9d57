mod common;

use common::{boot_at, cpu_at, step_cycles, WRAM_BASE};

#[test]
fn dispatch_frame_is_20_cycles_and_clears_state() {
    let (mut cpu, mut bus) = cpu_at(&[0x00]);
    cpu.ime = true;
    bus.ie_reg = 0x04;
    bus.if_reg = 0x04;
    let sp = cpu.regs.sp;

    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 20);
    assert_eq!(cpu.regs.pc, 0x0050);
    assert_eq!(cpu.regs.sp, sp.wrapping_sub(2));
    assert_eq!(bus.read_word(cpu.regs.sp), WRAM_BASE);
    assert!(!cpu.ime);
    assert_eq!(bus.if_reg & 0x04, 0);
}

#[test]
fn vblank_beats_stat_beats_timer() {
    let (mut cpu, mut bus) = cpu_at(&[0x00]);
    cpu.ime = true;
    bus.ie_reg = 0x1F;
    bus.if_reg = 0x07;

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.regs.pc, 0x0040);
    assert_eq!(bus.if_reg, 0x06, "only the V-Blank bit is consumed");
}

#[test]
fn masked_interrupts_stay_pending() {
    let (mut cpu, mut bus) = cpu_at(&[0x00]);
    cpu.ime = true;
    bus.ie_reg = 0x00;
    bus.if_reg = 0x1F;

    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 4, "plain NOP, nothing dispatched");
    assert_eq!(cpu.regs.pc, WRAM_BASE + 1);
    assert_eq!(bus.if_reg, 0x1F);
}

#[test]
fn ei_takes_effect_one_step_late() {
    let (mut cpu, mut bus) = cpu_at(&[0xFB, 0x00]); // EI; NOP
    bus.ie_reg = 0x01;
    bus.if_reg = 0x01;

    cpu.step(&mut bus).unwrap();
    assert!(!cpu.ime, "EI must not enable during its own step");
    assert_eq!(cpu.regs.pc, WRAM_BASE + 1);

    // The latch promotes at the top of this step and the pending V-Blank
    // dispatches instead of the NOP.
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 20);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert_eq!(bus.read_word(cpu.regs.sp), WRAM_BASE + 1);
}

#[test]
fn di_cancels_an_armed_ei() {
    let (mut cpu, mut bus) = cpu_at(&[0xFB, 0xF3, 0x00]); // EI; DI; NOP
    bus.ie_reg = 0x01;
    bus.if_reg = 0x01;

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 4);
    assert!(!cpu.ime);
    assert_eq!(cpu.regs.pc, WRAM_BASE + 3);
    assert_eq!(bus.if_reg, 0x01, "nothing was dispatched");
}

#[test]
fn reti_enables_immediately() {
    let (mut cpu, mut bus) = cpu_at(&[0xD9, 0x00]); // RETI
    cpu.regs.sp = 0xFFF0;
    bus.write_word(0xFFF0, 0xC100);
    bus.write_byte(0xC100, 0x00);
    bus.ie_reg = 0x02;
    bus.if_reg = 0x02;

    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert!(cpu.ime);
    assert_eq!(cpu.regs.pc, 0xC100);

    // No EI delay: the very next step dispatches.
    assert_eq!(cpu.step(&mut bus).unwrap(), 20);
    assert_eq!(cpu.regs.pc, 0x0048);
}

#[test]
fn halt_idles_then_wakes_without_dispatch_when_ime_is_off() {
    let (mut cpu, mut bus) = cpu_at(&[0x76, 0x04]); // HALT; INC B
    cpu.ime = false;
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert!(cpu.halted);

    // Halted steps burn four cycles and leave PC alone.
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.regs.pc, WRAM_BASE + 1);

    // An unmasked pending interrupt ends HALT; with IME off it resumes
    // execution instead of dispatching.
    bus.ie_reg = 0x04;
    bus.if_reg = 0x04;
    cpu.step(&mut bus).unwrap();
    assert!(!cpu.halted);
    assert_eq!(cpu.regs.pc, WRAM_BASE + 2, "INC B ran");
    assert_eq!(bus.if_reg, 0x04, "IF untouched without dispatch");
}

#[test]
fn halt_wakes_into_dispatch_when_ime_is_on() {
    let (mut cpu, mut bus) = cpu_at(&[0x76, 0x00]);
    cpu.ime = true;
    cpu.step(&mut bus).unwrap();
    assert!(cpu.halted);

    bus.ie_reg = 0x01;
    bus.if_reg = 0x01;
    let cycles = cpu.step(&mut bus).unwrap();
    assert_eq!(cycles, 20);
    assert!(!cpu.halted);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert_eq!(bus.read_word(cpu.regs.sp), WRAM_BASE + 1);
}

#[test]
fn stop_behaves_like_halt() {
    let (mut cpu, mut bus) = cpu_at(&[0x10, 0x00, 0x04]); // STOP; INC B
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert!(cpu.halted);

    bus.ie_reg = 0x10;
    bus.if_reg = 0x10;
    cpu.step(&mut bus).unwrap();
    // The pad byte was consumed by STOP, so execution resumes at INC B.
    assert_eq!(cpu.regs.pc, WRAM_BASE + 3);
}

#[test]
fn vblank_dispatch_end_to_end() {
    // EI; NOP; JR -2 — spin until the PPU requests V-Blank.
    let mut gb = boot_at(&[0xFB, 0x00, 0x18, 0xFE]);
    gb.bus.ie_reg = 0x01;

    let mut dispatched = false;
    for _ in 0..100_000 {
        gb.step().unwrap();
        if gb.cpu.regs.pc == 0x0040 {
            dispatched = true;
            break;
        }
    }
    assert!(dispatched, "V-Blank never dispatched");

    let stats = gb.stats();
    assert!(stats.ly >= 144, "dispatch happened outside V-Blank, ly={}", stats.ly);
    assert!(!gb.cpu.ime);
    assert_eq!(gb.bus.if_reg & 0x01, 0);
    // The interrupted PC (somewhere in the spin loop) is on the stack.
    let return_pc = gb.bus.read_word(gb.cpu.regs.sp);
    assert!(
        (WRAM_BASE + 1..=WRAM_BASE + 4).contains(&return_pc),
        "return PC {return_pc:04X} not in the spin loop"
    );
}

#[test]
fn timer_overflow_requests_and_dispatches() {
    // TAC=0x05 (enabled, 16-cycle period), TMA=0xAB, TIMA=0xFF.
    let mut gb = boot_at(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    gb.bus.write_byte(0xFF07, 0x05);
    gb.bus.write_byte(0xFF06, 0xAB);
    gb.bus.write_byte(0xFF05, 0xFF);

    // Four NOPs are 16 cycles.
    for _ in 0..4 {
        assert_eq!(step_cycles(&mut gb), 4);
    }
    assert_eq!(gb.bus.read_byte(0xFF05), 0xAB);
    assert_eq!(gb.bus.if_reg & 0x04, 0x04);

    // With IME on and IE allowing it, the next step lands on the vector.
    gb.cpu.ime = true;
    gb.bus.ie_reg = 0x04;
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, 0x0050);
}

#[test]
fn joypad_press_requests_interrupt_through_the_facade() {
    use dotmatrix_core::joypad::Button;

    let mut gb = boot_at(&[0x00]);
    gb.bus.write_byte(0xFF00, 0x20); // select the d-pad group
    gb.set_button(Button::Down, true);
    assert_eq!(gb.bus.if_reg & 0x10, 0x10);
    assert_eq!(gb.bus.read_byte(0xFF00) & 0x0F, 0x07); // Down is bit 3, active-low
}
