//! ROM-only cartridge images.
//!
//! Only 32 KiB no-MBC cartridges are accepted; everything else is a load
//! error. Shorter images are zero-padded so the bus can index the full
//! 0x0000-0x7FFF range unconditionally.

use std::{fs, path::Path};

use thiserror::Error;

pub const ROM_SIZE: usize = 0x8000;

// Header layout (gbdev.io/pandocs/The_Cartridge_Header.html).
const HEADER_END: usize = 0x0150;
const OFFSET_LOGO: usize = 0x0104;
const OFFSET_TITLE: usize = 0x0134;
const TITLE_LEN: usize = 16;
const OFFSET_CART_TYPE: usize = 0x0147;
const OFFSET_ROM_SIZE: usize = 0x0148;

// First byte of the Nintendo logo bitmap; the boot ROM checks the full
// block, a quick sanity check on one byte catches non-ROM files.
const LOGO_FIRST_BYTE: u8 = 0xCE;

#[derive(Error, Debug)]
pub enum CartridgeError {
    #[error("ROM image is {0} bytes; a ROM-only cartridge holds at most 32 KiB")]
    TooLarge(usize),
    #[error("ROM image is {0} bytes, too short to contain a cartridge header")]
    MissingHeader(usize),
    #[error("logo area does not look like a Game Boy cartridge (found {0:#04X} at 0x0104)")]
    BadLogo(u8),
    #[error("cartridge type {0:#04X} needs a mapper; only ROM-only (0x00) is supported")]
    UnsupportedMapper(u8),
    #[error("ROM-size byte is {0:#04X}; expected 0x00 (32 KiB)")]
    BadRomSize(u8),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct Cartridge {
    rom: Vec<u8>,
    pub title: String,
}

impl Cartridge {
    /// Validate a raw ROM image and wrap it as a cartridge.
    pub fn load(bytes: Vec<u8>) -> Result<Self, CartridgeError> {
        if bytes.len() > ROM_SIZE {
            return Err(CartridgeError::TooLarge(bytes.len()));
        }
        if bytes.len() < HEADER_END {
            return Err(CartridgeError::MissingHeader(bytes.len()));
        }
        if bytes[OFFSET_LOGO] != LOGO_FIRST_BYTE {
            return Err(CartridgeError::BadLogo(bytes[OFFSET_LOGO]));
        }
        if bytes[OFFSET_CART_TYPE] != 0x00 {
            return Err(CartridgeError::UnsupportedMapper(bytes[OFFSET_CART_TYPE]));
        }
        if bytes[OFFSET_ROM_SIZE] != 0x00 {
            return Err(CartridgeError::BadRomSize(bytes[OFFSET_ROM_SIZE]));
        }

        let title = bytes[OFFSET_TITLE..OFFSET_TITLE + TITLE_LEN]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect();

        let mut rom = bytes;
        rom.resize(ROM_SIZE, 0);
        Ok(Self { rom, title })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        Self::load(fs::read(path)?)
    }

    /// Read a byte from the 0x0000-0x7FFF window.
    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.rom[addr as usize & (ROM_SIZE - 1)]
    }
}
