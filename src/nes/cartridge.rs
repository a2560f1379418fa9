use std::{fs, path::Path};

use thiserror::Error;

use super::mapper::Mirroring;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;
const SRAM_LEN: usize = 8 * 1024;

/// Everything that can go wrong while loading a ROM. Nothing past the load
/// boundary returns errors; a bad image never mutates emulator state.
#[derive(Debug, Error)]
pub enum RomError {
    #[error("failed to read ROM file: {0}")]
    Io(#[from] std::io::Error),
    #[error("ROM is too small to contain an iNES header")]
    HeaderTooShort,
    #[error("invalid iNES header magic, expected NES<EOF>")]
    BadMagic,
    #[error("ROM declares no PRG banks")]
    EmptyPrg,
    #[error("ROM truncated: expected {expected} {section} bytes but file ended early")]
    Truncated {
        section: &'static str,
        expected: usize,
    },
    #[error("mapper {0} is not supported (supported: 0-4)")]
    UnsupportedMapper(u8),
}

/// A parsed iNES (v1) image: PRG in 16 KiB banks, CHR in 8 KiB banks (or an
/// 8 KiB CHR-RAM region when the header count is zero), plus the wiring the
/// mapper needs.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_battery_backed_ram: bool,
    pub prg_rom: Vec<u8>,
    pub chr_data: Vec<u8>,
    pub chr_is_ram: bool,
    pub sram_size: usize,
}

impl Cartridge {
    pub fn from_file(path: &Path) -> Result<Self, RomError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RomError> {
        if bytes.len() < HEADER_LEN {
            return Err(RomError::HeaderTooShort);
        }
        if &bytes[0..4] != b"NES\x1A" {
            return Err(RomError::BadMagic);
        }

        let prg_banks = bytes[4] as usize;
        let chr_banks = bytes[5] as usize;
        let flags6 = bytes[6];
        let flags7 = bytes[7];

        if prg_banks == 0 {
            return Err(RomError::EmptyPrg);
        }

        let mapper_id = (flags6 >> 4) | (flags7 & 0xF0);
        let four_screen = (flags6 & 0x08) != 0;
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if (flags6 & 0x01) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let has_battery_backed_ram = (flags6 & 0x02) != 0;
        let trainer_present = (flags6 & 0x04) != 0;

        let mut cursor = HEADER_LEN;
        if trainer_present {
            cursor += TRAINER_LEN;
        }

        let prg_len = prg_banks * PRG_BANK_LEN;
        if bytes.len() < cursor + prg_len {
            return Err(RomError::Truncated {
                section: "PRG",
                expected: prg_len,
            });
        }
        let prg_rom = bytes[cursor..cursor + prg_len].to_vec();
        cursor += prg_len;

        let (chr_data, chr_is_ram) = if chr_banks == 0 {
            (vec![0; CHR_BANK_LEN], true)
        } else {
            let chr_len = chr_banks * CHR_BANK_LEN;
            if bytes.len() < cursor + chr_len {
                return Err(RomError::Truncated {
                    section: "CHR",
                    expected: chr_len,
                });
            }
            (bytes[cursor..cursor + chr_len].to_vec(), false)
        };

        Ok(Self {
            mapper_id,
            mirroring,
            has_battery_backed_ram,
            prg_rom,
            chr_data,
            chr_is_ram,
            sram_size: SRAM_LEN,
        })
    }
}
