// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

// SPEC: http://ist.uwaterloo.ca/~schepers/formats/CRT.TXT

/// Cartridge hardware type, as carried in the CRT header's type field.
/// Only the mappers named by this core are modeled; anything else degrades
/// to `Normal` (fixed mapping, I/O writes ignored).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mapper {
    Normal,
    SimonsBasic,
    Ocean,
    C64Gs,
}

impl Mapper {
    pub fn from_hw_type(hw_type: u16) -> Mapper {
        match hw_type {
            4 => Mapper::SimonsBasic,
            5 => Mapper::Ocean,
            15 => Mapper::C64Gs,
            _ => Mapper::Normal,
        }
    }
}

pub struct Chip {
    pub bank_number: u16,
    pub load_address: u16,
    pub size: u16,
    pub data: Vec<u8>,
}

/// A loaded cartridge image: the chip packets plus the mapper logic that
/// decides which chip is visible at $8000/$A000 and how writes to the
/// $DE00-$DFFF I/O window switch banks.
pub struct Cartridge {
    pub mapper: Mapper,
    pub exrom: bool,
    pub game: bool,
    chips: Vec<Chip>,
    bank_lo: usize,
    bank_hi: Option<usize>,
}

impl Cartridge {
    pub fn new(mapper: Mapper, exrom: bool, game: bool, chips: Vec<Chip>) -> Cartridge {
        let mut cartridge = Cartridge {
            mapper,
            exrom,
            game,
            chips,
            bank_lo: 0,
            bank_hi: None,
        };
        cartridge.reset();
        cartridge
    }

    pub fn reset(&mut self) {
        self.bank_lo = self
            .chips
            .iter()
            .position(|chip| chip.load_address < 0xa000)
            .unwrap_or(0);
        self.bank_hi = self.find_chip(0, 0xa000);
        if self.mapper == Mapper::SimonsBasic {
            // Simons Basic starts with the $A000-$BFFF window banked in.
            self.game = false;
        }
    }

    /// $8000-$9FFF. Always backed by a chip under every mapper this core models.
    pub fn read_lo(&self, address: u16) -> u8 {
        let chip = &self.chips[self.bank_lo];
        chip.data[(address - chip.load_address) as usize % chip.data.len()]
    }

    /// $A000-$BFFF. `None` means the window is not cartridge-backed and the
    /// caller should fall through to RAM/BASIC per the normal bank map. A 16K
    /// chip loaded at $8000 covers this window itself (no separate $A000
    /// chip packet), so falls back to the active lo-bank chip when its size
    /// says it spans the full 16K.
    pub fn read_hi(&self, address: u16) -> Option<u8> {
        if let Some(i) = self.bank_hi {
            let chip = &self.chips[i];
            return Some(chip.data[(address - chip.load_address) as usize % chip.data.len()]);
        }
        let lo = &self.chips[self.bank_lo];
        if lo.size == 16384 {
            Some(lo.data[(address - lo.load_address) as usize % lo.data.len()])
        } else {
            None
        }
    }

    pub fn read_io(&self, _address: u16) -> u8 {
        0
    }

    /// Returns true if the active bank/window changed and the bus glue
    /// should recompute its memory map.
    pub fn write_io(&mut self, address: u16, value: u8) -> bool {
        match self.mapper {
            Mapper::Normal => false,
            Mapper::SimonsBasic => {
                if address == 0xde00 {
                    self.game = value != 0x01;
                    self.bank_hi = if !self.game {
                        self.find_chip(0, 0xa000)
                    } else {
                        None
                    };
                    true
                } else {
                    false
                }
            }
            Mapper::Ocean => {
                if address == 0xde00 {
                    let bank = (value & 0x3f) as u16;
                    self.bank_lo = self.find_chip(bank, 0x8000).unwrap_or(self.bank_lo);
                    self.bank_hi = self.find_chip(bank, 0xa000);
                    true
                } else {
                    false
                }
            }
            Mapper::C64Gs => {
                if (0xde00..=0xdfff).contains(&address) {
                    let bank = address - 0xde00;
                    if let Some(idx) = self.find_chip(bank, 0x8000) {
                        self.bank_lo = idx;
                    }
                    true
                } else {
                    false
                }
            }
        }
    }

    fn find_chip(&self, bank_number: u16, load_address: u16) -> Option<usize> {
        self.chips.iter().position(|chip| {
            chip.bank_number == bank_number
                && chip.load_address == load_address
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chip(bank: u16, addr: u16, size: usize) -> Chip {
        Chip {
            bank_number: bank,
            load_address: addr,
            size: size as u16,
            data: vec![bank as u8; size],
        }
    }

    #[test]
    fn normal_fixed_mapping() {
        let mut cart = Cartridge::new(Mapper::Normal, false, true, vec![chip(0, 0x8000, 8192)]);
        assert_eq!(0, cart.read_lo(0x8000));
        assert!(!cart.write_io(0xde00, 0x01));
    }

    #[test]
    fn ocean_switches_8k_bank() {
        let chips = vec![chip(0, 0x8000, 8192), chip(1, 0x8000, 8192)];
        let mut cart = Cartridge::new(Mapper::Ocean, false, true, chips);
        assert_eq!(0, cart.read_lo(0x8000));
        assert!(cart.write_io(0xde00, 1));
        assert_eq!(1, cart.read_lo(0x8000));
    }

    #[test]
    fn c64gs_bank_from_address_offset() {
        let chips = vec![chip(0, 0x8000, 8192), chip(3, 0x8000, 8192)];
        let mut cart = Cartridge::new(Mapper::C64Gs, false, true, chips);
        assert!(cart.write_io(0xde03, 0));
        assert_eq!(3, cart.read_lo(0x8000));
    }

    #[test]
    fn ocean_16k_chip_covers_hi_window() {
        let chips = vec![chip(0, 0x8000, 16384)];
        let cart = Cartridge::new(Mapper::Ocean, false, true, chips);
        assert_eq!(0, cart.read_lo(0x8000));
        assert_eq!(0, cart.read_hi(0xa000).unwrap());
    }

    #[test]
    fn simons_basic_toggles_hi_window() {
        let chips = vec![chip(0, 0x8000, 8192), chip(0, 0xa000, 8192)];
        let mut cart = Cartridge::new(Mapper::SimonsBasic, false, false, chips);
        assert!(cart.read_hi(0xa000).is_some());
        cart.write_io(0xde00, 0x00);
        assert!(cart.read_hi(0xa000).is_none());
    }
}
