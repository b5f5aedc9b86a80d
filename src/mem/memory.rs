// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::EmuError;
use crate::mem::cartridge::Cartridge;
use crate::mem::memory_map::{Bank, MemoryMap};
use crate::mem::{Addressable, Mmio, Ram, Rom};

#[allow(dead_code)]
#[derive(Copy, Clone)]
pub enum BaseAddr {
    IoPortDdr = 0x0000,
    IoPort = 0x0001,
    Basic = 0xa000,
    Charset = 0xd000,
    Kernal = 0xe000,
}

impl BaseAddr {
    pub fn addr(&self) -> u16 {
        *self as u16
    }
}

/// RAM, the three mask ROMs, the I/O window and the cartridge expansion
/// port, combined behind the processor-port bank switch ($00/$01) and the
/// cartridge's GAME/EXROM lines. This is the CPU's view of the bus; the
/// VIC's 16 KiB-bank view is `vic_read`.
pub struct Memory {
    map: MemoryMap,
    config: crate::mem::memory_map::Configuration,
    ram: Ram,
    basic: Rom,
    charset: Rom,
    kernal: Rom,
    io: Option<Rc<RefCell<Mmio>>>,
    cartridge: Option<Cartridge>,
    port_ddr: u8,
    port_value: u8,
    vic_bank_select: Rc<Cell<u8>>,
}

impl Memory {
    pub fn new(basic: Rom, charset: Rom, kernal: Rom) -> Memory {
        let map = MemoryMap::new();
        let config = map.get(31);
        Memory {
            map,
            config,
            ram: Ram::new(0x10000),
            basic,
            charset,
            kernal,
            io: None,
            cartridge: None,
            port_ddr: 0x2f,
            port_value: 0x37,
            vic_bank_select: Rc::new(Cell::new(0)),
        }
    }

    #[cfg(test)]
    pub fn from_roms(path_prefix: &str) -> Result<Memory, EmuError> {
        use std::path::Path;
        let basic = Rom::load(&Path::new(path_prefix).join("basic.rom"), BaseAddr::Basic.addr())?;
        let charset = Rom::load(&Path::new(path_prefix).join("characters.rom"), BaseAddr::Charset.addr())?;
        let kernal = Rom::load(&Path::new(path_prefix).join("kernal.rom"), BaseAddr::Kernal.addr())?;
        Ok(Memory::new(basic, charset, kernal))
    }

    pub fn set_io(&mut self, io: Rc<RefCell<Mmio>>) {
        self.io = Some(io);
    }

    pub fn vic_bank_select(&self) -> Rc<Cell<u8>> {
        self.vic_bank_select.clone()
    }

    pub fn attach_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
        self.switch_banks();
    }

    pub fn detach_cartridge(&mut self) {
        self.cartridge = None;
        self.switch_banks();
    }

    pub fn reset(&mut self) {
        self.port_ddr = 0x2f;
        self.port_value = 0x37;
        if let Some(ref mut cartridge) = self.cartridge {
            cartridge.reset();
        }
        self.switch_banks();
    }

    /// Write to the processor port ($00 DDR, $01 data) reconfigures the
    /// bank map immediately, as on real hardware.
    pub fn write_port(&mut self, register: u16, value: u8) {
        match register {
            0 => self.port_ddr = value,
            1 => self.port_value = value,
            _ => unreachable!(),
        }
        self.switch_banks();
    }

    pub fn read_port(&self, register: u16) -> u8 {
        match register {
            0 => self.port_ddr,
            1 => self.effective_port() | !self.port_ddr,
            _ => unreachable!(),
        }
    }

    fn effective_port(&self) -> u8 {
        self.port_value & self.port_ddr
    }

    pub fn switch_banks(&mut self) {
        let port = self.effective_port() | !self.port_ddr;
        let loram = port & 0x01 != 0;
        let hiram = port & 0x02 != 0;
        let charen = port & 0x04 != 0;
        let (game, exrom) = match self.cartridge {
            Some(ref c) => (c.game, c.exrom),
            None => (true, true),
        };
        let mode = (loram as u8)
            | (hiram as u8) << 1
            | (charen as u8) << 2
            | (game as u8) << 3
            | (exrom as u8) << 4;
        self.config = self.map.get(mode);
    }

    /// VIC-visible 16 KiB bank, selected by CIA-2 port A bits 0-1 (inverted:
    /// 0 selects the highest bank).
    pub fn vic_read(&self, address: u16) -> u8 {
        let bank_base = ((!self.vic_bank_select.get() & 0x03) as u16) << 14;
        let full_address = bank_base | (address & 0x3fff);
        let zone = (full_address & 0xf000) >> 12;
        match zone {
            0x1 => self.charset.read(full_address - 0x1000),
            0x9 => self.charset.read(full_address - 0x9000),
            _ => self.ram.read(full_address),
        }
    }

    pub fn write_direct(&mut self, address: u16, value: u8) {
        self.ram.write(address, value);
    }

    pub fn read_direct(&self, address: u16) -> u8 {
        self.ram.read(address)
    }
}

impl Addressable for Memory {
    fn read(&self, address: u16) -> u8 {
        if address < 2 {
            return self.read_port(address);
        }
        let zone = (address & 0xf000) >> 12;
        match self.config.get(zone as u8) {
            Bank::Ram => self.ram.read(address),
            Bank::Basic => self.basic.read(address),
            Bank::Charset => self.charset.read(address),
            Bank::Kernal => self.kernal.read(address),
            Bank::RomL => self
                .cartridge
                .as_ref()
                .map_or(self.ram.read(address), |c| c.read_lo(address)),
            Bank::RomH => self
                .cartridge
                .as_ref()
                .map_or(self.ram.read(address), |c| {
                    c.read_hi(address).unwrap_or_else(|| self.ram.read(address))
                }),
            Bank::Io => self.read_io(address),
            Bank::Disabled => 0xff,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if address < 2 {
            self.write_port(address, value);
            return;
        }
        let zone = (address & 0xf000) >> 12;
        match self.config.get(zone as u8) {
            Bank::Io => self.write_io(address, value),
            Bank::Disabled => {}
            _ => self.ram.write(address, value),
        }
    }
}

impl Memory {
    fn read_io(&self, address: u16) -> u8 {
        if address >= 0xde00 {
            self.cartridge.as_ref().map_or(0, |c| c.read_io(address))
        } else {
            match self.io {
                Some(ref io) => io.borrow().read(address),
                None => 0,
            }
        }
    }

    fn write_io(&mut self, address: u16, value: u8) {
        if address >= 0xde00 {
            let changed = self
                .cartridge
                .as_mut()
                .map_or(false, |c| c.write_io(address, value));
            if changed {
                self.switch_banks();
            }
        } else if let Some(ref io) = self.io {
            io.borrow_mut().write(address, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::memory_map::Bank;

    fn new_memory() -> Memory {
        Memory::new(
            Rom::from_bytes(vec![0x94; 0x2000], BaseAddr::Basic.addr()),
            Rom::from_bytes(vec![0x00; 0x1000], BaseAddr::Charset.addr()),
            Rom::from_bytes(vec![0x85; 0x2000], BaseAddr::Kernal.addr()),
        )
    }

    #[test]
    fn read_basic_rom_default() {
        let mem = new_memory();
        assert_eq!(0x94, mem.read(BaseAddr::Basic.addr()));
    }

    #[test]
    fn write_page_0_goes_to_ram() {
        let mut mem = new_memory();
        mem.write(0x00f0, 0xff);
        assert_eq!(0xff, mem.read_direct(0x00f0));
    }

    #[test]
    fn hiding_basic_exposes_ram() {
        let mut mem = new_memory();
        mem.write_port(1, 0b110); // LORAM=0 -> basic hidden
        assert_eq!(Bank::Ram, mem.config.get(0xa));
    }

    #[test]
    fn default_mode_is_basic_io_kernal() {
        let mem = new_memory();
        assert_eq!(Bank::Basic, mem.config.get(0xa));
        assert_eq!(Bank::Io, mem.config.get(0xd));
        assert_eq!(Bank::Kernal, mem.config.get(0xe));
    }
}
