// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::cell::RefCell;
use std::rc::Rc;

use crate::io::Cia;
use crate::mem::{Addressable, ColorRam};
use crate::sound::Sid;
use crate::video::Vic;

/// The $D000-$DDFF slice of the I/O window: VIC, SID, color RAM and both
/// CIAs, each mirrored across their register block per the real decode.
/// The cartridge I/O window ($DE00-$DFFF) is handled directly by `Memory`,
/// since only the expansion port (not this struct) knows the active mapper.
pub struct Mmio {
    vic: Rc<RefCell<Vic>>,
    sid: Rc<RefCell<Sid>>,
    color_ram: Rc<RefCell<ColorRam>>,
    cia1: Rc<RefCell<Cia>>,
    cia2: Rc<RefCell<Cia>>,
}

impl Mmio {
    pub fn new(
        vic: Rc<RefCell<Vic>>,
        sid: Rc<RefCell<Sid>>,
        color_ram: Rc<RefCell<ColorRam>>,
        cia1: Rc<RefCell<Cia>>,
        cia2: Rc<RefCell<Cia>>,
    ) -> Mmio {
        Mmio {
            vic,
            sid,
            color_ram,
            cia1,
            cia2,
        }
    }
}

impl Addressable for Mmio {
    fn read(&self, address: u16) -> u8 {
        match address {
            0xd000..=0xd3ff => self.vic.borrow_mut().read((address & 0x3f) as u8),
            0xd400..=0xd7ff => self.sid.borrow_mut().read((address & 0x1f) as u8),
            0xd800..=0xdbff => self.color_ram.borrow().read(address - 0xd800),
            0xdc00..=0xdcff => self.cia1.borrow_mut().read((address & 0x0f) as u8),
            0xdd00..=0xddff => self.cia2.borrow_mut().read((address & 0x0f) as u8),
            _ => 0xff,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            0xd000..=0xd3ff => self.vic.borrow_mut().write((address & 0x3f) as u8, value),
            0xd400..=0xd7ff => self.sid.borrow_mut().write((address & 0x1f) as u8, value),
            0xd800..=0xdbff => self.color_ram.borrow_mut().write(address - 0xd800, value),
            0xdc00..=0xdcff => self.cia1.borrow_mut().write((address & 0x0f) as u8, value),
            0xdd00..=0xddff => self.cia2.borrow_mut().write((address & 0x0f) as u8, value),
            _ => {}
        }
    }
}
