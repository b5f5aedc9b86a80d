// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

// SPEC: http://www.zimmers.net/cbmpics/cbm/c64/vic-ii.txt

use std::cell::RefCell;
use std::rc::Rc;

use crate::cpu::interrupt_line::{InterruptLine, Source};
use crate::mem::{Addressable, ColorRam, Memory};
use crate::system::frame_buffer::FrameBuffer;
use crate::system::model::VicModel;
use crate::video::border_unit::BorderUnit;
use crate::video::gfx_sequencer::{GfxSequencer, Mode as GfxMode};
use crate::video::mux_unit::MuxUnit;
use crate::video::spec::Spec;
use crate::video::sprite_sequencer::{Mode as SpriteMode, SpriteSequencer};

#[derive(Copy, Clone, PartialEq)]
enum DisplayState {
    Idle,
    Display,
}

#[derive(Copy, Clone)]
pub enum Reg {
    M0X = 0x00,
    M0Y = 0x01,
    M1X = 0x02,
    M1Y = 0x03,
    M2X = 0x04,
    M2Y = 0x05,
    M3X = 0x06,
    M3Y = 0x07,
    M4X = 0x08,
    M4Y = 0x09,
    M5X = 0x0a,
    M5Y = 0x0b,
    M6X = 0x0c,
    M6Y = 0x0d,
    M7X = 0x0e,
    M7Y = 0x0f,
    MX8 = 0x10,
    CR1 = 0x11,
    RASTER = 0x12,
    LPX = 0x13,
    LPY = 0x14,
    ME = 0x15,
    CR2 = 0x16,
    MYE = 0x17,
    MEMPTR = 0x18,
    IRR = 0x19,
    IMR = 0x1a,
    MDP = 0x1b,
    MMC = 0x1c,
    MXE = 0x1d,
    MM = 0x1e,
    MD = 0x1f,
    EC = 0x20,
    B0C = 0x21,
    B1C = 0x22,
    B2C = 0x23,
    B3C = 0x24,
    MM0 = 0x25,
    MM1 = 0x26,
    M0C = 0x27,
    M1C = 0x28,
    M2C = 0x29,
    M3C = 0x2a,
    M4C = 0x2b,
    M5C = 0x2c,
    M6C = 0x2d,
    M7C = 0x2e,
    IGNORE = 0xff,
}

impl Reg {
    pub fn from(reg: u8) -> Reg {
        match reg {
            0x00 => Reg::M0X,
            0x01 => Reg::M0Y,
            0x02 => Reg::M1X,
            0x03 => Reg::M1Y,
            0x04 => Reg::M2X,
            0x05 => Reg::M2Y,
            0x06 => Reg::M3X,
            0x07 => Reg::M3Y,
            0x08 => Reg::M4X,
            0x09 => Reg::M4Y,
            0x0a => Reg::M5X,
            0x0b => Reg::M5Y,
            0x0c => Reg::M6X,
            0x0d => Reg::M6Y,
            0x0e => Reg::M7X,
            0x0f => Reg::M7Y,
            0x10 => Reg::MX8,
            0x11 => Reg::CR1,
            0x12 => Reg::RASTER,
            0x13 => Reg::LPX,
            0x14 => Reg::LPY,
            0x15 => Reg::ME,
            0x16 => Reg::CR2,
            0x17 => Reg::MYE,
            0x18 => Reg::MEMPTR,
            0x19 => Reg::IRR,
            0x1a => Reg::IMR,
            0x1b => Reg::MDP,
            0x1c => Reg::MMC,
            0x1d => Reg::MXE,
            0x1e => Reg::MM,
            0x1f => Reg::MD,
            0x20 => Reg::EC,
            0x21 => Reg::B0C,
            0x22 => Reg::B1C,
            0x23 => Reg::B2C,
            0x24 => Reg::B3C,
            0x25 => Reg::MM0,
            0x26 => Reg::MM1,
            0x27 => Reg::M0C,
            0x28 => Reg::M1C,
            0x29 => Reg::M2C,
            0x2a => Reg::M3C,
            0x2b => Reg::M4C,
            0x2c => Reg::M5C,
            0x2d => Reg::M6C,
            0x2e => Reg::M7C,
            _ => Reg::IGNORE,
        }
    }
}

/// The MOS 6567/6569 (VIC-II): a per-cycle raster sequencer that shares the
/// bus with the CPU. `clock()` advances exactly one master cycle and drives
/// bad-line stalls, sprite DMA, and pixel composition through the building
/// blocks in `border_unit`/`gfx_sequencer`/`mux_unit`/`sprite_sequencer`.
pub struct Vic {
    mem: Rc<RefCell<Memory>>,
    color_ram: Rc<RefCell<ColorRam>>,
    frame_buffer: Rc<RefCell<FrameBuffer>>,
    irq_line: Rc<RefCell<InterruptLine>>,
    spec: Spec,

    den: bool,
    scroll_x: u8,
    scroll_y: u8,
    raster_compare: u16,
    irq_enable: u8,
    irq_status: u8,
    video_matrix_base: u16,
    char_base: u16,
    light_pen_pos: [u8; 2],

    border: BorderUnit,
    gfx: GfxSequencer,
    mux: MuxUnit,
    sprites: [SpriteSequencer; 8],

    raster_line: u16,
    cycle_in_line: u16,
    vc: u16,
    vc_base: u16,
    vmli: u8,
    rc: u8,
    display_state: DisplayState,
    bad_line_enabled: bool,
    is_bad_line: bool,

    sprite_dma_on: [bool; 8],
    sprite_mcbase: [u8; 8],

    character_space: [u8; 40],
    color_space: [u8; 40],

    collision_sprite_sprite: u8,
    collision_sprite_bg: u8,

    frame_done: bool,
}

impl Vic {
    pub fn new(
        model: VicModel,
        mem: Rc<RefCell<Memory>>,
        color_ram: Rc<RefCell<ColorRam>>,
        frame_buffer: Rc<RefCell<FrameBuffer>>,
        irq_line: Rc<RefCell<InterruptLine>>,
    ) -> Vic {
        Vic {
            mem,
            color_ram,
            frame_buffer,
            irq_line,
            spec: Spec::new(model),
            den: true,
            scroll_x: 0,
            scroll_y: 3,
            raster_compare: 0,
            irq_enable: 0,
            irq_status: 0,
            video_matrix_base: 0x0400,
            char_base: 0x1000,
            light_pen_pos: [0; 2],
            border: BorderUnit::new(),
            gfx: GfxSequencer::new(),
            mux: MuxUnit::new(),
            sprites: [
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
                SpriteSequencer::new(),
            ],
            raster_line: 0,
            cycle_in_line: 1,
            vc: 0,
            vc_base: 0,
            vmli: 0,
            rc: 0,
            display_state: DisplayState::Idle,
            bad_line_enabled: false,
            is_bad_line: false,
            sprite_dma_on: [false; 8],
            sprite_mcbase: [0; 8],
            character_space: [0; 40],
            color_space: [0; 40],
            collision_sprite_sprite: 0,
            collision_sprite_bg: 0,
            frame_done: false,
        }
    }

    pub fn reset(&mut self) {
        self.den = true;
        self.scroll_x = 0;
        self.scroll_y = 3;
        self.raster_compare = 0;
        self.irq_enable = 0;
        self.irq_status = 0;
        self.video_matrix_base = 0x0400;
        self.char_base = 0x1000;
        self.light_pen_pos = [0; 2];
        self.border.reset();
        self.gfx.reset();
        self.mux.reset();
        for sprite in self.sprites.iter_mut() {
            sprite.reset();
        }
        self.raster_line = 0;
        self.cycle_in_line = 1;
        self.vc = 0;
        self.vc_base = 0;
        self.vmli = 0;
        self.rc = 0;
        self.display_state = DisplayState::Idle;
        self.bad_line_enabled = false;
        self.is_bad_line = false;
        self.sprite_dma_on = [false; 8];
        self.sprite_mcbase = [0; 8];
        self.character_space = [0; 40];
        self.color_space = [0; 40];
        self.collision_sprite_sprite = 0;
        self.collision_sprite_bg = 0;
        self.frame_done = false;
    }

    pub fn raster_line(&self) -> u16 {
        self.raster_line
    }

    /// Consumes the end-of-frame flag raised when `raster_line` wraps to 0.
    pub fn take_frame_done(&mut self) -> bool {
        let done = self.frame_done;
        self.frame_done = false;
        done
    }

    /// Advances the chip by exactly one master cycle. Returns `false` while
    /// RDY should be held low, stalling the CPU's read micro-ops (bad-line
    /// c-accesses and the sprite-data fetch window).
    pub fn clock(&mut self) -> bool {
        self.is_bad_line = self.raster_line >= 0x30
            && self.raster_line <= 0xf7
            && (self.raster_line & 0x07) as u8 == self.scroll_y
            && self.bad_line_enabled;

        if self.cycle_in_line == 1 {
            if self.raster_line == 0 {
                self.vc_base = 0;
            }
            self.check_raster_irq();
        }

        if self.raster_line == 0x30 && self.den {
            self.bad_line_enabled = true;
        }

        if self.cycle_in_line == 14 {
            self.vc = self.vc_base;
            if self.is_bad_line {
                self.vmli = 0;
                self.rc = 0;
                self.display_state = DisplayState::Display;
            }
        }

        if self.is_bad_line && self.cycle_in_line >= 15 && self.cycle_in_line <= 54 {
            self.c_access();
        }

        if self.cycle_in_line == 16 {
            self.advance_sprite_mcbase();
        }

        if self.cycle_in_line == 55 {
            self.update_sprite_dma();
        }

        if self.cycle_in_line == 58 {
            self.fetch_sprite_data();
            if self.rc == 7 {
                self.display_state = DisplayState::Idle;
                self.vc_base = self.vc;
            }
            if self.display_state == DisplayState::Display {
                self.rc = (self.rc + 1) & 0x07;
            }
        }

        if self.cycle_in_line >= 16 && self.cycle_in_line <= 55 {
            self.g_access();
        }

        self.render_cycle();

        let sprite_stall = self.cycle_in_line == 58 && self.sprite_dma_on.iter().any(|&on| on);
        let rdy = !(self.is_bad_line && self.cycle_in_line >= 15 && self.cycle_in_line <= 54)
            && !sprite_stall;

        self.advance_raster();
        rdy
    }

    fn check_raster_irq(&mut self) {
        if self.raster_line == self.raster_compare {
            self.irq_status |= 0x01;
        }
        self.update_irq();
    }

    /// Tracks which sprites touched a pixel this cycle: two or more sprites
    /// overlapping sets $D01E (MM) and IRR bit 2, a sprite over a foreground
    /// graphics pixel sets $D01F (MD) and IRR bit 1. Both registers OR-latch
    /// until read (see `read`'s `Reg::MM`/`Reg::MD` arms).
    fn check_sprite_collisions(&mut self, sprite_out: [Option<u8>; 8], gfx_is_foreground: bool) {
        let mut sprite_mask = 0u8;
        for (i, pixel) in sprite_out.iter().enumerate() {
            if pixel.is_some() {
                sprite_mask |= 1 << i;
            }
        }
        if sprite_mask == 0 {
            return;
        }
        let mut irq_changed = false;
        if sprite_mask.count_ones() >= 2 {
            self.collision_sprite_sprite |= sprite_mask;
            self.irq_status |= 0x04;
            irq_changed = true;
        }
        if gfx_is_foreground {
            self.collision_sprite_bg |= sprite_mask;
            self.irq_status |= 0x02;
            irq_changed = true;
        }
        if irq_changed {
            self.update_irq();
        }
    }

    fn update_irq(&mut self) {
        if self.irq_status & self.irq_enable & 0x0f != 0 {
            self.irq_status |= 0x80;
            self.irq_line.borrow_mut().set(Source::Vic);
        } else {
            self.irq_status &= 0x7f;
            self.irq_line.borrow_mut().clear(Source::Vic);
        }
    }

    fn c_access(&mut self) {
        let addr = self.video_matrix_base + self.vc;
        self.character_space[self.vmli as usize] = self.mem.borrow().vic_read(addr);
        self.color_space[self.vmli as usize] = self.color_ram.borrow().read(self.vc);
    }

    fn g_access(&mut self) {
        if self.display_state == DisplayState::Display {
            let addr = self.gfx_fetch_address();
            let g_data = self.mem.borrow().vic_read(addr);
            let idx = self.vmli as usize;
            self.gfx
                .set_data(self.character_space[idx], self.color_space[idx], g_data);
        } else {
            self.gfx.set_data(0, 0, 0);
        }
        self.gfx.load_data();
        self.vc = (self.vc + 1) & 0x3ff;
        self.vmli = (self.vmli + 1) % 40;
    }

    fn gfx_fetch_address(&self) -> u16 {
        let idx = self.vmli as usize;
        match self.gfx.config.mode {
            GfxMode::Bitmap | GfxMode::McBitmap => {
                (self.char_base & 0x2000) | (self.vc << 3) | self.rc as u16
            }
            GfxMode::EcmText => {
                self.char_base
                    | (((self.character_space[idx] & 0x3f) as u16) << 3)
                    | self.rc as u16
            }
            _ => self.char_base | ((self.character_space[idx] as u16) << 3) | self.rc as u16,
        }
    }

    fn advance_sprite_mcbase(&mut self) {
        for i in 0..8 {
            if self.sprite_dma_on[i] {
                if self.sprites[i].expansion_ff {
                    self.sprite_mcbase[i] = (self.sprite_mcbase[i] + 3) % 64;
                }
                if self.sprite_mcbase[i] == 63 {
                    self.sprite_dma_on[i] = false;
                }
            }
        }
    }

    fn update_sprite_dma(&mut self) {
        let sprite_y = (self.raster_line & 0xff) as u8;
        for i in 0..8 {
            if self.sprites[i].config.enabled
                && self.sprites[i].config.y == sprite_y
                && !self.sprite_dma_on[i]
            {
                self.sprite_dma_on[i] = true;
                self.sprite_mcbase[i] = 0;
                if self.sprites[i].config.expand_y {
                    self.sprites[i].expansion_ff = false;
                }
            }
            if self.sprites[i].config.expand_y {
                self.sprites[i].expansion_ff = !self.sprites[i].expansion_ff;
            }
        }
    }

    /// One combined sprite-pointer/data fetch per active sprite per line.
    /// Real hardware spreads this across cycles 58+2n with a 2-cycle stall
    /// per sprite; collapsed here into a single cycle-58 burst.
    fn fetch_sprite_data(&mut self) {
        for i in 0..8 {
            if self.sprite_dma_on[i] {
                let ptr_addr = (self.video_matrix_base & 0x3fff) + 0x3f8 + i as u16;
                let ptr = self.mem.borrow().vic_read(ptr_addr) as u16;
                let base = (ptr << 6) + self.sprite_mcbase[i] as u16;
                let b0 = self.mem.borrow().vic_read(base);
                let b1 = self.mem.borrow().vic_read(base + 1);
                let b2 = self.mem.borrow().vic_read(base + 2);
                self.sprites[i].set_data(0, b0);
                self.sprites[i].set_data(1, b1);
                self.sprites[i].set_data(2, b2);
                self.sprites[i].display = true;
                self.sprite_mcbase[i] = (self.sprite_mcbase[i] + 3) % 64;
            } else {
                self.sprites[i].display = false;
            }
        }
    }

    fn render_cycle(&mut self) {
        let base_raw_x =
            ((self.spec.first_x_coord as u32 + (self.cycle_in_line as u32 - 1) * 8) % 0x200) as u16;
        for pixel in 0..8u16 {
            let raw_x = (base_raw_x + pixel) % 0x200;
            let screen_x = BorderUnit::map_sprite_to_screen(raw_x);

            self.border.update_main_ff(screen_x, self.raster_line, self.den);

            self.gfx.clock();
            let gfx_out = self.gfx.output();

            let mut sprite_out = [None; 8];
            for i in 0..8 {
                self.sprites[i].clock(screen_x);
                sprite_out[i] = self.sprites[i].output();
            }

            self.check_sprite_collisions(sprite_out, gfx_out.1);

            self.mux.feed_graphics(gfx_out);
            self.mux.feed_sprites(sprite_out);
            if self.border.is_enabled() {
                self.mux.feed_border(self.border.config.border_color);
            }

            let color = self.mux.output();
            self.frame_buffer.borrow_mut().write(screen_x, self.raster_line, color);
        }
    }

    fn advance_raster(&mut self) {
        if self.cycle_in_line >= self.spec.cycles_per_raster {
            self.cycle_in_line = 1;
            self.raster_line += 1;
            if self.raster_line >= self.spec.raster_lines {
                self.raster_line = 0;
                self.bad_line_enabled = false;
                self.frame_done = true;
            }
        } else {
            self.cycle_in_line += 1;
        }
    }

    fn sync_sprite_screen_x(&mut self, i: usize) {
        self.sprites[i].config.x_screen = BorderUnit::map_sprite_to_screen(self.sprites[i].config.x);
    }

    pub fn read(&mut self, reg: u8) -> u8 {
        match Reg::from(reg) {
            Reg::M0X => (self.sprites[0].config.x & 0x00ff) as u8,
            Reg::M0Y => self.sprites[0].config.y,
            Reg::M1X => (self.sprites[1].config.x & 0x00ff) as u8,
            Reg::M1Y => self.sprites[1].config.y,
            Reg::M2X => (self.sprites[2].config.x & 0x00ff) as u8,
            Reg::M2Y => self.sprites[2].config.y,
            Reg::M3X => (self.sprites[3].config.x & 0x00ff) as u8,
            Reg::M3Y => self.sprites[3].config.y,
            Reg::M4X => (self.sprites[4].config.x & 0x00ff) as u8,
            Reg::M4Y => self.sprites[4].config.y,
            Reg::M5X => (self.sprites[5].config.x & 0x00ff) as u8,
            Reg::M5Y => self.sprites[5].config.y,
            Reg::M6X => (self.sprites[6].config.x & 0x00ff) as u8,
            Reg::M6Y => self.sprites[6].config.y,
            Reg::M7X => (self.sprites[7].config.x & 0x00ff) as u8,
            Reg::M7Y => self.sprites[7].config.y,
            Reg::MX8 => {
                let mut value = 0u8;
                for (i, sprite) in self.sprites.iter().enumerate() {
                    if sprite.config.x & 0x100 != 0 {
                        value |= 1 << i;
                    }
                }
                value
            }
            Reg::CR1 => {
                let rst8 = ((self.raster_line & 0x100) >> 1) as u8;
                let ecm = if self.gfx.config.mode as u8 & 0x04 != 0 { 0x40 } else { 0 };
                let bmm = if self.gfx.config.mode as u8 & 0x02 != 0 { 0x20 } else { 0 };
                let den = if self.den { 0x10 } else { 0 };
                let rsel = if self.border.config.rsel { 0x08 } else { 0 };
                (rst8 as u8) | ecm | bmm | den | rsel | (self.scroll_y & 0x07)
            }
            Reg::RASTER => (self.raster_line & 0x00ff) as u8,
            Reg::LPX => self.light_pen_pos[0],
            Reg::LPY => self.light_pen_pos[1],
            Reg::ME => {
                let mut value = 0u8;
                for (i, sprite) in self.sprites.iter().enumerate() {
                    if sprite.config.enabled {
                        value |= 1 << i;
                    }
                }
                value
            }
            Reg::CR2 => {
                let res = 1 << 5;
                let mcm = if self.gfx.config.mode as u8 & 0x01 != 0 { 0x10 } else { 0 };
                let csel = if self.border.config.csel { 0x08 } else { 0 };
                res | mcm | csel | (self.scroll_x & 0x07) | 0xc0
            }
            Reg::MYE => {
                let mut value = 0u8;
                for (i, sprite) in self.sprites.iter().enumerate() {
                    if sprite.config.expand_y {
                        value |= 1 << i;
                    }
                }
                value
            }
            Reg::MEMPTR => {
                let vm = ((self.video_matrix_base >> 10) as u8) << 4;
                let cb = ((self.char_base >> 11) as u8) << 1;
                vm | cb | 0x01
            }
            Reg::IRR => self.irq_status | 0x70,
            Reg::IMR => self.irq_enable | 0xf0,
            Reg::MDP => {
                let mut value = 0u8;
                for (i, sprite) in self.sprites.iter().enumerate() {
                    if sprite.config.data_priority {
                        value |= 1 << i;
                    }
                }
                value
            }
            Reg::MMC => {
                let mut value = 0u8;
                for (i, sprite) in self.sprites.iter().enumerate() {
                    if sprite.config.mode == SpriteMode::Multicolor {
                        value |= 1 << i;
                    }
                }
                value
            }
            Reg::MXE => {
                let mut value = 0u8;
                for (i, sprite) in self.sprites.iter().enumerate() {
                    if sprite.config.expand_x {
                        value |= 1 << i;
                    }
                }
                value
            }
            Reg::MM => {
                let value = self.collision_sprite_sprite;
                self.collision_sprite_sprite = 0;
                value
            }
            Reg::MD => {
                let value = self.collision_sprite_bg;
                self.collision_sprite_bg = 0;
                value
            }
            Reg::EC => self.border.config.border_color | 0xf0,
            Reg::B0C => self.gfx.config.bg_color[0] | 0xf0,
            Reg::B1C => self.gfx.config.bg_color[1] | 0xf0,
            Reg::B2C => self.gfx.config.bg_color[2] | 0xf0,
            Reg::B3C => self.gfx.config.bg_color[3] | 0xf0,
            Reg::MM0 => self.sprites[0].config.multicolor[0] | 0xf0,
            Reg::MM1 => self.sprites[0].config.multicolor[1] | 0xf0,
            Reg::M0C => self.sprites[0].config.color | 0xf0,
            Reg::M1C => self.sprites[1].config.color | 0xf0,
            Reg::M2C => self.sprites[2].config.color | 0xf0,
            Reg::M3C => self.sprites[3].config.color | 0xf0,
            Reg::M4C => self.sprites[4].config.color | 0xf0,
            Reg::M5C => self.sprites[5].config.color | 0xf0,
            Reg::M6C => self.sprites[6].config.color | 0xf0,
            Reg::M7C => self.sprites[7].config.color | 0xf0,
            Reg::IGNORE => 0xff,
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        match Reg::from(reg) {
            Reg::M0X => {
                self.sprites[0].config.x = (self.sprites[0].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(0);
            }
            Reg::M0Y => self.sprites[0].config.y = value,
            Reg::M1X => {
                self.sprites[1].config.x = (self.sprites[1].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(1);
            }
            Reg::M1Y => self.sprites[1].config.y = value,
            Reg::M2X => {
                self.sprites[2].config.x = (self.sprites[2].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(2);
            }
            Reg::M2Y => self.sprites[2].config.y = value,
            Reg::M3X => {
                self.sprites[3].config.x = (self.sprites[3].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(3);
            }
            Reg::M3Y => self.sprites[3].config.y = value,
            Reg::M4X => {
                self.sprites[4].config.x = (self.sprites[4].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(4);
            }
            Reg::M4Y => self.sprites[4].config.y = value,
            Reg::M5X => {
                self.sprites[5].config.x = (self.sprites[5].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(5);
            }
            Reg::M5Y => self.sprites[5].config.y = value,
            Reg::M6X => {
                self.sprites[6].config.x = (self.sprites[6].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(6);
            }
            Reg::M6Y => self.sprites[6].config.y = value,
            Reg::M7X => {
                self.sprites[7].config.x = (self.sprites[7].config.x & 0xff00) | value as u16;
                self.sync_sprite_screen_x(7);
            }
            Reg::M7Y => self.sprites[7].config.y = value,
            Reg::MX8 => {
                for i in 0..8 {
                    let bit = value & (1 << i) != 0;
                    self.sprites[i].config.x = if bit {
                        self.sprites[i].config.x | 0x100
                    } else {
                        self.sprites[i].config.x & 0x0ff
                    };
                    self.sync_sprite_screen_x(i);
                }
            }
            Reg::CR1 => {
                self.raster_compare = (self.raster_compare & 0x00ff) | (((value & 0x80) as u16) << 1);
                let mut mode = self.gfx.config.mode as u8 & 0x01;
                mode |= if value & 0x40 != 0 { 0x04 } else { 0 };
                mode |= if value & 0x20 != 0 { 0x02 } else { 0 };
                self.gfx.config.mode = GfxMode::from(mode);
                self.den = value & 0x10 != 0;
                self.border.config.rsel = value & 0x08 != 0;
                self.scroll_y = value & 0x07;
            }
            Reg::RASTER => self.raster_compare = (self.raster_compare & 0xff00) | value as u16,
            Reg::LPX => self.light_pen_pos[0] = value,
            Reg::LPY => self.light_pen_pos[1] = value,
            Reg::ME => {
                for i in 0..8 {
                    self.sprites[i].config.enabled = value & (1 << i) != 0;
                }
            }
            Reg::CR2 => {
                let mut mode = self.gfx.config.mode as u8 & 0x06;
                mode |= if value & 0x10 != 0 { 0x01 } else { 0 };
                self.gfx.config.mode = GfxMode::from(mode);
                self.border.config.csel = value & 0x08 != 0;
                self.scroll_x = value & 0x07;
            }
            Reg::MYE => {
                for i in 0..8 {
                    self.sprites[i].config.expand_y = value & (1 << i) != 0;
                }
            }
            Reg::MEMPTR => {
                self.video_matrix_base = (((value & 0xf0) >> 4) as u16) << 10;
                self.char_base = (((value & 0x0e) >> 1) as u16) << 11;
            }
            Reg::IRR => {
                self.irq_status &= !(value & 0x0f);
                self.update_irq();
            }
            Reg::IMR => {
                self.irq_enable = value & 0x0f;
                self.update_irq();
            }
            Reg::MDP => {
                for i in 0..8 {
                    self.sprites[i].config.data_priority = value & (1 << i) != 0;
                }
            }
            Reg::MMC => {
                for i in 0..8 {
                    self.sprites[i].config.mode = if value & (1 << i) != 0 {
                        SpriteMode::Multicolor
                    } else {
                        SpriteMode::Standard
                    };
                }
            }
            Reg::MXE => {
                for i in 0..8 {
                    self.sprites[i].config.expand_x = value & (1 << i) != 0;
                }
            }
            Reg::MM => {}
            Reg::MD => {}
            Reg::EC => self.border.config.border_color = value & 0x0f,
            Reg::B0C => self.gfx.config.bg_color[0] = value & 0x0f,
            Reg::B1C => self.gfx.config.bg_color[1] = value & 0x0f,
            Reg::B2C => self.gfx.config.bg_color[2] = value & 0x0f,
            Reg::B3C => self.gfx.config.bg_color[3] = value & 0x0f,
            Reg::MM0 => {
                for sprite in self.sprites.iter_mut() {
                    sprite.config.multicolor[0] = value & 0x0f;
                }
            }
            Reg::MM1 => {
                for sprite in self.sprites.iter_mut() {
                    sprite.config.multicolor[1] = value & 0x0f;
                }
            }
            Reg::M0C => self.sprites[0].config.color = value & 0x0f,
            Reg::M1C => self.sprites[1].config.color = value & 0x0f,
            Reg::M2C => self.sprites[2].config.color = value & 0x0f,
            Reg::M3C => self.sprites[3].config.color = value & 0x0f,
            Reg::M4C => self.sprites[4].config.color = value & 0x0f,
            Reg::M5C => self.sprites[5].config.color = value & 0x0f,
            Reg::M6C => self.sprites[6].config.color = value & 0x0f,
            Reg::M7C => self.sprites[7].config.color = value & 0x0f,
            Reg::IGNORE => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{BaseAddr, Rom};
    use crate::system::palette::Palette;

    fn new_vic() -> Vic {
        let mem = Rc::new(RefCell::new(Memory::new(
            Rom::from_bytes(vec![0; 0x2000], BaseAddr::Basic.addr()),
            Rom::from_bytes(vec![0; 0x1000], BaseAddr::Charset.addr()),
            Rom::from_bytes(vec![0; 0x2000], BaseAddr::Kernal.addr()),
        )));
        let color_ram = Rc::new(RefCell::new(ColorRam::new()));
        let frame_buffer = Rc::new(RefCell::new(FrameBuffer::new(504, 312, Palette::default())));
        let irq_line = Rc::new(RefCell::new(InterruptLine::new()));
        Vic::new(VicModel::Mos6569, mem, color_ram, frame_buffer, irq_line)
    }

    #[test]
    fn raster_line_wraps_at_312_and_never_hits_line_312() {
        let mut vic = new_vic();
        for _ in 0..(312 * 63) {
            vic.clock();
            assert_ne!(312, vic.raster_line());
        }
        assert_eq!(0, vic.raster_line());
    }

    #[test]
    fn frame_done_raised_once_per_312_lines() {
        let mut vic = new_vic();
        let mut frames = 0;
        for _ in 0..(312 * 63) {
            vic.clock();
            if vic.take_frame_done() {
                frames += 1;
            }
        }
        assert_eq!(1, frames);
    }

    #[test]
    fn raster_irq_fires_when_compare_matches() {
        let mut vic = new_vic();
        vic.write(0x12, 5); // RASTER compare lo = 5
        vic.write(0x1a, 0x01); // IMR: raster IRQ unmasked
        for _ in 0..(5 * 63 + 1) {
            vic.clock();
        }
        assert_eq!(0x01, vic.read(0x19) & 0x01);
        assert!(vic.irq_line.borrow().is_asserted());
    }

    #[test]
    fn sprite_sprite_overlap_latches_mm_and_irr_until_read() {
        let mut vic = new_vic();
        vic.write(0x1a, 0x04); // IMR: sprite-sprite collision unmasked
        let sprite_out = [Some(1), Some(1), None, None, None, None, None, None];
        vic.check_sprite_collisions(sprite_out, false);

        assert_eq!(0x04, vic.read(0x19) & 0x04);
        assert_eq!(0b0000_0011, vic.read(0x1e));
        // reading MM clears the accumulator.
        assert_eq!(0, vic.read(0x1e));
    }

    #[test]
    fn sprite_over_foreground_graphics_latches_md() {
        let mut vic = new_vic();
        let sprite_out = [None, Some(9), None, None, None, None, None, None];
        vic.check_sprite_collisions(sprite_out, true);

        assert_eq!(0b0000_0010, vic.read(0x1f));
        assert_eq!(0, vic.read(0x1f));
    }

    #[test]
    fn badline_detection_follows_yscroll_and_den() {
        let mut vic = new_vic();
        vic.write(0x11, 0x1b); // DEN=1, RSEL=1, YSCROLL=3 (default-matching)
        vic.raster_line = 0x30;
        vic.cycle_in_line = 1;
        vic.clock();
        assert!(vic.bad_line_enabled);
    }

    #[test]
    fn sprite_x_register_round_trips_low_byte() {
        let mut vic = new_vic();
        vic.write(0x00, 0x42);
        assert_eq!(0x42, vic.read(0x00));
    }

    #[test]
    fn border_color_register_masks_to_nibble() {
        let mut vic = new_vic();
        vic.write(0x20, 0xff);
        assert_eq!(0x0f, vic.border.config.border_color);
        assert_eq!(0xff, vic.read(0x20));
    }
}
