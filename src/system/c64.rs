// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::cpu::{Cpu6510, InterruptLine, Source};
use crate::error::EmuError;
use crate::io::Cia;
use crate::mem::{BaseAddr, Cartridge, ColorRam, Memory, Mmio, Rom};
use crate::sound::Sid;
use crate::system::breakpoint::BreakpointManager;
use crate::system::config::Config;
use crate::system::frame_buffer::FrameBuffer;
use crate::system::palette::Palette;
use crate::video::Vic;

/// A stop condition surfaced by `run_frame`. Errors that abort the running
/// program (JAM) and debugger-requested stops (breakpoints) share this type
/// rather than `EmuError`, which is reserved for load-time failures (see the
/// error handling design).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FrameComplete,
    IllegalInstruction(u8),
    HardBreakpoint(u16),
    SoftBreakpoint(u16),
}

/// Owns every chip in the ensemble and drives them one master cycle at a
/// time. This is the scheduler: `beam_tick` is the unit of progress, and
/// everything else (frame pacing, breakpoints, tracing) is built on top of
/// calling it repeatedly.
pub struct C64 {
    config: Config,

    cpu: Cpu6510,
    vic: Rc<RefCell<Vic>>,
    sid: Rc<RefCell<Sid>>,
    cia1: Rc<RefCell<Cia>>,
    cia2: Rc<RefCell<Cia>>,
    mem: Rc<RefCell<Memory>>,

    frame_buffer: Rc<RefCell<FrameBuffer>>,
    breakpoints: BreakpointManager,
    trace: bool,

    cycles: u64,
    frames: u64,
}

impl C64 {
    pub fn new(config: Config, basic: Rom, charset: Rom, kernal: Rom) -> C64 {
        let irq_line = Rc::new(RefCell::new(InterruptLine::new()));
        let nmi_line = Rc::new(RefCell::new(InterruptLine::new()));

        let mem = Rc::new(RefCell::new(Memory::new(basic, charset, kernal)));
        let color_ram = Rc::new(RefCell::new(ColorRam::new()));
        let frame_buffer = Rc::new(RefCell::new(FrameBuffer::new(403, 284, Palette::default())));

        let vic = Rc::new(RefCell::new(Vic::new(
            config.model.vic_model,
            mem.clone(),
            color_ram.clone(),
            frame_buffer.clone(),
            irq_line.clone(),
        )));
        let sid = Rc::new(RefCell::new(Sid::new(config.model.sid_model)));
        sid.borrow_mut()
            .set_sampling_parameters(config.model.cpu_freq, config.sound.sample_rate);
        sid.borrow_mut().enable_filter(config.sound.sid_filters);

        let cia1 = Rc::new(RefCell::new(Cia::new(irq_line.clone(), Source::Cia1)));
        let cia2 = Rc::new(RefCell::new(Cia::new(nmi_line.clone(), Source::Cia2)));

        // CIA-2 port A bits 0-1 select the VIC's visible 16 KiB bank.
        let vic_bank_select = mem.borrow().vic_bank_select();
        cia2
            .borrow_mut()
            .set_port_a_observer(Box::new(move |port_a| vic_bank_select.set(port_a)));

        let mmio = Mmio::new(vic.clone(), sid.clone(), color_ram, cia1.clone(), cia2.clone());
        mem.borrow_mut().set_io(Rc::new(RefCell::new(mmio)));

        let cpu = Cpu6510::new(mem.clone(), irq_line, nmi_line);

        C64 {
            config,
            cpu,
            vic,
            sid,
            cia1,
            cia2,
            mem,
            frame_buffer,
            breakpoints: BreakpointManager::new(),
            trace: false,
            cycles: 0,
            frames: 0,
        }
    }

    /// Loads the three mask ROMs from `rom_dir` (`basic.rom`, `characters.rom`,
    /// `kernal.rom`) and constructs the machine around them.
    pub fn open(config: Config, rom_dir: &Path) -> Result<C64, EmuError> {
        let basic = Rom::load(&rom_dir.join("basic.rom"), BaseAddr::Basic.addr())?;
        let charset = Rom::load(&rom_dir.join("characters.rom"), BaseAddr::Charset.addr())?;
        let kernal = Rom::load(&rom_dir.join("kernal.rom"), BaseAddr::Kernal.addr())?;
        Ok(C64::new(config, basic, charset, kernal))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cpu(&self) -> &Cpu6510 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu6510 {
        &mut self.cpu
    }

    pub fn sid(&self) -> Rc<RefCell<Sid>> {
        self.sid.clone()
    }

    pub fn frame_buffer(&self) -> Rc<RefCell<FrameBuffer>> {
        self.frame_buffer.clone()
    }

    pub fn breakpoints_mut(&mut self) -> &mut BreakpointManager {
        &mut self.breakpoints
    }

    /// Enables a one-line-per-instruction trace at `trace!(target: "cpu")`.
    pub fn set_trace(&mut self, enable: bool) {
        self.trace = enable;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Copies `data` verbatim into RAM starting at `offset`, bypassing bank
    /// switching. Used by the PRG/BIN loaders to hand a program to memory
    /// without going through the CPU's bus view.
    pub fn load(&mut self, data: &[u8], offset: u16) {
        let mut mem = self.mem.borrow_mut();
        let mut address = offset;
        for &byte in data {
            mem.write_direct(address, byte);
            address = address.wrapping_add(1);
        }
    }

    /// Reads a RAM byte directly, bypassing bank switching. Mirrors `load`'s
    /// write path; mainly useful for loader tests and debugger inspection.
    pub fn read_direct(&self, address: u16) -> u8 {
        self.mem.borrow().read_direct(address)
    }

    pub fn attach_cartridge(&mut self, cartridge: Cartridge) {
        self.mem.borrow_mut().attach_cartridge(cartridge);
        self.reset(false);
    }

    pub fn detach_cartridge(&mut self) {
        self.mem.borrow_mut().detach_cartridge();
        self.reset(false);
    }

    pub fn reset(&mut self, hard: bool) {
        info!(target: "c64", "Resetting system (hard = {})", hard);
        if hard {
            self.mem.borrow_mut().reset();
        }
        self.cpu.reset();
        self.vic.borrow_mut().reset();
        self.sid.borrow_mut().reset();
        self.cia1.borrow_mut().reset();
        self.cia2.borrow_mut().reset();
        self.frame_buffer.borrow_mut().reset();
        self.cycles = 0;
        self.frames = 0;
    }

    /// Advances every chip by exactly one master cycle, in the fixed order
    /// VIC, CPU, CIAs, SID. Returns true once per 312 lines, when the VIC
    /// has just completed a frame.
    pub fn beam_tick(&mut self) -> bool {
        let rdy = self.vic.borrow_mut().clock();
        self.cpu.set_rdy(rdy);
        self.cpu.clock();

        if self.trace && self.cpu.just_fetched_instruction() {
            trace!(
                target: "cpu",
                "{:04x}: a={:02x} x={:02x} y={:02x} sp={:02x} p={:02x}",
                self.cpu.last_fetch_pc(),
                self.cpu.a(),
                self.cpu.x(),
                self.cpu.y(),
                self.cpu.sp(),
                self.cpu.p()
            );
        }

        self.cia1.borrow_mut().tick();
        self.cia2.borrow_mut().tick();
        self.sid.borrow_mut().execute(1);

        self.cycles = self.cycles.wrapping_add(1);
        let frame_done = self.vic.borrow_mut().take_frame_done();
        if frame_done {
            self.frames = self.frames.wrapping_add(1);
        }
        frame_done
    }

    /// Runs until either a full frame has been produced or a debugger-visible
    /// stop condition (JAM, breakpoint) is hit. The caller decides what to do
    /// next: pull the frame, inspect the CPU, or keep running.
    pub fn run_frame(&mut self) -> StopReason {
        loop {
            let frame_done = self.beam_tick();

            if let Some(opcode) = self.cpu.is_jammed() {
                return StopReason::IllegalInstruction(opcode);
            }
            if self.breakpoints.is_bp_present() && self.cpu.just_fetched_instruction() {
                if let Some(reason) = self.check_breakpoint(self.cpu.last_fetch_pc()) {
                    return reason;
                }
            }
            if frame_done {
                return StopReason::FrameComplete;
            }
        }
    }

    fn check_breakpoint(&mut self, pc: u16) -> Option<StopReason> {
        let soft = self
            .breakpoints
            .list()
            .find(|bp| bp.address == pc && bp.enabled)
            .map(|bp| bp.is_soft());
        if self.breakpoints.check_address(pc).is_some() {
            Some(if soft.unwrap_or(false) {
                StopReason::SoftBreakpoint(pc)
            } else {
                StopReason::HardBreakpoint(pc)
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::model::SystemModel;

    fn new_test_machine() -> C64 {
        let config = Config::new(SystemModel::c64_pal());
        C64::new(
            config,
            Rom::from_bytes(vec![0; 0x2000], BaseAddr::Basic.addr()),
            Rom::from_bytes(vec![0; 0x1000], BaseAddr::Charset.addr()),
            Rom::from_bytes(vec![0x60; 0x2000], BaseAddr::Kernal.addr()),
        )
    }

    #[test]
    fn reset_then_boot_lands_on_reset_vector_after_seven_cycles() {
        let mut c64 = new_test_machine();
        // reset vector $FFFC/D reads from the all-$60 (RTS) kernal image.
        c64.reset(true);
        for _ in 0..7 {
            c64.beam_tick();
        }
        // FetchOpcode on the 7th cycle reads the vector byte and advances pc past it.
        assert_eq!(0x6061, c64.cpu().pc());
    }

    #[test]
    fn beam_tick_advances_raster_line_over_one_frame() {
        let mut c64 = new_test_machine();
        c64.reset(true);
        let cycles_per_frame = c64.config().model.cycles_per_frame as u64;
        let mut ticks = 0u64;
        loop {
            let done = c64.beam_tick();
            ticks += 1;
            if done {
                break;
            }
            assert!(ticks <= cycles_per_frame + 1);
        }
        assert_eq!(cycles_per_frame, ticks);
        assert_eq!(1, c64.frames());
    }

    #[test]
    fn hard_breakpoint_stops_run_frame_at_instruction_boundary() {
        let mut c64 = new_test_machine();
        c64.reset(true);
        c64.cpu_mut().set_pc(0x0800);
        c64.breakpoints_mut().set(0x0800, false);
        match c64.run_frame() {
            StopReason::HardBreakpoint(addr) => assert_eq!(0x0800, addr),
            other => panic!("expected hard breakpoint, got {:?}", other),
        }
    }

    #[test]
    fn load_writes_bytes_directly_into_ram() {
        let mut c64 = new_test_machine();
        c64.load(&[0xa9, 0x42], 0x1000);
        assert_eq!(0xa9, c64.mem.borrow().read_direct(0x1000));
        assert_eq!(0x42, c64.mem.borrow().read_direct(0x1001));
    }
}
