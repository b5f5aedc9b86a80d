// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

/// One bit per device that can assert an interrupt request. IRQ and NMI
/// each get their own `InterruptLine`; a source is "asserted" while its
/// bit is set, and clears only when the device itself clears it (e.g. a
/// CIA ICR read, or VIC $D019 write-one-to-clear).
#[derive(Copy, Clone, Debug)]
pub enum Source {
    Vic = 1 << 0,
    Cia1 = 1 << 1,
    Cia2 = 1 << 2,
    Cartridge = 1 << 3,
}

pub enum Vector {
    Nmi = 0xfffa,
    Reset = 0xfffc,
    Irq = 0xfffe,
}

#[derive(Default)]
pub struct InterruptLine {
    line: u8,
}

impl InterruptLine {
    pub fn new() -> InterruptLine {
        InterruptLine { line: 0 }
    }

    #[inline]
    pub fn set(&mut self, source: Source) {
        if log_enabled!(log::Level::Trace) {
            trace!(target: "cpu::int", "set {:?}", source);
        }
        self.line |= source as u8;
    }

    #[inline]
    pub fn clear(&mut self, source: Source) {
        self.line &= !(source as u8);
    }

    #[inline]
    pub fn is_asserted(&self) -> bool {
        self.line != 0
    }

    pub fn reset(&mut self) {
        self.line = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear() {
        let mut line = InterruptLine::new();
        assert!(!line.is_asserted());
        line.set(Source::Vic);
        line.set(Source::Cia1);
        assert!(line.is_asserted());
        line.clear(Source::Vic);
        assert!(line.is_asserted());
        line.clear(Source::Cia1);
        assert!(!line.is_asserted());
    }
}
