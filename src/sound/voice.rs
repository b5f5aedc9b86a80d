// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use crate::sound::envelope::Envelope;
use crate::sound::wave::Oscillator;
use crate::system::model::SidModel;

/// One of the SID's three voices: an oscillator feeding an ADSR envelope.
/// Sync/ring-mod partners are wired up by the owning `Sid` each sample,
/// since voice 1 syncs to voice 3 and so on around the ring.
pub struct Voice {
    pub oscillator: Oscillator,
    pub envelope: Envelope,
    pub filter_routed: bool,
    last_overflow: bool,
}

impl Voice {
    pub fn new() -> Voice {
        Voice {
            oscillator: Oscillator::new(),
            envelope: Envelope::new(),
            filter_routed: false,
            last_overflow: false,
        }
    }

    pub fn reset(&mut self) {
        self.oscillator.reset();
        self.envelope.reset();
        self.filter_routed = false;
        self.last_overflow = false;
    }

    pub fn set_control(&mut self, value: u8) {
        self.oscillator.set_control(value);
        self.envelope.set_gate(value & 0x01 != 0);
    }

    /// Advances the oscillator and envelope by one sample and returns the
    /// overflow flag for the next voice's hard-sync check.
    pub fn clock(&mut self, base_speed: u32, sync_source_overflowed: bool) -> bool {
        self.oscillator.sync_to(sync_source_overflowed);
        let overflowed = self.oscillator.clock(base_speed);
        self.envelope.clock(1);
        self.last_overflow = overflowed;
        overflowed
    }

    /// Signed sample contribution, waveform output scaled by the envelope.
    pub fn output(&self, ring_source_msb: bool, model: SidModel) -> i32 {
        let wave = self.oscillator.output(ring_source_msb, model) as i32;
        let env = self.envelope.output() as i32;
        (wave - 0x800) * env
    }

    pub fn msb(&self) -> bool {
        self.oscillator.msb()
    }

    pub fn last_overflow_peek(&self) -> bool {
        self.last_overflow
    }

    /// $D41B readback: the oscillator's high byte, used only for voice 3.
    pub fn oscillator_output_hint(&self, model: SidModel) -> u16 {
        self.oscillator.output(false, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_drives_envelope_through_control_register() {
        let mut voice = Voice::new();
        voice.set_control(0x41);
        assert!(voice.envelope.output() >= 0);
        assert_eq!(crate::sound::envelope::State::Attack, voice.envelope.state);
    }
}
