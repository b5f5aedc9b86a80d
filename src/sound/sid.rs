// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

// SPEC: http://www.oxyron.de/html/registers_sid.html

use crate::sound::filter::Filter;
use crate::sound::sound_buffer::SoundBuffer;
use crate::sound::voice::Voice;
use crate::system::model::SidModel;

/// Register writes decay to zero after this many generated samples, for the
/// write-only registers that still return a fading copy of the last value.
const WRITE_LATCH_DECAY_SAMPLES: u32 = 2000;

pub struct Sid {
    model: SidModel,
    voices: [Voice; 3],
    filter: Filter,
    filter_enabled: bool,
    voice3_disconnected: bool,

    cpu_freq: u32,
    sample_rate: u32,
    base_speed: u32,
    sample_error: u64,

    write_latch: [u8; 32],
    write_latch_age: [u32; 32],

    buffer: SoundBuffer,
}

impl Sid {
    pub fn new(model: SidModel) -> Sid {
        let mut sid = Sid {
            model,
            voices: [Voice::new(), Voice::new(), Voice::new()],
            filter: Filter::new(),
            filter_enabled: true,
            voice3_disconnected: false,
            cpu_freq: 985_248,
            sample_rate: 44_100,
            base_speed: 0,
            sample_error: 0,
            write_latch: [0; 32],
            write_latch_age: [0; 32],
            buffer: SoundBuffer::new(),
        };
        sid.set_sampling_parameters(985_248, 44_100);
        sid
    }

    pub fn set_sampling_parameters(&mut self, cpu_freq: u32, sample_rate: u32) {
        self.cpu_freq = cpu_freq;
        self.sample_rate = sample_rate;
        // Q16 fixed-point cpu_freq/sample_rate: the oscillator multiplies
        // this by the 16-bit frequency register each sample to get its
        // 24-bit phase step, reproducing Fout = Freg * cpu_freq / 2^24.
        self.base_speed = (((cpu_freq as u64) << 16) / sample_rate as u64) as u32;
    }

    pub fn enable_filter(&mut self, enable: bool) {
        self.filter_enabled = enable;
    }

    pub fn buffer(&mut self) -> &mut SoundBuffer {
        &mut self.buffer
    }

    pub fn reset(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
        self.filter.reset();
        self.voice3_disconnected = false;
        self.write_latch = [0; 32];
        self.write_latch_age = [0; 32];
        self.sample_error = 0;
        self.buffer.reset();
    }

    /// Catches the SID up to `cpu_cycles` master cycles, producing
    /// `cpu_cycles * sample_rate / cpu_clock` samples via integer
    /// accumulation, and pushes each into the shared ring buffer.
    pub fn execute(&mut self, cpu_cycles: u32) {
        self.sample_error += cpu_cycles as u64 * self.sample_rate as u64;
        while self.sample_error >= self.cpu_freq as u64 {
            self.sample_error -= self.cpu_freq as u64;
            let sample = self.tick_sample();
            self.buffer.push(sample);
            for age in self.write_latch_age.iter_mut() {
                *age = age.saturating_sub(1);
            }
        }
    }

    fn tick_sample(&mut self) -> f32 {
        // Sync/ring-mod wiring: voice N syncs/rings from voice N-1, wrapping.
        let prev_overflow = [
            self.voices[2].last_overflow_peek(),
            self.voices[0].last_overflow_peek(),
            self.voices[1].last_overflow_peek(),
        ];
        let prev_msb = [
            self.voices[2].msb(),
            self.voices[0].msb(),
            self.voices[1].msb(),
        ];

        for i in 0..3 {
            self.voices[i].clock(self.base_speed, prev_overflow[i]);
        }

        let mut mix: f32 = 0.0;
        for i in 0..3 {
            if i == 2 && self.voice3_disconnected && !self.voices[2].filter_routed {
                continue;
            }
            let raw = self.voices[i].output(prev_msb[i], self.model) as f32 / (2048.0 * 256.0);
            let sample = if self.filter_enabled && self.voices[i].filter_routed {
                self.filter.process(i, raw)
            } else {
                raw
            };
            mix += sample;
        }
        let volume = self.filter.volume as f32 / 15.0;
        (mix * volume).max(-1.0).min(1.0)
    }

    pub fn read(&mut self, reg: u8) -> u8 {
        match reg {
            0x19 | 0x1a => 0xff,
            0x1b => (self.voices[2].oscillator_output_hint(self.model) >> 4) as u8,
            0x1c => self.voices[2].envelope.output(),
            _ => {
                if self.write_latch_age[reg as usize] > 0 {
                    self.write_latch[reg as usize]
                } else {
                    0
                }
            }
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        if (reg as usize) < self.write_latch.len() {
            self.write_latch[reg as usize] = value;
            self.write_latch_age[reg as usize] = WRITE_LATCH_DECAY_SAMPLES;
        }
        match reg {
            0x00 => self.voices[0].oscillator.set_freq_lo(value),
            0x01 => self.voices[0].oscillator.set_freq_hi(value),
            0x02 => self.voices[0].oscillator.set_pw_lo(value),
            0x03 => self.voices[0].oscillator.set_pw_hi(value),
            0x04 => self.voices[0].set_control(value),
            0x05 => self.voices[0].envelope.set_attack_decay(value),
            0x06 => self.voices[0].envelope.set_sustain_release(value),
            0x07 => self.voices[1].oscillator.set_freq_lo(value),
            0x08 => self.voices[1].oscillator.set_freq_hi(value),
            0x09 => self.voices[1].oscillator.set_pw_lo(value),
            0x0a => self.voices[1].oscillator.set_pw_hi(value),
            0x0b => self.voices[1].set_control(value),
            0x0c => self.voices[1].envelope.set_attack_decay(value),
            0x0d => self.voices[1].envelope.set_sustain_release(value),
            0x0e => self.voices[2].oscillator.set_freq_lo(value),
            0x0f => self.voices[2].oscillator.set_freq_hi(value),
            0x10 => self.voices[2].oscillator.set_pw_lo(value),
            0x11 => self.voices[2].oscillator.set_pw_hi(value),
            0x12 => self.voices[2].set_control(value),
            0x13 => self.voices[2].envelope.set_attack_decay(value),
            0x14 => self.voices[2].envelope.set_sustain_release(value),
            0x15 => self.filter.set_fc_lo(value),
            0x16 => self.filter.set_fc_hi(value),
            0x17 => {
                self.filter.set_res_filt(value);
                for (i, voice) in self.voices.iter_mut().enumerate() {
                    voice.filter_routed = self.filter.is_routed(i);
                }
            }
            0x18 => {
                self.filter.set_mode_volume(value);
                self.voice3_disconnected = value & 0x80 != 0;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_produces_samples_at_rate_conversion() {
        let mut sid = Sid::new(SidModel::Mos6581);
        sid.set_sampling_parameters(985_248, 44_100);
        // a tenth of a second of cycles should yield ~4410 samples.
        sid.execute(98_525);
        let produced = sid.buffer().len();
        assert!((4_390..4_420).contains(&produced));
    }

    #[test]
    fn paddle_registers_always_read_as_0xff() {
        let mut sid = Sid::new(SidModel::Mos6581);
        assert_eq!(0xff, sid.read(0x19));
        assert_eq!(0xff, sid.read(0x1a));
    }

    #[test]
    fn write_only_register_latches_and_decays() {
        let mut sid = Sid::new(SidModel::Mos6581);
        sid.write(0x00, 0x42);
        assert_eq!(0x42, sid.read(0x00));
        sid.execute(2_000_000);
        assert_eq!(0, sid.read(0x00));
    }

    #[test]
    fn gate_bit_starts_voice_envelope() {
        let mut sid = Sid::new(SidModel::Mos6581);
        sid.write(0x04, 0x01);
        assert_eq!(
            crate::sound::envelope::State::Attack,
            sid.voices[0].envelope.state
        );
    }
}
