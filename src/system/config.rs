// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use crate::system::model::SystemModel;

/// Aggregates the hardware timing model with the engineering knobs that
/// have no counterpart in real hardware (sample rate, ring buffer size).
/// Keyboard and joystick input are external collaborators and carry no
/// configuration here.
pub struct Config {
    pub model: SystemModel,
    pub sound: SoundConfig,
}

impl Config {
    pub fn new(model: SystemModel) -> Config {
        Config {
            model,
            sound: SoundConfig::default(),
        }
    }
}

pub struct SoundConfig {
    pub enable: bool,
    pub buffer_size: usize,
    pub sample_rate: u32,
    pub sid_filters: bool,
}

impl SoundConfig {
    pub fn default() -> SoundConfig {
        SoundConfig {
            enable: true,
            buffer_size: 4096,
            sample_rate: 44_100,
            sid_filters: true,
        }
    }
}
