// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

mod border_unit;
mod gfx_sequencer;
mod mux_unit;
mod spec;
mod sprite_sequencer;
mod vic;

pub use self::vic::Vic;
