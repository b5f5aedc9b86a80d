// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! External file-format collaborators: the bytes a CRT or PRG image hands to
//! the memory subsystem. T64/D64 disk images and tape containers are out of
//! scope (see the purpose & scope notes); everything here ends either as a
//! `mem::cartridge::Cartridge` or a plain byte copy into RAM.

pub mod crt;
pub mod prg;

pub use self::crt::load_crt;
pub use self::prg::load_prg;
