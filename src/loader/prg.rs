// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! PRG loader (see §10.6 of the design notes): the minimal file format for
//! handing a program to memory without a disk-drive emulation. The first two
//! bytes are a little-endian load address; everything after is copied
//! verbatim starting there.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::EmuError;
use crate::system::c64::C64;

// Zero-page BASIC pointers primed so `RUN` sees the program immediately,
// mirroring what the KERNAL's LOAD routine does for a BASIC-range load.
const TXTTAB: u16 = 0x2b; // start of program text
const VARTAB: u16 = 0x2d; // start of variables (= end of program)
const ARYTAB: u16 = 0x2f; // start of arrays
const STREND: u16 = 0x31; // end of arrays / start of string storage

/// Loads `path` into `c64`'s RAM at the address stored in its first two
/// bytes. When `prime_basic` is set, also primes the zero-page pointers so a
/// subsequent `RUN` works without a real LOAD having run first.
pub fn load_prg(c64: &mut C64, path: &Path, prime_basic: bool) -> Result<u16, EmuError> {
    let mut file = File::open(path)?;
    let offset = file.read_u16::<LittleEndian>()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    info!(target: "loader", "Loading PRG at 0x{:04x}, {} bytes", offset, data.len());

    c64.load(&data, offset);
    if prime_basic {
        let end = offset.wrapping_add(data.len() as u16);
        prime_basic_pointers(c64, offset, end);
    }
    Ok(offset)
}

fn prime_basic_pointers(c64: &mut C64, start: u16, end: u16) {
    let start_bytes = start.to_le_bytes();
    let end_bytes = end.to_le_bytes();
    c64.load(&start_bytes, TXTTAB);
    c64.load(&end_bytes, VARTAB);
    c64.load(&end_bytes, ARYTAB);
    c64.load(&end_bytes, STREND);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{BaseAddr, Rom};
    use crate::system::config::Config;
    use crate::system::model::SystemModel;
    use std::io::Write;

    fn new_test_machine() -> C64 {
        let config = Config::new(SystemModel::c64_pal());
        C64::new(
            config,
            Rom::from_bytes(vec![0; 0x2000], BaseAddr::Basic.addr()),
            Rom::from_bytes(vec![0; 0x1000], BaseAddr::Charset.addr()),
            Rom::from_bytes(vec![0; 0x2000], BaseAddr::Kernal.addr()),
        )
    }

    #[test]
    fn loads_program_at_embedded_address_and_primes_pointers() {
        let mut path = std::env::temp_dir();
        path.push("vireo64_prg_loader_test.prg");
        {
            let mut file = File::create(&path).unwrap();
            file.write_all(&0x0801u16.to_le_bytes()).unwrap();
            file.write_all(&[0xaa, 0xbb, 0xcc]).unwrap();
        }

        let mut c64 = new_test_machine();
        let offset = load_prg(&mut c64, &path, true).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(0x0801, offset);
        assert_eq!(0xaa, c64.read_direct(0x0801));
        assert_eq!(0x01, c64.read_direct(TXTTAB));
        assert_eq!(0x08, c64.read_direct(TXTTAB + 1));
        let end = 0x0801u16 + 3;
        assert_eq!((end & 0xff) as u8, c64.read_direct(VARTAB));
        assert_eq!((end >> 8) as u8, c64.read_direct(VARTAB + 1));
    }
}
