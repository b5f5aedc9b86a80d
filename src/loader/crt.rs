// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

// SPEC: http://ist.uwaterloo.ca/~schepers/formats/CRT.TXT

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::EmuError;
use crate::mem::cartridge::{Cartridge, Chip, Mapper};

const HEADER_SIG: &[u8; 16] = b"C64 CARTRIDGE   ";
const CHIP_SIG: &[u8; 4] = b"CHIP";

/// Parses a `.CRT` image into a `Cartridge` ready for `Memory::attach_cartridge`.
/// Rejects truncated files and bad magic values; never panics on malformed
/// input (see the error handling design).
pub fn load_crt(path: &Path) -> Result<Cartridge, EmuError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    parse_crt(&buf)
}

fn parse_crt(buf: &[u8]) -> Result<Cartridge, EmuError> {
    if buf.len() < 0x40 {
        return Err(EmuError::InvalidCartridge("truncated header".to_string()));
    }
    if &buf[0x00..0x10] != HEADER_SIG {
        return Err(EmuError::InvalidCartridge("bad magic".to_string()));
    }
    let header_length = (&buf[0x10..0x14]).read_u32::<BigEndian>().unwrap();
    let hw_type = (&buf[0x16..0x18]).read_u16::<BigEndian>().unwrap();
    let exrom = buf[0x18] == 0;
    let game = buf[0x19] == 0;

    let mut chips = Vec::new();
    let mut offset = header_length as usize;
    while offset < buf.len() {
        if offset + 0x10 > buf.len() {
            return Err(EmuError::InvalidCartridge("truncated chip packet".to_string()));
        }
        if &buf[offset..offset + 4] != CHIP_SIG {
            return Err(EmuError::InvalidCartridge("bad chip magic".to_string()));
        }
        let packet_length = (&buf[offset + 4..offset + 8]).read_u32::<BigEndian>().unwrap() as usize;
        let bank_number = (&buf[offset + 0x0a..offset + 0x0c]).read_u16::<BigEndian>().unwrap();
        let load_address = (&buf[offset + 0x0c..offset + 0x0e]).read_u16::<BigEndian>().unwrap();
        let size = (&buf[offset + 0x0e..offset + 0x10]).read_u16::<BigEndian>().unwrap();

        let data_start = offset + 0x10;
        let data_end = data_start + size as usize;
        if data_end > buf.len() {
            return Err(EmuError::InvalidCartridge("chip image larger than file".to_string()));
        }
        chips.push(Chip {
            bank_number,
            load_address,
            size,
            data: buf[data_start..data_end].to_vec(),
        });

        if packet_length == 0 {
            break;
        }
        offset += packet_length;
    }

    Ok(Cartridge::new(Mapper::from_hw_type(hw_type), exrom, game, chips))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(hw_type: u16, exrom: u8, game: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 0x40];
        buf[0x00..0x10].copy_from_slice(HEADER_SIG);
        buf[0x10..0x14].copy_from_slice(&0x40u32.to_be_bytes());
        buf[0x14..0x16].copy_from_slice(&0x01u16.to_be_bytes());
        buf[0x16..0x18].copy_from_slice(&hw_type.to_be_bytes());
        buf[0x18] = exrom;
        buf[0x19] = game;
        buf
    }

    fn chip_packet(bank: u16, load_address: u16, data: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(CHIP_SIG);
        buf.extend_from_slice(&((0x10 + data.len()) as u32).to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes()); // chip type: ROM
        buf.extend_from_slice(&bank.to_be_bytes());
        buf.extend_from_slice(&load_address.to_be_bytes());
        buf.extend_from_slice(&(data.len() as u16).to_be_bytes());
        buf.extend_from_slice(data);
        buf
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = header(0, 0, 1);
        buf[0] = b'X';
        assert!(parse_crt(&buf).is_err());
    }

    #[test]
    fn rejects_truncated_file() {
        let buf = vec![0u8; 8];
        assert!(parse_crt(&buf).is_err());
    }

    #[test]
    fn parses_ocean_cartridge_with_one_chip() {
        let mut buf = header(5, 1, 0); // Ocean, EXROM active, GAME active
        buf.extend_from_slice(&chip_packet(0, 0x8000, &[0xaa; 8192]));
        let cart = parse_crt(&buf).unwrap();
        assert_eq!(Mapper::Ocean, cart.mapper);
        assert_eq!(0xaa, cart.read_lo(0x8000));
    }

    #[test]
    fn parses_two_chip_packets() {
        let mut buf = header(0, 0, 1); // Normal
        buf.extend_from_slice(&chip_packet(0, 0x8000, &[0x11; 8192]));
        buf.extend_from_slice(&chip_packet(0, 0xa000, &[0x22; 8192]));
        let cart = parse_crt(&buf).unwrap();
        assert_eq!(0x11, cart.read_lo(0x8000));
        assert_eq!(Some(0x22), cart.read_hi(0xa000));
    }
}
