// This file is part of vireo64.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum EmuError {
    Io(io::Error),
    InvalidCartridge(String),
    InvalidRomSize { expected: usize, actual: usize },
}

impl fmt::Display for EmuError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmuError::Io(e) => write!(f, "i/o error: {}", e),
            EmuError::InvalidCartridge(msg) => write!(f, "invalid cartridge: {}", msg),
            EmuError::InvalidRomSize { expected, actual } => write!(
                f,
                "invalid rom size: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for EmuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EmuError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EmuError {
    fn from(e: io::Error) -> Self {
        EmuError::Io(e)
    }
}
