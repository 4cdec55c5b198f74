// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
///
/// Architectural faults (overflow, illegal opcodes, misaligned accesses)
/// never surface here: they are routed through the exception controller.
/// This type covers host-side failures and conditions the embedder must see.
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("BIOS file not found: {0}")]
    BiosNotFound(String),

    #[error("Invalid BIOS size: {got} bytes (expected at most {expected})")]
    InvalidBiosSize { expected: usize, got: usize },

    #[error("Invalid memory access at 0x{address:08X}")]
    InvalidMemoryAccess { address: u32 },

    #[error("Unaligned memory access: {size}-byte access at 0x{address:08X}")]
    UnalignedAccess { address: u32, size: u8 },

    #[error("Capability not modeled: {0}")]
    UnmodeledCapability(&'static str),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Save state error: {0}")]
    SaveState(String),

    #[error("Loader error: {0}")]
    LoaderError(String),
}

impl From<toml::de::Error> for EmulatorError {
    fn from(err: toml::de::Error) -> Self {
        EmulatorError::Config(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for EmulatorError {
    fn from(err: bincode::error::EncodeError) -> Self {
        EmulatorError::SaveState(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for EmulatorError {
    fn from(err: bincode::error::DecodeError) -> Self {
        EmulatorError::SaveState(err.to_string())
    }
}
