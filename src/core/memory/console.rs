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

//! Debug console output (SIO TX FIFO)
//!
//! The kernel prints through the EE serial port. Every byte written to the
//! TX FIFO register is handed to the embedder's hook. Completed lines are
//! also logged at info level.

use super::IODevice;
use crate::core::error::Result;

/// Console byte sink
pub type ConsoleHook = Box<dyn FnMut(u8)>;

/// SIO transmit side
pub struct DebugConsole {
    hook: Option<ConsoleHook>,
    line: Vec<u8>,
}

impl DebugConsole {
    /// Physical address of SIO_TXFIFO
    pub const TX_FIFO: u32 = 0x1000_F180;

    /// SIO register block
    const START: u32 = 0x1000_F100;
    const END: u32 = 0x1000_F1FF;

    /// Longest line buffered for the log before it is flushed anyway
    pub const MAX_LINE: usize = 4096;

    pub fn new() -> Self {
        Self {
            hook: None,
            line: Vec::new(),
        }
    }

    /// Install (or replace) the byte hook
    pub fn set_hook(&mut self, hook: ConsoleHook) {
        self.hook = Some(hook);
    }

    /// Remove the byte hook
    pub fn clear_hook(&mut self) {
        self.hook = None;
    }

    /// Emit one byte
    pub fn put(&mut self, byte: u8) {
        if let Some(hook) = self.hook.as_mut() {
            hook(byte);
        }

        if byte == b'\n' {
            self.flush_line();
        } else if byte != b'\r' {
            self.line.push(byte);
            if self.line.len() >= Self::MAX_LINE {
                self.flush_line();
            }
        }
    }

    fn flush_line(&mut self) {
        log::info!("[EE] {}", String::from_utf8_lossy(&self.line));
        self.line.clear();
    }
}

impl Default for DebugConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl IODevice for DebugConsole {
    fn address_range(&self) -> (u32, u32) {
        (Self::START, Self::END)
    }

    fn read_word(&self, offset: u32) -> Result<u32> {
        log::trace!("SIO read at offset 0x{:02X}", offset);
        Ok(0)
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<()> {
        self.write_sized(offset, 4, value as u128)
    }

    /// Any write width to TX FIFO sends its low byte
    fn write_sized(&mut self, offset: u32, _size: usize, value: u128) -> Result<()> {
        if offset & !0x3 == Self::TX_FIFO - Self::START {
            self.put(value as u8);
        } else {
            log::trace!("SIO write 0x{:02X} at offset 0x{:02X}", value, offset);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "SIO"
    }
}
