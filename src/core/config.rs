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

//! Emulator configuration
//!
//! Runtime knobs for the execution driver and the bus. Values are loaded from
//! a TOML file; any field left out falls back to its default.
//!
//! # Example
//!
//! ```
//! use ps2rx::core::config::{EmulatorConfig, ExecutionMode};
//!
//! let config = EmulatorConfig::from_toml_str(
//!     r#"
//!     mode = "interpreter"
//!     poll_threshold = 16
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.mode, ExecutionMode::Interpreter);
//! assert_eq!(config.poll_threshold, 16);
//! assert_eq!(config.max_block_len, 256);
//! ```

use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the driver executes guest code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Decode basic blocks once and replay them
    BlockCache,
    /// Fetch, decode and execute one instruction per step
    Interpreter,
}

/// When cached blocks are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationPolicy {
    /// Only the FlushCache system call, `flush_blocks()` and `reset()`
    SyscallOnly,
    /// Additionally drop any block overlapping a RAM write
    OnCodeWrite,
}

/// Execution driver and bus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Execution mode
    pub mode: ExecutionMode,

    /// Addresses of known kernel idle loops
    pub idle_addresses: Vec<u32>,

    /// Cycles skipped when the PC sits on an idle address
    pub idle_skip_cycles: u32,

    /// INTC_STAT reads tolerated before a polling loop is fast-forwarded
    pub poll_threshold: u32,

    /// Cycles reported for a fast-forwarded polling loop
    pub poll_skip_cycles: u32,

    /// Syscall numbers (in $v1) that flush the block cache
    pub flush_syscalls: Vec<u32>,

    /// Block invalidation policy
    pub invalidation: InvalidationPolicy,

    /// Maximum number of instructions in one block
    pub max_block_len: usize,

    /// Fail accesses that would need the TLB instead of direct-mapping them
    pub strict_mmu: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::BlockCache,
            idle_addresses: vec![0x0008_1FC0],
            idle_skip_cycles: 2048,
            poll_threshold: 64,
            poll_skip_cycles: 128,
            flush_syscalls: vec![0x64, 0x68],
            invalidation: InvalidationPolicy::SyscallOnly,
            max_block_len: 256,
            strict_mmu: false,
        }
    }
}

impl EmulatorConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EmulatorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.max_block_len < 2 {
            // A branch and its delay slot must fit in one block
            return Err(crate::core::error::EmulatorError::Config(format!(
                "max_block_len must be at least 2 (got {})",
                self.max_block_len
            )));
        }
        // A fast-forward must advance time or the run loop never ends
        for (name, cycles) in [
            ("idle_skip_cycles", self.idle_skip_cycles),
            ("poll_skip_cycles", self.poll_skip_cycles),
        ] {
            if cycles == 0 {
                return Err(crate::core::error::EmulatorError::Config(format!(
                    "{} must be non-zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EmulatorConfig::default();
        assert_eq!(config.mode, ExecutionMode::BlockCache);
        assert_eq!(config.invalidation, InvalidationPolicy::SyscallOnly);
        assert!(config.flush_syscalls.contains(&0x64));
        assert!(!config.strict_mmu);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EmulatorConfig::from_toml_str("strict_mmu = true").unwrap();
        assert!(config.strict_mmu);
        assert_eq!(config.idle_skip_cycles, 2048);
    }

    #[test]
    fn test_invalidation_policy_names() {
        let config = EmulatorConfig::from_toml_str(r#"invalidation = "on_code_write""#).unwrap();
        assert_eq!(config.invalidation, InvalidationPolicy::OnCodeWrite);
    }

    #[test]
    fn test_rejects_tiny_blocks() {
        assert!(EmulatorConfig::from_toml_str("max_block_len = 1").is_err());
    }

    #[test]
    fn test_rejects_zero_skip_cycles() {
        assert!(matches!(
            EmulatorConfig::from_toml_str("idle_skip_cycles = 0"),
            Err(crate::core::error::EmulatorError::Config(_))
        ));
        assert!(matches!(
            EmulatorConfig::from_toml_str("poll_skip_cycles = 0"),
            Err(crate::core::error::EmulatorError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(EmulatorConfig::from_toml_str("mode = 3").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "idle_addresses = [0x1000, 0x2000]").unwrap();
        writeln!(file, "poll_skip_cycles = 7").unwrap();

        let config = EmulatorConfig::load(file.path()).unwrap();
        assert_eq!(config.idle_addresses, vec![0x1000, 0x2000]);
        assert_eq!(config.poll_skip_cycles, 7);
    }
}
