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

//! Basic block cache
//!
//! A block is a straight-line run of decoded instructions starting at a given
//! PC and ending at the first control transfer plus its delay slot. Blocks
//! are immutable once cached; the cache is only cleared as a whole (FlushCache
//! syscall, `flush_blocks()`, reset) unless the driver runs with the
//! `OnCodeWrite` invalidation policy.
//!
//! # Example
//!
//! ```
//! use ps2rx::core::cpu::{build_block, BlockCache};
//! use ps2rx::core::memory::Bus;
//!
//! let mut bus = Bus::new();
//! // addiu $t0, $zero, 1 ; jr $ra ; nop
//! bus.write32(0x8000_1000, 0x2408_0001).unwrap();
//! bus.write32(0x8000_1004, 0x03E0_0008).unwrap();
//! bus.write32(0x8000_1008, 0x0000_0000).unwrap();
//!
//! let block = build_block(&bus, 0x8000_1000, 256).unwrap();
//! assert_eq!(block.len(), 3);
//!
//! let mut cache = BlockCache::new();
//! cache.insert(block);
//! assert!(cache.get(0x8000_1000).is_some());
//! ```

use super::decode::{decode, DecodedInstruction};
use crate::core::error::{EmulatorError, Result};
use crate::core::memory::Bus;
use std::collections::HashMap;
use std::rc::Rc;

/// Physical address mask used to compare blocks with written ranges
const PHYS_MASK: u32 = 0x1FFF_FFFF;

/// A decoded basic block
#[derive(Debug, Clone)]
pub struct Block {
    /// Virtual address of the first instruction
    pub start: u32,

    /// Instructions in program order
    pub instructions: Vec<DecodedInstruction>,

    /// Sum of the declared cycle costs
    pub cycles: u32,
}

impl Block {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Virtual address one past the last instruction
    pub fn end(&self) -> u32 {
        self.start.wrapping_add(4 * self.instructions.len() as u32)
    }

    /// Address of the instruction at `index`
    #[inline(always)]
    pub fn address_of(&self, index: usize) -> u32 {
        self.start.wrapping_add(4 * index as u32)
    }

    /// Whether the block covers any byte of the physical range `[start, end)`
    pub fn overlaps_physical(&self, start: u32, end: u32) -> bool {
        let block_start = self.start & PHYS_MASK;
        let block_end = block_start + 4 * self.instructions.len() as u32;
        block_start < end && start < block_end
    }
}

/// Decode a block starting at `start`
///
/// Growth stops after a control transfer and its delay slot, after a
/// trap-like instruction (no delay slot), or once `max_len` instructions
/// have been decoded. A delay slot is always kept with its branch, so a
/// block can hold `max_len + 1` instructions.
///
/// # Errors
///
/// Propagates bus errors from instruction fetch, and returns
/// `InternalError` when `start` is not word aligned.
pub fn build_block(bus: &Bus, start: u32, max_len: usize) -> Result<Block> {
    if start & 0x3 != 0 {
        return Err(EmulatorError::InternalError(format!(
            "block start 0x{:08X} is not word aligned",
            start
        )));
    }

    let mut instructions = Vec::new();
    let mut cycles = 0u32;
    let mut addr = start;

    loop {
        let instr = decode(bus.read32(addr)?);
        cycles += instr.cycles.cycles();
        instructions.push(instr);
        addr = addr.wrapping_add(4);

        if instr.branch.has_delay_slot() {
            let slot = decode(bus.read32(addr)?);
            cycles += slot.cycles.cycles();
            instructions.push(slot);
            break;
        }
        if instr.branch.ends_block() || instructions.len() >= max_len {
            break;
        }
    }

    log::debug!(
        "Built block 0x{:08X}: {} instructions, {} cycles",
        start,
        instructions.len(),
        cycles
    );

    Ok(Block {
        start,
        instructions,
        cycles,
    })
}

/// Blocks keyed by start PC
#[derive(Debug, Default)]
pub struct BlockCache {
    blocks: HashMap<u32, Rc<Block>>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached block starting at `pc`
    #[inline]
    pub fn get(&self, pc: u32) -> Option<Rc<Block>> {
        self.blocks.get(&pc).cloned()
    }

    /// Cache a block, replacing any block with the same start
    pub fn insert(&mut self, block: Block) -> Rc<Block> {
        let block = Rc::new(block);
        self.blocks.insert(block.start, Rc::clone(&block));
        block
    }

    /// Drop every block
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop blocks overlapping the physical range `[start, end)`
    ///
    /// Returns the number of blocks dropped.
    pub fn invalidate_range(&mut self, start: u32, end: u32) -> usize {
        let before = self.blocks.len();
        self.blocks
            .retain(|_, block| !block.overlaps_physical(start, end));
        before - self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cpu::BranchClass;

    fn write_program(bus: &mut Bus, base: u32, words: &[u32]) {
        for (n, &word) in words.iter().enumerate() {
            bus.write32(base + 4 * n as u32, word).unwrap();
        }
    }

    #[test]
    fn test_block_ends_after_delay_slot() {
        let mut bus = Bus::new();
        // addiu ; beq ; addiu (slot) ; addiu (not part of the block)
        write_program(
            &mut bus,
            0x8000_0100,
            &[0x2408_0001, 0x1000_0004, 0x2409_0002, 0x240A_0003],
        );

        let block = build_block(&bus, 0x8000_0100, 256).unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(block.instructions[1].branch, BranchClass::Conditional);
        assert_eq!(block.end(), 0x8000_010C);
    }

    #[test]
    fn test_trap_like_has_no_slot() {
        let mut bus = Bus::new();
        // syscall ; addiu
        write_program(&mut bus, 0x8000_0200, &[0x0000_000C, 0x2408_0001]);

        let block = build_block(&bus, 0x8000_0200, 256).unwrap();
        assert_eq!(block.len(), 1);
        assert_eq!(block.instructions[0].branch, BranchClass::TrapLike);
    }

    #[test]
    fn test_max_len_cap() {
        let mut bus = Bus::new();
        write_program(&mut bus, 0x8000_0300, &[0; 8]);

        let block = build_block(&bus, 0x8000_0300, 4).unwrap();
        assert_eq!(block.len(), 4);
        assert_eq!(block.cycles, 4);
    }

    #[test]
    fn test_slot_may_exceed_cap() {
        let mut bus = Bus::new();
        // nop ; j ; nop
        write_program(&mut bus, 0x8000_0400, &[0, 0x0800_0000, 0]);

        let block = build_block(&bus, 0x8000_0400, 2).unwrap();
        assert_eq!(block.len(), 3);
    }

    #[test]
    fn test_rejects_misaligned_start() {
        let bus = Bus::new();
        assert!(build_block(&bus, 0x8000_0002, 16).is_err());
    }

    #[test]
    fn test_invalidate_range_uses_physical_addresses() {
        let mut bus = Bus::new();
        write_program(&mut bus, 0x8000_0500, &[0, 0, 0x0000_000C]);
        write_program(&mut bus, 0x8000_0600, &[0x0000_000C]);

        let mut cache = BlockCache::new();
        cache.insert(build_block(&bus, 0x8000_0500, 16).unwrap());
        cache.insert(build_block(&bus, 0x8000_0600, 16).unwrap());
        assert_eq!(cache.len(), 2);

        // Write through KSEG1 to the second word of the first block
        assert_eq!(cache.invalidate_range(0x0000_0504, 0x0000_0508), 1);
        assert!(cache.get(0x8000_0500).is_none());
        assert!(cache.get(0x8000_0600).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}
