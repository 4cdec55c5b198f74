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

//! PlayStation 2 Emotion Engine core library
//!
//! This library emulates the R5900 CPU at the heart of the PS2 Emotion
//! Engine: the 128-bit register file, the MMI multimedia instructions, COP0,
//! the single-precision FPU and the VU0 macro-mode register interface, plus
//! the memory bus and a block-caching execution driver.
//!
//! # Example
//!
//! ```
//! use ps2rx::core::cpu::CPU;
//! use ps2rx::core::memory::Bus;
//!
//! let mut cpu = CPU::new();
//! let mut bus = Bus::new();
//!
//! // addiu $v0, $zero, 42
//! bus.write32(0x8000_0000, 0x2402_002A).unwrap();
//! cpu.set_pc(0x8000_0000);
//! cpu.step(&mut bus).unwrap();
//! assert_eq!(cpu.reg(2), 42);
//! ```

pub mod core;
