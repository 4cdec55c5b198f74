// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Memory Bus Tests
//!
//! - `basic`: region identification, unmapped defaults, reset
//! - `bus`: sized read/write, alignment, endianness, ROM protection
//! - `regions`: segment mirroring, scratchpad window, strict MMU mode
//! - `devices`: INTC routing and poll counter, console hook, attached devices
//! - `helpers`: common test utilities

use super::*;

mod devices;
mod helpers;
mod regions;
