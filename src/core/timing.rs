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

//! Scheduler contract and the default timing event manager
//!
//! The CPU core only needs one thing from the scheduler: a way to report how
//! many core cycles have elapsed so peripherals it does not own (timers, DMA,
//! vsync) can catch up. That contract is the [`Scheduler`] trait.
//!
//! [`TimingEventManager`] is the stock implementation: a global tick counter
//! plus a small set of one-shot or periodic events the embedder polls after
//! each tick.
//!
//! # Example
//!
//! ```
//! use ps2rx::core::timing::{Scheduler, TimingEventManager};
//!
//! let mut timing = TimingEventManager::new();
//! let vsync = timing.register_periodic_event("VSync", 1000);
//! timing.schedule(vsync, 1000);
//!
//! timing.tick(999);
//! assert!(timing.run_events().is_empty());
//! timing.tick(1);
//! assert_eq!(timing.run_events(), vec![vsync]);
//! ```

/// Tick count type (relative time in CPU cycles)
pub type TickCount = u32;

/// Global tick counter type (absolute time in CPU cycles since reset)
pub type GlobalTicks = u64;

/// Event handle (identifier for registered events)
pub type EventHandle = usize;

/// Consumer side of the scheduler
///
/// The execution driver calls `tick` once per retired instruction in
/// interpreter mode, or once per replayed block in block mode.
pub trait Scheduler {
    /// Advance the shared cycle counter
    fn tick(&mut self, cycles: TickCount);

    /// Absolute cycle count since reset
    fn now(&self) -> GlobalTicks;
}

/// Timing event
#[derive(Debug)]
struct TimingEvent {
    /// Event name (for debugging)
    name: &'static str,

    /// Next execution time (global ticks)
    next_run_time: GlobalTicks,

    /// Interval for periodic events (0 = one-shot)
    interval: TickCount,

    /// Whether this event is currently active
    active: bool,
}

/// Timing Event Manager
///
/// Keeps a global tick counter and a list of registered events. Events whose
/// deadline has passed are reported by [`run_events`](Self::run_events);
/// periodic events are rescheduled automatically.
#[derive(Debug, Default)]
pub struct TimingEventManager {
    /// Global tick counter (absolute time since reset)
    global_tick_counter: GlobalTicks,

    /// Registered events
    events: Vec<TimingEvent>,
}

impl TimingEventManager {
    /// Create a new timing event manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-shot event
    ///
    /// The event is inactive until [`schedule`](Self::schedule) is called.
    pub fn register_event(&mut self, name: &'static str) -> EventHandle {
        self.register_periodic_event(name, 0)
    }

    /// Register a periodic event with automatic rescheduling
    pub fn register_periodic_event(
        &mut self,
        name: &'static str,
        interval: TickCount,
    ) -> EventHandle {
        let handle = self.events.len();
        self.events.push(TimingEvent {
            name,
            next_run_time: 0,
            interval,
            active: false,
        });
        handle
    }

    /// Schedule an event to run after `ticks` cycles from now
    pub fn schedule(&mut self, handle: EventHandle, ticks: TickCount) {
        let now = self.global_tick_counter;
        if let Some(event) = self.events.get_mut(handle) {
            event.next_run_time = now + ticks as GlobalTicks;
            event.active = true;
        }
    }

    /// Deactivate an event
    pub fn deactivate(&mut self, handle: EventHandle) {
        if let Some(event) = self.events.get_mut(handle) {
            event.active = false;
        }
    }

    /// Cycles until the next active event, if any
    pub fn downcount(&self) -> Option<GlobalTicks> {
        self.events
            .iter()
            .filter(|e| e.active)
            .map(|e| e.next_run_time.saturating_sub(self.global_tick_counter))
            .min()
    }

    /// Collect every event whose deadline has been reached
    ///
    /// One-shot events are deactivated, periodic events move to their next
    /// deadline.
    pub fn run_events(&mut self) -> Vec<EventHandle> {
        let now = self.global_tick_counter;
        let mut triggered = Vec::new();

        for (handle, event) in self.events.iter_mut().enumerate() {
            if !event.active || event.next_run_time > now {
                continue;
            }

            log::trace!(
                "Timing: Event '{}' executed (late: {} ticks)",
                event.name,
                now - event.next_run_time
            );

            if event.interval > 0 {
                event.next_run_time += event.interval as GlobalTicks;
            } else {
                event.active = false;
            }
            triggered.push(handle);
        }

        triggered
    }

    /// Reset the counter and deactivate every event
    pub fn reset(&mut self) {
        self.global_tick_counter = 0;
        for event in &mut self.events {
            event.active = false;
        }
    }
}

impl Scheduler for TimingEventManager {
    #[inline]
    fn tick(&mut self, cycles: TickCount) {
        self.global_tick_counter += cycles as GlobalTicks;
    }

    #[inline]
    fn now(&self) -> GlobalTicks {
        self.global_tick_counter
    }
}
