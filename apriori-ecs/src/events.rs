//! The dual event queues and their stable handles.
//!
//! Scheduled events live in a slot arena; the two binary heaps hold
//! `(time, handle)` keys only. Entities keep handles — not references — to
//! the predictions that mention them, and invalidation just flips a flag in
//! the slot. Tombstoned slots are skipped when popped and compacted away by
//! the per-tick sweep; generations on the handles make stale back-references
//! harmless.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use cgmath::BaseFloat;
use specs::prelude::Entity;

use core::{ImpactEvent, RestingContact};
use input::KeyCode;

/// Everything the scheduler can dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum Event<S> {
    /// A predicted collision; game-time stream.
    Impact(ImpactEvent<Entity, S>),
    /// A resting contact scheduled to slide off its support; game-time
    /// stream.
    StopResting(RestingContact<Entity>),
    /// A key went down; real-time stream.
    KeyPress(KeyCode),
    /// A key came back up; real-time stream.
    KeyRelease(KeyCode),
}

/// Stable reference to a scheduled event.
///
/// Indexes the queue's slot arena; the generation guards against reuse, so a
/// handle kept past its event's lifetime simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventHandle {
    index: u32,
    generation: u32,
}

struct Slot<S> {
    event: Option<Event<S>>,
    generation: u32,
    invalid: bool,
    earliest_tick: u64,
}

#[derive(Clone, Copy)]
struct Key<S> {
    time: S,
    handle: EventHandle,
}

impl<S> PartialEq for Key<S>
where
    S: BaseFloat,
{
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for Key<S> where S: BaseFloat {}

impl<S> PartialOrd for Key<S>
where
    S: BaseFloat,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Key<S>
where
    S: BaseFloat,
{
    // reversed: BinaryHeap is a max-heap, we want the earliest time on top
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
    }
}

/// The two future-event queues, backed by one slot arena.
pub struct EventQueue<S> {
    slots: Vec<Slot<S>>,
    free: Vec<u32>,
    game: BinaryHeap<Key<S>>,
    real: BinaryHeap<Key<S>>,
}

impl<S> Default for EventQueue<S>
where
    S: BaseFloat,
{
    fn default() -> Self {
        EventQueue::new()
    }
}

impl<S> EventQueue<S>
where
    S: BaseFloat,
{
    /// Create an empty queue pair.
    pub fn new() -> Self {
        EventQueue {
            slots: Vec::new(),
            free: Vec::new(),
            game: BinaryHeap::new(),
            real: BinaryHeap::new(),
        }
    }

    fn alloc(&mut self, event: Event<S>, earliest_tick: u64) -> EventHandle {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.event = Some(event);
                slot.invalid = false;
                slot.earliest_tick = earliest_tick;
                EventHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    event: Some(event),
                    generation: 0,
                    invalid: false,
                    earliest_tick,
                });
                EventHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    fn retire(&mut self, handle: EventHandle) -> Option<Event<S>> {
        let slot = &mut self.slots[handle.index as usize];
        debug_assert_eq!(slot.generation, handle.generation);
        let event = slot.event.take();
        slot.generation += 1;
        slot.invalid = false;
        self.free.push(handle.index);
        event
    }

    fn live(&self, handle: EventHandle) -> bool {
        let slot = &self.slots[handle.index as usize];
        slot.generation == handle.generation && slot.event.is_some() && !slot.invalid
    }

    /// Schedule an event on the game-time stream. `earliest_tick` holds it
    /// back until the given tick; pass 0 for no deferral.
    pub fn schedule_game(&mut self, time: S, event: Event<S>, earliest_tick: u64) -> EventHandle {
        let handle = self.alloc(event, earliest_tick);
        self.game.push(Key { time, handle });
        handle
    }

    /// Schedule an event on the real-time stream.
    pub fn schedule_real(&mut self, time: S, event: Event<S>) -> EventHandle {
        let handle = self.alloc(event, 0);
        self.real.push(Key { time, handle });
        handle
    }

    /// Tombstone a scheduled event. Returns whether the handle still
    /// resolved to a live event.
    pub fn invalidate(&mut self, handle: EventHandle) -> bool {
        let slot = &mut self.slots[handle.index as usize];
        if slot.generation == handle.generation && slot.event.is_some() && !slot.invalid {
            slot.invalid = true;
            true
        } else {
            false
        }
    }

    /// Whether the handle still points at a live event.
    pub fn is_live(&self, handle: EventHandle) -> bool {
        (handle.index as usize) < self.slots.len() && self.live(handle)
    }

    /// Earliest live game-time event, with tombstones dropped off the top.
    /// An event deferred past `current_tick` hides the stream for this tick.
    pub fn peek_game(&mut self, current_tick: u64) -> Option<(S, EventHandle)> {
        loop {
            let key = match self.game.peek() {
                Some(key) => *key,
                None => return None,
            };
            if !self.live(key.handle) {
                self.game.pop();
                if self.slots[key.handle.index as usize].generation == key.handle.generation {
                    self.retire(key.handle);
                }
                continue;
            }
            if self.slots[key.handle.index as usize].earliest_tick > current_tick {
                return None;
            }
            return Some((key.time, key.handle));
        }
    }

    /// Earliest live real-time event, with tombstones dropped off the top.
    pub fn peek_real(&mut self) -> Option<(S, EventHandle)> {
        loop {
            let key = match self.real.peek() {
                Some(key) => *key,
                None => return None,
            };
            if !self.live(key.handle) {
                self.real.pop();
                if self.slots[key.handle.index as usize].generation == key.handle.generation {
                    self.retire(key.handle);
                }
                continue;
            }
            return Some((key.time, key.handle));
        }
    }

    /// Pop the earliest live game-time event.
    pub fn pop_game(&mut self, current_tick: u64) -> Option<(S, Event<S>)> {
        match self.peek_game(current_tick) {
            Some((time, handle)) => {
                self.game.pop();
                self.retire(handle).map(|event| (time, event))
            }
            None => None,
        }
    }

    /// Pop the earliest live real-time event.
    pub fn pop_real(&mut self) -> Option<(S, Event<S>)> {
        match self.peek_real() {
            Some((time, handle)) => {
                self.real.pop();
                self.retire(handle).map(|event| (time, event))
            }
            None => None,
        }
    }

    /// Compact both heaps, dropping tombstoned events and freeing their
    /// slots. Run at least once per tick.
    pub fn sweep(&mut self) {
        let game = ::std::mem::replace(&mut self.game, BinaryHeap::new());
        let mut kept = Vec::with_capacity(game.len());
        for key in game.into_vec() {
            if self.live(key.handle) {
                kept.push(key);
            } else if self.slots[key.handle.index as usize].generation == key.handle.generation {
                self.retire(key.handle);
            }
        }
        self.game = BinaryHeap::from(kept);

        let real = ::std::mem::replace(&mut self.real, BinaryHeap::new());
        let mut kept = Vec::with_capacity(real.len());
        for key in real.into_vec() {
            if self.live(key.handle) {
                kept.push(key);
            } else if self.slots[key.handle.index as usize].generation == key.handle.generation {
                self.retire(key.handle);
            }
        }
        self.real = BinaryHeap::from(kept);
    }

    /// Number of live game-time events.
    pub fn live_game(&self) -> usize {
        self.game.iter().filter(|key| self.live(key.handle)).count()
    }

    /// Number of live real-time events.
    pub fn live_real(&self) -> usize {
        self.real.iter().filter(|key| self.live(key.handle)).count()
    }

    /// Inspect a scheduled event through its handle.
    pub fn event(&self, handle: EventHandle) -> Option<&Event<S>> {
        if self.is_live(handle) {
            self.slots[handle.index as usize].event.as_ref()
        } else {
            None
        }
    }
}
