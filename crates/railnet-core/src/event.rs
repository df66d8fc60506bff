//! Typed event system with buffered, snapshot-safe delivery.
//!
//! Engine operations emit events while they run; the engine calls
//! [`EventBus::deliver`] once the operation has finished, so listeners
//! always observe a consistent game. Only the engine can emit; hosts
//! subscribe, poll history and suppress kinds. Each event kind also keeps a
//! short history in an [`EventBuffer`] ring buffer that render code can poll
//! instead of subscribing.
//!
//! # Unsubscribing during delivery
//!
//! A listener may drop itself by returning [`ListenerControl::Unsubscribe`],
//! and any listener may queue the removal of any subscription through an
//! [`Unsubscriber`] handle. Removals requested during a dispatch are deferred
//! until the current event has been offered to every subscriber that was
//! registered when its dispatch began, so nobody is skipped or called twice.
//! Removals requested outside a dispatch take effect before the next event
//! is offered to anyone.

use crate::fixed::Turn;
use crate::id::*;
use crate::player::Standing;
use crate::state::{GameState, IntentKind};
use std::cell::RefCell;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A game event. All events carry the turn during which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Turns --
    TurnChanged {
        player: PlayerId,
        turn: Turn,
    },
    GameEnded {
        standings: Vec<Standing>,
        turn: Turn,
    },

    // -- Network integrity --
    JunctionBroken {
        station: StationId,
        turn: Turn,
    },
    JunctionFixed {
        station: StationId,
        turn: Turn,
    },

    // -- Phases --
    StateChanged {
        from: GameState,
        to: GameState,
        turn: Turn,
    },

    // -- Player actions --
    StationClicked {
        station: StationId,
        state: GameState,
        turn: Turn,
    },
    TrainPlaced {
        player: PlayerId,
        train: usize,
        station: StationId,
        turn: Turn,
    },
    RouteCompleted {
        player: PlayerId,
        train: usize,
        stations: Vec<StationId>,
        turn: Turn,
    },
    IntentRejected {
        intent: IntentKind,
        reason: String,
        turn: Turn,
    },
}

/// Discriminant tag for event types, used for subscription and suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TurnChanged,
    GameEnded,
    JunctionBroken,
    JunctionFixed,
    StateChanged,
    StationClicked,
    TrainPlaced,
    RouteCompleted,
    IntentRejected,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 9;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TurnChanged { .. } => EventKind::TurnChanged,
            Event::GameEnded { .. } => EventKind::GameEnded,
            Event::JunctionBroken { .. } => EventKind::JunctionBroken,
            Event::JunctionFixed { .. } => EventKind::JunctionFixed,
            Event::StateChanged { .. } => EventKind::StateChanged,
            Event::StationClicked { .. } => EventKind::StationClicked,
            Event::TrainPlaced { .. } => EventKind::TrainPlaced,
            Event::RouteCompleted { .. } => EventKind::RouteCompleted,
            Event::IntentRejected { .. } => EventKind::IntentRejected,
        }
    }

    /// The turn during which the event occurred.
    pub fn turn(&self) -> Turn {
        match self {
            Event::TurnChanged { turn, .. }
            | Event::GameEnded { turn, .. }
            | Event::JunctionBroken { turn, .. }
            | Event::JunctionFixed { turn, .. }
            | Event::StateChanged { turn, .. }
            | Event::StationClicked { turn, .. }
            | Event::TrainPlaced { turn, .. }
            | Event::RouteCompleted { turn, .. }
            | Event::IntentRejected { turn, .. } => *turn,
        }
    }
}

impl EventKind {
    /// Convert to usize index for array lookups.
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event into the ring buffer. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation (including dropped).
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// The most recently written event.
    pub fn latest(&self) -> Option<&Event> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.capacity() - 1) % self.capacity();
        self.events[idx].as_ref()
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        // Once full, head points at the oldest entry.
        let start = if self.len < self.capacity() { 0 } else { self.head };
        (0..self.len).filter_map(move |i| self.events[(start + i) % self.capacity()].as_ref())
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

/// What a listener wants after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerControl {
    Keep,
    Unsubscribe,
}

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event) -> ListenerControl>;

/// Handle returned by subscription; used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Priority level for event subscribers. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct SubscriberEntry {
    id: SubscriptionId,
    /// `None` subscribes to every kind.
    kind: Option<EventKind>,
    priority: SubscriberPriority,
    listener: Listener,
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Queues subscription removals, including from inside a listener.
///
/// Cloned handles share one queue. The bus drains it before and after each
/// dispatch, and whenever subscriptions are counted or removed directly.
#[derive(Debug, Clone, Default)]
pub struct Unsubscriber {
    pending: Rc<RefCell<Vec<SubscriptionId>>>,
}

impl Unsubscriber {
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.pending.borrow_mut().push(id);
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// The central event bus: a pending queue, one history buffer per kind,
/// subscribers, and suppression flags.
///
/// Events originate in the engine only:
///
/// ```compile_fail
/// use railnet_core::event::{Event, EventBus};
/// use railnet_core::id::PlayerId;
///
/// let mut bus = EventBus::default();
/// bus.emit(Event::TurnChanged { player: PlayerId(0), turn: 1 });
/// ```
pub struct EventBus {
    /// Emitted but not yet delivered, in emission order.
    queue: Vec<Event>,

    /// Recent history per kind, allocated on first emit.
    history: [Option<EventBuffer>; EVENT_KIND_COUNT],

    /// Suppressed kinds are neither queued nor recorded.
    suppressed: [bool; EVENT_KIND_COUNT],

    /// Kept sorted by `(priority, id)`.
    subscribers: Vec<SubscriberEntry>,

    removals: Unsubscriber,

    history_capacity: usize,
    next_id: u64,
    delivered: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queue", &self.queue)
            .field("history", &self.history)
            .field("suppressed", &self.suppressed)
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a bus keeping `history_capacity` recent events per kind.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            queue: Vec::new(),
            history: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            subscribers: Vec::new(),
            removals: Unsubscriber::default(),
            history_capacity,
            next_id: 0,
            delivered: 0,
        }
    }

    /// Suppress an event kind. Suppressed events are dropped at emit time.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.history[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Queue an event for the next [`deliver`](Self::deliver) and record it
    /// in history. No-ops if the kind is suppressed.
    pub(crate) fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.history_capacity;
        self.history[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event.clone());
        self.queue.push(event);
    }

    /// Subscribe to one event kind with normal priority.
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) -> SubscriptionId {
        self.insert(Some(kind), SubscriberPriority::Normal, listener)
    }

    /// Subscribe to every event kind with normal priority.
    pub fn subscribe_all(&mut self, listener: Listener) -> SubscriptionId {
        self.insert(None, SubscriberPriority::Normal, listener)
    }

    /// Subscribe with an explicit priority. `kind = None` means every kind.
    pub fn subscribe_with_priority(
        &mut self,
        kind: Option<EventKind>,
        priority: SubscriberPriority,
        listener: Listener,
    ) -> SubscriptionId {
        self.insert(kind, priority, listener)
    }

    fn insert(
        &mut self,
        kind: Option<EventKind>,
        priority: SubscriberPriority,
        listener: Listener,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let entry = SubscriberEntry {
            id,
            kind,
            priority,
            listener,
        };
        // Ids grow monotonically, so insertion after the last entry of equal
        // or lower priority keeps `(priority, id)` order.
        let pos = self
            .subscribers
            .partition_point(|e| e.priority <= priority);
        self.subscribers.insert(pos, entry);
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.apply_removals(Vec::new());
        let before = self.subscribers.len();
        self.subscribers.retain(|e| e.id != id);
        self.subscribers.len() != before
    }

    /// Drop `removals` plus everything queued through [`Unsubscriber`] handles.
    fn apply_removals(&mut self, mut removals: Vec<SubscriptionId>) {
        removals.append(&mut self.removals.pending.borrow_mut());
        if !removals.is_empty() {
            self.subscribers.retain(|e| !removals.contains(&e.id));
        }
    }

    /// A handle that can queue removals from inside a listener.
    pub fn unsubscriber(&self) -> Unsubscriber {
        self.removals.clone()
    }

    /// Live subscriptions, not counting any already queued for removal.
    pub fn subscriber_count(&self) -> usize {
        let pending = self.removals.pending.borrow();
        self.subscribers
            .iter()
            .filter(|e| !pending.contains(&e.id))
            .count()
    }

    /// Deliver all queued events, oldest first.
    ///
    /// For each event every subscriber registered at the start of its
    /// dispatch whose kind matches is called exactly once, in
    /// `(priority, subscription order)`. Removals requested during the
    /// dispatch, by return value or through an [`Unsubscriber`], are applied
    /// once the event has been offered to all of them. Removals queued
    /// before a dispatch are applied before it starts.
    pub fn deliver(&mut self) {
        let events = std::mem::take(&mut self.queue);
        for event in &events {
            self.apply_removals(Vec::new());
            let kind = event.kind();
            let mut removals = Vec::new();

            for entry in &mut self.subscribers {
                if entry.kind.is_some_and(|k| k != kind) {
                    continue;
                }
                if (entry.listener)(event) == ListenerControl::Unsubscribe {
                    removals.push(entry.id);
                }
            }

            self.apply_removals(removals);
            self.delivered += 1;
        }
    }

    /// Events emitted but not yet delivered.
    pub fn pending(&self) -> &[Event] {
        &self.queue
    }

    /// Total events delivered since creation.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Recent history for a kind (read-only).
    pub fn history(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.history[kind.index()].as_ref()
    }

    /// The most recent event of a kind, if any.
    pub fn latest(&self, kind: EventKind) -> Option<&Event> {
        self.history(kind).and_then(EventBuffer::latest)
    }

    /// Total events ever emitted for a kind (including those aged out of history).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.history(kind).map_or(0, EventBuffer::total_written)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
