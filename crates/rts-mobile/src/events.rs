//! Movement events and the observer fan-out.
//!
//! # Ordering
//!
//! Events raised while one actor ticks are buffered and flushed together
//! once that actor is done, sorted (stably) by kind:
//!
//! | Rank | Kind                  |
//! |------|-----------------------|
//! | 0    | `LayerChanged`        |
//! | 1    | `MovementTypeChanged` |
//! | 2    | `FinishedMoving`      |
//! | 3    | `CrushWarned`         |
//! | 3    | `Crushed`             |
//!
//! Within a kind, raise order is kept.  Observers are called in the order
//! their subscriptions were made.

use rts_core::{ActorId, CPos, DamageTypes, MovementType};

// ── MovementEvent ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MovementEvent {
    MovementTypeChanged { actor: ActorId, types: MovementType },
    LayerChanged { actor: ActorId, from_layer: u8, to_layer: u8 },
    FinishedMoving { actor: ActorId, cell: CPos },
    CrushWarned { victim: ActorId, crusher: ActorId, fleeing: bool },
    Crushed { victim: ActorId, crusher: ActorId, damage_types: DamageTypes },
}

impl MovementEvent {
    /// The actor the event is about (the victim for crush events).
    pub fn actor(&self) -> ActorId {
        match *self {
            MovementEvent::MovementTypeChanged { actor, .. }
            | MovementEvent::LayerChanged { actor, .. }
            | MovementEvent::FinishedMoving { actor, .. } => actor,
            MovementEvent::CrushWarned { victim, .. } | MovementEvent::Crushed { victim, .. } => victim,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            MovementEvent::MovementTypeChanged { .. } => EventKind::MovementTypeChanged,
            MovementEvent::LayerChanged { .. } => EventKind::LayerChanged,
            MovementEvent::FinishedMoving { .. } => EventKind::FinishedMoving,
            MovementEvent::CrushWarned { .. } => EventKind::CrushWarned,
            MovementEvent::Crushed { .. } => EventKind::Crushed,
        }
    }

    pub(crate) fn rank(&self) -> u8 {
        match self.kind() {
            EventKind::LayerChanged => 0,
            EventKind::MovementTypeChanged => 1,
            EventKind::FinishedMoving => 2,
            EventKind::CrushWarned | EventKind::Crushed => 3,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum EventKind {
    MovementTypeChanged,
    LayerChanged,
    FinishedMoving,
    CrushWarned,
    Crushed,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::MovementTypeChanged,
        EventKind::LayerChanged,
        EventKind::FinishedMoving,
        EventKind::CrushWarned,
        EventKind::Crushed,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

// ── MovementObserver ──────────────────────────────────────────────────────────

/// Receives movement events.  Every method has a no-op default; implement
/// only the ones you need.
pub trait MovementObserver {
    fn movement_type_changed(&mut self, _actor: ActorId, _types: MovementType) {}

    fn layer_changed(&mut self, _actor: ActorId, _from_layer: u8, _to_layer: u8) {}

    fn finished_moving(&mut self, _actor: ActorId, _cell: CPos) {}

    /// `fleeing` is `true` when the victim won its roll and asked to be
    /// nudged away.
    fn crush_warned(&mut self, _victim: ActorId, _crusher: ActorId, _fleeing: bool) {}

    fn crushed(&mut self, _victim: ActorId, _crusher: ActorId, _damage_types: DamageTypes) {}
}

/// Returned by [`ObserverRegistry::register`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ObserverHandle(usize);

// ── ObserverRegistry ──────────────────────────────────────────────────────────

/// Registered observers plus one ordered subscription list per event kind.
#[derive(Default)]
pub struct ObserverRegistry {
    observers:     Vec<Box<dyn MovementObserver>>,
    /// `(handle, actor filter)` per [`EventKind`] slot.
    subscriptions: [Vec<(ObserverHandle, Option<ActorId>)>; 5],
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an observer.  It receives nothing until subscribed.
    pub fn register(&mut self, observer: Box<dyn MovementObserver>) -> ObserverHandle {
        self.observers.push(observer);
        ObserverHandle(self.observers.len() - 1)
    }

    /// Deliver events of `kind` to `handle`; only those about `actor` when
    /// one is given.
    pub fn subscribe(&mut self, handle: ObserverHandle, kind: EventKind, actor: Option<ActorId>) {
        self.subscriptions[kind.slot()].push((handle, actor));
    }

    /// Register and subscribe to every kind for every actor.
    pub fn register_all(&mut self, observer: Box<dyn MovementObserver>) -> ObserverHandle {
        let handle = self.register(observer);
        for kind in EventKind::ALL {
            self.subscribe(handle, kind, None);
        }
        handle
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn dispatch(&mut self, event: &MovementEvent) {
        let about = event.actor();
        for &(handle, filter) in &self.subscriptions[event.kind().slot()] {
            if filter.is_some_and(|a| a != about) {
                continue;
            }
            let Some(observer) = self.observers.get_mut(handle.0) else {
                continue;
            };
            match *event {
                MovementEvent::MovementTypeChanged { actor, types } => observer.movement_type_changed(actor, types),
                MovementEvent::LayerChanged { actor, from_layer, to_layer } => {
                    observer.layer_changed(actor, from_layer, to_layer)
                }
                MovementEvent::FinishedMoving { actor, cell } => observer.finished_moving(actor, cell),
                MovementEvent::CrushWarned { victim, crusher, fleeing } => {
                    observer.crush_warned(victim, crusher, fleeing)
                }
                MovementEvent::Crushed { victim, crusher, damage_types } => {
                    observer.crushed(victim, crusher, damage_types)
                }
            }
        }
    }
}
