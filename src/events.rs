//! Synchronous battle event bus.
//!
//! Handlers run on the caller's stack, in registration order, before
//! `emit` returns. There is no queue and no cross-thread dispatch.
//! `subscribe` hands back a [`SubscriptionId`] that removes the handler.

use crate::combat::AttackResult;
use crate::state::{BattlePhase, BattleResult, Role};
use std::collections::HashMap;

/// Closed set of event kinds handlers can subscribe to.
///
/// Each [`BattleEvent`] variant maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BattleStart,
    TurnStart,
    TurnEnd,
    Attack,
    DamageDealt,
    CombatantDefeated,
    BattleEnd,
    StateChanged,
}

impl EventKind {
    /// Every kind, in the order a battle first produces them.
    pub const ALL: [EventKind; 8] = [
        EventKind::StateChanged,
        EventKind::BattleStart,
        EventKind::TurnStart,
        EventKind::DamageDealt,
        EventKind::Attack,
        EventKind::TurnEnd,
        EventKind::CombatantDefeated,
        EventKind::BattleEnd,
    ];

    /// Snake-case name, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::BattleStart => "battle_start",
            EventKind::TurnStart => "turn_start",
            EventKind::TurnEnd => "turn_end",
            EventKind::Attack => "attack",
            EventKind::DamageDealt => "damage_dealt",
            EventKind::CombatantDefeated => "combatant_defeated",
            EventKind::BattleEnd => "battle_end",
            EventKind::StateChanged => "state_changed",
        }
    }
}

/// An event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    BattleStart {
        challenger_id: String,
        opponent_id: String,
    },
    /// An attack is about to be resolved on `turn`.
    TurnStart {
        turn: u32,
        attacker: Role,
    },
    /// `turn` is the turn about to begin.
    TurnEnd {
        turn: u32,
        next_attacker: Role,
    },
    Attack {
        attacker: Role,
        result: Box<AttackResult>,
    },
    /// Damage committed to `target`; `remaining_hp` is its HP afterwards.
    DamageDealt {
        target: Role,
        damage: u32,
        remaining_hp: u32,
    },
    CombatantDefeated {
        role: Role,
        combatant_id: String,
    },
    BattleEnd(BattleResult),
    StateChanged {
        phase: BattlePhase,
        turn: u32,
    },
}

impl BattleEvent {
    /// The kind handlers subscribe to for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            BattleEvent::BattleStart { .. } => EventKind::BattleStart,
            BattleEvent::TurnStart { .. } => EventKind::TurnStart,
            BattleEvent::TurnEnd { .. } => EventKind::TurnEnd,
            BattleEvent::Attack { .. } => EventKind::Attack,
            BattleEvent::DamageDealt { .. } => EventKind::DamageDealt,
            BattleEvent::CombatantDefeated { .. } => EventKind::CombatantDefeated,
            BattleEvent::BattleEnd(_) => EventKind::BattleEnd,
            BattleEvent::StateChanged { .. } => EventKind::StateChanged,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&BattleEvent) + Send>;

/// Publish/subscribe hub keyed by [`EventKind`].
///
/// # Examples
///
/// ```rust
/// use duelcore::events::{BattleEvent, EventBus, EventKind};
/// use duelcore::BattlePhase;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let mut bus = EventBus::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// let id = bus.subscribe(EventKind::StateChanged, move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// bus.emit(&BattleEvent::StateChanged { phase: BattlePhase::Ready, turn: 1 });
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
///
/// assert!(bus.unsubscribe(id));
/// bus.emit(&BattleEvent::StateChanged { phase: BattlePhase::Ready, turn: 1 });
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
}

impl EventBus {
    /// An empty bus with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    ///
    /// Handlers must be `Send` so the bus, and the engine owning it, can
    /// move between threads.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&BattleEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove one subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.handlers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(sub, _)| *sub == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Invoke every handler registered for the event's kind.
    ///
    /// Returns how many handlers ran.
    pub fn emit(&mut self, event: &BattleEvent) -> usize {
        let kind = event.kind();
        let Some(handlers) = self.handlers.get_mut(&kind) else {
            return 0;
        };
        for (_, handler) in handlers.iter_mut() {
            handler(event);
        }
        tracing::trace!(event = kind.as_str(), handlers = handlers.len(), "emitted");
        handlers.len()
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Number of live subscriptions for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (kind.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("handlers", &counts)
            .field("next_id", &self.next_id)
            .finish()
    }
}
