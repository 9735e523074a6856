//! Siege events and the observer bus
//!
//! Every registered subscriber sees every event. Subscribers are for
//! display and bookkeeping; core decisions never depend on them. Each tick
//! also returns the events it produced as a `SiegeEventLog`.

use std::fmt;
use std::sync::Arc;

use crate::core::types::{EntityId, Tick};
use crate::economy::loyalty::LoyaltyState;
use crate::phase::state::{GameOutcome, GamePhase};
use crate::waves::enemy_type::EnemyType;

#[derive(Debug, Clone)]
pub enum SiegeEvent {
    PhaseChanged {
        previous: GamePhase,
        next: GamePhase,
    },
    /// Spawn list for a wave, in spawn order
    WaveComposed {
        wave: u32,
        budget: u32,
        enemies: Vec<Arc<EnemyType>>,
    },
    WaveCompleted {
        wave: u32,
        forced: bool,
    },
    EnemySpawned {
        id: EntityId,
        name: String,
    },
    DaySettled {
        settled: usize,
        skipped: usize,
    },
    TierChanged {
        villager: EntityId,
        from: u8,
        to: u8,
    },
    VillagerAngered {
        villager: EntityId,
    },
    VillagerRebelled {
        villager: EntityId,
    },
    CascadeTriggered {
        source: EntityId,
        angered: Vec<EntityId>,
    },
    MassRebellion {
        rebelling: usize,
        defected: Vec<EntityId>,
    },
    Damage {
        target: EntityId,
        source: Option<EntityId>,
        amount: i32,
    },
    FriendlyFire {
        victim: EntityId,
        source: Option<EntityId>,
    },
    LoyaltyChanged {
        villager: EntityId,
        loyalty: LoyaltyState,
    },
    CombatantDied {
        id: EntityId,
    },
    GameOver {
        outcome: GameOutcome,
    },
}

#[derive(Debug, Clone)]
pub struct LoggedEvent {
    pub tick: Tick,
    pub event: SiegeEvent,
}

/// Events produced during a single tick
#[derive(Debug, Clone, Default)]
pub struct SiegeEventLog {
    pub events: Vec<LoggedEvent>,
}

impl SiegeEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiegeEvent> {
        self.events.iter().map(|e| &e.event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber = Box<dyn FnMut(&SiegeEvent)>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_id: u64,
    pending: Vec<LoggedEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&SiegeEvent) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Fan out to every subscriber and record for the current tick's log
    pub fn emit(&mut self, tick: Tick, event: SiegeEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
        self.pending.push(LoggedEvent { tick, event });
    }

    /// Hand over everything emitted since the last call
    pub fn take_log(&mut self) -> SiegeEventLog {
        SiegeEventLog {
            events: std::mem::take(&mut self.pending),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_every_subscriber_sees_every_event() {
        let mut bus = EventBus::new();
        let seen_a = Rc::new(RefCell::new(0));
        let seen_b = Rc::new(RefCell::new(0));
        let a = Rc::clone(&seen_a);
        let b = Rc::clone(&seen_b);
        bus.subscribe(move |_| *a.borrow_mut() += 1);
        bus.subscribe(move |_| *b.borrow_mut() += 1);

        bus.emit(1, SiegeEvent::WaveCompleted { wave: 1, forced: false });
        bus.emit(
            2,
            SiegeEvent::PhaseChanged {
                previous: GamePhase::Night,
                next: GamePhase::NightToDay,
            },
        );

        assert_eq!(*seen_a.borrow(), 2);
        assert_eq!(*seen_b.borrow(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0));
        let s = Rc::clone(&seen);
        let id = bus.subscribe(move |_| *s.borrow_mut() += 1);

        assert!(bus.unsubscribe(id));
        bus.emit(1, SiegeEvent::WaveCompleted { wave: 1, forced: false });

        assert_eq!(*seen.borrow(), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_take_log_drains() {
        let mut bus = EventBus::new();
        bus.emit(4, SiegeEvent::WaveCompleted { wave: 2, forced: true });

        let log = bus.take_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log.events[0].tick, 4);
        assert!(bus.take_log().is_empty());
    }
}
