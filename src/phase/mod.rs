//! Phase orchestration - the day/night state machine and everything it
//! sequences: cooperative timed tasks and the event bus.

pub mod events;
pub mod orchestrator;
pub mod state;
pub mod tasks;

pub use events::{EventBus, LoggedEvent, SiegeEvent, SiegeEventLog, SubscriberId};
pub use orchestrator::{PhaseChange, PhaseOrchestrator};
pub use state::{GameOutcome, GamePhase};
pub use tasks::{Continuation, ScheduledTask, TaskId, TaskScheduler, TaskScope};
