//! Game phases and the explicit transition table

use serde::{Deserialize, Serialize};

use crate::core::config::StartingPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Day,
    DayToNight,
    Night,
    NightToDay,
    GameOver,
    Paused,
}

impl GamePhase {
    pub fn initial(starting: StartingPhase) -> Self {
        match starting {
            StartingPhase::Day => GamePhase::Day,
            StartingPhase::Night => GamePhase::Night,
        }
    }

    /// Allowed edges. Pause edges are further restricted by the orchestrator
    /// (resume must return to the phase that was paused).
    pub fn can_transition(self, next: GamePhase) -> bool {
        use GamePhase::*;
        match (self, next) {
            (GameOver, _) => false,
            (_, GameOver) => true,
            (Day, DayToNight) | (DayToNight, Night) | (Night, NightToDay) | (NightToDay, Day) => true,
            (Paused, Paused) => false,
            (_, Paused) => true,
            (Paused, Day | DayToNight | Night | NightToDay) => true,
            _ => false,
        }
    }

    /// Targeting and attacks only run at night
    pub fn combat_active(self) -> bool {
        self == GamePhase::Night
    }

    pub fn is_terminal(self) -> bool {
        self == GamePhase::GameOver
    }

    pub fn is_transition(self) -> bool {
        matches!(self, GamePhase::DayToNight | GamePhase::NightToDay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Survived past the last wave
    Victory,
    /// More than the configured share of the population is Rebel
    RebellionLoss,
    MassRebellion,
    PlayerKilled,
}

impl GameOutcome {
    pub fn is_victory(self) -> bool {
        self == GameOutcome::Victory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_edges() {
        assert!(GamePhase::Day.can_transition(GamePhase::DayToNight));
        assert!(GamePhase::DayToNight.can_transition(GamePhase::Night));
        assert!(GamePhase::Night.can_transition(GamePhase::NightToDay));
        assert!(GamePhase::NightToDay.can_transition(GamePhase::Day));
    }

    #[test]
    fn test_no_shortcuts() {
        assert!(!GamePhase::Day.can_transition(GamePhase::Night));
        assert!(!GamePhase::Night.can_transition(GamePhase::Day));
        assert!(!GamePhase::DayToNight.can_transition(GamePhase::Day));
    }

    #[test]
    fn test_game_over_is_terminal() {
        for next in [GamePhase::Day, GamePhase::Night, GamePhase::Paused, GamePhase::GameOver] {
            assert!(!GamePhase::GameOver.can_transition(next));
        }
        assert!(GamePhase::Night.can_transition(GamePhase::GameOver));
        assert!(GamePhase::Paused.can_transition(GamePhase::GameOver));
    }

    #[test]
    fn test_combat_only_at_night() {
        assert!(GamePhase::Night.combat_active());
        assert!(!GamePhase::Day.combat_active());
        assert!(!GamePhase::Paused.combat_active());
    }
}
