//! Phase orchestrator
//!
//! Owns the current phase, the simulation clock and the task scheduler.
//! `change_state` is the only way the phase moves. The simulation root
//! runs exit/enter side effects based on the returned `PhaseChange`.

use crate::core::clock::SimClock;
use crate::core::error::{Result, SiegeError};
use crate::phase::state::{GameOutcome, GamePhase};
use crate::phase::tasks::TaskScheduler;

/// A transition that actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub previous: GamePhase,
    pub next: GamePhase,
}

impl PhaseChange {
    /// Pause and resume suspend a phase without leaving it; no exit/enter
    /// side effects run for them.
    pub fn runs_side_effects(&self) -> bool {
        self.previous != GamePhase::Paused && self.next != GamePhase::Paused
    }
}

#[derive(Debug, Clone)]
pub struct PhaseOrchestrator {
    phase: GamePhase,
    paused_from: Option<GamePhase>,
    clock: SimClock,
    pub tasks: TaskScheduler,
    wave_index: u32,
    max_waves: u32,
    outcome: Option<GameOutcome>,
}

impl PhaseOrchestrator {
    pub fn new(initial: GamePhase, max_waves: u32) -> Self {
        Self {
            phase: initial,
            paused_from: None,
            clock: SimClock::new(),
            tasks: TaskScheduler::new(),
            wave_index: 0,
            max_waves,
            outcome: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Phase that is running, or that was suspended by a pause
    pub fn effective_phase(&self) -> GamePhase {
        self.paused_from.unwrap_or(self.phase)
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn wave_index(&self) -> u32 {
        self.wave_index
    }

    pub fn max_waves(&self) -> u32 {
        self.max_waves
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Bump the wave index on Night entry. Returns false once the index
    /// passes `max_waves` (the siege has been survived).
    pub fn advance_wave(&mut self) -> bool {
        self.wave_index += 1;
        self.wave_index <= self.max_waves
    }

    /// Ok(false) for a same-state no-op, Err for an edge missing from the table
    pub fn check_transition(&self, next: GamePhase) -> Result<bool> {
        let previous = self.phase;
        if previous == next {
            return Ok(false);
        }
        let resuming_elsewhere = previous == GamePhase::Paused
            && next != GamePhase::GameOver
            && Some(next) != self.paused_from;
        if !previous.can_transition(next) || resuming_elsewhere {
            return Err(SiegeError::InvalidTransition { from: previous, to: next });
        }
        Ok(true)
    }

    /// Move to `next`. Same-state requests are a no-op (`Ok(None)`);
    /// edges missing from the table are rejected without mutating anything.
    pub fn change_state(&mut self, next: GamePhase) -> Result<Option<PhaseChange>> {
        if !self.check_transition(next)? {
            return Ok(None);
        }
        let previous = self.phase;

        match next {
            GamePhase::Paused => {
                self.paused_from = Some(previous);
                self.clock.set_time_scale(0.0);
            }
            _ if previous == GamePhase::Paused => {
                self.paused_from = None;
                self.clock.set_time_scale(1.0);
            }
            _ => {}
        }
        if next == GamePhase::GameOver {
            self.paused_from = None;
            self.clock.set_time_scale(1.0);
        }

        self.phase = next;
        tracing::info!("phase {:?} -> {:?}", previous, next);
        Ok(Some(PhaseChange { previous, next }))
    }

    pub fn pause(&mut self) -> Result<Option<PhaseChange>> {
        if self.phase.is_terminal() {
            return Ok(None);
        }
        self.change_state(GamePhase::Paused)
    }

    pub fn resume(&mut self) -> Result<Option<PhaseChange>> {
        match self.paused_from {
            Some(phase) if self.phase == GamePhase::Paused => self.change_state(phase),
            _ => Ok(None),
        }
    }

    /// Record the outcome (first one wins) and move to GameOver
    pub fn end_game(&mut self, outcome: GameOutcome) -> Result<Option<PhaseChange>> {
        if self.phase.is_terminal() {
            return Ok(None);
        }
        self.outcome.get_or_insert(outcome);
        self.change_state(GamePhase::GameOver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_state_is_noop() {
        let mut orch = PhaseOrchestrator::new(GamePhase::Day, 20);
        assert_eq!(orch.change_state(GamePhase::Day).unwrap(), None);
        assert_eq!(orch.phase(), GamePhase::Day);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut orch = PhaseOrchestrator::new(GamePhase::Day, 20);
        let err = orch.change_state(GamePhase::Night).unwrap_err();
        assert!(matches!(err, SiegeError::InvalidTransition { .. }));
        assert_eq!(orch.phase(), GamePhase::Day);
    }

    #[test]
    fn test_pause_freezes_clock_and_resumes() {
        let mut orch = PhaseOrchestrator::new(GamePhase::Night, 20);
        orch.pause().unwrap();
        assert_eq!(orch.phase(), GamePhase::Paused);
        assert_eq!(orch.effective_phase(), GamePhase::Night);

        orch.clock_mut().advance(1.0);
        assert_eq!(orch.now(), 0.0);

        let change = orch.resume().unwrap().unwrap();
        assert_eq!(change.next, GamePhase::Night);
        assert!(!change.runs_side_effects());
        orch.clock_mut().advance(1.0);
        assert_eq!(orch.now(), 1.0);
    }

    #[test]
    fn test_resume_must_return_to_paused_phase() {
        let mut orch = PhaseOrchestrator::new(GamePhase::Day, 20);
        orch.pause().unwrap();
        assert!(orch.change_state(GamePhase::Night).is_err());
        assert!(orch.change_state(GamePhase::Day).is_ok());
    }

    #[test]
    fn test_game_over_first_outcome_wins() {
        let mut orch = PhaseOrchestrator::new(GamePhase::Night, 20);
        orch.end_game(GameOutcome::MassRebellion).unwrap();
        assert_eq!(orch.end_game(GameOutcome::Victory).unwrap(), None);
        assert_eq!(orch.outcome(), Some(GameOutcome::MassRebellion));
        assert!(orch.pause().unwrap().is_none());
    }

    #[test]
    fn test_wave_index_past_max() {
        let mut orch = PhaseOrchestrator::new(GamePhase::Day, 2);
        assert!(orch.advance_wave());
        assert!(orch.advance_wave());
        assert!(!orch.advance_wave());
        assert_eq!(orch.wave_index(), 3);
    }
}
