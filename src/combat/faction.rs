//! Allegiance and friendly-fire rules

use serde::{Deserialize, Serialize};

use crate::economy::loyalty::LoyaltyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    /// Player plus Loyal and Angry villagers
    Settlement,
    Rebel,
    /// Wave enemies
    Horde,
}

/// What an entity looks like to someone choosing a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSide {
    Player,
    Villager(LoyaltyState),
    Enemy,
}

impl TargetSide {
    pub fn allegiance(self) -> Allegiance {
        match self {
            TargetSide::Player => Allegiance::Settlement,
            TargetSide::Villager(LoyaltyState::Rebel) => Allegiance::Rebel,
            TargetSide::Villager(_) => Allegiance::Settlement,
            TargetSide::Enemy => Allegiance::Horde,
        }
    }
}

/// The point of view of a combatant running its perception routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    Villager(LoyaltyState),
    Enemy,
}

impl Perspective {
    pub fn allegiance(self) -> Allegiance {
        match self {
            Perspective::Villager(loyalty) => TargetSide::Villager(loyalty).allegiance(),
            Perspective::Enemy => Allegiance::Horde,
        }
    }
}

/// Damage from the player or a settlement villager landing on a settlement villager
pub fn is_friendly_fire(source: TargetSide, target: TargetSide) -> bool {
    let source_is_settlement = matches!(
        source,
        TargetSide::Player | TargetSide::Villager(LoyaltyState::Loyal | LoyaltyState::Angry)
    );
    let target_is_settlement_villager =
        matches!(target, TargetSide::Villager(LoyaltyState::Loyal | LoyaltyState::Angry));
    source_is_settlement && target_is_settlement_villager
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allegiance_from_loyalty() {
        assert_eq!(TargetSide::Villager(LoyaltyState::Loyal).allegiance(), Allegiance::Settlement);
        assert_eq!(TargetSide::Villager(LoyaltyState::Angry).allegiance(), Allegiance::Settlement);
        assert_eq!(TargetSide::Villager(LoyaltyState::Rebel).allegiance(), Allegiance::Rebel);
        assert_eq!(TargetSide::Enemy.allegiance(), Allegiance::Horde);
        assert_eq!(Perspective::Enemy.allegiance(), Allegiance::Horde);
    }

    #[test]
    fn test_friendly_fire_detection() {
        let loyal = TargetSide::Villager(LoyaltyState::Loyal);
        let angry = TargetSide::Villager(LoyaltyState::Angry);
        let rebel = TargetSide::Villager(LoyaltyState::Rebel);

        assert!(is_friendly_fire(TargetSide::Player, loyal));
        assert!(is_friendly_fire(loyal, angry));
        assert!(!is_friendly_fire(loyal, rebel));
        assert!(!is_friendly_fire(TargetSide::Player, TargetSide::Enemy));
        assert!(!is_friendly_fire(rebel, loyal));
        assert!(!is_friendly_fire(TargetSide::Enemy, loyal));
    }
}
