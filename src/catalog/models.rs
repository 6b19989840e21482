use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Maximum length of a player-written standing rule, after trimming.
pub const MAX_RULE_TEXT_LEN: usize = 140;
/// Bounds for numeric resolutions (sip counts and the like).
pub const MIN_COUNT: u32 = 1;
pub const MAX_COUNT: u32 = 10;

/// Category of a catalog card.
///
/// The category drives base draw weights, timer durations and the default
/// resolution behavior; it never encodes per-card specifics (those live in
/// [`ResolutionKind`] and [`SpecialEffect`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CardKind {
    Forfeit,
    Rule,
    Role,
    Curse,
    Event,
    Joker,
    Duel,
    Vote,
}

/// What input a card requires before it can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// No input, the card resolves as-is.
    None,
    /// One target player.
    Target,
    /// Two distinct target players.
    TwoTargets,
    /// A number within [`MIN_COUNT`]..=[`MAX_COUNT`].
    Count,
    /// A target player plus a number.
    TargetCount,
    /// Free-text rule creation, bounded by [`MAX_RULE_TEXT_LEN`].
    RuleText,
    /// Launches a duel instead of resolving directly.
    DuelChallenge,
    /// Launches a room-wide vote instead of resolving directly.
    GroupVote,
}

impl ResolutionKind {
    /// Whether resolving this kind names one or more target players.
    pub fn takes_targets(&self) -> bool {
        matches!(
            self,
            ResolutionKind::Target | ResolutionKind::TwoTargets | ResolutionKind::TargetCount
        )
    }
}

/// Effects that would otherwise require sniffing card titles.
///
/// A card carrying one of these resolves through a dedicated branch before any
/// category dispatch happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialEffect {
    /// Remove a curse from one target player.
    LiftCurse,
    /// Remove every role assignment in the room.
    ClearRoles,
    /// Move a curse from the first target to the second.
    TransferCurse,
    /// Remove every standing rule in the room.
    ClearRules,
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub kind: CardKind,
    pub title: String,
    pub text: String,
    pub resolution: ResolutionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialEffect>,
}

impl Card {
    pub fn new(
        id: &str,
        kind: CardKind,
        title: &str,
        text: &str,
        resolution: ResolutionKind,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            text: text.to_string(),
            resolution,
            special: None,
        }
    }

    pub fn with_special(mut self, special: SpecialEffect) -> Self {
        self.special = Some(special);
        self
    }
}

/// Shape of an operator-submitted custom card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCard {
    pub kind: CardKind,
    pub title: String,
    pub text: String,
    pub resolution: ResolutionKind,
    #[serde(default)]
    pub special: Option<SpecialEffect>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_kind_serializes_snake_case() {
        let json = serde_json::to_string(&CardKind::Forfeit).unwrap();
        assert_eq!(json, "\"forfeit\"");
        let back: CardKind = serde_json::from_str("\"vote\"").unwrap();
        assert_eq!(back, CardKind::Vote);
    }

    #[test]
    fn test_takes_targets() {
        assert!(ResolutionKind::Target.takes_targets());
        assert!(ResolutionKind::TwoTargets.takes_targets());
        assert!(ResolutionKind::TargetCount.takes_targets());
        assert!(!ResolutionKind::None.takes_targets());
        assert!(!ResolutionKind::RuleText.takes_targets());
        assert!(!ResolutionKind::DuelChallenge.takes_targets());
    }

    #[test]
    fn test_card_roundtrip_with_special() {
        let card = Card::new(
            "fresh-start",
            CardKind::Rule,
            "Fresh Start",
            "All standing rules are wiped.",
            ResolutionKind::None,
        )
        .with_special(SpecialEffect::ClearRules);

        let json = serde_json::to_string(&card).unwrap();
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
    }
}
