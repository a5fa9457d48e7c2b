use crate::Card;
use crate::table::MeldId;
use thiserror::Error;

/// Which meld shape a validation failure was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeldKind {
    Run,
    Set,
}

impl std::fmt::Display for MeldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeldKind::Run => f.write_str("run"),
            MeldKind::Set => f.write_str("set"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RummyError {
    #[error("cards [{cards}] do not form a valid {kind}")]
    MeldValidation { kind: MeldKind, cards: String },

    #[error("extension [{cards}] does not keep the meld valid")]
    ExtensionRejected { cards: String },

    #[error("attempted to discard from an empty hand")]
    EmptyHandInvariantViolation,

    #[error("public group {0} is not on the table")]
    UnknownPublicGroupReference(MeldId),

    #[error("card {0} is not in the hand")]
    CardNotInHand(Card),

    #[error("invalid card: {0}")]
    InvalidCard(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RummyError {
    /// Internal invariant violations; these indicate a caller or engine bug
    /// rather than a candidate that simply does not work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RummyError::EmptyHandInvariantViolation | RummyError::UnknownPublicGroupReference(_)
        )
    }

    pub(crate) fn meld_validation(kind: MeldKind, cards: &[Card]) -> Self {
        RummyError::MeldValidation {
            kind,
            cards: join_cards(cards),
        }
    }

    pub(crate) fn extension_rejected(cards: &[Card]) -> Self {
        RummyError::ExtensionRejected {
            cards: join_cards(cards),
        }
    }
}

pub type Result<T> = std::result::Result<T, RummyError>;

pub(crate) fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Suit;

    #[test]
    fn only_invariant_violations_are_fatal() {
        assert!(RummyError::EmptyHandInvariantViolation.is_fatal());
        assert!(RummyError::UnknownPublicGroupReference(MeldId::new(3)).is_fatal());
        let cards = [Card::new(Suit::Heart, 1), Card::new(Suit::Club, 5)];
        assert!(!RummyError::meld_validation(MeldKind::Run, &cards).is_fatal());
        assert!(!RummyError::extension_rejected(&cards).is_fatal());
    }

    #[test]
    fn validation_message_lists_cards() {
        let cards = [Card::new(Suit::Heart, 1), Card::joker()];
        let err = RummyError::meld_validation(MeldKind::Set, &cards);
        assert_eq!(err.to_string(), "cards [H1 W] do not form a valid set");
    }
}
