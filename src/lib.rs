use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

pub mod api;
pub mod candidates;
pub mod config;
pub mod error;
pub mod meld;
pub mod scoring;
pub mod solver;
pub mod table;
#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

pub use config::SearchConfig;
pub use error::{MeldKind, Result, RummyError};
pub use meld::{Extensions, Meld, PlayExtension, RunPlay, SetPlay};
pub use solver::{
    CommitReport, PlayOutcome, PlaySearch, SearchResult, check_go_out, commit_play,
    find_best_play, get_all_plays,
};
pub use table::{Growth, MeldId, Play, PublicGroupPlay, Table};

/// Card suit. `Joker` is only carried by jokers and doubles as the
/// "any suit" sentinel in [`PlayExtension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Club,
    Spade,
    Heart,
    Diamond,
    Joker,
}

impl Suit {
    /// The four suits a run can be built in.
    pub const NATURAL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Heart, Suit::Diamond];

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Suit::Club),
            'S' => Some(Suit::Spade),
            'H' => Some(Suit::Heart),
            'D' => Some(Suit::Diamond),
            'J' => Some(Suit::Joker),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Club => 'C',
            Suit::Spade => 'S',
            Suit::Heart => 'H',
            Suit::Diamond => 'D',
            Suit::Joker => 'J',
        }
    }
}

/// A playing card.
///
/// Equality, hashing and ordering only look at `(value, suit)`. A card placed
/// into a meld in place of a wild is a *fixed* card: it shows the represented
/// suit/value and remembers the physical wild it replaces, so committing the
/// meld removes the right card from the hand.
#[derive(Debug, Clone, Copy)]
pub struct Card {
    suit: Suit,
    value: u8,
    fixed_from: Option<(Suit, u8)>,
}

impl Card {
    /// Value printed on natural jokers.
    pub const JOKER_VALUE: u8 = 14;
    /// Highest rank a run may reach.
    pub const MAX_RANK: u8 = 13;

    /// Create a card. Panics if `value` is outside `1..=14`.
    pub fn new(suit: Suit, value: u8) -> Self {
        assert!((1..=Self::JOKER_VALUE).contains(&value), "Value must be 1-14");
        Card {
            suit,
            value,
            fixed_from: None,
        }
    }

    /// Checked variant of [`Card::new`].
    pub fn try_new(suit: Suit, value: u8) -> Result<Self> {
        if (1..=Self::JOKER_VALUE).contains(&value) {
            Ok(Card::new(suit, value))
        } else {
            Err(RummyError::InvalidCard(format!("{}{}", suit.to_char(), value)))
        }
    }

    /// A natural joker.
    pub fn joker() -> Self {
        Card::new(Suit::Joker, Self::JOKER_VALUE)
    }

    /// A wild placed into a meld as the concrete card `suit`/`value`.
    pub fn fixed(suit: Suit, value: u8, wild: Card) -> Result<Self> {
        if suit == Suit::Joker || !(1..=Self::MAX_RANK).contains(&value) {
            return Err(RummyError::InvalidCard(format!(
                "cannot fix {} as {}{}",
                wild,
                suit.to_char(),
                value
            )));
        }
        let origin = wild.physical();
        Ok(Card {
            suit,
            value,
            fixed_from: Some((origin.suit, origin.value)),
        })
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_from.is_some()
    }

    /// The card that physically sits in a hand: the original wild for a fixed
    /// card, the card itself otherwise.
    pub fn physical(&self) -> Card {
        match self.fixed_from {
            Some((suit, value)) => Card::new(suit, value),
            None => *self,
        }
    }

    /// Jokers, natural 14s and the round's rank are wild. Fixed cards never are.
    pub fn is_wild(&self, round: u8) -> bool {
        if self.is_fixed() {
            return false;
        }
        self.suit == Suit::Joker || self.value == Self::JOKER_VALUE || self.value == round
    }

    /// Penalty points for holding this card: 0 for wilds and fixed cards,
    /// face value capped at 10 otherwise.
    pub fn score(&self, round: u8) -> u32 {
        if self.is_fixed() || self.is_wild(round) {
            0
        } else {
            u32::from(self.value.min(10))
        }
    }

    /// The concrete `(suit, value)` this card shows inside a meld, or `None`
    /// for an unfixed wild.
    pub fn face(&self, round: u8) -> Option<(Suit, u8)> {
        if self.is_wild(round) {
            None
        } else {
            Some((self.suit, self.value))
        }
    }

    /// Parse a card from its short form.
    /// Format: "H7" (seven of hearts), "CK"/"C13", "SA"/"S1", "W" (joker),
    /// "H5*" (a joker fixed as the five of hearts).
    pub fn from_string(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || RummyError::InvalidCard(s.to_string());

        let upper = s.to_ascii_uppercase();
        if upper == "W" || upper == "JK" {
            return Ok(Card::joker());
        }

        if let Some(face) = upper.strip_suffix('*') {
            let face = Card::from_string(face)?;
            return Card::fixed(face.suit, face.value, Card::joker());
        }

        let mut chars = upper.chars();
        let suit = chars.next().and_then(Suit::from_char).ok_or_else(invalid)?;
        let rest = chars.as_str();
        let value = match rest {
            "A" => 1,
            "J" => 11,
            "Q" => 12,
            "K" => 13,
            digits => digits.parse::<u8>().map_err(|_| invalid())?,
        };

        Card::try_new(suit, value)
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.suit == other.suit
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.suit.hash(state);
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then(self.suit.cmp(&other.suit))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suit == Suit::Joker && self.value == Self::JOKER_VALUE {
            return f.write_str("W");
        }
        write!(f, "{}{}", self.suit.to_char(), self.value)?;
        if self.is_fixed() {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// The cards one player holds. Value-equal cards may appear more than once,
/// since games are dealt from several decks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Hand { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        Hand { cards }
    }

    /// Parse a whitespace-separated card list, e.g. "H1 H2 H3 W".
    pub fn from_string(input: &str) -> Result<Self> {
        let cards = input
            .split_whitespace()
            .map(Card::from_string)
            .collect::<Result<Vec<_>>>()?;
        Ok(Hand { cards })
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Remove the first value-equal card. Returns false if none matched.
    pub fn remove(&mut self, card: &Card) -> bool {
        if let Some(index) = self.cards.iter().position(|c| c == card) {
            self.cards.remove(index);
            true
        } else {
            false
        }
    }

    /// Remove every card in `cards`, or nothing at all if any is missing.
    pub fn take_all(&mut self, cards: &[Card]) -> Result<()> {
        let mut remaining = self.cards.clone();
        for card in cards {
            let index = remaining
                .iter()
                .position(|c| c == card)
                .ok_or(RummyError::CardNotInHand(*card))?;
            remaining.remove(index);
        }
        self.cards = remaining;
        Ok(())
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    /// Number of value-equal copies of `card`.
    pub fn count(&self, card: &Card) -> usize {
        self.cards.iter().filter(|c| *c == card).count()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Sort by value, then suit.
    pub fn sort(&mut self) {
        self.cards.sort();
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Split into `(non_wilds, wilds)` for the given round, keeping hand order.
    pub fn partition(&self, round: u8) -> (Vec<Card>, Vec<Card>) {
        self.cards.iter().partition(|c| !c.is_wild(round))
    }

    pub fn non_wilds(&self, round: u8) -> Vec<Card> {
        self.partition(round).0
    }

    pub fn wilds(&self, round: u8) -> Vec<Card> {
        self.partition(round).1
    }

    pub fn score(&self, round: u8) -> u32 {
        self.cards.iter().map(|c| c.score(round)).sum()
    }

    /// The card worth the most points; ties go to the higher card.
    pub fn highest_scoring(&self, round: u8) -> Option<Card> {
        self.cards
            .iter()
            .max_by(|a, b| a.score(round).cmp(&b.score(round)).then(a.cmp(b)))
            .copied()
    }

    /// Remove and return [`Hand::highest_scoring`].
    pub fn discard_highest(&mut self, round: u8) -> Option<Card> {
        let card = self.highest_scoring(round)?;
        self.remove(&card);
        Some(card)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", card)?;
        }
        f.write_str(">")
    }
}

/// Face-up discard stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscardPile(Vec<Card>);

impl DiscardPile {
    pub fn new() -> Self {
        DiscardPile(Vec::new())
    }

    pub fn push(&mut self, card: Card) {
        self.0.push(card);
    }

    pub fn pop(&mut self) -> Option<Card> {
        self.0.pop()
    }

    pub fn peek(&self) -> Option<&Card> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
