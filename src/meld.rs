//! Runs, sets, and the rules for growing and fixing them.

use crate::error::{MeldKind, Result, RummyError};
use crate::{Card, Suit};
use std::fmt;

/// Smallest legal run or set.
pub const MIN_MELD_LEN: usize = 3;

/// A range of values a meld may grow into, optionally restricted to a suit.
/// `Suit::Joker` means any suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayExtension {
    first_value: u8,
    last_value: u8,
    suit: Suit,
}

impl PlayExtension {
    pub fn new(first_value: u8, last_value: u8, suit: Suit) -> Self {
        PlayExtension {
            first_value,
            last_value,
            suit,
        }
    }

    pub fn first_value(&self) -> u8 {
        self.first_value
    }

    pub fn last_value(&self) -> u8 {
        self.last_value
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn accepts_any_suit(&self) -> bool {
        self.suit == Suit::Joker
    }

    pub fn contains_value(&self, value: u8) -> bool {
        (self.first_value..=self.last_value).contains(&value)
    }

    /// Wilds always fit; other cards must be in range and of the right suit.
    pub fn contains(&self, card: &Card, round: u8) -> bool {
        match card.face(round) {
            None => true,
            Some((suit, value)) => {
                self.contains_value(value) && (self.accepts_any_suit() || suit == self.suit)
            }
        }
    }
}

/// Where a meld can still grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extensions {
    Run {
        lower: Option<PlayExtension>,
        upper: Option<PlayExtension>,
    },
    Set(PlayExtension),
}

impl Extensions {
    /// The extension on one side. Sets grow the same way on both sides.
    pub fn side(&self, grow_right: bool) -> Option<PlayExtension> {
        match self {
            Extensions::Run { lower, upper } => {
                if grow_right {
                    *upper
                } else {
                    *lower
                }
            }
            Extensions::Set(ext) => Some(*ext),
        }
    }
}

/// Suit and first-slot value of a valid run; both `None` when every card is
/// an unfixed wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunShape {
    suit: Option<Suit>,
    first: Option<u8>,
}

fn run_shape(cards: &[Card], round: u8) -> Option<RunShape> {
    let len = cards.len();
    if len < MIN_MELD_LEN || len > usize::from(Card::MAX_RANK) {
        return None;
    }

    let mut suit = None;
    let mut first: Option<i32> = None;
    for (i, card) in cards.iter().enumerate() {
        let Some((s, v)) = card.face(round) else {
            continue;
        };
        if *suit.get_or_insert(s) != s {
            return None;
        }
        let origin = i32::from(v) - i as i32;
        if *first.get_or_insert(origin) != origin {
            return None;
        }
    }

    match first {
        Some(origin) => {
            let last = origin + len as i32 - 1;
            if origin < 1 || last > i32::from(Card::MAX_RANK) {
                return None;
            }
            Some(RunShape {
                suit,
                first: Some(origin as u8),
            })
        }
        None => Some(RunShape {
            suit: None,
            first: None,
        }),
    }
}

/// Shared value of a valid set: `Some(None)` for an all-wild set.
fn set_value(cards: &[Card], round: u8) -> Option<Option<u8>> {
    if cards.len() < MIN_MELD_LEN {
        return None;
    }
    let mut value = None;
    for (_, v) in cards.iter().filter_map(|c| c.face(round)) {
        if *value.get_or_insert(v) != v {
            return None;
        }
    }
    Some(value)
}

/// Physical wild cards inside a meld, fixed or not.
pub(crate) fn physical_wilds(cards: &[Card], round: u8) -> Vec<Card> {
    cards
        .iter()
        .filter(|c| c.is_fixed() || c.is_wild(round))
        .map(|c| c.physical())
        .collect()
}

fn grown(cards: &[Card], extra: &[Card], grow_right: bool) -> Vec<Card> {
    let mut out = Vec::with_capacity(cards.len() + extra.len());
    if grow_right {
        out.extend_from_slice(cards);
        out.extend_from_slice(extra);
    } else {
        out.extend_from_slice(extra);
        out.extend_from_slice(cards);
    }
    out
}

/// Same-suit consecutive cards, lowest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlay {
    cards: Vec<Card>,
    round: u8,
    suit: Option<Suit>,
    first: Option<u8>,
}

impl RunPlay {
    pub fn new(cards: Vec<Card>, round: u8) -> Result<Self> {
        let shape = run_shape(&cards, round)
            .ok_or_else(|| RummyError::meld_validation(MeldKind::Run, &cards))?;
        Ok(RunPlay {
            cards,
            round,
            suit: shape.suit,
            first: shape.first,
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// `None` while every card is an unfixed wild.
    pub fn suit(&self) -> Option<Suit> {
        self.suit
    }

    pub fn first_value(&self) -> Option<u8> {
        self.first
    }

    pub fn last_value(&self) -> Option<u8> {
        self.first.map(|first| first + self.len() as u8 - 1)
    }

    pub fn get_possible_extensions(&self) -> Extensions {
        let len = self.len() as u8;
        let max = Card::MAX_RANK;
        let (lower, upper) = match self.suit.zip(self.first) {
            Some((suit, first)) => {
                let last = first + len - 1;
                (
                    (first > 1).then(|| PlayExtension::new(1, first - 1, suit)),
                    (last < max).then(|| PlayExtension::new(last + 1, max, suit)),
                )
            }
            None if len >= max => (None, None),
            // all wild: any suit, limited by how far the run can still slide
            None => (
                Some(PlayExtension::new(1, max - len, Suit::Joker)),
                Some(PlayExtension::new(len + 1, max, Suit::Joker)),
            ),
        };
        Extensions::Run { lower, upper }
    }

    pub fn can_add_card(&self, card: &Card, grow_right: bool) -> bool {
        let Some(ext) = self.get_possible_extensions().side(grow_right) else {
            return false;
        };
        ext.contains(card, self.round)
            && run_shape(&grown(&self.cards, &[*card], grow_right), self.round).is_some()
    }

    pub fn add_card(&mut self, card: Card, grow_right: bool) -> Result<()> {
        if !self.can_add_card(&card, grow_right) {
            return Err(RummyError::extension_rejected(&[card]));
        }
        *self = RunPlay::new(grown(&self.cards, &[card], grow_right), self.round)?;
        Ok(())
    }

    /// Replace every wild with the card its position stands for. An all-wild
    /// run is numbered from `fix_value` in clubs.
    pub fn fix_wilds(&mut self, fix_value: u8) -> Result<()> {
        let len = self.len() as u8;
        let suit = self.suit.unwrap_or(Suit::Club);
        let first = match self.first {
            Some(first) => first,
            None => fix_value.clamp(1, Card::MAX_RANK + 1 - len),
        };
        let cards = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| {
                if card.is_wild(self.round) {
                    Card::fixed(suit, first + i as u8, *card)
                } else {
                    Ok(*card)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        *self = RunPlay::new(cards, self.round)?;
        Ok(())
    }

    pub fn wilds_used(&self) -> Vec<Card> {
        physical_wilds(&self.cards, self.round)
    }
}

/// Cards sharing one value; suits may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPlay {
    cards: Vec<Card>,
    round: u8,
    value: Option<u8>,
}

impl SetPlay {
    pub fn new(cards: Vec<Card>, round: u8) -> Result<Self> {
        let value = set_value(&cards, round)
            .ok_or_else(|| RummyError::meld_validation(MeldKind::Set, &cards))?;
        Ok(SetPlay {
            cards,
            round,
            value,
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// `None` while every card is an unfixed wild.
    pub fn value(&self) -> Option<u8> {
        self.value
    }

    pub fn get_possible_extensions(&self) -> Extensions {
        let ext = match self.value {
            Some(v) => PlayExtension::new(v, v, Suit::Joker),
            None => PlayExtension::new(1, Card::MAX_RANK, Suit::Joker),
        };
        Extensions::Set(ext)
    }

    /// Sets accept matching values and wilds on either side.
    pub fn can_add_card(&self, card: &Card, _grow_right: bool) -> bool {
        match self.get_possible_extensions() {
            Extensions::Set(ext) => ext.contains(card, self.round),
            Extensions::Run { .. } => false,
        }
    }

    pub fn add_card(&mut self, card: Card, grow_right: bool) -> Result<()> {
        if !self.can_add_card(&card, grow_right) {
            return Err(RummyError::extension_rejected(&[card]));
        }
        *self = SetPlay::new(grown(&self.cards, &[card], grow_right), self.round)?;
        Ok(())
    }

    /// Wilds become the set's value in clubs; an all-wild set takes `fix_value`.
    pub fn fix_wilds(&mut self, fix_value: u8) -> Result<()> {
        let value = self
            .value
            .unwrap_or_else(|| fix_value.clamp(1, Card::MAX_RANK));
        let cards = self
            .cards
            .iter()
            .map(|card| {
                if card.is_wild(self.round) {
                    Card::fixed(Suit::Club, value, *card)
                } else {
                    Ok(*card)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        *self = SetPlay::new(cards, self.round)?;
        Ok(())
    }

    pub fn wilds_used(&self) -> Vec<Card> {
        physical_wilds(&self.cards, self.round)
    }
}

/// A committed or candidate meld of either shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Meld {
    Run(RunPlay),
    Set(SetPlay),
}

impl Meld {
    /// Build a meld from cards, trying a run first and then a set.
    pub fn parse(cards: Vec<Card>, round: u8) -> Result<Self> {
        Self::build(MeldKind::Run, cards.clone(), round)
            .or_else(|_| Self::build(MeldKind::Set, cards, round))
    }

    /// Parse a meld from a card list: "H4 H5 W" or "H7 D7 D7".
    pub fn from_string(input: &str, round: u8) -> Result<Self> {
        let cards = input
            .split_whitespace()
            .map(Card::from_string)
            .collect::<Result<Vec<_>>>()?;
        Self::parse(cards, round)
    }

    fn build(kind: MeldKind, cards: Vec<Card>, round: u8) -> Result<Self> {
        match kind {
            MeldKind::Run => RunPlay::new(cards, round).map(Meld::Run),
            MeldKind::Set => SetPlay::new(cards, round).map(Meld::Set),
        }
    }

    pub fn kind(&self) -> MeldKind {
        match self {
            Meld::Run(_) => MeldKind::Run,
            Meld::Set(_) => MeldKind::Set,
        }
    }

    pub fn is_run(&self) -> bool {
        matches!(self, Meld::Run(_))
    }

    pub fn cards(&self) -> &[Card] {
        match self {
            Meld::Run(run) => run.cards(),
            Meld::Set(set) => set.cards(),
        }
    }

    pub fn round(&self) -> u8 {
        match self {
            Meld::Run(run) => run.round(),
            Meld::Set(set) => set.round(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards().is_empty()
    }

    pub fn get_possible_extensions(&self) -> Extensions {
        match self {
            Meld::Run(run) => run.get_possible_extensions(),
            Meld::Set(set) => set.get_possible_extensions(),
        }
    }

    pub fn can_add_card(&self, card: &Card, grow_right: bool) -> bool {
        match self {
            Meld::Run(run) => run.can_add_card(card, grow_right),
            Meld::Set(set) => set.can_add_card(card, grow_right),
        }
    }

    pub fn add_card(&mut self, card: Card, grow_right: bool) -> Result<()> {
        match self {
            Meld::Run(run) => run.add_card(card, grow_right),
            Meld::Set(set) => set.add_card(card, grow_right),
        }
    }

    pub fn fix_wilds(&mut self, fix_value: u8) -> Result<()> {
        match self {
            Meld::Run(run) => run.fix_wilds(fix_value),
            Meld::Set(set) => set.fix_wilds(fix_value),
        }
    }

    /// The meld formed by joining `extra` on one side, re-validated from
    /// scratch. Keeps this meld's shape when possible, otherwise tries the
    /// other one.
    pub fn joined(&self, extra: &[Card], grow_right: bool) -> Result<Meld> {
        let combined = grown(self.cards(), extra, grow_right);
        let round = self.round();
        let (preferred, fallback) = match self.kind() {
            MeldKind::Run => (MeldKind::Run, MeldKind::Set),
            MeldKind::Set => (MeldKind::Set, MeldKind::Run),
        };
        Self::build(preferred, combined.clone(), round)
            .or_else(|_| Self::build(fallback, combined, round))
            .map_err(|_| RummyError::extension_rejected(extra))
    }

    pub fn wilds_used(&self) -> Vec<Card> {
        physical_wilds(self.cards(), self.round())
    }
}

impl fmt::Display for Meld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.kind())?;
        for (i, card) in self.cards().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", card)?;
        }
        f.write_str("]")
    }
}
