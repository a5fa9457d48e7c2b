//! Public melds on the table and the plays that put cards there.

use crate::error::{Result, RummyError};
use crate::meld::{Extensions, Meld, RunPlay, SetPlay, physical_wilds};
use crate::{Card, Hand};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a meld on the table. Melds are never removed within a
/// round, so an id stays valid once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeldId(usize);

impl MeldId {
    pub fn new(index: usize) -> Self {
        MeldId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MeldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena of committed melds shared by every player for the round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    melds: Vec<Meld>,
}

impl Table {
    pub fn new() -> Self {
        Table { melds: Vec::new() }
    }

    pub fn from_melds(melds: Vec<Meld>) -> Self {
        Table { melds }
    }

    pub fn add_meld(&mut self, meld: Meld) -> MeldId {
        self.melds.push(meld);
        MeldId(self.melds.len() - 1)
    }

    pub fn get(&self, id: MeldId) -> Option<&Meld> {
        self.melds.get(id.0)
    }

    pub fn melds(&self) -> &[Meld] {
        &self.melds
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeldId, &Meld)> {
        self.melds.iter().enumerate().map(|(i, m)| (MeldId(i), m))
    }

    pub fn len(&self) -> usize {
        self.melds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.melds.is_empty()
    }

    pub(crate) fn replace(&mut self, id: MeldId, meld: Meld) -> Result<()> {
        let slot = self
            .melds
            .get_mut(id.0)
            .ok_or(RummyError::UnknownPublicGroupReference(id))?;
        *slot = meld;
        Ok(())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, meld) in self.iter() {
            writeln!(f, "{} {}", id, meld)?;
        }
        Ok(())
    }
}

/// Which end of a public meld a delta attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Growth {
    Prepend,
    Append,
}

impl Growth {
    pub fn grows_right(self) -> bool {
        self == Growth::Append
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Growth::Prepend => f.write_str("prepend"),
            Growth::Append => f.write_str("append"),
        }
    }
}

/// Cards from a hand added to one end of a table meld.
///
/// The delta is only meaningful against the meld it targets: every check
/// joins the new cards onto that meld and re-validates the whole thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicGroupPlay {
    cards: Vec<Card>,
    target: MeldId,
    growth: Growth,
}

impl PublicGroupPlay {
    pub fn new(cards: Vec<Card>, target: MeldId, growth: Growth) -> Self {
        PublicGroupPlay {
            cards,
            target,
            growth,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn target(&self) -> MeldId {
        self.target
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    fn resolve<'a>(&self, melds: &'a [Meld]) -> Result<&'a Meld> {
        melds
            .get(self.target.index())
            .ok_or(RummyError::UnknownPublicGroupReference(self.target))
    }

    /// The meld `base` becomes once this delta is attached.
    pub fn combined_with(&self, base: &Meld) -> Result<Meld> {
        base.joined(&self.cards, self.growth.grows_right())
    }

    pub fn get_possible_extensions(&self, melds: &[Meld]) -> Result<Extensions> {
        let base = self.resolve(melds)?;
        Ok(self.combined_with(base)?.get_possible_extensions())
    }

    /// Only grows in the delta's own direction.
    pub fn can_add_card(&self, card: &Card, grow_right: bool, melds: &[Meld]) -> bool {
        if grow_right != self.growth.grows_right() {
            return false;
        }
        let Ok(base) = self.resolve(melds) else {
            return false;
        };
        let mut grown = self.clone();
        grown.extend_with(*card);
        grown.combined_with(base).is_ok()
    }

    /// Attach one more card at the far end of the delta.
    pub fn extend_with(&mut self, card: Card) {
        match self.growth {
            Growth::Append => self.cards.push(card),
            Growth::Prepend => self.cards.insert(0, card),
        }
    }

    pub fn add_card(&mut self, card: Card, grow_right: bool, melds: &[Meld]) -> Result<()> {
        if !self.can_add_card(&card, grow_right, melds) {
            return Err(RummyError::extension_rejected(&[card]));
        }
        self.extend_with(card);
        Ok(())
    }

    /// Fix the wilds of the combined meld and keep only the new part.
    pub fn fix_wilds(&mut self, melds: &[Meld], fix_value: u8) -> Result<()> {
        let mut combined = self.combined_with(self.resolve(melds)?)?;
        combined.fix_wilds(fix_value)?;
        let n = self.cards.len();
        let fixed = combined.cards();
        self.cards = match self.growth {
            Growth::Append => fixed[fixed.len() - n..].to_vec(),
            Growth::Prepend => fixed[..n].to_vec(),
        };
        Ok(())
    }

    /// Move the cards out of `hand` and grow the target meld in place.
    /// Nothing is mutated on failure.
    pub fn execute(&self, hand: &mut Hand, table: &mut Table) -> Result<MeldId> {
        let base = table
            .get(self.target)
            .ok_or(RummyError::UnknownPublicGroupReference(self.target))?;
        let combined = self.combined_with(base)?;
        let physical: Vec<Card> = self.cards.iter().map(Card::physical).collect();
        hand.take_all(&physical)?;
        table.replace(self.target, combined)?;
        Ok(self.target)
    }
}

/// One step of a turn: a new meld laid down, or cards added to a table meld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Play {
    Run(RunPlay),
    Set(SetPlay),
    Public(PublicGroupPlay),
}

impl Play {
    /// Cards this play takes from the hand, as they will appear on the table.
    pub fn cards(&self) -> &[Card] {
        match self {
            Play::Run(run) => run.cards(),
            Play::Set(set) => set.cards(),
            Play::Public(delta) => delta.cards(),
        }
    }

    pub fn get_possible_extensions(&self, melds: &[Meld]) -> Result<Extensions> {
        match self {
            Play::Run(run) => Ok(run.get_possible_extensions()),
            Play::Set(set) => Ok(set.get_possible_extensions()),
            Play::Public(delta) => delta.get_possible_extensions(melds),
        }
    }

    pub fn can_add_card(&self, card: &Card, grow_right: bool, melds: &[Meld]) -> bool {
        match self {
            Play::Run(run) => run.can_add_card(card, grow_right),
            Play::Set(set) => set.can_add_card(card, grow_right),
            Play::Public(delta) => delta.can_add_card(card, grow_right, melds),
        }
    }

    pub fn add_card(&mut self, card: Card, grow_right: bool, melds: &[Meld]) -> Result<()> {
        match self {
            Play::Run(run) => run.add_card(card, grow_right),
            Play::Set(set) => set.add_card(card, grow_right),
            Play::Public(delta) => delta.add_card(card, grow_right, melds),
        }
    }

    pub fn fix_wilds(&mut self, melds: &[Meld], fix_value: u8) -> Result<()> {
        match self {
            Play::Run(run) => run.fix_wilds(fix_value),
            Play::Set(set) => set.fix_wilds(fix_value),
            Play::Public(delta) => delta.fix_wilds(melds, fix_value),
        }
    }

    /// Commit the play: remove its physical cards from `hand` and place them
    /// on `table`. Returns the id of the meld that was created or grown.
    pub fn execute(&self, hand: &mut Hand, table: &mut Table) -> Result<MeldId> {
        let meld = match self {
            Play::Public(delta) => return delta.execute(hand, table),
            Play::Run(run) => Meld::Run(run.clone()),
            Play::Set(set) => Meld::Set(set.clone()),
        };
        let physical: Vec<Card> = meld.cards().iter().map(Card::physical).collect();
        hand.take_all(&physical)?;
        Ok(table.add_meld(meld))
    }

    /// Physical wild cards this play consumes.
    pub fn wilds_used(&self, round: u8) -> Vec<Card> {
        match self {
            Play::Run(run) => run.wilds_used(),
            Play::Set(set) => set.wilds_used(),
            Play::Public(delta) => physical_wilds(delta.cards(), round),
        }
    }
}

impl fmt::Display for Play {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards = crate::error::join_cards(self.cards());
        match self {
            Play::Run(_) => write!(f, "lay down run [{}]", cards),
            Play::Set(_) => write!(f, "lay down set [{}]", cards),
            Play::Public(delta) => {
                write!(f, "{} [{}] to {}", delta.growth, cards, delta.target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Suit;

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace()
            .map(|c| Card::from_string(c).unwrap())
            .collect()
    }

    fn table_with(melds: &[&str], round: u8) -> Table {
        Table::from_melds(
            melds
                .iter()
                .map(|m| Meld::from_string(m, round).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_table_ids_are_stable() {
        let mut table = Table::new();
        let a = table.add_meld(Meld::from_string("H1 H2 H3", 5).unwrap());
        let b = table.add_meld(Meld::from_string("C9 D9 S9", 5).unwrap());
        assert_eq!(a, MeldId::new(0));
        assert_eq!(b.index(), 1);
        assert_eq!(table.len(), 2);
        assert!(table.get(b).unwrap().cards().contains(&Card::new(Suit::Diamond, 9)));
        assert!(table.get(MeldId::new(7)).is_none());
        assert_eq!(b.to_string(), "#1");
    }

    #[test]
    fn test_public_set_extension_executes() {
        let mut table = table_with(&["H7 D7 D7"], 3);
        let mut hand = Hand::from_string("H7 C2").unwrap();
        let delta = PublicGroupPlay::new(cards("H7"), MeldId::new(0), Growth::Append);
        let id = delta.execute(&mut hand, &mut table).unwrap();
        assert_eq!(id, MeldId::new(0));
        assert_eq!(table.melds()[0].cards(), cards("H7 D7 D7 H7").as_slice());
        assert_eq!(hand.cards(), cards("C2").as_slice());
    }

    #[test]
    fn test_public_run_prepend() {
        let mut table = table_with(&["S5 S6 S7"], 3);
        let mut hand = Hand::from_string("S4 S3 H9").unwrap();
        let delta = PublicGroupPlay::new(cards("S3 S4"), MeldId::new(0), Growth::Prepend);
        delta.execute(&mut hand, &mut table).unwrap();
        assert_eq!(table.melds()[0].cards(), cards("S3 S4 S5 S6 S7").as_slice());
        assert_eq!(hand.len(), 1);
    }

    #[test]
    fn test_public_extension_rejects_and_leaves_state() {
        let mut table = table_with(&["S5 S6 S7"], 3);
        let mut hand = Hand::from_string("S9").unwrap();
        let delta = PublicGroupPlay::new(cards("S9"), MeldId::new(0), Growth::Append);
        let err = delta.execute(&mut hand, &mut table).unwrap_err();
        assert!(matches!(err, RummyError::ExtensionRejected { .. }));
        assert!(!err.is_fatal());
        assert_eq!(hand.len(), 1);
        assert_eq!(table.melds()[0].len(), 3);
    }

    #[test]
    fn test_unknown_public_group_is_fatal() {
        let mut table = table_with(&["S5 S6 S7"], 3);
        let mut hand = Hand::from_string("S8").unwrap();
        let delta = PublicGroupPlay::new(cards("S8"), MeldId::new(4), Growth::Append);
        let err = delta.execute(&mut hand, &mut table).unwrap_err();
        assert!(matches!(err, RummyError::UnknownPublicGroupReference(id) if id.index() == 4));
        assert!(err.is_fatal());
        assert_eq!(hand.len(), 1);
    }

    #[test]
    fn test_public_can_add_card_respects_direction() {
        let table = table_with(&["S5 S6 S7"], 3);
        let delta = PublicGroupPlay::new(cards("S8"), MeldId::new(0), Growth::Append);
        assert!(delta.can_add_card(&Card::new(Suit::Spade, 9), true, table.melds()));
        assert!(delta.can_add_card(&Card::joker(), true, table.melds()));
        assert!(!delta.can_add_card(&Card::joker(), false, table.melds()));
        assert!(!delta.can_add_card(&Card::new(Suit::Spade, 10), true, table.melds()));
    }

    #[test]
    fn test_public_fix_wilds_keeps_only_new_cards() {
        let table = table_with(&["S5 S6 S7"], 3);
        let mut append = PublicGroupPlay::new(cards("W S9"), MeldId::new(0), Growth::Append);
        append.fix_wilds(table.melds(), 1).unwrap();
        assert_eq!(append.cards()[0].to_string(), "S8*");
        assert_eq!(append.cards()[1].to_string(), "S9");

        let mut prepend = PublicGroupPlay::new(cards("W"), MeldId::new(0), Growth::Prepend);
        prepend.fix_wilds(table.melds(), 1).unwrap();
        assert_eq!(prepend.cards(), cards("S4").as_slice());
        assert!(prepend.cards()[0].is_fixed());
    }

    #[test]
    fn test_play_execute_removes_physical_wild() {
        let mut table = Table::new();
        let mut hand = Hand::from_string("H4 W H6 C2").unwrap();
        let mut play = Play::Run(RunPlay::new(cards("H4 W H6"), 3).unwrap());
        play.fix_wilds(table.melds(), 1).unwrap();
        assert_eq!(play.cards()[1].to_string(), "H5*");
        let id = play.execute(&mut hand, &mut table).unwrap();
        assert_eq!(id, MeldId::new(0));
        assert_eq!(hand.cards(), cards("C2").as_slice());
        assert_eq!(play.wilds_used(3), vec![Card::joker()]);
    }

    #[test]
    fn test_play_execute_missing_card_is_atomic() {
        let mut table = Table::new();
        let mut hand = Hand::from_string("H4 H6").unwrap();
        let play = Play::Run(RunPlay::new(cards("H4 W H6"), 3).unwrap());
        let err = play.execute(&mut hand, &mut table).unwrap_err();
        assert!(matches!(err, RummyError::CardNotInHand(_)));
        assert_eq!(hand.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_play_display() {
        let play = Play::Set(SetPlay::new(cards("H7 D7 W"), 3).unwrap());
        assert_eq!(play.to_string(), "lay down set [H7 D7 W]");
        let delta = Play::Public(PublicGroupPlay::new(cards("H7"), MeldId::new(2), Growth::Append));
        assert_eq!(delta.to_string(), "append [H7] to #2");
    }
}
