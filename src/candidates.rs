//! Candidate melds a hand can lay down or add to the table.
//!
//! Every enumerator is a pure function of the hand and round: calling it
//! twice on the same input yields the same candidates in the same order.
//! Candidates that fail meld validation are dropped here and never surface.

use crate::meld::{MIN_MELD_LEN, Meld, RunPlay, SetPlay};
use crate::table::{Growth, MeldId, PublicGroupPlay};
use crate::{Card, Hand, Suit};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Generate the next combination in lexicographic order
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    if k == 0 || k > n {
        return false;
    }

    // Find the rightmost element that can be incremented
    let mut i = k;
    while i > 0 {
        i -= 1;
        if combo[i] < n - k + i {
            combo[i] += 1;
            // Reset all elements to the right
            for j in (i + 1)..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }

    false
}

/// Call `f` with every `k`-subset of `0..n`, in lexicographic order.
fn for_each_combination(n: usize, k: usize, mut f: impl FnMut(&[usize])) {
    if k == 0 || k > n {
        return;
    }
    let mut combo: Vec<usize> = (0..k).collect();
    loop {
        f(&combo);
        if !next_combination(&mut combo, n) {
            break;
        }
    }
}

/// Distinct values of `suit` among `cards`, ascending.
fn suit_values(cards: &[Card], suit: Suit) -> Vec<u8> {
    let mut values: Vec<u8> = cards
        .iter()
        .filter(|c| c.suit() == suit)
        .map(|c| c.value())
        .collect();
    values.sort_unstable();
    values.dedup();
    values
}

/// Fill `lo..=hi` of `suit` with the naturals in `present`, and wilds from
/// `fill` everywhere else.
fn fill_span(
    suit: Suit,
    lo: u8,
    hi: u8,
    present: &[u8],
    fill: &mut impl Iterator<Item = Card>,
) -> Vec<Card> {
    let mut cards = Vec::with_capacity(usize::from(hi - lo) + 1);
    for value in lo..=hi {
        if present.contains(&value) {
            cards.push(Card::new(suit, value));
        } else if let Some(wild) = fill.next() {
            cards.push(wild);
        }
    }
    cards
}

/// Every structurally distinct run the hand can form.
///
/// For each suit, every span of the suit's distinct values is completed with
/// wilds: internal gaps first, then padding up to the minimum length (upward
/// when it fits under the top rank, downward otherwise). Wilds left over are
/// then swapped in for interior naturals, one candidate per subset, so the
/// freed naturals can be used elsewhere. Boundary naturals are never swapped
/// out, since that is the same as a shorter span.
pub fn get_non_redundant_runs(hand: &Hand, round: u8) -> Vec<RunPlay> {
    let (non_wilds, wilds) = hand.partition(round);
    let mut runs = Vec::new();

    for suit in Suit::NATURAL {
        let values = suit_values(&non_wilds, suit);
        for i in 0..values.len() {
            for j in i..values.len() {
                let (lo, hi) = (values[i], values[j]);
                let span = usize::from(hi - lo) + 1;
                let naturals = j - i + 1;
                let gaps = span - naturals;
                let pad = MIN_MELD_LEN.saturating_sub(span);
                if gaps + pad > wilds.len() {
                    continue;
                }

                let mut spare = wilds.clone();
                let mut fill = spare.split_off(spare.len() - gaps - pad).into_iter().rev();
                let mut cards = fill_span(suit, lo, hi, &values[i..=j], &mut fill);
                let padding: Vec<Card> = fill.collect();
                if usize::from(hi) + pad <= usize::from(Card::MAX_RANK) {
                    cards.extend(padding);
                } else {
                    cards.splice(0..0, padding);
                }

                let Ok(base) = RunPlay::new(cards.clone(), round) else {
                    continue;
                };
                runs.push(base);

                let interior: Vec<usize> = cards
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| {
                        !c.is_wild(round) && c.value() != lo && c.value() != hi
                    })
                    .map(|(pos, _)| pos)
                    .collect();
                for k in 1..=spare.len().min(interior.len()) {
                    let swaps = &spare[spare.len() - k..];
                    for_each_combination(interior.len(), k, |combo| {
                        let mut swapped = cards.clone();
                        for (&idx, wild) in combo.iter().zip(swaps) {
                            swapped[interior[idx]] = *wild;
                        }
                        if let Ok(run) = RunPlay::new(swapped, round) {
                            runs.push(run);
                        }
                    });
                }
            }
        }
    }

    runs
}

/// Sets the hand can form.
///
/// With `only_maximum_size`, each value group is taken whole together with
/// every wild, and wilds alone form one set of all of them. Otherwise every
/// subset of each value group is paired with every usable wild count, and
/// wild-only sets come in every length from the minimum up.
pub fn get_sets(hand: &Hand, round: u8, only_maximum_size: bool) -> Vec<SetPlay> {
    let (non_wilds, wilds) = hand.partition(round);
    let mut sets = Vec::new();

    if wilds.len() >= MIN_MELD_LEN {
        let shortest = if only_maximum_size {
            wilds.len()
        } else {
            MIN_MELD_LEN
        };
        for len in shortest..=wilds.len() {
            if let Ok(set) = SetPlay::new(wilds[..len].to_vec(), round) {
                sets.push(set);
            }
        }
    }

    let mut groups: BTreeMap<u8, Vec<Card>> = BTreeMap::new();
    for card in &non_wilds {
        groups.entry(card.value()).or_default().push(*card);
    }

    for group in groups.values_mut() {
        group.sort();
        if only_maximum_size {
            if group.len() + wilds.len() < MIN_MELD_LEN {
                continue;
            }
            let mut cards = group.clone();
            cards.extend_from_slice(&wilds);
            if let Ok(set) = SetPlay::new(cards, round) {
                sets.push(set);
            }
            continue;
        }

        // identical cards make identical subsets; keep the first of each
        let mut seen: HashSet<Vec<Card>> = HashSet::new();
        for count in 1..=group.len() {
            for_each_combination(group.len(), count, |combo| {
                let picked: Vec<Card> = combo.iter().map(|&i| group[i]).collect();
                if !seen.insert(picked.clone()) {
                    return;
                }
                for wild_count in MIN_MELD_LEN.saturating_sub(count)..=wilds.len() {
                    let mut cards = picked.clone();
                    cards.extend_from_slice(&wilds[..wild_count]);
                    if let Ok(set) = SetPlay::new(cards, round) {
                        sets.push(set);
                    }
                }
            });
        }
    }

    sets
}

/// Ways the hand can grow the public run `meld` at either end.
///
/// Each candidate ends in a natural card; wilds only fill the gaps on the
/// way there. Trailing wilds are left to the mop-up at the end of a search
/// branch. Runs made only of unfixed wilds have no suit yet and get no
/// candidates.
pub fn get_extension_candidates(
    hand: &Hand,
    round: u8,
    target: MeldId,
    meld: &Meld,
) -> Vec<PublicGroupPlay> {
    let Meld::Run(run) = meld else {
        return Vec::new();
    };
    let (Some(suit), Some(first), Some(last)) = (run.suit(), run.first_value(), run.last_value())
    else {
        return Vec::new();
    };

    let (non_wilds, wilds) = hand.partition(round);
    let values = suit_values(&non_wilds, suit);
    let mut candidates = Vec::new();

    let above: Vec<u8> = values.iter().copied().filter(|&v| v > last).collect();
    for (n, &top) in above.iter().enumerate() {
        let gaps = usize::from(top - last) - (n + 1);
        if gaps > wilds.len() {
            break;
        }
        let mut fill = wilds[wilds.len() - gaps..].iter().rev().copied();
        let cards = fill_span(suit, last + 1, top, &above[..=n], &mut fill);
        let delta = PublicGroupPlay::new(cards, target, Growth::Append);
        if delta.combined_with(meld).is_ok() {
            candidates.push(delta);
        }
    }

    let below: Vec<u8> = values.iter().rev().copied().filter(|&v| v < first).collect();
    for (n, &bottom) in below.iter().enumerate() {
        let gaps = usize::from(first - bottom) - (n + 1);
        if gaps > wilds.len() {
            break;
        }
        let mut fill = wilds[wilds.len() - gaps..].iter().rev().copied();
        let cards = fill_span(suit, bottom, first - 1, &below[..=n], &mut fill);
        let delta = PublicGroupPlay::new(cards, target, Growth::Prepend);
        if delta.combined_with(meld).is_ok() {
            candidates.push(delta);
        }
    }

    candidates
}

/// For every public set whose value the hand holds naturally, play all of
/// those cards onto it. A set made only of unfixed wilds takes any value, so
/// each value in hand is offered separately.
pub fn get_public_set_plays(hand: &Hand, round: u8, melds: &[Meld]) -> Vec<PublicGroupPlay> {
    let non_wilds = hand.non_wilds(round);
    let mut plays = Vec::new();

    for (index, meld) in melds.iter().enumerate() {
        let Meld::Set(set) = meld else {
            continue;
        };
        let values: BTreeSet<u8> = match set.value() {
            Some(value) => BTreeSet::from([value]),
            None => non_wilds.iter().map(Card::value).collect(),
        };
        for value in values {
            let matching: Vec<Card> = non_wilds
                .iter()
                .copied()
                .filter(|c| c.value() == value)
                .collect();
            if matching.is_empty() {
                continue;
            }
            let delta = PublicGroupPlay::new(matching, MeldId::new(index), Growth::Append);
            if delta.combined_with(meld).is_ok() {
                plays.push(delta);
            }
        }
    }

    plays
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hand(s: &str) -> Hand {
        Hand::from_string(s).unwrap()
    }

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace()
            .map(|c| Card::from_string(c).unwrap())
            .collect()
    }

    fn run_cards(runs: &[RunPlay]) -> Vec<Vec<Card>> {
        runs.iter().map(|r| r.cards().to_vec()).collect()
    }

    #[test]
    fn test_next_combination() {
        let mut combo = vec![0, 1];
        let mut seen = vec![combo.clone()];
        while next_combination(&mut combo, 4) {
            seen.push(combo.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }

    #[test]
    fn test_for_each_combination_counts() {
        let mut count = 0;
        for_each_combination(5, 3, |_| count += 1);
        assert_eq!(count, 10);
        let mut none = 0;
        for_each_combination(2, 3, |_| none += 1);
        assert_eq!(none, 0);
    }

    #[test]
    fn test_runs_simple() {
        let runs = get_non_redundant_runs(&hand("H1 H2 H3 H8 H9"), 4);
        assert_eq!(run_cards(&runs), vec![cards("H1 H2 H3")]);
    }

    #[test]
    fn test_runs_no_wilds_every_span() {
        let runs = get_non_redundant_runs(&hand("S4 S5 S6 S7"), 3);
        assert_eq!(
            run_cards(&runs),
            vec![cards("S4 S5 S6"), cards("S4 S5 S6 S7"), cards("S5 S6 S7")]
        );
    }

    #[test]
    fn test_runs_fill_gap_and_pad() {
        let runs = get_non_redundant_runs(&hand("D5 D7 W"), 3);
        // D5 alone cannot reach length 3 with one wild; the gap is filled
        assert_eq!(run_cards(&runs), vec![cards("D5 W D7")]);

        let runs = get_non_redundant_runs(&hand("C12 C13 W"), 3);
        // no room above the king, so the wild goes below
        assert_eq!(run_cards(&runs), vec![cards("W C12 C13")]);

        let runs = get_non_redundant_runs(&hand("C6 W W"), 3);
        assert_eq!(run_cards(&runs), vec![cards("C6 W W")]);
    }

    #[test]
    fn test_runs_substitute_interior_naturals() {
        let runs = get_non_redundant_runs(&hand("H4 H5 H6 W"), 3);
        let found = run_cards(&runs);
        assert!(found.contains(&cards("H4 H5 H6")));
        // the spare wild frees the interior five
        assert!(found.contains(&cards("H4 W H6")));
        // padding with the wild
        assert!(found.contains(&cards("H4 H5 W")));
        assert!(found.contains(&cards("H5 H6 W")));
        // boundary naturals are never swapped out
        assert!(!found.contains(&cards("W H5 H6")));
    }

    #[test]
    fn test_runs_use_tail_wild_first() {
        // round 5: both the joker and the five of clubs are wild
        let found = run_cards(&get_non_redundant_runs(&hand("W S7 S9 C5"), 5));
        assert!(found.contains(&cards("S7 C5 S9")));
        assert!(!found.contains(&cards("S7 W S9")));
    }

    #[test]
    fn test_runs_ignore_duplicates() {
        let runs = get_non_redundant_runs(&hand("H1 H2 H3 H2"), 5);
        assert_eq!(run_cards(&runs), vec![cards("H1 H2 H3")]);
    }

    #[test]
    fn test_sets_maximum() {
        let sets = get_sets(&hand("H3 H3 H3 H1 H2"), 6, true);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].cards(), cards("H3 H3 H3").as_slice());

        let sets = get_sets(&hand("C6 W C6 W"), 3, true);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].cards(), cards("C6 C6 W W").as_slice());
    }

    #[test]
    fn test_sets_wild_only() {
        let max = get_sets(&hand("W W W W"), 3, true);
        assert_eq!(max.len(), 1);
        assert_eq!(max[0].len(), 4);

        let all = get_sets(&hand("W W W W"), 3, false);
        let lengths: Vec<usize> = all.iter().map(SetPlay::len).collect();
        assert_eq!(lengths, vec![3, 4]);
    }

    #[test]
    fn test_sets_exhaustive() {
        let sets = get_sets(&hand("H7 D7 S7 W"), 3, false);
        let found: Vec<Vec<Card>> = sets.iter().map(|s| s.cards().to_vec()).collect();
        assert!(found.contains(&cards("H7 D7 W")));
        // naturals come out in card order
        assert!(found.contains(&cards("S7 H7 D7")));
        assert!(found.contains(&cards("S7 H7 D7 W")));
        assert!(!found.iter().any(|s| s.len() < 3));
        // one natural and one wild is never enough
        assert!(!found.contains(&cards("H7 W")));
    }

    #[test]
    fn test_sets_exhaustive_skips_identical_subsets() {
        let sets = get_sets(&hand("H7 H7 H7"), 3, false);
        assert_eq!(sets.len(), 1);
    }

    #[test]
    fn test_extension_candidates_both_sides() {
        let meld = Meld::from_string("S5 S6 S7", 3).unwrap();
        let found = get_extension_candidates(&hand("S8 S10 S4 W H9"), 3, MeldId::new(0), &meld);
        let shapes: Vec<(Growth, Vec<Card>)> = found
            .iter()
            .map(|d| (d.growth(), d.cards().to_vec()))
            .collect();
        assert_eq!(
            shapes,
            vec![
                (Growth::Append, cards("S8")),
                (Growth::Append, cards("S8 W S10")),
                (Growth::Prepend, cards("S4")),
            ]
        );
        assert!(found.iter().all(|d| d.target() == MeldId::new(0)));
    }

    #[test]
    fn test_extension_candidates_skip_sets_and_suitless_runs() {
        let set = Meld::from_string("H7 D7 D7", 3).unwrap();
        assert!(get_extension_candidates(&hand("H7"), 3, MeldId::new(0), &set).is_empty());

        let wild_run = Meld::Run(RunPlay::new(cards("W W W"), 3).unwrap());
        assert!(get_extension_candidates(&hand("H4 H5"), 3, MeldId::new(0), &wild_run).is_empty());
    }

    #[test]
    fn test_public_set_plays() {
        let melds = vec![
            Meld::from_string("S5 S6 S7", 3).unwrap(),
            Meld::from_string("H7 D7 D7", 3).unwrap(),
        ];
        let plays = get_public_set_plays(&hand("H7 C7 H2 W"), 3, &melds);
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].target(), MeldId::new(1));
        assert_eq!(plays[0].cards(), cards("H7 C7").as_slice());
        assert_eq!(plays[0].growth(), Growth::Append);
    }

    #[test]
    fn test_public_set_of_wilds_takes_any_value() {
        let melds = vec![Meld::Set(SetPlay::new(cards("W W W"), 3).unwrap())];
        let plays = get_public_set_plays(&hand("C5 D5 H9 W"), 3, &melds);
        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].cards(), cards("C5 D5").as_slice());
        assert_eq!(plays[1].cards(), cards("H9").as_slice());
        assert!(plays.iter().all(|p| p.target() == MeldId::new(0)));

        let grown = plays[0].combined_with(&melds[0]).unwrap();
        assert!(!grown.is_run());
        assert_eq!(grown.len(), 5);
    }

    fn any_hand() -> impl Strategy<Value = Vec<Card>> {
        let card = (0usize..5, 1u8..=13).prop_map(|(s, v)| {
            if s == 4 {
                Card::joker()
            } else {
                Card::new(Suit::NATURAL[s], v)
            }
        });
        prop::collection::vec(card, 0..9)
    }

    proptest! {
        #[test]
        fn prop_enumerators_are_repeatable(cards in any_hand(), round in 3u8..=13) {
            let hand = Hand::with_cards(cards);
            let runs = get_non_redundant_runs(&hand, round);
            prop_assert_eq!(&runs, &get_non_redundant_runs(&hand, round));
            for maximum in [true, false] {
                let sets = get_sets(&hand, round, maximum);
                prop_assert_eq!(&sets, &get_sets(&hand, round, maximum));
            }
        }

        #[test]
        fn prop_candidates_fit_in_hand(cards in any_hand(), round in 3u8..=13) {
            let hand = Hand::with_cards(cards);
            for run in get_non_redundant_runs(&hand, round) {
                prop_assert!(hand.clone().take_all(run.cards()).is_ok());
            }
            for set in get_sets(&hand, round, false) {
                prop_assert!(hand.clone().take_all(set.cards()).is_ok());
            }
        }
    }
}
