use crate::candidates::{
    get_extension_candidates, get_non_redundant_runs, get_public_set_plays, get_sets,
};
use crate::config::SearchConfig;
use crate::error::{Result, RummyError};
use crate::meld::Meld;
use crate::scoring;
use crate::table::{Growth, MeldId, Play, Table};
use crate::{Card, DiscardPile, Hand};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, trace};

/// Milliseconds on the browser's monotonic clock, falling back to wall time
/// when no `Performance` object is available (e.g. in a worker without it).
#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Cross-platform time tracker for search budgets
#[derive(Clone, Copy)]
struct TimeTracker {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    start_ms: f64,
    limit_ms: u64,
}

impl TimeTracker {
    fn new(limit_ms: u64) -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
            #[cfg(target_arch = "wasm32")]
            start_ms: now_ms(),
            limit_ms,
        }
    }

    fn is_expired(&self) -> bool {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.start.elapsed() >= std::time::Duration::from_millis(self.limit_ms)
        }
        #[cfg(target_arch = "wasm32")]
        {
            (now_ms() - self.start_ms) >= self.limit_ms as f64
        }
    }
}

/// One complete way to lay down cards this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    remaining: Hand,
    plays: Vec<Play>,
    round: u8,
}

impl PlayOutcome {
    fn new(remaining: Hand, plays: Vec<Play>, round: u8) -> Self {
        PlayOutcome {
            remaining,
            plays,
            round,
        }
    }

    /// Cards still in hand after every play, before discarding.
    pub fn remaining(&self) -> &Hand {
        &self.remaining
    }

    /// Plays in the order they must be committed.
    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    /// The card thrown away to end the turn: the highest-scoring one left.
    pub fn discard(&self) -> Option<Card> {
        self.remaining.highest_scoring(self.round)
    }

    /// Points left in hand after the discard.
    pub fn residual_score(&self) -> u32 {
        scoring::residual_score(&self.remaining, self.round)
    }

    pub fn goes_out(&self) -> bool {
        self.residual_score() == 0
    }

    /// Physical wild cards laid down by the plays.
    pub fn wilds_used(&self) -> Vec<Card> {
        self.plays
            .iter()
            .flat_map(|play| play.wilds_used(self.round))
            .collect()
    }

    pub fn is_natural(&self) -> bool {
        self.wilds_used().is_empty()
    }

    /// Lower is better. Equal scores go to the outcome holding fewer cards;
    /// only full ties fall back to search order.
    fn rank(&self) -> (u32, usize) {
        (self.residual_score(), self.remaining.len())
    }
}

/// Identity of one play on a path. Wilds are keyed as `None`, since which
/// physical wild fills a slot does not matter.
///
/// A path is named by the sorted keys of its plays, so every ordering of the
/// same plays is expanded once. Order itself is never pruned: a maximal set
/// takes every wild left, so which set goes first changes what follows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum BranchKey {
    Run(Vec<Option<Card>>),
    Extension(MeldId, Growth, Vec<Option<Card>>),
    Set(Vec<Option<Card>>),
    PublicSet(MeldId, Vec<Option<Card>>),
}

impl BranchKey {
    fn faces(cards: &[Card], round: u8) -> Vec<Option<Card>> {
        cards
            .iter()
            .map(|c| (!c.is_wild(round)).then_some(*c))
            .collect()
    }
}

/// Plays chosen so far on a path, newest first. Siblings share their prefix.
struct PlayChain {
    play: Play,
    parent: Option<Rc<PlayChain>>,
}

fn collect_plays(chain: &Option<Rc<PlayChain>>) -> Vec<Play> {
    let mut plays = Vec::new();
    let mut link = chain.as_deref();
    while let Some(node) = link {
        plays.push(node.play.clone());
        link = node.parent.as_deref();
    }
    plays.reverse();
    plays
}

/// Search state at one point on a path.
struct Node {
    remaining: Hand,
    /// Table as it looks with this path's public extensions applied.
    table: Rc<Vec<Meld>>,
    chain: Option<Rc<PlayChain>>,
    /// Sorted keys of the plays on this path.
    path: Vec<BranchKey>,
}

struct Branch {
    key: BranchKey,
    play: Play,
}

struct Frame {
    node: Node,
    branches: std::vec::IntoIter<Branch>,
}

/// Branches out of `node`, in search order: runs and public run extensions
/// exhaustively, then maximal sets and public set plays.
fn branches_of(node: &Node, round: u8) -> Vec<Branch> {
    let mut branches = Vec::new();
    let mut offer = |key: BranchKey, play: Play| branches.push(Branch { key, play });

    for run in get_non_redundant_runs(&node.remaining, round) {
        offer(BranchKey::Run(BranchKey::faces(run.cards(), round)), Play::Run(run));
    }
    for (index, meld) in node.table.iter().enumerate() {
        for delta in get_extension_candidates(&node.remaining, round, MeldId::new(index), meld) {
            let faces = BranchKey::faces(delta.cards(), round);
            offer(
                BranchKey::Extension(delta.target(), delta.growth(), faces),
                Play::Public(delta),
            );
        }
    }
    for set in get_sets(&node.remaining, round, true) {
        offer(BranchKey::Set(BranchKey::faces(set.cards(), round)), Play::Set(set));
    }
    for delta in get_public_set_plays(&node.remaining, round, &node.table) {
        let faces = BranchKey::faces(delta.cards(), round);
        offer(BranchKey::PublicSet(delta.target(), faces), Play::Public(delta));
    }

    branches
}

/// The node reached by taking `branch`, or `None` if it no longer applies.
fn descend(node: &Node, branch: Branch) -> Option<Node> {
    let Branch { key, play } = branch;
    let physical: Vec<Card> = play.cards().iter().map(Card::physical).collect();
    let mut remaining = node.remaining.clone();
    remaining.take_all(&physical).ok()?;

    let mut table = Rc::clone(&node.table);
    if let Play::Public(delta) = &play {
        let index = delta.target().index();
        let grown = delta.combined_with(table.get(index)?).ok()?;
        Rc::make_mut(&mut table)[index] = grown;
    }

    let mut path = node.path.clone();
    path.insert(path.partition_point(|k| *k <= key), key);

    Some(Node {
        remaining,
        table,
        chain: Some(Rc::new(PlayChain {
            play,
            parent: node.chain.clone(),
        })),
        path,
    })
}

/// Try to put one wild on a run-shaped play already in the sequence.
/// Newer plays go first, so a meld end grown twice takes the wild on its
/// outermost delta.
fn place_wild(plays: &mut [Play], table: &mut Rc<Vec<Meld>>, wild: Card) -> bool {
    for play in plays.iter_mut().rev() {
        match play {
            Play::Run(run) => {
                for grow_right in [true, false] {
                    if run.add_card(wild, grow_right).is_ok() {
                        return true;
                    }
                }
            }
            Play::Public(delta) => {
                let index = delta.target().index();
                let Some(current) = table.get(index) else {
                    continue;
                };
                if !current.is_run() {
                    continue;
                }
                let Ok(grown) = current.joined(&[wild], delta.growth().grows_right()) else {
                    continue;
                };
                if !grown.is_run() {
                    continue;
                }
                Rc::make_mut(table)[index] = grown;
                delta.extend_with(wild);
                return true;
            }
            Play::Set(_) => {}
        }
    }
    false
}

/// Lazy depth-first enumeration of every way to lay down a hand.
///
/// The first item is always the empty play. Dropping the iterator early is
/// free; nothing is computed ahead of the item being returned.
pub struct PlaySearch {
    round: u8,
    stack: Vec<Frame>,
    start: Option<PlayOutcome>,
    /// Paths already expanded, by their sorted play keys.
    seen: HashSet<Vec<BranchKey>>,
    leaves: usize,
}

impl PlaySearch {
    fn new(hand: &Hand, round: u8, table: &Table) -> Self {
        let root = Node {
            remaining: hand.clone(),
            table: Rc::new(table.melds().to_vec()),
            chain: None,
            path: Vec::new(),
        };
        let mut search = PlaySearch {
            round,
            stack: Vec::new(),
            start: Some(PlayOutcome::new(hand.clone(), Vec::new(), round)),
            seen: HashSet::new(),
            leaves: 0,
        };
        let branches = branches_of(&root, round);
        if !branches.is_empty() {
            search.stack.push(Frame {
                node: root,
                branches: branches.into_iter(),
            });
        }
        search
    }

    /// Close out a path: mop up leftover wilds and package the result.
    fn finish(&mut self, node: Node) -> PlayOutcome {
        let Node {
            mut remaining,
            mut table,
            chain,
            ..
        } = node;
        let mut plays = collect_plays(&chain);
        for wild in remaining.wilds(self.round) {
            if place_wild(&mut plays, &mut table, wild) {
                remaining.remove(&wild);
            }
        }

        self.leaves += 1;
        let outcome = PlayOutcome::new(remaining, plays, self.round);
        trace!(
            target: "rummy_solver::search",
            leaf = self.leaves,
            plays = outcome.plays.len(),
            residual = outcome.residual_score(),
            "outcome"
        );
        outcome
    }
}

impl Iterator for PlaySearch {
    type Item = PlayOutcome;

    fn next(&mut self) -> Option<PlayOutcome> {
        if let Some(start) = self.start.take() {
            return Some(start);
        }

        loop {
            let frame = self.stack.last_mut()?;
            let Some(branch) = frame.branches.next() else {
                self.stack.pop();
                continue;
            };
            let Some(child) = descend(&frame.node, branch) else {
                continue;
            };
            if !self.seen.insert(child.path.clone()) {
                continue;
            }
            let branches = branches_of(&child, self.round);
            if branches.is_empty() {
                return Some(self.finish(child));
            }
            self.stack.push(Frame {
                node: child,
                branches: branches.into_iter(),
            });
        }
    }
}

/// Every way `hand` can be laid down this turn, lazily.
pub fn get_all_plays(hand: &Hand, round: u8, table: &Table) -> PlaySearch {
    PlaySearch::new(hand, round, table)
}

/// Whether some play leaves nothing but a discard worth zero points.
pub fn check_go_out(hand: &Hand, round: u8, table: &Table) -> bool {
    get_all_plays(hand, round, table).any(|outcome| outcome.goes_out())
}

/// Best outcome found by [`find_best_play`] plus metadata about the search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Lowest residual score found; the empty play if nothing beats it.
    pub best: PlayOutcome,
    /// False if a time or outcome limit cut the search short.
    pub search_completed: bool,
    pub outcomes_examined: usize,
}

/// Find the play with the lowest residual score, breaking ties on fewer cards
/// left and then on whichever the search reaches first.
///
/// The first outcome is always examined, so a result exists even when the
/// budget runs out immediately.
pub fn find_best_play(
    hand: &Hand,
    round: u8,
    table: &Table,
    config: &SearchConfig,
) -> SearchResult {
    let timer = config.time_limit_ms.map(TimeTracker::new);
    let mut best = PlayOutcome::new(hand.clone(), Vec::new(), round);
    let mut best_rank = best.rank();
    let mut outcomes_examined = 0;
    let mut search_completed = true;

    for outcome in get_all_plays(hand, round, table) {
        let out_of_budget = outcomes_examined > 0
            && (timer.is_some_and(|t| t.is_expired())
                || config
                    .max_outcomes
                    .is_some_and(|max| outcomes_examined >= max));
        if out_of_budget {
            search_completed = false;
            break;
        }

        outcomes_examined += 1;
        let rank = outcome.rank();
        if rank < best_rank {
            best = outcome;
            best_rank = rank;
        }

        if config.stop_at_go_out && best_rank.0 == 0 {
            search_completed = false;
            break;
        }
    }

    debug!(
        target: "rummy_solver::search",
        outcomes_examined,
        search_completed,
        residual = best_rank.0,
        plays = best.plays().len(),
        "search finished"
    );

    SearchResult {
        best,
        search_completed,
        outcomes_examined,
    }
}

/// What [`commit_play`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Table meld created or grown by each play, in order.
    pub placed: Vec<MeldId>,
    pub discard: Option<Card>,
    pub residual_score: u32,
    pub wilds_used: Vec<Card>,
    pub natural: bool,
}

impl CommitReport {
    pub fn went_out(&self) -> bool {
        self.residual_score == 0
    }

    /// Bonus this turn earns, see [`scoring::go_out_adjustment`].
    pub fn go_out_adjustment(&self, first_out: bool) -> i32 {
        if self.went_out() {
            scoring::go_out_adjustment(first_out, self.natural)
        } else {
            0
        }
    }
}

/// Lay `outcome` down for real: fix each play's wilds against the current
/// table, execute it, then discard the outcome's discard card.
///
/// Plays are committed one at a time. If one fails, the ones before it stay
/// on the table.
pub fn commit_play(
    hand: &mut Hand,
    table: &mut Table,
    discard_pile: &mut DiscardPile,
    outcome: &PlayOutcome,
    fix_value: u8,
) -> Result<CommitReport> {
    let round = outcome.round();
    let mut placed = Vec::with_capacity(outcome.plays().len());

    for play in outcome.plays() {
        let mut play = play.clone();
        play.fix_wilds(table.melds(), fix_value)?;
        let id = play.execute(hand, table)?;
        debug!(target: "rummy_solver::commit", meld = %id, %play, "play committed");
        placed.push(id);
    }

    let discard = outcome.discard();
    if let Some(card) = discard {
        if hand.is_empty() {
            return Err(RummyError::EmptyHandInvariantViolation);
        }
        if !hand.remove(&card) {
            return Err(RummyError::CardNotInHand(card));
        }
        discard_pile.push(card);
        debug!(target: "rummy_solver::commit", %card, "discarded");
    }

    Ok(CommitReport {
        placed,
        discard,
        residual_score: hand.score(round),
        wilds_used: outcome.wilds_used(),
        natural: outcome.is_natural(),
    })
}
