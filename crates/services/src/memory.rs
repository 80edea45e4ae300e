//! Card-matching memory game: a shuffled board of symbol pairs, played solo or
//! pass-and-play.
//!
//! Flipping the second card of a turn leaves the pair face up until
//! [`MemoryBoard::resolve`] is called, so a front end can show both cards
//! before they are matched or turned back over.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use quiz_core::model::{Placement, ProfileId};

use crate::error::MemoryError;
use crate::multiplayer::{MAX_PLAYERS, MIN_PLAYERS, SeatConfig, Standing};

/// Board sizes offered when setting up a game.
pub const CARD_COUNTS: [usize; 6] = [8, 16, 24, 32, 48, 64];

pub const MIN_CARDS: usize = 4;
pub const MAX_CARDS: usize = 64;

/// Board size for a memory level: four cards per level, capped at 64.
#[must_use]
pub fn card_count_for_level(level: u32) -> usize {
    usize::try_from(level)
        .unwrap_or(usize::MAX)
        .saturating_mul(4)
        .clamp(MIN_CARDS, MAX_CARDS)
}

//
// ─── SYMBOLS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmojiSet {
    Fruits,
    Animals,
    Vehicles,
    Nature,
    Sports,
    Food,
    #[default]
    Mixed,
}

impl EmojiSet {
    pub const ALL: [EmojiSet; 7] = [
        EmojiSet::Fruits,
        EmojiSet::Animals,
        EmojiSet::Vehicles,
        EmojiSet::Nature,
        EmojiSet::Sports,
        EmojiSet::Food,
        EmojiSet::Mixed,
    ];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            EmojiSet::Fruits => "Fruits",
            EmojiSet::Animals => "Animals",
            EmojiSet::Vehicles => "Vehicles",
            EmojiSet::Nature => "Nature",
            EmojiSet::Sports => "Sports",
            EmojiSet::Food => "Food",
            EmojiSet::Mixed => "Mixed",
        }
    }

    /// 32 distinct symbols, enough for the largest board.
    #[must_use]
    pub fn symbols(self) -> &'static [&'static str] {
        match self {
            EmojiSet::Fruits => &FRUITS,
            EmojiSet::Animals => &ANIMALS,
            EmojiSet::Vehicles => &VEHICLES,
            EmojiSet::Nature => &NATURE,
            EmojiSet::Sports => &SPORTS,
            EmojiSet::Food => &FOOD,
            EmojiSet::Mixed => &MIXED,
        }
    }
}

impl fmt::Display for EmojiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for EmojiSet {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EmojiSet::ALL
            .into_iter()
            .find(|set| set.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MemoryError::UnknownEmojiSet(s.to_owned()))
    }
}

const FRUITS: [&str; 32] = [
    "🍎", "🍊", "🍋", "🍇", "🍓", "🫐", "🍑", "🍒",
    "🍌", "🍉", "🥝", "🍍", "🥭", "🍐", "🍈", "🥥",
    "🍏", "🍅", "🥑", "🍆", "🥕", "🌽", "🥦", "🥬",
    "🥒", "🌶️", "🫑", "🧄", "🧅", "🥔", "🍠", "🥜",
];

const ANIMALS: [&str; 32] = [
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼",
    "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵", "🐔",
    "🐧", "🐦", "🐤", "🦆", "🦅", "🦉", "🦇", "🐺",
    "🐗", "🐴", "🦄", "🐝", "🐛", "🦋", "🐌", "🐞",
];

const VEHICLES: [&str; 32] = [
    "🚗", "🚕", "🚙", "🚌", "🚎", "🏎️", "🚓", "🚑",
    "🚒", "🚐", "🛻", "🚚", "🚛", "🚜", "🏍️", "🛵",
    "🚲", "🛴", "🚂", "🚃", "🚄", "🚅", "🚆", "🚇",
    "✈️", "🚀", "🛸", "🚁", "⛵", "🚤", "🛥️", "🚢",
];

const NATURE: [&str; 32] = [
    "🌸", "🌺", "🌻", "🌹", "🌷", "🌼", "💐", "🌾",
    "🌲", "🌳", "🌴", "🌵", "🍀", "🍁", "🍂", "🍃",
    "🌈", "☀️", "🌙", "⭐", "🌟", "❄️", "💧", "🔥",
    "🌊", "⚡", "🌪️", "🌤️", "⛅", "🌧️", "🌨️", "☁️",
];

const SPORTS: [&str; 32] = [
    "⚽", "🏀", "🏈", "⚾", "🥎", "🎾", "🏐", "🏉",
    "🥏", "🎱", "🏓", "🏸", "🏒", "🏑", "🥍", "🏏",
    "🥅", "⛳", "🏹", "🎣", "🥊", "🥋", "🎽", "🛹",
    "🛼", "🛷", "⛸️", "🥌", "🎿", "🏂", "🏋️", "🤸",
];

const FOOD: [&str; 32] = [
    "🍕", "🍔", "🍟", "🌭", "🥪", "🌮", "🌯", "🥙",
    "🧆", "🥚", "🍳", "🥘", "🍲", "🥣", "🥗", "🍿",
    "🧈", "🧀", "🥓", "🥩", "🍗", "🍖", "🦴", "🌰",
    "🍞", "🥐", "🥖", "🥨", "🥯", "🧇", "🥞", "🍩",
];

const MIXED: [&str; 32] = [
    "🍎", "🍊", "🍋", "🍇", "🍓", "🫐", "🍑", "🍒",
    "🌟", "🌙", "☀️", "🌈", "❄️", "🔥", "💧", "🌸",
    "🦋", "🐝", "🐞", "🦊", "🐼", "🦁", "🐯", "🐸",
    "🚀", "✈️", "🚗", "🚢", "🎈", "🎁", "🎨", "🎭",
];

//
// ─── BOARD ─────────────────────────────────────────────────────────────────────
//

/// What a successful flip did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    /// First card of the turn is face up.
    First,
    /// Two cards are face up and counted as one move; call `resolve` next.
    PairReady { first: usize, second: usize },
}

/// A resolved pair of face-up cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub first: usize,
    pub second: usize,
    pub is_match: bool,
    /// Every pair on the board has now been found.
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBoard {
    cards: Vec<String>,
    matched: Vec<bool>,
    face_up: Vec<usize>,
    moves: u32,
}

impl MemoryBoard {
    /// Deal `card_count` cards: the first `card_count / 2` symbols of `set`,
    /// each twice, shuffled.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::InvalidCardCount` unless `card_count` is even and
    /// within 4..=64.
    pub fn new<R: Rng + ?Sized>(
        card_count: usize,
        set: EmojiSet,
        rng: &mut R,
    ) -> Result<Self, MemoryError> {
        if card_count % 2 != 0 || !(MIN_CARDS..=MAX_CARDS).contains(&card_count) {
            return Err(MemoryError::InvalidCardCount(card_count));
        }

        let mut cards: Vec<String> = set.symbols()[..card_count / 2]
            .iter()
            .flat_map(|symbol| [(*symbol).to_owned(), (*symbol).to_owned()])
            .collect();
        cards.shuffle(rng);
        Ok(Self::dealt(cards))
    }

    /// Like [`MemoryBoard::new`] with a reproducible shuffle.
    ///
    /// # Errors
    ///
    /// See [`MemoryBoard::new`].
    pub fn with_seed(card_count: usize, set: EmojiSet, seed: u64) -> Result<Self, MemoryError> {
        Self::new(card_count, set, &mut StdRng::seed_from_u64(seed))
    }

    /// Seeded deal when `seed` is given, otherwise an OS-seeded one.
    ///
    /// # Errors
    ///
    /// See [`MemoryBoard::new`].
    pub fn deal(card_count: usize, set: EmojiSet, seed: Option<u64>) -> Result<Self, MemoryError> {
        match seed {
            Some(seed) => Self::with_seed(card_count, set, seed),
            None => Self::new(card_count, set, &mut StdRng::from_os_rng()),
        }
    }

    /// A board laid out exactly as given.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::InvalidCardCount` for a bad size and
    /// `MemoryError::InvalidLayout` unless every symbol appears exactly twice.
    pub fn from_layout(cards: Vec<String>) -> Result<Self, MemoryError> {
        if cards.len() % 2 != 0 || !(MIN_CARDS..=MAX_CARDS).contains(&cards.len()) {
            return Err(MemoryError::InvalidCardCount(cards.len()));
        }
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for card in &cards {
            *counts.entry(card.as_str()).or_default() += 1;
        }
        if counts.values().any(|n| *n != 2) {
            return Err(MemoryError::InvalidLayout);
        }
        Ok(Self::dealt(cards))
    }

    fn dealt(cards: Vec<String>) -> Self {
        Self {
            matched: vec![false; cards.len()],
            cards,
            face_up: Vec::with_capacity(2),
            moves: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    #[must_use]
    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.cards.get(index).map(String::as_str)
    }

    /// The symbol if the card is face up or already matched.
    #[must_use]
    pub fn visible_symbol(&self, index: usize) -> Option<&str> {
        if self.is_matched(index) || self.face_up.contains(&index) {
            self.symbol(index)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_matched(&self, index: usize) -> bool {
        self.matched.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn face_up(&self) -> &[usize] {
        &self.face_up
    }

    /// Number of pairs turned over so far, matched or not.
    #[must_use]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[must_use]
    pub fn matched_pairs(&self) -> usize {
        self.matched.iter().filter(|m| **m).count() / 2
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.matched.iter().all(|m| *m)
    }

    #[must_use]
    pub fn is_pair_pending(&self) -> bool {
        self.face_up.len() == 2
    }

    /// Turn a card face up.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError` when the board is complete, a pair still waits
    /// to be resolved, or the card is out of range, matched or already face up.
    pub fn flip(&mut self, index: usize) -> Result<Flip, MemoryError> {
        if self.is_complete() {
            return Err(MemoryError::Complete);
        }
        if self.is_pair_pending() {
            return Err(MemoryError::PairPending);
        }
        if index >= self.cards.len() {
            return Err(MemoryError::OutOfRange {
                index,
                len: self.cards.len(),
            });
        }
        if self.matched[index] {
            return Err(MemoryError::AlreadyMatched(index));
        }
        if self.face_up.contains(&index) {
            return Err(MemoryError::AlreadyFaceUp(index));
        }

        self.face_up.push(index);
        match self.face_up[..] {
            [first, second] => {
                self.moves = self.moves.saturating_add(1);
                Ok(Flip::PairReady { first, second })
            }
            _ => Ok(Flip::First),
        }
    }

    /// Settle the two face-up cards: a match stays visible, a miss turns both
    /// back over.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::NoPairPending` unless two cards are face up.
    pub fn resolve(&mut self) -> Result<Reveal, MemoryError> {
        let [first, second] = self.face_up[..] else {
            return Err(MemoryError::NoPairPending);
        };
        self.face_up.clear();

        let is_match = self.cards[first] == self.cards[second];
        if is_match {
            self.matched[first] = true;
            self.matched[second] = true;
        }
        let is_complete = self.is_complete();
        debug!(first, second, is_match, moves = self.moves, "pair resolved");
        if is_complete {
            info!(cards = self.cards.len(), moves = self.moves, "memory board cleared");
        }

        Ok(Reveal {
            first,
            second,
            is_match,
            is_complete,
        })
    }
}

//
// ─── PASS AND PLAY ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySeat {
    name: String,
    profile_id: Option<ProfileId>,
    pairs: u32,
}

impl MemorySeat {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    /// Pairs found by this player.
    #[must_use]
    pub fn pairs(&self) -> u32 {
        self.pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryTurn {
    pub seat: usize,
    pub reveal: Reveal,
    /// Who flips next. Unchanged after a match.
    pub next_seat: usize,
}

/// Players take turns on one board. Finding a pair scores a point and keeps
/// the turn; a miss passes it on.
#[derive(Debug, Clone)]
pub struct MemoryMatch {
    board: MemoryBoard,
    seats: Vec<MemorySeat>,
    current_seat: usize,
}

impl MemoryMatch {
    /// Seat levels are ignored; the board size is chosen up front.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::PlayerCount` unless 2 to 4 players are given.
    pub fn new(players: Vec<SeatConfig>, board: MemoryBoard) -> Result<Self, MemoryError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(MemoryError::PlayerCount(players.len()));
        }
        let seats = players
            .into_iter()
            .map(|p| MemorySeat {
                name: p.name,
                profile_id: p.profile_id,
                pairs: 0,
            })
            .collect::<Vec<_>>();
        info!(players = seats.len(), cards = board.len(), "memory match started");
        Ok(Self {
            board,
            seats,
            current_seat: 0,
        })
    }

    #[must_use]
    pub fn board(&self) -> &MemoryBoard {
        &self.board
    }

    #[must_use]
    pub fn seats(&self) -> &[MemorySeat] {
        &self.seats
    }

    #[must_use]
    pub fn current_seat(&self) -> usize {
        self.current_seat
    }

    #[must_use]
    pub fn current_player(&self) -> &MemorySeat {
        &self.seats[self.current_seat]
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.board.is_complete()
    }

    /// # Errors
    ///
    /// See [`MemoryBoard::flip`].
    pub fn flip(&mut self, index: usize) -> Result<Flip, MemoryError> {
        self.board.flip(index)
    }

    /// # Errors
    ///
    /// See [`MemoryBoard::resolve`].
    pub fn resolve(&mut self) -> Result<MemoryTurn, MemoryError> {
        let reveal = self.board.resolve()?;
        let seat = self.current_seat;
        if reveal.is_match {
            let player = &mut self.seats[seat];
            player.pairs = player.pairs.saturating_add(1);
        } else {
            self.current_seat = (seat + 1) % self.seats.len();
        }
        Ok(MemoryTurn {
            seat,
            reveal,
            next_seat: self.current_seat,
        })
    }

    /// The sole top scorer once the board is cleared. A shared top score
    /// has no winner.
    #[must_use]
    pub fn winner(&self) -> Option<usize> {
        if !self.is_finished() {
            return None;
        }
        let best = self.seats.iter().map(|s| s.pairs).max()?;
        let mut leaders = self
            .seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.pairs == best);
        match (leaders.next(), leaders.next()) {
            (Some((seat, _)), None) => Some(seat),
            _ => None,
        }
    }

    /// Seats by pairs found, highest first; ties keep seat order. Only the
    /// winner carries a placement.
    #[must_use]
    pub fn standings(&self) -> Vec<Standing> {
        let winner = self.winner();
        let mut order: Vec<usize> = (0..self.seats.len()).collect();
        order.sort_by(|a, b| self.seats[*b].pairs.cmp(&self.seats[*a].pairs));

        order
            .into_iter()
            .map(|seat| {
                let player = &self.seats[seat];
                Standing {
                    seat,
                    name: player.name.clone(),
                    profile_id: player.profile_id,
                    score: player.pairs,
                    placement: (winner == Some(seat)).then_some(Placement::Gold),
                }
            })
            .collect()
    }

    /// Gold for a winner linked to a saved profile, ready for
    /// `ProfileService::award_placements`.
    #[must_use]
    pub fn placements(&self) -> Vec<(ProfileId, Placement)> {
        self.standings()
            .into_iter()
            .filter_map(|s| Some((s.profile_id?, s.placement?)))
            .collect()
    }
}
