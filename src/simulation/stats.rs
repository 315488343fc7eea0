//! Batch statistics over game records
//!
//! Records are aggregated by (start, mulligans, outcome, end turn) with a
//! count, and every statistic takes a filter over those keys, so the same
//! numbers can be read for the whole batch or any slice of it.

use crate::simulation::engine::{GameRecord, Outcome, SimulatorConfig, Start};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResultKey {
    pub start: Start,
    pub mulligans: u32,
    pub outcome: Outcome,
    pub end_turn: u32,
}

impl ResultKey {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Won
    }

    pub fn on_the_play(&self) -> bool {
        self.start == Start::Otp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupedResult {
    #[serde(flatten)]
    pub key: ResultKey,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckStats {
    pub deck: String,
    pub iterations: usize,
    pub results: Vec<GroupedResult>,
}

impl DeckStats {
    pub fn from_records(deck: &str, records: &[GameRecord]) -> Self {
        let mut groups: HashMap<ResultKey, usize> = HashMap::new();
        for record in records {
            let key = ResultKey {
                start: record.start,
                mulligans: record.mulligans,
                outcome: record.outcome,
                end_turn: record.end_turn,
            };
            *groups.entry(key).or_insert(0) += 1;
        }
        let mut results: Vec<GroupedResult> = groups
            .into_iter()
            .map(|(key, count)| GroupedResult { key, count })
            .collect();
        results.sort_by_key(|r| r.key);

        DeckStats {
            deck: deck.to_string(),
            iterations: records.len(),
            results,
        }
    }

    /// Number of games matching the filter
    pub fn count(&self, filter: impl Fn(&ResultKey) -> bool) -> usize {
        self.results.iter().filter(|r| filter(&r.key)).map(|r| r.count).sum()
    }

    /// Share of all games matching the filter, in [0, 1]
    pub fn rate(&self, filter: impl Fn(&ResultKey) -> bool) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.count(filter) as f64 / self.iterations as f64
    }

    /// Distinct end turns of matching games, ascending
    pub fn win_turns(&self, filter: impl Fn(&ResultKey) -> bool) -> Vec<u32> {
        let mut turns: Vec<u32> = self
            .results
            .iter()
            .filter(|r| filter(&r.key))
            .map(|r| r.key.end_turn)
            .collect();
        turns.sort_unstable();
        turns.dedup();
        turns
    }

    /// Distinct mulligan counts of matching games, ascending
    pub fn mulligans(&self, filter: impl Fn(&ResultKey) -> bool) -> Vec<u32> {
        let mut mulligans: Vec<u32> = self
            .results
            .iter()
            .filter(|r| filter(&r.key))
            .map(|r| r.key.mulligans)
            .collect();
        mulligans.sort_unstable();
        mulligans.dedup();
        mulligans
    }

    /// Average end turn of matching games; `None` when nothing matches
    pub fn average_win_turn(&self, filter: impl Fn(&ResultKey) -> bool + Copy) -> Option<f64> {
        let count = self.count(filter);
        if count == 0 {
            return None;
        }
        let sum: u64 = self
            .results
            .iter()
            .filter(|r| filter(&r.key))
            .map(|r| r.key.end_turn as u64 * r.count as u64)
            .sum();
        Some(sum as f64 / count as f64)
    }

    /// Mean absolute deviation around the average end turn
    pub fn win_turn_mad(&self, filter: impl Fn(&ResultKey) -> bool + Copy) -> Option<f64> {
        let avg = self.average_win_turn(filter)?;
        let distance: f64 = self
            .results
            .iter()
            .filter(|r| filter(&r.key))
            .map(|r| (avg - r.key.end_turn as f64).abs() * r.count as f64)
            .sum();
        Some(distance / self.count(filter) as f64)
    }

    /// Standard deviation around the average end turn
    pub fn win_turn_sd(&self, filter: impl Fn(&ResultKey) -> bool + Copy) -> Option<f64> {
        let avg = self.average_win_turn(filter)?;
        let distance: f64 = self
            .results
            .iter()
            .filter(|r| filter(&r.key))
            .map(|r| (r.key.end_turn as f64 - avg).powi(2) * r.count as f64)
            .sum();
        Some((distance / self.count(filter) as f64).sqrt())
    }

    /// Number of games per end turn
    pub fn distribution(&self, filter: impl Fn(&ResultKey) -> bool) -> BTreeMap<u32, usize> {
        let mut distribution = BTreeMap::new();
        for r in self.results.iter().filter(|r| filter(&r.key)) {
            *distribution.entry(r.key.end_turn).or_insert(0) += r.count;
        }
        distribution
    }

    pub fn summary(&self, filter: impl Fn(&ResultKey) -> bool + Copy) -> Summary {
        let won = |k: &ResultKey| filter(k) && k.won();
        let games = self.count(filter);
        Summary {
            games,
            wins: self.count(won),
            win_rate: if games == 0 { 0.0 } else { self.count(won) as f64 / games as f64 },
            average_win_turn: self.average_win_turn(won),
            win_turn_mad: self.win_turn_mad(won),
            win_turn_sd: self.win_turn_sd(won),
        }
    }

    pub fn report(&self) -> DeckReport {
        let all = |_: &ResultKey| true;
        DeckReport {
            deck: self.deck.clone(),
            overall: self.summary(all),
            on_the_play: self.summary(|k| k.on_the_play()),
            on_the_draw: self.summary(|k| !k.on_the_play()),
            by_mulligans: self
                .mulligans(all)
                .into_iter()
                .map(|m| (m, self.summary(move |k: &ResultKey| k.mulligans == m)))
                .collect(),
            win_turns: self.distribution(ResultKey::won),
            lost: self.count(|k| k.outcome == Outcome::Lost),
            timeouts: self.count(|k| k.outcome == Outcome::Timeout),
        }
    }
}

/// Headline numbers for a slice of the batch; turn statistics are over won games
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub average_win_turn: Option<f64>,
    pub win_turn_mad: Option<f64>,
    pub win_turn_sd: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckReport {
    pub deck: String,
    pub overall: Summary,
    pub on_the_play: Summary,
    pub on_the_draw: Summary,
    pub by_mulligans: BTreeMap<u32, Summary>,
    pub win_turns: BTreeMap<u32, usize>,
    pub lost: usize,
    pub timeouts: usize,
}

/// What `--json` writes
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub generated_at: DateTime<Utc>,
    pub config: SimulatorConfig,
    pub decks: Vec<DeckReport>,
}

impl SimulationReport {
    pub fn new(config: &SimulatorConfig, decks: Vec<DeckReport>) -> Self {
        SimulationReport {
            generated_at: Utc::now(),
            config: config.clone(),
            decks,
        }
    }
}
