//! Predicate filter.
//!
//! Narrows a chronologically ordered match list down to the fixtures a
//! strategy would have bet on. Every predicate follows the same shape: if
//! the bound is set and the match value is missing or out of range, the
//! match is dropped. Output order is input order.

use std::collections::HashMap;

use tracing::debug;

use crate::strategy::{Bound, MatchStat, Strategy};
use crate::types::{AwayRanking, GameData, HomeRanking, Market, RankingKey};

// ---------------------------------------------------------------------------
// Ranking lookup
// ---------------------------------------------------------------------------

/// Home and away table positions keyed by `(league, season, team)`.
///
/// Later records for the same key replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct RankingIndex {
    home: HashMap<RankingKey, Option<u32>>,
    away: HashMap<RankingKey, Option<u32>>,
}

impl RankingIndex {
    pub fn build(home_rankings: &[HomeRanking], away_rankings: &[AwayRanking]) -> Self {
        let home = home_rankings
            .iter()
            .map(|r| (RankingKey::from(r), r.ranking_home))
            .collect();
        let away = away_rankings
            .iter()
            .map(|r| (RankingKey::from(r), r.ranking_away))
            .collect();
        Self { home, away }
    }

    /// Home-table position of the match's home side.
    pub fn home_position(&self, game: &GameData) -> Option<u32> {
        self.home.get(&game.home_key()).copied().flatten()
    }

    /// Away-table position of the match's away side.
    pub fn away_position(&self, game: &GameData) -> Option<u32> {
        self.away.get(&game.away_key()).copied().flatten()
    }

    /// Number of (home, away) records.
    pub fn sizes(&self) -> (usize, usize) {
        (self.home.len(), self.away.len())
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// First predicate a match failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Season,
    League,
    HomeTeam,
    AwayTeam,
    DateRange,
    Rodada,
    Stat(MatchStat),
    RankingHome,
    RankingAway,
    /// No usable price for the market being bet.
    NoPrice,
    Odds,
    MarketOdds(Market),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Season => write!(f, "season"),
            Rejection::League => write!(f, "league"),
            Rejection::HomeTeam => write!(f, "home_team"),
            Rejection::AwayTeam => write!(f, "away_team"),
            Rejection::DateRange => write!(f, "date_range"),
            Rejection::Rodada => write!(f, "rodada"),
            Rejection::Stat(stat) => write!(f, "{}", stat.name()),
            Rejection::RankingHome => write!(f, "ranking_home"),
            Rejection::RankingAway => write!(f, "ranking_away"),
            Rejection::NoPrice => write!(f, "no_price"),
            Rejection::Odds => write!(f, "odds"),
            Rejection::MarketOdds(market) => write!(f, "odds_{market}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// A strategy's predicates bound to a ranking index.
pub struct MatchFilter<'s> {
    strategy: &'s Strategy,
    rankings: &'s RankingIndex,
}

impl<'s> MatchFilter<'s> {
    pub fn new(strategy: &'s Strategy, rankings: &'s RankingIndex) -> Self {
        Self { strategy, rankings }
    }

    /// Evaluate every predicate in order, stopping at the first failure.
    pub fn check(&self, game: &GameData) -> Result<(), Rejection> {
        let s = self.strategy;

        // Identity and category
        if !allowed(&s.season, &game.season) {
            return Err(Rejection::Season);
        }
        if !allowed(&s.leagues, &game.league) {
            return Err(Rejection::League);
        }
        if !allowed(&s.home_teams, &game.home) {
            return Err(Rejection::HomeTeam);
        }
        if !allowed(&s.away_teams, &game.away) {
            return Err(Rejection::AwayTeam);
        }

        self.check_dates(game)?;

        if !s.rodada_bound().admits(game.rodada) {
            return Err(Rejection::Rodada);
        }

        for stat in MatchStat::ALL {
            if !s.stat_bound(*stat).admits(stat.value(game)) {
                return Err(Rejection::Stat(*stat));
            }
        }

        self.check_rankings(game)?;
        self.check_odds(game)
    }

    pub fn admits(&self, game: &GameData) -> bool {
        self.check(game).is_ok()
    }

    fn check_dates(&self, game: &GameData) -> Result<(), Rejection> {
        if let Some(start) = self.strategy.window_start() {
            match game.date {
                Some(date) if date >= start => {}
                _ => return Err(Rejection::DateRange),
            }
        }
        if let Some(end) = self.strategy.window_end() {
            match game.date {
                Some(date) if date <= end => {}
                _ => return Err(Rejection::DateRange),
            }
        }
        Ok(())
    }

    /// A set ranking bound rejects a team with no record.
    fn check_rankings(&self, game: &GameData) -> Result<(), Rejection> {
        let home = self.rankings.home_position(game).map(f64::from);
        if !self.strategy.ranking_home_bound().admits(home) {
            return Err(Rejection::RankingHome);
        }
        let away = self.rankings.away_position(game).map(f64::from);
        if !self.strategy.ranking_away_bound().admits(away) {
            return Err(Rejection::RankingAway);
        }
        Ok(())
    }

    fn check_odds(&self, game: &GameData) -> Result<(), Rejection> {
        let s = self.strategy;

        // A match without a price for the bet market cannot be bet on,
        // whether or not min/max odds are configured.
        let price = game.odds_for(s.market).unwrap_or(0.0);
        if !(price.is_finite() && price > 0.0) {
            return Err(Rejection::NoPrice);
        }
        if !s.odds_bound().admits(Some(price)) {
            return Err(Rejection::Odds);
        }

        for market in Market::ALL {
            let bound: Bound = s.market_odds_bound(*market);
            if !bound.admits(game.odds_for(*market)) {
                return Err(Rejection::MarketOdds(*market));
            }
        }
        Ok(())
    }
}

/// Empty allow-list means no restriction.
fn allowed(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|item| item == value)
}

/// Apply a strategy's predicates to a match sequence.
///
/// Builds the ranking lookup from the given tables. Use [`MatchFilter`]
/// with a prebuilt [`RankingIndex`] when running many strategies over the
/// same rankings.
pub fn filter_matches<'a, I>(
    strategy: &Strategy,
    matches: I,
    home_rankings: &[HomeRanking],
    away_rankings: &[AwayRanking],
) -> Vec<&'a GameData>
where
    I: IntoIterator<Item = &'a GameData>,
{
    let index = RankingIndex::build(home_rankings, away_rankings);
    apply(&MatchFilter::new(strategy, &index), matches)
}

/// Run a bound filter over a match sequence, logging rejection counts.
pub fn apply<'a, I>(filter: &MatchFilter<'_>, matches: I) -> Vec<&'a GameData>
where
    I: IntoIterator<Item = &'a GameData>,
{
    let mut kept = Vec::new();
    let mut rejected: HashMap<Rejection, usize> = HashMap::new();

    for game in matches {
        match filter.check(game) {
            Ok(()) => kept.push(game),
            Err(reason) => *rejected.entry(reason).or_insert(0) += 1,
        }
    }

    if !rejected.is_empty() {
        let mut reasons: Vec<(Rejection, usize)> = rejected.into_iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        let summary = reasons
            .iter()
            .map(|(r, n)| format!("{r}={n}"))
            .collect::<Vec<_>>()
            .join(", ");
        debug!(
            strategy = %filter.strategy.name,
            kept = kept.len(),
            rejected = %summary,
            "Filter pass complete"
        );
    }

    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
