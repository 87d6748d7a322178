//! Point-based grade for a bid, shown next to the simulation numbers.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::types::{Money, Percent, PropertyFacts, StrategyInputs, ratio_percent};

const BASE_SCORE: u32 = 50;
const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum RatioStatus {
    Low,
    Fair,
    High,
    /// Reference price not known.
    Unknown,
}

impl RatioStatus {
    /// `low` and `high` are inclusive bounds of the fair band.
    fn classify(ratio: Option<Percent>, low: Percent, high: Percent) -> Self {
        match ratio {
            None => RatioStatus::Unknown,
            Some(r) if r < low => RatioStatus::Low,
            Some(r) if r > high => RatioStatus::High,
            Some(_) => RatioStatus::Fair,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum CompetitionLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl CompetitionLevel {
    pub fn from_competitors(competitor_count: u32) -> Self {
        match competitor_count {
            0..=3 => CompetitionLevel::Low,
            4..=6 => CompetitionLevel::Moderate,
            7..=8 => CompetitionLevel::High,
            _ => CompetitionLevel::VeryHigh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Grade::A,
            70..=79 => Grade::B,
            60..=69 => Grade::C,
            50..=59 => Grade::D,
            _ => Grade::F,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct BidAssessment {
    pub score: u32,
    pub grade: Grade,
    pub appraisal_status: RatioStatus,
    pub market_status: RatioStatus,
    pub minimum_bid_status: RatioStatus,
    pub competition: CompetitionLevel,
    /// Second round (one prior failure twice discounted) is the sweet spot.
    pub optimal_round: bool,
}

fn appraisal_points(ratio: Percent) -> u32 {
    if (80.0..=95.0).contains(&ratio) {
        30
    } else if (75.0..=100.0).contains(&ratio) {
        20
    } else {
        10
    }
}

fn sale_price_rate_points(rate: Percent) -> u32 {
    if rate >= 85.0 {
        25
    } else if rate >= 80.0 {
        20
    } else if rate >= 75.0 {
        15
    } else {
        10
    }
}

fn competitor_points(competitor_count: u32) -> u32 {
    match competitor_count {
        0..=3 => 25,
        4..=6 => 20,
        7..=8 => 15,
        _ => 10,
    }
}

fn failed_round_points(failed_round_count: u32) -> u32 {
    match failed_round_count {
        2 => 20,
        1 | 3 => 15,
        0 => 10,
        _ => 5,
    }
}

pub fn assess(
    bid_price: Money,
    facts: &PropertyFacts,
    strategy: &StrategyInputs,
    sale_price_rate: Percent,
) -> BidAssessment {
    let appraisal_ratio =
        (facts.appraisal_price > 0.0).then(|| ratio_percent(bid_price, facts.appraisal_price));
    let market_ratio = ratio_percent(bid_price, facts.market_price);
    let minimum_bid_ratio = ratio_percent(bid_price, facts.minimum_bid);

    let score = BASE_SCORE
        + appraisal_points(appraisal_ratio.unwrap_or(0.0))
        + sale_price_rate_points(sale_price_rate)
        + competitor_points(strategy.competitor_count)
        + failed_round_points(strategy.failed_round_count);
    let score = score.min(MAX_SCORE);

    BidAssessment {
        score,
        grade: Grade::from_score(score),
        appraisal_status: RatioStatus::classify(appraisal_ratio, 80.0, 95.0),
        market_status: RatioStatus::classify(Some(market_ratio), 75.0, 90.0),
        minimum_bid_status: RatioStatus::classify(Some(minimum_bid_ratio), 110.0, 130.0),
        competition: CompetitionLevel::from_competitors(strategy.competitor_count),
        optimal_round: strategy.failed_round_count == 2,
    }
}
