//! Ordered advice items for a simulated bid. Shells render `message()`
//! or localise on the variant themselves.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::types::{MarketCondition, Money, Percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Advice {
    HighProbability,
    MediumProbability,
    LowProbability,
    RaiseForCompetition,
    ConservativeIsEnough,
    RaiseForHotMarket,
    ColdMarketOpportunity,
    HeavyDiscountAfterFailures,
    DiscountAfterFailures,
    BelowAppraisalFloor,
    AboveAppraisalCeiling,
    WithinAppraisalRange,
    #[serde(rename_all = "camelCase")]
    ProfitableAgainstMarket { market_profit_ratio: Percent },
    UnprofitableAgainstMarket,
    NearMinimumBid,
    FarAboveMinimumBid,
    NegativeProfit,
    #[serde(rename_all = "camelCase")]
    FarBelowTarget { target_profit_rate: Percent },
    #[serde(rename_all = "camelCase")]
    BelowTarget { target_profit_rate: Percent },
    #[serde(rename_all = "camelCase")]
    MeetsTarget { target_profit_rate: Percent },
    #[serde(rename_all = "camelCase")]
    NearTarget { target_profit_rate: Percent },
    LateBidTiming,
    WatchCompetitors,
}

impl Advice {
    pub fn message(&self) -> String {
        match self {
            Advice::HighProbability => "High chance of winning; the current strategy works.".into(),
            Advice::MediumProbability => "Moderate chance of winning; try adjusting the bid.".into(),
            Advice::LowProbability => "Low chance of winning; the bid needs a substantial raise.".into(),
            Advice::RaiseForCompetition => {
                "Many competitors: consider raising the bid by 10-15%.".into()
            }
            Advice::ConservativeIsEnough => {
                "Few competitors: a conservative bid may be enough.".into()
            }
            Advice::RaiseForHotMarket => "Active market: raise the bid by 5-10%.".into(),
            Advice::ColdMarketOpportunity => {
                "Slow market: a conservative bid may still find an opening.".into()
            }
            Advice::HeavyDiscountAfterFailures => {
                "Failed three or more times: lower the bid by 15-20%.".into()
            }
            Advice::DiscountAfterFailures => {
                "Has failed before: consider lowering the bid by 5-10%.".into()
            }
            Advice::BelowAppraisalFloor => {
                "Below 80% of the appraisal; the chance of winning is very low.".into()
            }
            Advice::AboveAppraisalCeiling => {
                "Above 130% of the appraisal; the bid may be excessive.".into()
            }
            Advice::WithinAppraisalRange => "Within a reasonable range of the appraisal.".into(),
            Advice::ProfitableAgainstMarket { market_profit_ratio } => format!(
                "Profitable against the market price ({}%).",
                market_profit_ratio.round()
            ),
            Advice::UnprofitableAgainstMarket => {
                "Loses money against the market price; reconsider bidding.".into()
            }
            Advice::NearMinimumBid => {
                "Close to the minimum bid; the chance of winning may be low.".into()
            }
            Advice::FarAboveMinimumBid => {
                "More than twice the minimum bid; the bid may be excessive.".into()
            }
            Advice::NegativeProfit => "Expected return is negative; reconsider bidding.".into(),
            Advice::FarBelowTarget { target_profit_rate } => format!(
                "Expected return is under half the {target_profit_rate}% target; lower the bid substantially."
            ),
            Advice::BelowTarget { target_profit_rate } => format!(
                "Expected return is under 80% of the {target_profit_rate}% target; lower the bid."
            ),
            Advice::MeetsTarget { target_profit_rate } => {
                format!("Expected return meets the {target_profit_rate}% target.")
            }
            Advice::NearTarget { target_profit_rate } => format!(
                "Expected return is close to the {target_profit_rate}% target; fine-tune the bid."
            ),
            Advice::LateBidTiming => "Bidding in the final ten minutes can pay off.".into(),
            Advice::WatchCompetitors => {
                "Watch how competitors bid and time yours accordingly.".into()
            }
        }
    }
}

/// Inputs to `advise`, taken from a finished simulation.
#[derive(Debug, Clone, Copy)]
pub struct AdviceContext {
    /// Fraction in [0, 1].
    pub win_probability: f64,
    pub profit_rate: Percent,
    pub target_profit_rate: Percent,
    pub competitor_count: u32,
    pub market_condition: MarketCondition,
    pub failed_round_count: u32,
    /// `None` when the appraisal is unknown.
    pub appraisal_ratio: Option<Percent>,
    pub minimum_bid_ratio: Percent,
    /// Market price minus everything paid, bid included.
    pub market_profit: Money,
    pub total_outlay: Money,
}

pub fn advise(ctx: &AdviceContext) -> Vec<Advice> {
    let mut advice = Vec::new();

    advice.push(if ctx.win_probability >= 0.8 {
        Advice::HighProbability
    } else if ctx.win_probability >= 0.5 {
        Advice::MediumProbability
    } else {
        Advice::LowProbability
    });

    if ctx.competitor_count >= 10 {
        advice.push(Advice::RaiseForCompetition);
    } else if ctx.competitor_count <= 3 {
        advice.push(Advice::ConservativeIsEnough);
    }

    match ctx.market_condition {
        MarketCondition::Hot => advice.push(Advice::RaiseForHotMarket),
        MarketCondition::Cold => advice.push(Advice::ColdMarketOpportunity),
        MarketCondition::Normal => {}
    }

    if ctx.failed_round_count >= 3 {
        advice.push(Advice::HeavyDiscountAfterFailures);
    } else if ctx.failed_round_count >= 1 {
        advice.push(Advice::DiscountAfterFailures);
    }

    if let Some(ratio) = ctx.appraisal_ratio {
        advice.push(if ratio < 80.0 {
            Advice::BelowAppraisalFloor
        } else if ratio > 130.0 {
            Advice::AboveAppraisalCeiling
        } else {
            Advice::WithinAppraisalRange
        });
    }

    if ctx.market_profit > 0.0 {
        let market_profit_ratio = if ctx.total_outlay > 0.0 {
            ctx.market_profit / ctx.total_outlay * 100.0
        } else {
            0.0
        };
        advice.push(Advice::ProfitableAgainstMarket { market_profit_ratio });
    } else {
        advice.push(Advice::UnprofitableAgainstMarket);
    }

    if ctx.minimum_bid_ratio < 110.0 {
        advice.push(Advice::NearMinimumBid);
    } else if ctx.minimum_bid_ratio > 200.0 {
        advice.push(Advice::FarAboveMinimumBid);
    }

    let target_profit_rate = ctx.target_profit_rate;
    advice.push(if ctx.profit_rate < 0.0 {
        Advice::NegativeProfit
    } else if ctx.profit_rate < target_profit_rate * 0.5 {
        Advice::FarBelowTarget { target_profit_rate }
    } else if ctx.profit_rate < target_profit_rate * 0.8 {
        Advice::BelowTarget { target_profit_rate }
    } else if ctx.profit_rate >= target_profit_rate {
        Advice::MeetsTarget { target_profit_rate }
    } else {
        Advice::NearTarget { target_profit_rate }
    });

    advice.push(Advice::LateBidTiming);
    advice.push(Advice::WatchCompetitors);
    advice
}
