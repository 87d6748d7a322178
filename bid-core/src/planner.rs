//! Bid planner: single-bid evaluation and the optimal-bid search.
//!
//! `evaluate` is the native app's model (flat costs, percent-scale
//! probability clamped to [10, 95]). `find_optimal_bid` is the browser
//! model (category costs, multiplicative probability clamped to
//! [0.01, 0.99], risk-adjusted scoring over a fixed grid of prices).
//! The two never share cost schedules or probability scales.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::advice::{Advice, AdviceContext, advise};
use crate::assessment::{BidAssessment, assess};
use crate::config::PlannerConfig;
use crate::costs::{CategoryCosts, CostBreakdown, CostCalculator};
use crate::error::{Result, require_positive};
use crate::probability::{self, ProbabilityInputs};
use crate::types::{
    MarketCondition, Money, Percent, PropertyFacts, StrategyInputs, Urgency, ratio_percent,
};

/// Recommended bid never drops below this share of the market price.
pub const RECOMMENDATION_FLOOR_SHARE: f64 = 0.3;
/// Acquisition-side costs assumed by the recommendation formula.
const RECOMMENDATION_COST_RATE: f64 = 0.015;
/// Auction and registration fees assumed by the recommendation formula.
const RECOMMENDATION_FEE_RATE: f64 = 0.03;

pub const EVALUATE_MIN_PROBABILITY: Percent = 10.0;
pub const EVALUATE_MAX_PROBABILITY: Percent = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum PlanningMode {
    Evaluate,
    OptimalSearch,
}

/// Intermediate values of the sale-rate based recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub sale_price_rate: Percent,
    pub expected_auction_price: Money,
    pub additional_costs: Money,
    pub fees: Money,
    pub target_profit: Money,
    /// Before the floor is applied; may be negative.
    pub unclamped: Money,
    pub floor: Money,
    pub recommended_bid_price: Money,
}

pub fn recommend_bid_price(facts: &PropertyFacts, sale_price_rate: Percent) -> Recommendation {
    let expected_auction_price = facts.market_price * (sale_price_rate / 100.0);
    let additional_costs = facts.renovation_cost + expected_auction_price * RECOMMENDATION_COST_RATE;
    let fees = expected_auction_price * RECOMMENDATION_FEE_RATE;
    let target_profit = expected_auction_price * (facts.target_profit_rate / 100.0);

    let unclamped = expected_auction_price - additional_costs - fees - target_profit;
    let floor = facts.market_price * RECOMMENDATION_FLOOR_SHARE;

    Recommendation {
        sale_price_rate,
        expected_auction_price,
        additional_costs,
        fees,
        target_profit,
        unclamped,
        floor,
        recommended_bid_price: unclamped.max(floor),
    }
}

/// Percent-scale probability of the evaluate model.
pub fn evaluation_win_probability(
    bid_price: Money,
    recommended_bid_price: Money,
    competitor_count: u32,
    failed_round_count: u32,
) -> Percent {
    let bid_ratio = if recommended_bid_price > 0.0 {
        bid_price / recommended_bid_price
    } else {
        0.0
    };
    let mut probability = (bid_ratio * 50.0).min(90.0);
    probability += competitor_count as f64 * -3.0;
    probability += failed_round_count as f64 * 5.0;
    probability.clamp(EVALUATE_MIN_PROBABILITY, EVALUATE_MAX_PROBABILITY)
}

// ============================================================================
// Search range
// ============================================================================

/// Per-strategy multipliers that shift the search window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SearchMultipliers {
    pub urgency: f64,
    pub market: f64,
    pub competitor: f64,
    pub failed_rounds: f64,
    pub total: f64,
}

impl SearchMultipliers {
    pub fn for_strategy(strategy: &StrategyInputs) -> Self {
        let urgency = match strategy.urgency {
            Urgency::High => 1.12_f64,
            Urgency::Normal => 1.0,
            Urgency::Low => 0.92,
        }
        .clamp(0.9, 1.15);
        let market = match strategy.market_condition {
            MarketCondition::Hot => 1.05_f64,
            MarketCondition::Normal => 1.0,
            MarketCondition::Cold => 0.95,
        }
        .clamp(0.9, 1.1);
        let competitor = (1.0 + 0.02 * (strategy.competitor_count as f64 - 3.0)).clamp(0.9, 1.1);
        let failed_rounds = 0.95_f64
            .powi(strategy.failed_round_count.min(4) as i32)
            .clamp(0.7, 1.0);
        let total = (urgency * market * competitor * failed_rounds).clamp(0.7, 1.3);
        Self {
            urgency,
            market,
            competitor,
            failed_rounds,
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SearchRange {
    pub lower: Money,
    pub upper: Money,
    pub step: Money,
    pub steps: u32,
}

impl SearchRange {
    pub fn new(facts: &PropertyFacts, total_multiplier: f64, steps: u32) -> Self {
        let lower = ((facts.minimum_bid * 1.1).max(facts.market_price * 0.7) * total_multiplier)
            .max(facts.minimum_bid);

        let mut upper = (facts.market_price * 1.2)
            .min(facts.market_price * 1.1 * total_multiplier * 1.5);
        if facts.appraisal_price > 0.0 {
            upper = upper.min(facts.appraisal_price * 1.3);
        }
        let upper = upper.max(lower);

        Self {
            lower,
            upper,
            step: (upper - lower) / steps as f64,
            steps,
        }
    }

    /// `steps + 1` evenly spaced prices, both ends included.
    pub fn prices(&self) -> impl Iterator<Item = Money> + '_ {
        (0..=self.steps).map(move |i| {
            if i == self.steps {
                self.upper
            } else {
                self.lower + self.step * i as f64
            }
        })
    }
}

/// One evaluated price in the search grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct BidCandidate {
    pub price: Money,
    /// Fraction in [0.01, 0.99].
    pub win_probability: f64,
    /// Return on total outlay, percent.
    pub expected_profit: Percent,
    pub risk_adjusted_profit: Percent,
    pub minimum_bid_penalty: f64,
    pub appraisal_bonus: f64,
    pub score: f64,
    pub costs: CategoryCosts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub multipliers: SearchMultipliers,
    pub range: SearchRange,
    pub best_index: usize,
    pub candidates: Vec<BidCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub mode: PlanningMode,
    /// The price the ratios and costs below refer to.
    pub bid_price: Money,
    pub recommended_bid_price: Money,
    pub sale_price_rate: Percent,
    pub expected_auction_price: Money,
    pub winning_probability: Percent,
    pub expected_profit: Money,
    pub profit_rate: Percent,
    pub cost_breakdown: CostBreakdown,
    pub market_ratio: Percent,
    pub appraisal_ratio: Percent,
    pub minimum_bid_ratio: Percent,
    pub assessment: BidAssessment,
    pub advice: Vec<Advice>,
    pub search: Option<SearchSummary>,
}

// ============================================================================
// Planner
// ============================================================================

/// Stateless; holds only its configuration and the derived cost tables.
#[derive(Debug, Clone, Default)]
pub struct BidPlanner {
    config: PlannerConfig,
    costs: CostCalculator,
}

impl BidPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        let costs = CostCalculator::new(&config);
        Ok(Self { config, costs })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn cost_calculator(&self) -> &CostCalculator {
        &self.costs
    }

    /// Score a caller-chosen bid with the flat real-estate schedule.
    pub fn evaluate(
        &self,
        bid_price: Money,
        facts: &PropertyFacts,
        strategy: &StrategyInputs,
    ) -> Result<SimulationResult> {
        require_positive("bidPrice", bid_price)?;
        facts.validate()?;
        strategy.validate()?;

        let sale_price_rate = strategy.resolved_sale_rate(self.config.default_sale_price_rate);
        let recommendation = recommend_bid_price(facts, sale_price_rate);
        let winning_probability = evaluation_win_probability(
            bid_price,
            recommendation.recommended_bid_price,
            strategy.competitor_count,
            strategy.failed_round_count,
        );

        let costs = self.costs.flat(bid_price, facts.renovation_cost)?;
        let expected_profit = facts.market_price - bid_price - costs.total_cost;
        let profit_rate = expected_profit / bid_price * 100.0;
        let total_outlay = costs.total_cost_including_bid(bid_price);

        let market_ratio = ratio_percent(bid_price, facts.market_price);
        let appraisal_ratio = ratio_percent(bid_price, facts.appraisal_price);
        let minimum_bid_ratio = ratio_percent(bid_price, facts.minimum_bid);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: instrument::EVALUATION_TARGET,
            bid_price = bid_price,
            recommended_bid_price = recommendation.recommended_bid_price,
            sale_price_rate = sale_price_rate,
            winning_probability = winning_probability,
            total_cost = costs.total_cost,
            expected_profit = expected_profit,
            profit_rate = profit_rate,
        );

        let assessment = assess(bid_price, facts, strategy, sale_price_rate);
        let advice = advise(&AdviceContext {
            win_probability: winning_probability / 100.0,
            profit_rate,
            target_profit_rate: facts.target_profit_rate,
            competitor_count: strategy.competitor_count,
            market_condition: strategy.market_condition,
            failed_round_count: strategy.failed_round_count,
            appraisal_ratio: (facts.appraisal_price > 0.0).then_some(appraisal_ratio),
            minimum_bid_ratio,
            market_profit: facts.market_price - total_outlay,
            total_outlay,
        });

        Ok(SimulationResult {
            mode: PlanningMode::Evaluate,
            bid_price,
            recommended_bid_price: recommendation.recommended_bid_price,
            sale_price_rate,
            expected_auction_price: recommendation.expected_auction_price,
            winning_probability,
            expected_profit,
            profit_rate,
            cost_breakdown: CostBreakdown::Flat(costs),
            market_ratio,
            appraisal_ratio,
            minimum_bid_ratio,
            assessment,
            advice,
            search: None,
        })
    }

    /// Search the strategy-dependent price window for the best risk-adjusted score.
    pub fn find_optimal_bid(
        &self,
        facts: &PropertyFacts,
        strategy: &StrategyInputs,
    ) -> Result<SimulationResult> {
        facts.validate()?;
        strategy.validate()?;
        let steps = self.config.search_steps;

        let sale_price_rate = strategy.resolved_sale_rate(self.config.default_sale_price_rate);
        let multipliers = SearchMultipliers::for_strategy(strategy);
        let range = SearchRange::new(facts, multipliers.total, steps);

        let mut candidates: Vec<BidCandidate> = Vec::with_capacity(steps as usize + 1);
        let mut best_index = 0;
        for (index, price) in range.prices().enumerate() {
            let candidate = self.score_candidate(price, facts, strategy)?;

            #[cfg(feature = "instrument")]
            {
                let index = index as u64;
                tracing::info!(
                    target: instrument::CANDIDATE_TARGET,
                    index,
                    price = candidate.price,
                    win_probability = candidate.win_probability,
                    expected_profit = candidate.expected_profit,
                    risk_adjusted_profit = candidate.risk_adjusted_profit,
                    score = candidate.score,
                );
            }

            // Strictly greater only: ties keep the lower price.
            if index > 0 && candidate.score > candidates[best_index].score {
                best_index = index;
            }
            candidates.push(candidate);
        }

        let best = candidates[best_index].clone();

        #[cfg(feature = "instrument")]
        {
            let best_index = best_index as u64;
            tracing::info!(
                target: instrument::SELECTION_TARGET,
                best_index,
                price = best.price,
                score = best.score,
                win_probability = best.win_probability,
                lower = range.lower,
                upper = range.upper,
                total_multiplier = multipliers.total,
            );
        }

        let recommendation = recommend_bid_price(facts, sale_price_rate);
        let total_outlay = best.costs.total_cost_including_bid;
        let expected_profit = facts.market_price - total_outlay;
        let winning_probability = best.win_probability * 100.0;

        let market_ratio = ratio_percent(best.price, facts.market_price);
        let appraisal_ratio = ratio_percent(best.price, facts.appraisal_price);
        let minimum_bid_ratio = ratio_percent(best.price, facts.minimum_bid);

        let assessment = assess(best.price, facts, strategy, sale_price_rate);
        let advice = advise(&AdviceContext {
            win_probability: best.win_probability,
            profit_rate: best.expected_profit,
            target_profit_rate: facts.target_profit_rate,
            competitor_count: strategy.competitor_count,
            market_condition: strategy.market_condition,
            failed_round_count: strategy.failed_round_count,
            appraisal_ratio: (facts.appraisal_price > 0.0).then_some(appraisal_ratio),
            minimum_bid_ratio,
            market_profit: expected_profit,
            total_outlay,
        });

        Ok(SimulationResult {
            mode: PlanningMode::OptimalSearch,
            bid_price: best.price,
            recommended_bid_price: best.price,
            sale_price_rate,
            expected_auction_price: recommendation.expected_auction_price,
            winning_probability,
            expected_profit,
            profit_rate: best.expected_profit,
            cost_breakdown: CostBreakdown::Category(best.costs.clone()),
            market_ratio,
            appraisal_ratio,
            minimum_bid_ratio,
            assessment,
            advice,
            search: Some(SearchSummary {
                multipliers,
                range,
                best_index,
                candidates,
            }),
        })
    }

    fn score_candidate(
        &self,
        price: Money,
        facts: &PropertyFacts,
        strategy: &StrategyInputs,
    ) -> Result<BidCandidate> {
        let win_probability = probability::win_probability(&ProbabilityInputs {
            bid_price: price,
            property_value: facts.market_price,
            minimum_bid: facts.minimum_bid,
            appraisal_price: facts.appraisal_price,
            competitor_count: strategy.competitor_count,
            failed_round_count: strategy.failed_round_count,
            market_condition: strategy.market_condition,
            urgency: strategy.urgency,
        });

        let costs = self
            .costs
            .by_category(price, strategy.auction_category, facts.renovation_cost)?;
        let total = costs.total_cost_including_bid;
        let expected_profit = (facts.market_price - total) / total * 100.0;

        let risk_premium = probability::risk_premium(
            strategy.market_condition,
            strategy.failed_round_count,
            win_probability,
        );
        let volatility = probability::volatility_adjustment(win_probability, strategy.market_condition);
        let risk_adjusted_profit =
            (expected_profit * win_probability + risk_premium - volatility).clamp(-50.0, 200.0);

        let minimum_bid_penalty = if price / facts.minimum_bid < 1.15 {
            10.0
        } else {
            0.0
        };
        let appraisal_bonus = if facts.appraisal_price > 0.0 {
            let ratio = price / facts.appraisal_price;
            if (0.95..=1.05).contains(&ratio) { 15.0 } else { 0.0 }
        } else {
            0.0
        };

        let score = win_probability * risk_adjusted_profit - minimum_bid_penalty + appraisal_bonus
            - (1.0 - win_probability) * 5.0;

        Ok(BidCandidate {
            price,
            win_probability,
            expected_profit,
            risk_adjusted_profit,
            minimum_bid_penalty,
            appraisal_bonus,
            score,
            costs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuctionCategory;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * b.abs().max(1.0)
    }

    fn facts() -> PropertyFacts {
        PropertyFacts {
            market_price: 300_000_000.0,
            appraisal_price: 300_000_000.0,
            minimum_bid: 210_000_000.0,
            renovation_cost: 0.0,
            target_profit_rate: 10.0,
        }
    }

    fn strategy() -> StrategyInputs {
        StrategyInputs {
            competitor_count: 3,
            market_condition: MarketCondition::Normal,
            urgency: Urgency::Normal,
            auction_category: AuctionCategory::RealEstate,
            failed_round_count: 0,
            sale_rate_percent: 80.0,
        }
    }

    #[test]
    fn recommendation_floor_applies_when_targets_are_greedy() {
        let mut greedy = facts();
        greedy.target_profit_rate = 90.0;
        let rec = recommend_bid_price(&greedy, 80.0);
        assert!(rec.unclamped < rec.floor);
        assert_eq!(rec.recommended_bid_price, rec.floor);
        assert!(close(rec.floor, 90_000_000.0));
    }

    #[test]
    fn evaluation_probability_bounds() {
        assert_eq!(evaluation_win_probability(1.0, 1_000.0, 20, 0), 10.0);
        assert_eq!(evaluation_win_probability(1_000.0, 1.0, 0, 10), 95.0);
        // 1.0 ratio -> 50, three rivals -> 41, one failed round -> 46
        assert!(close(evaluation_win_probability(100.0, 100.0, 3, 1), 46.0));
        // zero recommendation is guarded, not a division
        assert_eq!(evaluation_win_probability(100.0, 0.0, 0, 0), 10.0);
    }

    #[test]
    fn multipliers_are_clamped() {
        let mut s = strategy();
        s.urgency = Urgency::High;
        s.market_condition = MarketCondition::Hot;
        s.competitor_count = 50;
        let m = SearchMultipliers::for_strategy(&s);
        assert_eq!(m.competitor, 1.1);
        assert!(m.total <= 1.3);

        s.failed_round_count = 9;
        let capped = SearchMultipliers::for_strategy(&s);
        s.failed_round_count = 4;
        assert_eq!(capped, SearchMultipliers::for_strategy(&s));
    }

    #[test]
    fn range_has_steps_plus_one_prices_with_exact_ends() {
        let range = SearchRange::new(&facts(), 1.0, 20);
        let prices: Vec<_> = range.prices().collect();
        assert_eq!(prices.len(), 21);
        assert_eq!(prices[0], range.lower);
        assert_eq!(prices[20], range.upper);
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn range_never_goes_below_minimum_bid() {
        let mut f = facts();
        f.minimum_bid = 280_000_000.0;
        let range = SearchRange::new(&f, 0.7, 20);
        assert!(range.lower >= f.minimum_bid);
        assert!(range.upper >= range.lower);
    }

    #[test]
    fn collapsed_range_still_yields_candidates() {
        let mut f = facts();
        f.minimum_bid = 400_000_000.0;
        let range = SearchRange::new(&f, 1.0, 20);
        assert_eq!(range.lower, range.upper);
        assert_eq!(range.prices().count(), 21);
    }

    #[test]
    fn evaluate_rejects_non_positive_bid() {
        let planner = BidPlanner::default();
        let err = planner.evaluate(0.0, &facts(), &strategy()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let err = BidPlanner::new(PlannerConfig {
            search_steps: 0,
            ..PlannerConfig::default()
        })
        .unwrap_err();
        assert!(err.is_invalid_input());

        let mut config = PlannerConfig::default();
        config.flat_rates.acquisition_tax_rate = -1.0;
        config.default_sale_price_rate = -50.0;
        assert!(BidPlanner::new(config).is_err());
    }

    #[test]
    fn custom_step_count_sizes_the_grid() {
        let planner = BidPlanner::new(PlannerConfig {
            search_steps: 4,
            ..PlannerConfig::default()
        })
        .unwrap();
        let result = planner.find_optimal_bid(&facts(), &strategy()).unwrap();
        let search = result.search.unwrap();
        assert_eq!(search.candidates.len(), 5);
        assert_eq!(search.candidates[4].price, search.range.upper);
    }

    #[test]
    fn search_picks_the_highest_score() {
        let planner = BidPlanner::default();
        let result = planner.find_optimal_bid(&facts(), &strategy()).unwrap();
        let search = result.search.as_ref().unwrap();
        let best = &search.candidates[search.best_index];
        assert!(search.candidates.iter().all(|c| c.score <= best.score));
        // first occurrence wins on ties
        assert!(search.candidates[..search.best_index].iter().all(|c| c.score < best.score));
        assert_eq!(result.recommended_bid_price, best.price);
        assert!(close(result.winning_probability, best.win_probability * 100.0));
    }
}
