//! Heuristic win-probability model used by the optimal-bid search.
//!
//! Every factor is an ordered bracket check on its input. The brackets are
//! half-open (`ratio < bound`) and are tested from the lowest bound upward,
//! so values landing exactly on a bound fall into the next bracket.

use crate::types::{MarketCondition, Money, Urgency};

pub const MIN_PROBABILITY: f64 = 0.01;
pub const MAX_PROBABILITY: f64 = 0.99;

/// Base factor from `bid / property value`.
pub fn base_factor(price_ratio: f64) -> f64 {
    if price_ratio < 0.7 {
        0.1
    } else if price_ratio < 0.8 {
        0.3
    } else if price_ratio < 0.9 {
        0.6
    } else if price_ratio < 1.0 {
        0.8
    } else if price_ratio < 1.1 {
        0.9
    } else if price_ratio < 1.2 {
        0.95
    } else {
        0.98
    }
}

pub fn competitor_factor(competitor_count: u32) -> f64 {
    match competitor_count {
        0 | 1 => 0.95,
        2 => 0.7,
        3 => 0.5,
        4 => 0.35,
        5 => 0.25,
        6..=8 => 0.15,
        _ => 0.1,
    }
}

pub fn failed_round_factor(failed_round_count: u32) -> f64 {
    match failed_round_count {
        0 => 1.0,
        1 => 0.9,
        2 => 0.8,
        3 => 0.7,
        _ => 0.6,
    }
}

/// Factor from `bid / minimum bid`.
pub fn minimum_bid_factor(ratio: f64) -> f64 {
    if ratio < 1.05 {
        0.5
    } else if ratio < 1.1 {
        0.7
    } else if ratio < 1.2 {
        0.9
    } else if ratio < 1.5 {
        1.0
    } else {
        1.1
    }
}

/// Factor from `bid / appraisal`. `None` (appraisal unknown) is neutral.
pub fn appraisal_factor(ratio: Option<f64>) -> f64 {
    let Some(ratio) = ratio else {
        return 1.0;
    };
    if ratio < 0.8 {
        0.6
    } else if ratio < 0.9 {
        0.8
    } else if ratio < 1.1 {
        1.0
    } else if ratio < 1.3 {
        1.1
    } else {
        1.2
    }
}

pub fn market_weight(condition: MarketCondition) -> f64 {
    match condition {
        MarketCondition::Hot => 1.4,
        MarketCondition::Normal => 1.0,
        MarketCondition::Cold => 0.6,
    }
}

pub fn urgency_weight(urgency: Urgency) -> f64 {
    match urgency {
        Urgency::High => 1.3,
        Urgency::Normal => 1.0,
        Urgency::Low => 0.7,
    }
}

/// Everything the model looks at for one candidate price.
#[derive(Debug, Clone, Copy)]
pub struct ProbabilityInputs {
    pub bid_price: Money,
    pub property_value: Money,
    pub minimum_bid: Money,
    /// 0 when unknown.
    pub appraisal_price: Money,
    pub competitor_count: u32,
    pub failed_round_count: u32,
    pub market_condition: MarketCondition,
    pub urgency: Urgency,
}

/// The individual factors, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityFactors {
    pub base: f64,
    pub competitor: f64,
    pub market: f64,
    pub urgency: f64,
    pub failed: f64,
    pub minimum_bid: f64,
    pub appraisal: f64,
}

impl ProbabilityFactors {
    pub fn product(&self) -> f64 {
        self.base
            * self.competitor
            * self.market
            * self.urgency
            * self.failed
            * self.minimum_bid
            * self.appraisal
    }
}

pub fn factors(inputs: &ProbabilityInputs) -> ProbabilityFactors {
    let appraisal_ratio =
        (inputs.appraisal_price > 0.0).then(|| inputs.bid_price / inputs.appraisal_price);
    ProbabilityFactors {
        base: base_factor(inputs.bid_price / inputs.property_value),
        competitor: competitor_factor(inputs.competitor_count),
        market: market_weight(inputs.market_condition),
        urgency: urgency_weight(inputs.urgency),
        failed: failed_round_factor(inputs.failed_round_count),
        minimum_bid: minimum_bid_factor(inputs.bid_price / inputs.minimum_bid),
        appraisal: appraisal_factor(appraisal_ratio),
    }
}

/// Win probability as a fraction in [0.01, 0.99].
pub fn win_probability(inputs: &ProbabilityInputs) -> f64 {
    factors(inputs)
        .product()
        .clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

// ============================================================================
// Risk terms
// ============================================================================

pub fn risk_premium(condition: MarketCondition, failed_round_count: u32, win_probability: f64) -> f64 {
    let market = match condition {
        MarketCondition::Hot => 5.0,
        MarketCondition::Normal => 0.0,
        MarketCondition::Cold => -3.0,
    };
    let failed = failed_round_count as f64 * -2.0;
    let tier = if win_probability < 0.3 {
        10.0
    } else if win_probability < 0.6 {
        5.0
    } else {
        0.0
    };
    market + failed + tier
}

pub fn market_volatility_factor(condition: MarketCondition) -> f64 {
    match condition {
        MarketCondition::Hot => 1.5,
        MarketCondition::Normal => 1.0,
        MarketCondition::Cold => 0.7,
    }
}

pub fn volatility_adjustment(win_probability: f64, condition: MarketCondition) -> f64 {
    (1.0 - win_probability) * 15.0 * market_volatility_factor(condition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ProbabilityInputs {
        ProbabilityInputs {
            bid_price: 95.0,
            property_value: 100.0,
            minimum_bid: 70.0,
            appraisal_price: 100.0,
            competitor_count: 1,
            failed_round_count: 0,
            market_condition: MarketCondition::Normal,
            urgency: Urgency::Normal,
        }
    }

    #[test]
    fn base_factor_brackets() {
        assert_eq!(base_factor(0.5), 0.1);
        assert_eq!(base_factor(0.7), 0.3);
        assert_eq!(base_factor(0.85), 0.6);
        assert_eq!(base_factor(0.95), 0.8);
        assert_eq!(base_factor(1.0), 0.9);
        assert_eq!(base_factor(1.15), 0.95);
        assert_eq!(base_factor(1.2), 0.98);
        assert_eq!(base_factor(3.0), 0.98);
    }

    #[test]
    fn competitor_factor_brackets() {
        assert_eq!(competitor_factor(0), 0.95);
        assert_eq!(competitor_factor(1), 0.95);
        assert_eq!(competitor_factor(2), 0.7);
        assert_eq!(competitor_factor(5), 0.25);
        assert_eq!(competitor_factor(6), 0.15);
        assert_eq!(competitor_factor(7), 0.15);
        assert_eq!(competitor_factor(8), 0.15);
        assert_eq!(competitor_factor(9), 0.1);
        assert_eq!(competitor_factor(40), 0.1);
    }

    #[test]
    fn failed_round_factor_caps_at_four() {
        assert_eq!(failed_round_factor(3), 0.7);
        assert_eq!(failed_round_factor(4), 0.6);
        assert_eq!(failed_round_factor(12), 0.6);
    }

    #[test]
    fn ratio_factor_brackets() {
        assert_eq!(minimum_bid_factor(1.0), 0.5);
        assert_eq!(minimum_bid_factor(1.05), 0.7);
        assert_eq!(minimum_bid_factor(1.15), 0.9);
        assert_eq!(minimum_bid_factor(1.49), 1.0);
        assert_eq!(minimum_bid_factor(1.5), 1.1);
        assert_eq!(appraisal_factor(Some(0.79)), 0.6);
        assert_eq!(appraisal_factor(Some(1.0)), 1.0);
        assert_eq!(appraisal_factor(Some(1.3)), 1.2);
        assert_eq!(appraisal_factor(None), 1.0);
    }

    #[test]
    fn probability_is_product_of_factors() {
        // base 0.8, competitor 0.95, min-bid ratio 1.357 -> 1.0, appraisal 0.95 -> 1.0
        let p = win_probability(&inputs());
        assert!((p - 0.76).abs() < 1e-12, "p = {p}");
    }

    #[test]
    fn probability_is_clamped() {
        let mut hot = inputs();
        hot.bid_price = 200.0;
        hot.market_condition = MarketCondition::Hot;
        hot.urgency = Urgency::High;
        assert_eq!(win_probability(&hot), MAX_PROBABILITY);

        let mut cold = inputs();
        cold.bid_price = 71.0;
        cold.competitor_count = 30;
        cold.failed_round_count = 5;
        cold.market_condition = MarketCondition::Cold;
        cold.urgency = Urgency::Low;
        assert_eq!(win_probability(&cold), MIN_PROBABILITY);
    }

    #[test]
    fn zero_appraisal_is_neutral_not_nan() {
        let mut unknown = inputs();
        unknown.appraisal_price = 0.0;
        let f = factors(&unknown);
        assert_eq!(f.appraisal, 1.0);
        assert!(win_probability(&unknown).is_finite());
    }

    #[test]
    fn risk_terms() {
        assert_eq!(risk_premium(MarketCondition::Hot, 0, 0.2), 15.0);
        assert_eq!(risk_premium(MarketCondition::Cold, 2, 0.5), -2.0);
        assert_eq!(risk_premium(MarketCondition::Normal, 1, 0.9), -2.0);
        assert!((volatility_adjustment(0.6, MarketCondition::Hot) - 9.0).abs() < 1e-12);
        assert_eq!(volatility_adjustment(1.0, MarketCondition::Cold), 0.0);
    }
}
