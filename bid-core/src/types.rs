use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{PlannerError, Result, require_non_negative, require_positive};

/// Amount in won.
pub type Money = f64;
/// Percentage points (80.0 means 80%).
pub type Percent = f64;

/// Won per 만원, the unit the shells' forms are filled in.
pub const WON_PER_MAN_WON: f64 = 10_000.0;

pub fn to_won(man_won: f64) -> Money {
    man_won * WON_PER_MAN_WON
}

pub fn to_man_won(won: Money) -> f64 {
    won / WON_PER_MAN_WON
}

/// Parse a money amount typed into a form ("322,000,000", " 1500원").
pub fn parse_money(field: &'static str, text: &str) -> Result<Money> {
    let cleaned: String = text
        .trim()
        .trim_end_matches('원')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let malformed = || PlannerError::MalformedNumber {
        field,
        value: text.to_string(),
    };
    let value: f64 = cleaned.trim().parse().map_err(|_| malformed())?;
    if !value.is_finite() {
        return Err(malformed());
    }
    Ok(value)
}

// ============================================================================
// Strategy enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum AuctionCategory {
    RealEstate,
    Vehicle,
    Art,
    General,
}

impl AuctionCategory {
    pub fn all() -> impl Iterator<Item = AuctionCategory> {
        [
            AuctionCategory::RealEstate,
            AuctionCategory::Vehicle,
            AuctionCategory::Art,
            AuctionCategory::General,
        ]
        .into_iter()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionCategory::RealEstate => "realEstate",
            AuctionCategory::Vehicle => "vehicle",
            AuctionCategory::Art => "art",
            AuctionCategory::General => "general",
        }
    }
}

impl FromStr for AuctionCategory {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "realEstate" => Ok(AuctionCategory::RealEstate),
            "vehicle" => Ok(AuctionCategory::Vehicle),
            "art" => Ok(AuctionCategory::Art),
            "general" => Ok(AuctionCategory::General),
            other => Err(PlannerError::UnknownVariant {
                kind: "auction category",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum MarketCondition {
    Hot,
    #[default]
    Normal,
    Cold,
}

impl MarketCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCondition::Hot => "hot",
            MarketCondition::Normal => "normal",
            MarketCondition::Cold => "cold",
        }
    }
}

impl FromStr for MarketCondition {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "hot" => Ok(MarketCondition::Hot),
            "normal" => Ok(MarketCondition::Normal),
            "cold" => Ok(MarketCondition::Cold),
            other => Err(PlannerError::UnknownVariant {
                kind: "market condition",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    High,
    // The browser form submitted "medium" for the middle option.
    #[default]
    #[serde(alias = "medium")]
    Normal,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "high",
            Urgency::Normal => "normal",
            Urgency::Low => "low",
        }
    }
}

impl FromStr for Urgency {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "high" => Ok(Urgency::High),
            "normal" | "medium" => Ok(Urgency::Normal),
            "low" => Ok(Urgency::Low),
            other => Err(PlannerError::UnknownVariant {
                kind: "urgency",
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// What is known about the asset for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFacts {
    /// Estimated fair market value.
    pub market_price: Money,
    /// Court appraisal; 0 means unknown.
    #[serde(default)]
    pub appraisal_price: Money,
    /// Statutory floor for this round.
    pub minimum_bid: Money,
    #[serde(default)]
    pub renovation_cost: Money,
    #[serde(default)]
    pub target_profit_rate: Percent,
}

impl PropertyFacts {
    pub fn validate(&self) -> Result<()> {
        require_positive("marketPrice", self.market_price)?;
        require_non_negative("appraisalPrice", self.appraisal_price)?;
        require_positive("minimumBid", self.minimum_bid)?;
        require_non_negative("renovationCost", self.renovation_cost)?;
        if !self.target_profit_rate.is_finite() {
            return Err(PlannerError::invalid(
                "targetProfitRate",
                format!("{} is not finite", self.target_profit_rate),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInputs {
    #[serde(default)]
    pub competitor_count: u32,
    #[serde(default)]
    pub market_condition: MarketCondition,
    #[serde(default)]
    pub urgency: Urgency,
    pub auction_category: AuctionCategory,
    #[serde(default)]
    pub failed_round_count: u32,
    /// Regional sale-price-to-appraisal ratio; <= 0 means "not available".
    #[serde(default)]
    pub sale_rate_percent: Percent,
}

impl StrategyInputs {
    pub fn validate(&self) -> Result<()> {
        if !self.sale_rate_percent.is_finite() {
            return Err(PlannerError::invalid(
                "saleRatePercent",
                format!("{} is not finite", self.sale_rate_percent),
            ));
        }
        Ok(())
    }

    /// Sale price rate with the fallback applied.
    pub fn resolved_sale_rate(&self, default_rate: Percent) -> Percent {
        if self.sale_rate_percent > 0.0 {
            self.sale_rate_percent
        } else {
            default_rate
        }
    }
}

/// `a / b × 100`, or 0 when the reference price is not positive.
pub fn ratio_percent(value: Money, reference: Money) -> Percent {
    if reference > 0.0 {
        value / reference * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_money() {
        assert_eq!(parse_money("bidPrice", "322,000,000").unwrap(), 322_000_000.0);
        assert_eq!(parse_money("bidPrice", " 1500원 ").unwrap(), 1500.0);
        assert_eq!(parse_money("bidPrice", "0.5").unwrap(), 0.5);
        assert!(matches!(
            parse_money("bidPrice", "12a"),
            Err(PlannerError::MalformedNumber { field: "bidPrice", .. })
        ));
        assert!(parse_money("bidPrice", "").is_err());
        assert!(parse_money("bidPrice", "inf").is_err());
    }

    #[test]
    fn man_won_conversion() {
        assert_eq!(to_won(32_200.0), 322_000_000.0);
        assert_eq!(to_man_won(322_000_000.0), 32_200.0);
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert_eq!(
            "realEstate".parse::<AuctionCategory>().unwrap(),
            AuctionCategory::RealEstate
        );
        let err = "boat".parse::<AuctionCategory>().unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn urgency_accepts_medium_alias() {
        assert_eq!("medium".parse::<Urgency>().unwrap(), Urgency::Normal);
        let parsed: Urgency = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Urgency::Normal);
        assert!("urgent".parse::<Urgency>().is_err());
    }

    #[test]
    fn json_field_names_are_camel_case() {
        let strategy: StrategyInputs = serde_json::from_str(
            r#"{"competitorCount":3,"marketCondition":"hot","urgency":"low",
                "auctionCategory":"vehicle","failedRoundCount":1,"saleRatePercent":82.5}"#,
        )
        .unwrap();
        assert_eq!(strategy.competitor_count, 3);
        assert_eq!(strategy.market_condition, MarketCondition::Hot);
        assert_eq!(strategy.auction_category, AuctionCategory::Vehicle);
        assert_eq!(strategy.resolved_sale_rate(80.0), 82.5);

        let unknown = serde_json::from_str::<StrategyInputs>(r#"{"auctionCategory":"boat"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn sale_rate_defaults_when_missing() {
        let strategy: StrategyInputs =
            serde_json::from_str(r#"{"auctionCategory":"realEstate"}"#).unwrap();
        assert_eq!(strategy.resolved_sale_rate(80.0), 80.0);
    }

    #[test]
    fn facts_validation() {
        let mut facts = PropertyFacts {
            market_price: 100.0,
            appraisal_price: 0.0,
            minimum_bid: 70.0,
            renovation_cost: 0.0,
            target_profit_rate: 10.0,
        };
        assert!(facts.validate().is_ok());
        facts.minimum_bid = 0.0;
        assert!(facts.validate().is_err());
        facts.minimum_bid = 70.0;
        facts.renovation_cost = -1.0;
        assert!(facts.validate().is_err());
    }

    #[test]
    fn ratio_guards_zero_reference() {
        assert_eq!(ratio_percent(50.0, 0.0), 0.0);
        assert_eq!(ratio_percent(50.0, 200.0), 25.0);
    }
}
