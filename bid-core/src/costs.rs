//! Transaction cost calculator.
//!
//! Two schedules live side by side and are never mixed:
//! - Regime A (`FlatCosts`): the real-estate schedule used by `evaluate`.
//!   Its `total_cost` excludes the bid price and the deposit/remaining split.
//! - Regime B (`CategoryCosts`): the per-category table used by the
//!   optimal-bid search. It reports totals both with and without the bid.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::{CategoryFeeTable, FlatCostRates, PlannerConfig};
use crate::error::{PlannerError, Result, require_non_negative};
use crate::types::{AuctionCategory, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum FeeRegime {
    /// Regime A.
    Flat,
    /// Regime B.
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct FlatCosts {
    pub deposit_amount: Money,
    pub remaining_payment: Money,
    pub acquisition_tax: Money,
    pub local_education_tax: Money,
    pub rural_special_tax: Money,
    pub registration_fees: Money,
    pub professional_fees: Money,
    pub other_costs: Money,
    /// Taxes + fees + other costs. Excludes the bid price.
    pub total_cost: Money,
}

impl FlatCosts {
    pub fn total_cost_including_bid(&self, bid_price: Money) -> Money {
        bid_price + self.total_cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCosts {
    pub category: AuctionCategory,
    pub bid_price: Money,
    pub deposit_amount: Money,
    pub remaining_payment: Money,
    pub auction_fee: Money,
    pub registration_fee: Money,
    pub tax: Money,
    pub additional_costs: Money,
    /// Renovation budget carried through from the facts.
    pub other_costs: Money,
    pub total_cost_excluding_bid: Money,
    pub total_cost_including_bid: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "regime", rename_all = "camelCase")]
pub enum CostBreakdown {
    Flat(FlatCosts),
    Category(CategoryCosts),
}

impl CostBreakdown {
    pub fn regime(&self) -> FeeRegime {
        match self {
            CostBreakdown::Flat(_) => FeeRegime::Flat,
            CostBreakdown::Category(_) => FeeRegime::Category,
        }
    }

    pub fn total_cost_excluding_bid(&self) -> Money {
        match self {
            CostBreakdown::Flat(c) => c.total_cost,
            CostBreakdown::Category(c) => c.total_cost_excluding_bid,
        }
    }

    pub fn total_cost_including_bid(&self, bid_price: Money) -> Money {
        match self {
            CostBreakdown::Flat(c) => c.total_cost_including_bid(bid_price),
            CostBreakdown::Category(c) => c.total_cost_including_bid,
        }
    }

    pub fn deposit_amount(&self) -> Money {
        match self {
            CostBreakdown::Flat(c) => c.deposit_amount,
            CostBreakdown::Category(c) => c.deposit_amount,
        }
    }
}

/// Stateless cost service; holds only the rate tables it was built with.
#[derive(Debug, Clone, Default)]
pub struct CostCalculator {
    flat: FlatCostRates,
    table: CategoryFeeTable,
}

impl CostCalculator {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            flat: config.flat_rates.clone(),
            table: config.fee_schedules.clone(),
        }
    }

    /// Regime A.
    pub fn flat(&self, bid_price: Money, renovation_cost: Money) -> Result<FlatCosts> {
        require_non_negative("bidPrice", bid_price)?;
        require_non_negative("renovationCost", renovation_cost)?;
        let r = &self.flat;

        let deposit_amount = bid_price * r.deposit_rate;
        let remaining_payment = bid_price * (1.0 - r.deposit_rate);
        let acquisition_tax = bid_price * r.acquisition_tax_rate;
        let local_education_tax = acquisition_tax * r.local_education_tax_share;
        let rural_special_tax = acquisition_tax * r.rural_special_tax_share;
        let registration_fees = bid_price * r.registration_fee_rate;
        let professional_fees = bid_price * r.professional_fee_rate;
        let other_costs = renovation_cost;

        let total_cost = acquisition_tax
            + local_education_tax
            + rural_special_tax
            + registration_fees
            + professional_fees
            + other_costs;

        Ok(FlatCosts {
            deposit_amount,
            remaining_payment,
            acquisition_tax,
            local_education_tax,
            rural_special_tax,
            registration_fees,
            professional_fees,
            other_costs,
            total_cost,
        })
    }

    /// Regime B.
    pub fn by_category(
        &self,
        bid_price: Money,
        category: AuctionCategory,
        renovation_cost: Money,
    ) -> Result<CategoryCosts> {
        require_non_negative("bidPrice", bid_price)?;
        require_non_negative("renovationCost", renovation_cost)?;
        let s = self.table.schedule(category);

        let deposit_amount = bid_price * s.deposit_rate;
        let remaining_payment = bid_price - deposit_amount;
        let auction_fee = bid_price * s.auction_fee_rate;
        let registration_fee = bid_price * s.registration_fee_rate;
        let tax = bid_price * s.tax_rate;
        let additional_costs = bid_price * s.additional_cost_rate;

        let total_cost_excluding_bid =
            auction_fee + registration_fee + tax + additional_costs + renovation_cost;

        Ok(CategoryCosts {
            category,
            bid_price,
            deposit_amount,
            remaining_payment,
            auction_fee,
            registration_fee,
            tax,
            additional_costs,
            other_costs: renovation_cost,
            total_cost_excluding_bid,
            total_cost_including_bid: bid_price + total_cost_excluding_bid,
        })
    }

    /// Regime dispatch. Regime A only describes real estate, so any other
    /// category is rejected rather than priced with the wrong schedule.
    pub fn compute(
        &self,
        regime: FeeRegime,
        bid_price: Money,
        category: AuctionCategory,
        renovation_cost: Money,
    ) -> Result<CostBreakdown> {
        match regime {
            FeeRegime::Flat => {
                if category != AuctionCategory::RealEstate {
                    return Err(PlannerError::invalid(
                        "auctionCategory",
                        format!("flat schedule covers realEstate only, got {category}"),
                    ));
                }
                self.flat(bid_price, renovation_cost).map(CostBreakdown::Flat)
            }
            FeeRegime::Category => self
                .by_category(bid_price, category, renovation_cost)
                .map(CostBreakdown::Category),
        }
    }

    /// Entry point for shells that still carry the category as a string.
    pub fn compute_named(
        &self,
        regime: FeeRegime,
        bid_price: Money,
        category: &str,
        renovation_cost: Money,
    ) -> Result<CostBreakdown> {
        let category: AuctionCategory = category.parse()?;
        self.compute(regime, bid_price, category, renovation_cost)
    }
}
