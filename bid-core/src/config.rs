//! Planner configuration. Every default reproduces the published fee and
//! tax schedule; shells override fields through JSON.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{PlannerError, Result, require_non_negative, require_positive};
use crate::types::{AuctionCategory, Percent};

/// Upper bound on `search_steps`; keeps the candidate grid bounded.
pub const MAX_SEARCH_STEPS: u32 = 1000;

/// Flat real-estate schedule (regime A). All rates are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatCostRates {
    pub deposit_rate: f64,
    pub acquisition_tax_rate: f64,
    /// Share of the acquisition tax.
    pub local_education_tax_share: f64,
    /// Share of the acquisition tax.
    pub rural_special_tax_share: f64,
    pub registration_fee_rate: f64,
    pub professional_fee_rate: f64,
}

impl FlatCostRates {
    pub fn validate(&self) -> Result<()> {
        require_non_negative("flatRates.depositRate", self.deposit_rate)?;
        require_non_negative("flatRates.acquisitionTaxRate", self.acquisition_tax_rate)?;
        require_non_negative("flatRates.localEducationTaxShare", self.local_education_tax_share)?;
        require_non_negative("flatRates.ruralSpecialTaxShare", self.rural_special_tax_share)?;
        require_non_negative("flatRates.registrationFeeRate", self.registration_fee_rate)?;
        require_non_negative("flatRates.professionalFeeRate", self.professional_fee_rate)
    }
}

impl Default for FlatCostRates {
    fn default() -> Self {
        Self {
            deposit_rate: 0.10,
            acquisition_tax_rate: 0.04,
            local_education_tax_share: 0.10,
            rural_special_tax_share: 0.10,
            registration_fee_rate: 0.01,
            professional_fee_rate: 0.005,
        }
    }
}

/// Per-category rates for regime B. All rates are fractions of the bid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub auction_fee_rate: f64,
    pub registration_fee_rate: f64,
    pub tax_rate: f64,
    pub additional_cost_rate: f64,
    pub deposit_rate: f64,
}

impl FeeSchedule {
    const fn new(
        auction_fee_rate: f64,
        registration_fee_rate: f64,
        tax_rate: f64,
        additional_cost_rate: f64,
    ) -> Self {
        Self {
            auction_fee_rate,
            registration_fee_rate,
            tax_rate,
            additional_cost_rate,
            deposit_rate: 0.10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_negative("feeSchedules.auctionFeeRate", self.auction_fee_rate)?;
        require_non_negative("feeSchedules.registrationFeeRate", self.registration_fee_rate)?;
        require_non_negative("feeSchedules.taxRate", self.tax_rate)?;
        require_non_negative("feeSchedules.additionalCostRate", self.additional_cost_rate)?;
        require_non_negative("feeSchedules.depositRate", self.deposit_rate)
    }

    /// Combined fee/tax rate, excluding the deposit split.
    pub fn combined_rate(&self) -> f64 {
        self.auction_fee_rate + self.registration_fee_rate + self.tax_rate + self.additional_cost_rate
    }
}

/// Regime B table, one schedule per category. There is no fallback entry:
/// every category must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryFeeTable {
    pub real_estate: FeeSchedule,
    pub vehicle: FeeSchedule,
    pub art: FeeSchedule,
    pub general: FeeSchedule,
}

impl Default for CategoryFeeTable {
    fn default() -> Self {
        Self {
            real_estate: FeeSchedule::new(0.02, 0.001, 0.04, 0.005),
            vehicle: FeeSchedule::new(0.03, 0.002, 0.03, 0.003),
            art: FeeSchedule::new(0.15, 0.001, 0.10, 0.005),
            general: FeeSchedule::new(0.05, 0.001, 0.10, 0.003),
        }
    }
}

impl CategoryFeeTable {
    pub fn schedule(&self, category: AuctionCategory) -> &FeeSchedule {
        match category {
            AuctionCategory::RealEstate => &self.real_estate,
            AuctionCategory::Vehicle => &self.vehicle,
            AuctionCategory::Art => &self.art,
            AuctionCategory::General => &self.general,
        }
    }

    pub fn validate(&self) -> Result<()> {
        AuctionCategory::all().try_for_each(|category| self.schedule(category).validate())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    /// Used when the regional lookup has no (positive) rate.
    pub default_sale_price_rate: Percent,
    /// Number of equal steps in the optimal-bid search; candidates = steps + 1.
    pub search_steps: u32,
    pub flat_rates: FlatCostRates,
    pub fee_schedules: CategoryFeeTable,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_sale_price_rate: 80.0,
            search_steps: 20,
            flat_rates: FlatCostRates::default(),
            fee_schedules: CategoryFeeTable::default(),
        }
    }
}

impl PlannerConfig {
    /// Rejects rates that would make costs negative or results non-finite.
    pub fn validate(&self) -> Result<()> {
        require_positive("defaultSalePriceRate", self.default_sale_price_rate)?;
        if !(1..=MAX_SEARCH_STEPS).contains(&self.search_steps) {
            return Err(PlannerError::invalid(
                "searchSteps",
                format!("{} is outside 1..={MAX_SEARCH_STEPS}", self.search_steps),
            ));
        }
        self.flat_rates.validate()?;
        self.fee_schedules.validate()
    }
}
