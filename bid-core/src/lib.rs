use wasm_bindgen::prelude::*;

mod advice;
mod assessment;
mod book;
mod config;
mod costs;
mod error;
mod planner;
mod region;
mod types;

pub mod probability;

pub use advice::*;
pub use assessment::*;
pub use book::*;
pub use config::*;
pub use costs::*;
pub use error::{PlannerError, Result};
pub use planner::*;
pub use region::*;
pub use types::*;

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API
// ============================================================================

/// Browser-facing planner: the calculator plus the shell's in-memory state
/// (loaded statistics and saved properties).
#[wasm_bindgen(js_name = BidPlanner)]
pub struct WasmPlanner {
    planner: BidPlanner,
    statistics: RegionalStatistics,
    book: PropertyBook,
}

#[wasm_bindgen(js_class = BidPlanner)]
impl WasmPlanner {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();
        Self::with_planner(BidPlanner::default())
    }

    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: PlannerConfig) -> std::result::Result<WasmPlanner, JsError> {
        console_error_panic_hook::set_once();
        Ok(Self::with_planner(BidPlanner::new(config)?))
    }

    pub fn config(&self) -> PlannerConfig {
        self.planner.config().clone()
    }

    pub fn evaluate(
        &self,
        bid_price: f64,
        facts: PropertyFacts,
        strategy: StrategyInputs,
    ) -> std::result::Result<SimulationResult, JsError> {
        Ok(self.planner.evaluate(bid_price, &facts, &strategy)?)
    }

    #[wasm_bindgen(js_name = findOptimalBid)]
    pub fn find_optimal_bid(
        &self,
        facts: PropertyFacts,
        strategy: StrategyInputs,
    ) -> std::result::Result<SimulationResult, JsError> {
        Ok(self.planner.find_optimal_bid(&facts, &strategy)?)
    }

    /// Cost breakdown for one price. `category` is the form's raw string.
    pub fn costs(
        &self,
        regime: FeeRegime,
        bid_price: f64,
        category: &str,
        renovation_cost: f64,
    ) -> std::result::Result<CostBreakdown, JsError> {
        Ok(self
            .planner
            .cost_calculator()
            .compute_named(regime, bid_price, category, renovation_cost)?)
    }

    /// Replace the regional statistics table.
    #[wasm_bindgen(js_name = loadStatistics)]
    pub fn load_statistics(&mut self, json: &str) -> std::result::Result<(), JsError> {
        self.statistics = RegionalStatistics::from_json(json)?;
        Ok(())
    }

    /// Sale price rate for a district, with the configured default applied.
    #[wasm_bindgen(js_name = salePriceRate)]
    pub fn sale_price_rate(&self, region: &str, district: &str) -> std::result::Result<f64, JsError> {
        let region: Region = region.parse()?;
        Ok(resolve_sale_price_rate(
            &self.statistics,
            region,
            district,
            self.planner.config().default_sale_price_rate,
        ))
    }

    #[wasm_bindgen(js_name = investmentRecommendation)]
    pub fn investment_recommendation(
        &self,
        region: &str,
        district: &str,
    ) -> std::result::Result<InvestmentOutlook, JsError> {
        let region: Region = region.parse()?;
        Ok(self.statistics.investment_recommendation(region, district))
    }

    // ------------------------------------------------------------------------
    // Saved properties
    // ------------------------------------------------------------------------

    #[wasm_bindgen(js_name = addProperty)]
    pub fn add_property(&mut self, record: PropertyRecord) -> u64 {
        self.book.insert(record).to_u64()
    }

    #[wasm_bindgen(js_name = updateProperty)]
    pub fn update_property(&mut self, id: u64, record: PropertyRecord) -> std::result::Result<(), JsError> {
        Ok(self.book.update(PropertyId::from_u64(id), record)?)
    }

    #[wasm_bindgen(js_name = removeProperty)]
    pub fn remove_property(&mut self, id: u64) -> std::result::Result<PropertyRecord, JsError> {
        Ok(self.book.remove(PropertyId::from_u64(id))?)
    }

    #[wasm_bindgen(js_name = getProperty)]
    pub fn get_property(&self, id: u64) -> Option<PropertyRecord> {
        self.book.get(PropertyId::from_u64(id)).cloned()
    }

    /// Newest first; a non-empty `query` filters by case number, location or court.
    #[wasm_bindgen(js_name = listProperties)]
    pub fn list_properties(&self, query: Option<String>) -> std::result::Result<js_sys::Array, JsError> {
        let entries = match query {
            Some(q) => self.book.search(&q),
            None => self.book.list(),
        };
        let array = js_sys::Array::new();
        for entry in &entries {
            array.push(&serde_wasm_bindgen::to_value(entry)?);
        }
        Ok(array)
    }

    #[wasm_bindgen(js_name = exportProperties)]
    pub fn export_properties(&self) -> std::result::Result<String, JsError> {
        Ok(self.book.to_json()?)
    }

    /// Replace the saved properties with a previously exported list.
    #[wasm_bindgen(js_name = importProperties)]
    pub fn import_properties(&mut self, json: &str) -> std::result::Result<usize, JsError> {
        self.book = PropertyBook::from_json(json)?;
        Ok(self.book.len())
    }
}

impl WasmPlanner {
    fn with_planner(planner: BidPlanner) -> Self {
        Self {
            planner,
            statistics: RegionalStatistics::default(),
            book: PropertyBook::new(),
        }
    }
}

impl Default for WasmPlanner {
    fn default() -> Self {
        Self::new()
    }
}
