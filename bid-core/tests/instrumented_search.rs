#![cfg(feature = "instrument")]

use bid_core::instrument::{
    self, CANDIDATE_TARGET, EVALUATION_TARGET, SELECTION_TARGET, ScopedTrace, TraceSubscriber,
};
use bid_core::{
    AuctionCategory, BidPlanner, MarketCondition, PropertyFacts, StrategyInputs, Urgency,
};
use polars::prelude::*;
use tracing::subscriber::with_default;

fn villa() -> PropertyFacts {
    PropertyFacts {
        market_price: 250_000_000.0,
        appraisal_price: 260_000_000.0,
        minimum_bid: 182_000_000.0,
        renovation_cost: 8_000_000.0,
        target_profit_rate: 12.0,
    }
}

fn contested() -> StrategyInputs {
    StrategyInputs {
        competitor_count: 7,
        market_condition: MarketCondition::Hot,
        urgency: Urgency::High,
        auction_category: AuctionCategory::RealEstate,
        failed_round_count: 1,
        sale_rate_percent: 84.0,
    }
}

#[test]
fn search_records_one_row_per_candidate() {
    let planner = BidPlanner::default();
    instrument::clear();
    let result = with_default(TraceSubscriber, || {
        planner.find_optimal_bid(&villa(), &contested())
    })
    .unwrap();
    let log = instrument::drain();

    assert_eq!(log.rows(CANDIDATE_TARGET), 21);
    assert_eq!(log.rows(SELECTION_TARGET), 1);
    assert_eq!(log.rows(EVALUATION_TARGET), 0);

    let search = result.search.as_ref().unwrap();
    let table = log.table(CANDIDATE_TARGET).unwrap();
    let traced: Vec<f64> = table.f64_column("price").unwrap().to_vec();
    let returned: Vec<f64> = search.candidates.iter().map(|c| c.price).collect();
    assert_eq!(traced, returned, "traced prices should match returned candidates");

    let selection = log.table(SELECTION_TARGET).unwrap();
    assert_eq!(selection.u64_column("best_index"), Some(&[search.best_index as u64][..]));
}

#[test]
fn candidate_table_loads_into_polars() {
    let planner = BidPlanner::default();
    instrument::clear();
    let result = with_default(TraceSubscriber, || {
        planner.find_optimal_bid(&villa(), &contested())
    })
    .unwrap();
    let log = instrument::drain();

    let df = log.table(CANDIDATE_TARGET).unwrap().to_dataframe().unwrap();
    assert_eq!(df.height(), 21);

    let top = df
        .clone()
        .lazy()
        .select([col("score").max().alias("top")])
        .collect()
        .unwrap();
    let top_score = top.column("top").unwrap().f64().unwrap().get(0).unwrap();
    let best = &result.search.as_ref().unwrap().candidates;
    let expected = best.iter().map(|c| c.score).fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(top_score, expected);

    let probabilities = df.column("win_probability").unwrap().f64().unwrap();
    assert!(probabilities.into_iter().flatten().all(|p| (0.01..=0.99).contains(&p)));
}

#[test]
fn evaluate_records_a_single_row() {
    let planner = BidPlanner::default();
    instrument::clear();
    with_default(TraceSubscriber, || {
        planner
            .evaluate(200_000_000.0, &villa(), &contested())
            .unwrap();
    });
    let log = instrument::drain();

    assert_eq!(log.rows(EVALUATION_TARGET), 1);
    assert_eq!(log.rows(CANDIDATE_TARGET), 0);
    let table = log.table(EVALUATION_TARGET).unwrap();
    assert_eq!(table.f64_column("bid_price"), Some(&[200_000_000.0][..]));
}

#[test]
fn scoped_trace_writes_parquet_and_sentinel() {
    let parent = std::env::temp_dir().join("bid-core-traces");
    let dir = {
        let trace = ScopedTrace::new(&parent, "scoped search");
        let planner = BidPlanner::default();
        with_default(TraceSubscriber, || {
            planner.find_optimal_bid(&villa(), &contested()).unwrap();
        });
        trace.dir().to_path_buf()
    };

    assert!(dir.join(format!("{CANDIDATE_TARGET}.parquet")).exists());
    assert!(dir.join(format!("{SELECTION_TARGET}.parquet")).exists());
    assert!(dir.join("_ready").exists());
    let _ = std::fs::remove_dir_all(&dir);
}
