//! Regional auction statistics: where the sale price rate comes from.
//!
//! The planner itself only sees a plain percentage. This module is the
//! collaborator that produces it from per-district court statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{PlannerError, Result};
use crate::types::{Money, Percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum Region {
    #[serde(alias = "서울")]
    Seoul,
    #[serde(alias = "부산")]
    Busan,
    #[serde(alias = "대구")]
    Daegu,
    #[serde(alias = "인천")]
    Incheon,
    #[serde(alias = "광주")]
    Gwangju,
    #[serde(alias = "대전")]
    Daejeon,
    #[serde(alias = "울산")]
    Ulsan,
    #[serde(alias = "세종")]
    Sejong,
    #[serde(alias = "경기")]
    Gyeonggi,
    #[serde(alias = "강원")]
    Gangwon,
    #[serde(alias = "충북")]
    Chungbuk,
    #[serde(alias = "충남")]
    Chungnam,
    #[serde(alias = "전북")]
    Jeonbuk,
    #[serde(alias = "전남")]
    Jeonnam,
    #[serde(alias = "경북")]
    Gyeongbuk,
    #[serde(alias = "경남")]
    Gyeongnam,
    #[serde(alias = "제주")]
    Jeju,
}

const REGION_NAMES: [(Region, &str, &str); 17] = [
    (Region::Seoul, "seoul", "서울"),
    (Region::Busan, "busan", "부산"),
    (Region::Daegu, "daegu", "대구"),
    (Region::Incheon, "incheon", "인천"),
    (Region::Gwangju, "gwangju", "광주"),
    (Region::Daejeon, "daejeon", "대전"),
    (Region::Ulsan, "ulsan", "울산"),
    (Region::Sejong, "sejong", "세종"),
    (Region::Gyeonggi, "gyeonggi", "경기"),
    (Region::Gangwon, "gangwon", "강원"),
    (Region::Chungbuk, "chungbuk", "충북"),
    (Region::Chungnam, "chungnam", "충남"),
    (Region::Jeonbuk, "jeonbuk", "전북"),
    (Region::Jeonnam, "jeonnam", "전남"),
    (Region::Gyeongbuk, "gyeongbuk", "경북"),
    (Region::Gyeongnam, "gyeongnam", "경남"),
    (Region::Jeju, "jeju", "제주"),
];

impl Region {
    pub fn all() -> impl Iterator<Item = Region> {
        REGION_NAMES.iter().map(|(region, _, _)| *region)
    }

    pub fn as_str(&self) -> &'static str {
        REGION_NAMES
            .iter()
            .find(|(region, _, _)| region == self)
            .map(|(_, name, _)| *name)
            .unwrap_or_default()
    }

    pub fn korean_name(&self) -> &'static str {
        REGION_NAMES
            .iter()
            .find(|(region, _, _)| region == self)
            .map(|(_, _, name)| *name)
            .unwrap_or_default()
    }
}

impl FromStr for Region {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        REGION_NAMES
            .iter()
            .find(|(_, english, korean)| english.eq_ignore_ascii_case(s) || *korean == s)
            .map(|(region, _, _)| *region)
            .ok_or_else(|| PlannerError::UnknownVariant {
                kind: "region",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Statistics tables
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct DistrictStats {
    #[serde(default)]
    pub auctions: u64,
    #[serde(default)]
    pub sales: u64,
    /// Sum of appraisals over the period, won.
    #[serde(default)]
    pub appraisal_value: Money,
    /// Sum of hammer prices over the period, won.
    #[serde(default)]
    pub sale_value: Money,
    /// Sold / auctioned, percent.
    #[serde(default)]
    pub sale_rate: Percent,
    /// Hammer price / appraisal, percent.
    #[serde(default)]
    pub sale_price_rate: Percent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTable {
    #[serde(default)]
    pub districts: BTreeMap<String, DistrictStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub total_auctions: u64,
    pub total_sales: u64,
    pub total_appraisal_value: Money,
    pub total_sale_value: Money,
    pub overall_sale_rate: Percent,
    pub overall_sale_price_rate: Percent,
}

impl RegionTable {
    pub fn summary(&self) -> RegionSummary {
        let mut s = RegionSummary {
            total_auctions: 0,
            total_sales: 0,
            total_appraisal_value: 0.0,
            total_sale_value: 0.0,
            overall_sale_rate: 0.0,
            overall_sale_price_rate: 0.0,
        };
        for d in self.districts.values() {
            s.total_auctions += d.auctions;
            s.total_sales += d.sales;
            s.total_appraisal_value += d.appraisal_value;
            s.total_sale_value += d.sale_value;
        }
        if s.total_auctions > 0 {
            s.overall_sale_rate = s.total_sales as f64 / s.total_auctions as f64 * 100.0;
        }
        if s.total_appraisal_value > 0.0 {
            s.overall_sale_price_rate = s.total_sale_value / s.total_appraisal_value * 100.0;
        }
        s
    }

    /// Exact key first, then the last word ("수원시 영통구" -> "영통구").
    fn district(&self, name: &str) -> Option<&DistrictStats> {
        let name = name.trim();
        self.districts.get(name).or_else(|| {
            let last = name.split_whitespace().last()?;
            self.districts.get(last)
        })
    }
}

/// Anything that can answer "what fraction of appraisal do sales fetch here".
pub trait SalePriceRateSource {
    fn sale_price_rate(&self, region: Region, district: &str) -> Option<Percent>;
}

/// Lookup with the planner's fallback applied.
pub fn resolve_sale_price_rate(
    source: &impl SalePriceRateSource,
    region: Region,
    district: &str,
    default_rate: Percent,
) -> Percent {
    source
        .sale_price_rate(region, district)
        .filter(|rate| *rate > 0.0)
        .unwrap_or(default_rate)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum MarketActivity {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum InvestmentGrade {
    StrongBuy,
    Buy,
    Neutral,
    Caution,
    Avoid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentOutlook {
    pub recommendation: InvestmentGrade,
    pub market_score: f64,
    pub activity: MarketActivity,
    /// `None` when the district has no statistics.
    pub sale_rate: Option<Percent>,
    pub sale_price_rate: Option<Percent>,
}

/// Region -> district statistics, as exported by the statistics pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionalStatistics {
    regions: BTreeMap<Region, RegionTable>,
}

impl RegionalStatistics {
    /// District keys are trimmed on load, matching `insert` and lookups.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut stats: Self = serde_json::from_str(json)?;
        for table in stats.regions.values_mut() {
            table.districts = std::mem::take(&mut table.districts)
                .into_iter()
                .map(|(name, d)| (name.trim().to_string(), d))
                .collect();
        }
        Ok(stats)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn insert(&mut self, region: Region, district: impl Into<String>, stats: DistrictStats) {
        self.regions
            .entry(region)
            .or_default()
            .districts
            .insert(district.into().trim().to_string(), stats);
    }

    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.regions.keys().copied()
    }

    pub fn district(&self, region: Region, district: &str) -> Option<&DistrictStats> {
        self.regions.get(&region)?.district(district)
    }

    pub fn summary(&self, region: Region) -> Option<RegionSummary> {
        self.regions.get(&region).map(RegionTable::summary)
    }

    /// Districts ranked by sale rate, best first.
    pub fn best_by_sale_rate(&self, region: Region, limit: usize) -> Vec<(String, Percent)> {
        self.ranked(region, limit, |d| d.sale_rate)
    }

    /// Districts ranked by sale price rate, best first.
    pub fn best_by_sale_price_rate(&self, region: Region, limit: usize) -> Vec<(String, Percent)> {
        self.ranked(region, limit, |d| d.sale_price_rate)
    }

    fn ranked(
        &self,
        region: Region,
        limit: usize,
        key: impl Fn(&DistrictStats) -> Percent,
    ) -> Vec<(String, Percent)> {
        let Some(table) = self.regions.get(&region) else {
            return Vec::new();
        };
        let mut ranked: Vec<_> = table
            .districts
            .iter()
            .map(|(name, stats)| (name.clone(), key(stats)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }

    /// 0-100; 50 when the district is unknown.
    pub fn market_condition_score(&self, region: Region, district: &str) -> f64 {
        let Some(stats) = self.district(region, district) else {
            return 50.0;
        };
        let sale_rate_score = (stats.sale_rate * 2.0).min(100.0);
        let score = sale_rate_score * 0.6 + stats.sale_price_rate * 0.4;
        (score * 10.0).round() / 10.0
    }

    pub fn competition_level(&self, region: Region, district: &str) -> MarketActivity {
        let Some(stats) = self.district(region, district) else {
            return MarketActivity::Moderate;
        };
        match stats.sale_rate {
            r if r >= 35.0 => MarketActivity::VeryHigh,
            r if r >= 25.0 => MarketActivity::High,
            r if r >= 15.0 => MarketActivity::Moderate,
            r if r >= 10.0 => MarketActivity::Low,
            _ => MarketActivity::VeryLow,
        }
    }

    pub fn investment_recommendation(&self, region: Region, district: &str) -> InvestmentOutlook {
        let Some(stats) = self.district(region, district) else {
            return InvestmentOutlook {
                recommendation: InvestmentGrade::Neutral,
                market_score: 50.0,
                activity: MarketActivity::Moderate,
                sale_rate: None,
                sale_price_rate: None,
            };
        };
        let market_score = self.market_condition_score(region, district);
        let recommendation = match market_score {
            s if s >= 80.0 => InvestmentGrade::StrongBuy,
            s if s >= 65.0 => InvestmentGrade::Buy,
            s if s >= 50.0 => InvestmentGrade::Neutral,
            s if s >= 35.0 => InvestmentGrade::Caution,
            _ => InvestmentGrade::Avoid,
        };
        InvestmentOutlook {
            recommendation,
            market_score,
            activity: self.competition_level(region, district),
            sale_rate: Some(stats.sale_rate),
            sale_price_rate: Some(stats.sale_price_rate),
        }
    }
}

impl SalePriceRateSource for RegionalStatistics {
    fn sale_price_rate(&self, region: Region, district: &str) -> Option<Percent> {
        let table = self.regions.get(&region)?;
        let district_rate = table
            .district(district)
            .map(|stats| stats.sale_price_rate)
            .filter(|rate| *rate > 0.0);
        if district_rate.is_some() {
            return district_rate;
        }
        let overall = table.summary().overall_sale_price_rate;
        (overall > 0.0).then_some(overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(sale_rate: f64, sale_price_rate: f64) -> DistrictStats {
        DistrictStats {
            auctions: 100,
            sales: sale_rate as u64,
            appraisal_value: 1_000_000_000.0,
            sale_value: 1_000_000_000.0 * sale_price_rate / 100.0,
            sale_rate,
            sale_price_rate,
        }
    }

    fn sample() -> RegionalStatistics {
        let mut s = RegionalStatistics::default();
        s.insert(Region::Seoul, "강남구", stats(40.0, 85.3));
        s.insert(Region::Seoul, "송파구", stats(30.0, 87.1));
        s.insert(Region::Gyeonggi, "영통구", stats(12.0, 78.5));
        s.insert(Region::Gyeonggi, "미사용구", stats(5.0, 0.0));
        s
    }

    #[test]
    fn regions_parse_from_either_name() {
        assert_eq!("서울".parse::<Region>().unwrap(), Region::Seoul);
        assert_eq!("Gyeonggi".parse::<Region>().unwrap(), Region::Gyeonggi);
        assert_eq!(" 제주 ".parse::<Region>().unwrap(), Region::Jeju);
        assert!("atlantis".parse::<Region>().is_err());
        assert_eq!(Region::all().count(), 17);
        assert_eq!(Region::Busan.korean_name(), "부산");
    }

    #[test]
    fn district_rate_wins_over_region_average() {
        let s = sample();
        assert_eq!(s.sale_price_rate(Region::Seoul, "강남구"), Some(85.3));
        assert_eq!(s.sale_price_rate(Region::Gyeonggi, "수원시 영통구"), Some(78.5));
    }

    #[test]
    fn zero_district_rate_falls_back_to_region() {
        let s = sample();
        let rate = s.sale_price_rate(Region::Gyeonggi, "미사용구").unwrap();
        // (785M + 0) / 2000M
        assert!((rate - 39.25).abs() < 1e-9, "{rate}");
        assert_eq!(s.sale_price_rate(Region::Busan, "해운대구"), None);
        assert_eq!(resolve_sale_price_rate(&s, Region::Busan, "해운대구", 80.0), 80.0);
    }

    #[test]
    fn market_score_and_tiers() {
        let s = sample();
        // min(80, 100) * 0.6 + 85.3 * 0.4 = 82.12 -> 82.1
        assert_eq!(s.market_condition_score(Region::Seoul, "강남구"), 82.1);
        assert_eq!(s.competition_level(Region::Seoul, "강남구"), MarketActivity::VeryHigh);
        assert_eq!(s.competition_level(Region::Gyeonggi, "영통구"), MarketActivity::Low);
        assert_eq!(
            s.investment_recommendation(Region::Seoul, "강남구").recommendation,
            InvestmentGrade::StrongBuy
        );

        let unknown = s.investment_recommendation(Region::Jeju, "제주시");
        assert_eq!(unknown.recommendation, InvestmentGrade::Neutral);
        assert_eq!(unknown.market_score, 50.0);
        assert_eq!(unknown.sale_rate, None);
    }

    #[test]
    fn ranking_is_descending_and_limited() {
        let s = sample();
        let ranked = s.best_by_sale_price_rate(Region::Seoul, 1);
        assert_eq!(ranked, vec![("송파구".to_string(), 87.1)]);
        let by_rate = s.best_by_sale_rate(Region::Seoul, 5);
        assert_eq!(by_rate[0].0, "강남구");
        assert!(s.best_by_sale_rate(Region::Ulsan, 5).is_empty());
    }

    #[test]
    fn loads_korean_keyed_json() {
        let json = r#"{"서울":{"districts":{"강남구":{"saleRate":40.0,"salePriceRate":85.3}}}}"#;
        let s = RegionalStatistics::from_json(json).unwrap();
        assert_eq!(s.sale_price_rate(Region::Seoul, "강남구"), Some(85.3));
        assert!(RegionalStatistics::from_json(r#"{"atlantis":{}}"#).is_err());
    }

    #[test]
    fn loaded_district_keys_are_trimmed() {
        let json = r#"{"서울":{"districts":{" 강남구 ":{"salePriceRate":85.3}}}}"#;
        let s = RegionalStatistics::from_json(json).unwrap();
        assert_eq!(s.sale_price_rate(Region::Seoul, "강남구"), Some(85.3));
        assert_eq!(s.sale_price_rate(Region::Seoul, "서울특별시 강남구"), Some(85.3));
        assert!(s.to_json().unwrap().contains("\"강남구\""));
    }

    #[test]
    fn summary_weights_by_value() {
        let s = sample();
        let summary = s.summary(Region::Seoul).unwrap();
        assert_eq!(summary.total_auctions, 200);
        assert!((summary.overall_sale_price_rate - 86.2).abs() < 1e-9);
    }
}
