//! Client-side aggregate summaries
//!
//! The API returns raw resources; these helpers compute the small rollups
//! the tool surface attaches to its results: star-rating distributions for
//! reviews, unit/proceeds rollups for sales TSV payloads, and weight
//! rankings for diagnostic signatures.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Star-rating distribution over a set of customer reviews
#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    /// Reviews that carried a rating
    pub total: u64,
    /// Mean rating, 0.0 when there are no rated reviews
    pub average: f64,
    /// Count per star value, keys "1" through "5"
    pub distribution: BTreeMap<String, u64>,
}

/// Distribution of `attributes.rating` across review resources
pub fn rating_summary(reviews: &[Value]) -> RatingSummary {
    let mut distribution: BTreeMap<String, u64> =
        (1..=5).map(|star| (star.to_string(), 0)).collect();
    let mut total = 0u64;
    let mut sum = 0u64;

    for review in reviews {
        let Some(rating) = review["attributes"]["rating"].as_u64() else {
            continue;
        };
        if !(1..=5).contains(&rating) {
            continue;
        }
        if let Some(count) = distribution.get_mut(&rating.to_string()) {
            *count += 1;
        }
        total += 1;
        sum += rating;
    }

    let average = if total == 0 {
        0.0
    } else {
        sum as f64 / total as f64
    };

    RatingSummary {
        total,
        average,
        distribution,
    }
}

/// Rollup of a sales report TSV payload
#[derive(Debug, Clone, Serialize)]
pub struct SalesRollup {
    /// Sum of the Units column
    pub total_units: i64,
    /// Sum of the Developer Proceeds column
    pub total_proceeds: f64,
    /// Number of data rows in the report
    pub row_count: usize,
    /// Per-product breakdown, largest unit count first
    pub by_product: Vec<ProductSales>,
}

/// One product's share of a sales report
#[derive(Debug, Clone, Serialize)]
pub struct ProductSales {
    /// SKU column, falling back to Title when absent
    pub product: String,
    pub units: i64,
    pub proceeds: f64,
}

/// Roll up a tab-separated sales report by product
///
/// Column positions vary between report types, so columns are located by
/// header name. Rows missing the located columns are skipped rather than
/// failing the whole rollup.
pub fn sales_rollup(report: &str) -> SalesRollup {
    let mut lines = report.lines();
    let header: Vec<&str> = lines.next().unwrap_or("").split('\t').collect();

    let find = |name: &str| header.iter().position(|column| *column == name);
    let units_col = find("Units");
    let proceeds_col = find("Developer Proceeds");
    let product_col = find("SKU").or_else(|| find("Title"));

    let mut total_units = 0i64;
    let mut total_proceeds = 0f64;
    let mut row_count = 0usize;
    let mut per_product: BTreeMap<String, (i64, f64)> = BTreeMap::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        row_count += 1;

        let units = units_col
            .and_then(|col| fields.get(col))
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(0);
        let proceeds = proceeds_col
            .and_then(|col| fields.get(col))
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        let product = product_col
            .and_then(|col| fields.get(col))
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| "(unknown)".to_string());

        total_units += units;
        total_proceeds += proceeds;
        let entry = per_product.entry(product).or_insert((0, 0.0));
        entry.0 += units;
        entry.1 += proceeds;
    }

    let mut by_product: Vec<ProductSales> = per_product
        .into_iter()
        .map(|(product, (units, proceeds))| ProductSales {
            product,
            units,
            proceeds,
        })
        .collect();
    by_product.sort_by(|a, b| b.units.cmp(&a.units));

    SalesRollup {
        total_units,
        total_proceeds,
        row_count,
        by_product,
    }
}

/// Diagnostic signatures ranked by weight
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRanking {
    /// Signatures in descending weight order
    pub ranked: Vec<RankedSignature>,
}

/// One diagnostic signature with its share of the total weight
#[derive(Debug, Clone, Serialize)]
pub struct RankedSignature {
    pub id: String,
    pub signature: String,
    pub weight: f64,
    /// Fraction of the summed weight, 0.0 when the total is zero
    pub share: f64,
}

/// Rank diagnostic signature resources by descending `attributes.weight`
pub fn diagnostic_ranking(signatures: &[Value]) -> DiagnosticRanking {
    let mut entries: Vec<(String, String, f64)> = signatures
        .iter()
        .map(|item| {
            (
                item["id"].as_str().unwrap_or_default().to_string(),
                item["attributes"]["signature"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                item["attributes"]["weight"].as_f64().unwrap_or(0.0),
            )
        })
        .collect();

    entries.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    let total: f64 = entries.iter().map(|(_, _, weight)| weight).sum();

    let ranked = entries
        .into_iter()
        .map(|(id, signature, weight)| RankedSignature {
            id,
            signature,
            weight,
            share: if total > 0.0 { weight / total } else { 0.0 },
        })
        .collect();

    DiagnosticRanking { ranked }
}
