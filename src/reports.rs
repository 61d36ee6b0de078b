use crate::types::{
    CategoryProfit, CustomerSpend, ProductSales, SalesRecord, Segment, SegmentTotal, SummaryStats,
};
use crate::util::quantile;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub const LOW_QUANTILE: f64 = 0.33;
pub const HIGH_QUANTILE: f64 = 0.66;
pub const UNDERPERFORMER_COUNT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerSegmentation {
    pub customers: Vec<CustomerSpend>,
    pub low_thresh: f64,
    pub high_thresh: f64,
    pub segments: Vec<SegmentTotal>,
}

/// Sum `value` per key, keeping keys in first-encountered order.
fn sum_by<'a, K, V>(records: &'a [SalesRecord], key: K, value: V) -> Vec<(String, f64)>
where
    K: Fn(&'a SalesRecord) -> &'a str,
    V: Fn(&SalesRecord) -> f64,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut sums: Vec<(String, f64)> = Vec::new();
    for r in records {
        let k = key(r);
        let slot = *index.entry(k).or_insert_with(|| {
            sums.push((k.to_string(), 0.0));
            sums.len() - 1
        });
        sums[slot].1 += value(r);
    }
    sums
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn ascending(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Classify a spend against the two cutoffs. Boundary values go to the lower tier.
pub fn classify(spend: f64, low_thresh: f64, high_thresh: f64) -> Segment {
    if spend <= low_thresh {
        Segment::Low
    } else if spend <= high_thresh {
        Segment::Medium
    } else {
        Segment::High
    }
}

pub fn segment_customers(data: &[SalesRecord]) -> CustomerSegmentation {
    let spend = sum_by(data, |r| r.customer_name.as_str(), |r| r.total_sales);
    if spend.is_empty() {
        return CustomerSegmentation::default();
    }

    let totals: Vec<f64> = spend.iter().map(|(_, v)| *v).collect();
    let low_thresh = quantile(&totals, LOW_QUANTILE);
    let high_thresh = quantile(&totals, HIGH_QUANTILE);

    let customers: Vec<CustomerSpend> = spend
        .into_iter()
        .map(|(customer_name, total_spend)| CustomerSpend {
            segment: classify(total_spend, low_thresh, high_thresh),
            customer_name,
            total_spend,
        })
        .collect();

    let mut segments: Vec<SegmentTotal> = Vec::new();
    for c in &customers {
        match segments.iter_mut().find(|s| s.segment == c.segment) {
            Some(s) => s.total_spend += c.total_spend,
            None => segments.push(SegmentTotal {
                segment: c.segment,
                total_spend: c.total_spend,
            }),
        }
    }
    segments.sort_by(|a, b| descending(a.total_spend, b.total_spend));

    CustomerSegmentation {
        customers,
        low_thresh,
        high_thresh,
        segments,
    }
}

pub fn profit_by_category(data: &[SalesRecord]) -> Vec<CategoryProfit> {
    let mut rows: Vec<CategoryProfit> = sum_by(data, |r| r.category.as_str(), |r| r.total_sales)
        .into_iter()
        .map(|(category, total_sales)| CategoryProfit {
            category,
            total_sales,
        })
        .collect();
    rows.sort_by(|a, b| descending(a.total_sales, b.total_sales));
    rows
}

/// The `limit` products with the lowest total sales, lowest first.
pub fn underperformers(data: &[SalesRecord], limit: usize) -> Vec<ProductSales> {
    let mut rows: Vec<ProductSales> = sum_by(data, |r| r.product_name.as_str(), |r| r.total_sales)
        .into_iter()
        .map(|(product_name, total_sales)| ProductSales {
            product_name,
            total_sales,
        })
        .collect();
    rows.sort_by(|a, b| ascending(a.total_sales, b.total_sales));
    rows.truncate(limit);
    rows
}

pub fn generate_summary(
    data: &[SalesRecord],
    segmentation: &CustomerSegmentation,
    duplicate_records: usize,
) -> SummaryStats {
    let categories: HashSet<&str> = data.iter().map(|r| r.category.as_str()).collect();
    let products: HashSet<&str> = data.iter().map(|r| r.product_name.as_str()).collect();
    SummaryStats {
        total_records: data.len(),
        total_customers: segmentation.customers.len(),
        total_categories: categories.len(),
        total_products: products.len(),
        duplicate_records,
        total_sales: data.iter().map(|r| r.total_sales).sum(),
        low_thresh: segmentation.low_thresh,
        high_thresh: segmentation.high_thresh,
    }
}
