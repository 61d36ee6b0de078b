//! Cleaning passes over the in-memory sales table.
//!
//! Data flows `RawRow -> TypedRow -> CleanRecord -> SalesRecord`; each pass
//! is a plain row-wise function so the steps can be run and tested alone.
use crate::error::{PipelineError, Result};
use crate::types::{CleanRecord, DuplicateRecord, Field, RawRow, SalesRecord, TypedRow};
use crate::util::{average, clean_text, is_missing_token, mode, parse_date_safe, parse_f64_safe};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Substitute for absent or unreadable dates: "5/6/2005" read day/month/year.
pub fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2005, 6, 5).unwrap_or(NaiveDate::MIN)
}

/// Non-empty cells that failed type coercion, per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub coercion_failures: BTreeMap<Field, usize>,
}

/// How many cells each fallback filled, and with what.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    pub filled: BTreeMap<Field, usize>,
    pub customer_fill: Option<String>,
    pub category_fill: Option<String>,
    pub sales_amount_fill: Option<f64>,
    pub quantity_fill: Option<f64>,
}

/// Coerce every row's fields, turning unparseable values into missing markers.
pub fn normalize(rows: Vec<RawRow>) -> (Vec<TypedRow>, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let mut note_failure = |field: Field, raw: Option<&str>, parsed: bool| {
        if !parsed && raw.is_some_and(|s| !is_missing_token(s)) {
            *report.coercion_failures.entry(field).or_insert(0) += 1;
        }
    };

    let typed: Vec<TypedRow> = rows
        .into_iter()
        .map(|row| {
            let sales_amount = parse_f64_safe(row.sales_amount.as_deref());
            note_failure(Field::SalesAmount, row.sales_amount.as_deref(), sales_amount.is_some());
            let quantity = parse_f64_safe(row.quantity.as_deref());
            note_failure(Field::Quantity, row.quantity.as_deref(), quantity.is_some());
            let date = parse_date_safe(row.date.as_deref());
            note_failure(Field::Date, row.date.as_deref(), date.is_some());

            TypedRow {
                customer_name: clean_text(row.customer_name.as_deref()),
                product_name: clean_text(row.product_name.as_deref()),
                category: clean_text(row.category.as_deref()),
                sales_amount,
                quantity,
                date,
            }
        })
        .collect();

    for (field, count) in &report.coercion_failures {
        warn!("{} value(s) in '{}' could not be parsed and were marked missing", count, field);
    }
    (typed, report)
}

/// Fill every missing marker using the per-field fallback chains, then check
/// that nothing is left missing.
///
/// - Customer Name: column mode, else `"Unknown"`.
/// - Product Name: `"Unknown Product"`.
/// - Category: column mode, else `"Unknown"`.
/// - Sales Amount, Quantity: column mean. A column with no values at all has
///   no mean and stays missing.
/// - Date: the default date for anything absent or unreadable.
pub fn resolve_missing(mut rows: Vec<TypedRow>) -> Result<(Vec<CleanRecord>, ResolveReport)> {
    let mut report = ResolveReport::default();

    let customer_fill = mode(rows.iter().filter_map(|r| r.customer_name.as_deref()))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let category_fill =
        mode(rows.iter().filter_map(|r| r.category.as_deref())).unwrap_or_else(|| UNKNOWN.to_string());
    let amounts: Vec<f64> = rows.iter().filter_map(|r| r.sales_amount).collect();
    let quantities: Vec<f64> = rows.iter().filter_map(|r| r.quantity).collect();
    let sales_amount_fill = average(&amounts);
    let quantity_fill = average(&quantities);
    let product_fill = UNKNOWN_PRODUCT.to_string();
    let date_fill = default_date();

    for row in &mut rows {
        fill_with(&mut row.customer_name, Some(&customer_fill), Field::CustomerName, &mut report);
        fill_with(&mut row.product_name, Some(&product_fill), Field::ProductName, &mut report);
        fill_with(&mut row.category, Some(&category_fill), Field::Category, &mut report);
        fill_with(&mut row.sales_amount, sales_amount_fill.as_ref(), Field::SalesAmount, &mut report);
        fill_with(&mut row.quantity, quantity_fill.as_ref(), Field::Quantity, &mut report);
        fill_with(&mut row.date, Some(&date_fill), Field::Date, &mut report);
    }

    if report.filled.contains_key(&Field::CustomerName) {
        report.customer_fill = Some(customer_fill);
    }
    if report.filled.contains_key(&Field::Category) {
        report.category_fill = Some(category_fill);
    }
    if report.filled.contains_key(&Field::SalesAmount) {
        report.sales_amount_fill = sales_amount_fill;
    }
    if report.filled.contains_key(&Field::Quantity) {
        report.quantity_fill = quantity_fill;
    }
    for (field, count) in &report.filled {
        info!("Filled {} missing value(s) in '{}'", count, field);
    }

    let clean = ensure_complete(rows)?;
    Ok((clean, report))
}

fn fill_with<T: Clone>(slot: &mut Option<T>, fill: Option<&T>, field: Field, report: &mut ResolveReport) {
    if slot.is_none() {
        if let Some(value) = fill {
            *slot = Some(value.clone());
            *report.filled.entry(field).or_insert(0) += 1;
        }
    }
}

/// Convert typed rows into clean records, failing if any field is still missing.
pub fn ensure_complete(rows: Vec<TypedRow>) -> Result<Vec<CleanRecord>> {
    for field in Field::ALL {
        let missing = rows.iter().filter(|r| is_field_missing(r, field)).count();
        if missing > 0 {
            return Err(PipelineError::UnresolvedMissingValue { field, missing });
        }
    }

    let clean = rows
        .into_iter()
        .filter_map(|r| {
            Some(CleanRecord {
                customer_name: r.customer_name?,
                product_name: r.product_name?,
                category: r.category?,
                sales_amount: r.sales_amount?,
                quantity: r.quantity?,
                date: r.date?,
            })
        })
        .collect();
    Ok(clean)
}

fn is_field_missing(row: &TypedRow, field: Field) -> bool {
    match field {
        Field::CustomerName => row.customer_name.is_none(),
        Field::ProductName => row.product_name.is_none(),
        Field::Category => row.category.is_none(),
        Field::SalesAmount => row.sales_amount.is_none(),
        Field::Quantity => row.quantity.is_none(),
        Field::Date => row.date.is_none(),
    }
}

/// Every record whose (customer, date, product) key occurs more than once,
/// in table order. Records are reported, never removed.
pub fn detect_duplicates(records: &[CleanRecord]) -> Vec<DuplicateRecord> {
    let key = |r: &CleanRecord| (r.customer_name.clone(), r.date, r.product_name.clone());
    let mut group_sizes: HashMap<(String, NaiveDate, String), usize> = HashMap::new();
    for r in records {
        *group_sizes.entry(key(r)).or_insert(0) += 1;
    }

    let duplicates: Vec<DuplicateRecord> = records
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| {
            let size = group_sizes.get(&key(r)).copied().unwrap_or(0);
            (size > 1).then(|| DuplicateRecord {
                row: idx + 1,
                customer_name: r.customer_name.clone(),
                date: r.date,
                product_name: r.product_name.clone(),
                sales_amount: r.sales_amount,
                quantity: r.quantity,
                group_size: size,
            })
        })
        .collect();
    debug!("Found {} record(s) in duplicate groups", duplicates.len());
    duplicates
}

/// Remove records identical in every field, keeping the first occurrence.
pub fn drop_duplicates(records: Vec<CleanRecord>) -> Vec<CleanRecord> {
    let before = records.len();
    let mut seen: HashSet<(String, String, String, u64, u64, NaiveDate)> = HashSet::new();
    let kept: Vec<CleanRecord> = records
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.customer_name.clone(),
                r.product_name.clone(),
                r.category.clone(),
                r.sales_amount.to_bits(),
                r.quantity.to_bits(),
                r.date,
            ))
        })
        .collect();
    info!("Dropped {} exact duplicate record(s)", before - kept.len());
    kept
}

/// Attach `total_sales = quantity * sales_amount` to every record.
pub fn derive_total_sales(records: Vec<CleanRecord>) -> Vec<SalesRecord> {
    records
        .into_iter()
        .map(|r| SalesRecord {
            total_sales: r.quantity * r.sales_amount,
            customer_name: r.customer_name,
            product_name: r.product_name,
            category: r.category,
            sales_amount: r.sales_amount,
            quantity: r.quantity,
            date: r.date,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        customer: Option<&str>,
        product: Option<&str>,
        category: Option<&str>,
        amount: Option<&str>,
        quantity: Option<&str>,
        date: Option<&str>,
    ) -> RawRow {
        RawRow {
            customer_name: customer.map(String::from),
            product_name: product.map(String::from),
            category: category.map(String::from),
            sales_amount: amount.map(String::from),
            quantity: quantity.map(String::from),
            date: date.map(String::from),
        }
    }

    fn clean(customer: &str, product: &str, amount: f64, date: (i32, u32, u32)) -> CleanRecord {
        CleanRecord {
            customer_name: customer.to_string(),
            product_name: product.to_string(),
            category: "Tools".to_string(),
            sales_amount: amount,
            quantity: 1.0,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        }
    }

    #[test]
    fn normalize_marks_unparseable_values_missing() {
        let rows = vec![raw(Some(" A "), Some("Widget"), None, Some("Free"), Some("3"), Some("soon"))];
        let (typed, report) = normalize(rows);
        assert_eq!(typed[0].customer_name.as_deref(), Some("A"));
        assert_eq!(typed[0].sales_amount, None);
        assert_eq!(typed[0].quantity, Some(3.0));
        assert_eq!(typed[0].date, None);
        assert_eq!(report.coercion_failures.get(&Field::SalesAmount), Some(&1));
        assert_eq!(report.coercion_failures.get(&Field::Date), Some(&1));
        assert_eq!(report.coercion_failures.get(&Field::Quantity), None);
    }

    #[test]
    fn empty_cells_are_not_counted_as_coercion_failures() {
        let rows = vec![raw(Some("A"), Some("W"), Some("T"), Some(""), Some("NA"), None)];
        let (_, report) = normalize(rows);
        assert!(report.coercion_failures.is_empty());
    }

    #[test]
    fn resolve_applies_each_fallback_chain() {
        let rows = vec![
            raw(Some("A"), Some("Widget"), Some("Tools"), Some("Free"), Some("3"), Some("")),
            raw(Some("B"), None, Some("Toys"), Some("10"), None, Some("2024-03-01")),
            raw(None, Some("Gizmo"), None, Some("20"), Some("5"), Some("not a date")),
            raw(Some("B"), Some("Gizmo"), Some("Toys"), Some("30"), Some("1"), Some("1/2/2024")),
        ];
        let (typed, _) = normalize(rows);
        let (clean, report) = resolve_missing(typed).unwrap();

        assert_eq!(clean[0].sales_amount, 20.0);
        assert_eq!(clean[0].date, default_date());
        assert_eq!(clean[1].product_name, UNKNOWN_PRODUCT);
        assert_eq!(clean[1].quantity, 3.0);
        assert_eq!(clean[2].customer_name, "B");
        assert_eq!(clean[2].category, "Toys");
        assert_eq!(clean[2].date, default_date());
        assert_eq!(clean[3].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        assert_eq!(report.filled.get(&Field::Date), Some(&2));
        assert_eq!(report.customer_fill.as_deref(), Some("B"));
        assert_eq!(report.sales_amount_fill, Some(20.0));
    }

    #[test]
    fn all_missing_text_columns_fall_back_to_literals() {
        let rows = vec![raw(None, None, None, Some("1"), Some("1"), None)];
        let (typed, _) = normalize(rows);
        let (clean, _) = resolve_missing(typed).unwrap();
        assert_eq!(clean[0].customer_name, UNKNOWN);
        assert_eq!(clean[0].product_name, UNKNOWN_PRODUCT);
        assert_eq!(clean[0].category, UNKNOWN);
    }

    #[test]
    fn numeric_column_without_values_fails_completeness_check() {
        let rows = vec![
            raw(Some("A"), Some("W"), Some("T"), Some("Free"), Some("1"), None),
            raw(Some("B"), Some("W"), Some("T"), None, Some("2"), None),
        ];
        let (typed, _) = normalize(rows);
        match resolve_missing(typed) {
            Err(PipelineError::UnresolvedMissingValue { field, missing }) => {
                assert_eq!(field, Field::SalesAmount);
                assert_eq!(missing, 2);
            }
            other => panic!("expected unresolved missing value, got {other:?}"),
        }
    }

    #[test]
    fn mean_fill_of_huge_amounts_is_finite() {
        let rows = vec![
            raw(Some("A"), Some("W"), Some("T"), Some("1e308"), Some("1"), None),
            raw(Some("B"), Some("W"), Some("T"), Some("1e308"), Some("1"), None),
            raw(Some("C"), Some("W"), Some("T"), Some("Free"), Some("1"), None),
        ];
        let (typed, _) = normalize(rows);
        let (clean, report) = resolve_missing(typed).unwrap();
        assert_eq!(clean[2].sales_amount, 1e308);
        assert!(clean.iter().all(|r| r.sales_amount.is_finite()));
        assert_eq!(report.sales_amount_fill, Some(1e308));
    }

    #[test]
    fn duplicates_are_grouped_on_customer_date_product() {
        let records = vec![
            clean("A", "Widget", 10.0, (2024, 1, 1)),
            clean("A", "Widget", 99.0, (2024, 1, 1)),
            clean("A", "Gadget", 10.0, (2024, 1, 1)),
            clean("B", "Widget", 10.0, (2024, 1, 1)),
        ];
        let dups = detect_duplicates(&records);
        assert_eq!(dups.len(), 2);
        assert_eq!(dups[0].row, 1);
        assert_eq!(dups[1].row, 2);
        assert_eq!(dups[1].sales_amount, 99.0);
        assert!(dups.iter().all(|d| d.group_size == 2));
    }

    #[test]
    fn drop_duplicates_keeps_first_exact_copy() {
        let records = vec![
            clean("A", "Widget", 10.0, (2024, 1, 1)),
            clean("A", "Widget", 10.0, (2024, 1, 1)),
            clean("A", "Widget", 11.0, (2024, 1, 1)),
        ];
        let kept = drop_duplicates(records);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].sales_amount, 11.0);
    }

    #[test]
    fn total_sales_is_quantity_times_amount() {
        let mut r = clean("A", "Widget", 2.5, (2024, 1, 1));
        r.quantity = 4.0;
        let derived = derive_total_sales(vec![r]);
        assert_eq!(derived[0].total_sales, 10.0);
    }
}
