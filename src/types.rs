use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::format_number;

/// Header names the loader requires, in file order.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Customer Name",
    "Product Name",
    "Category",
    "Sales Amount",
    "Quantity",
    "Date",
];

/// One untyped row exactly as it appears in the source CSV.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawRow {
    #[serde(rename = "Customer Name")]
    pub customer_name: Option<String>,
    #[serde(rename = "Product Name")]
    pub product_name: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Sales Amount")]
    pub sales_amount: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
}

/// A row after type coercion. `None` is the missing marker for every field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedRow {
    pub customer_name: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub sales_amount: Option<f64>,
    pub quantity: Option<f64>,
    pub date: Option<NaiveDate>,
}

/// A fully resolved row; no field can be missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    pub customer_name: String,
    pub product_name: String,
    pub category: String,
    pub sales_amount: f64,
    pub quantity: f64,
    pub date: NaiveDate,
}

/// A clean row carrying the derived `total_sales` figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub customer_name: String,
    pub product_name: String,
    pub category: String,
    pub sales_amount: f64,
    pub quantity: f64,
    pub date: NaiveDate,
    pub total_sales: f64,
}

/// Columns of the sales table, used for diagnostics and per-field counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CustomerName,
    ProductName,
    Category,
    SalesAmount,
    Quantity,
    Date,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::CustomerName,
        Field::ProductName,
        Field::Category,
        Field::SalesAmount,
        Field::Quantity,
        Field::Date,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Field::CustomerName => "Customer Name",
            Field::ProductName => "Product Name",
            Field::Category => "Category",
            Field::SalesAmount => "Sales Amount",
            Field::Quantity => "Quantity",
            Field::Date => "Date",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// Spend tier assigned to a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Segment {
    #[serde(rename = "Low Spender")]
    Low,
    #[serde(rename = "Medium Spender")]
    Medium,
    #[serde(rename = "High Spender")]
    High,
}

impl Segment {
    pub fn label(self) -> &'static str {
        match self {
            Segment::Low => "Low Spender",
            Segment::Medium => "Medium Spender",
            Segment::High => "High Spender",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn display_amount(v: &f64) -> String {
    format_number(*v, 2)
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CustomerSpend {
    #[serde(rename = "Customer Name")]
    #[tabled(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Total Spend")]
    #[tabled(rename = "Total Spend", display_with = "display_amount")]
    pub total_spend: f64,
    #[serde(rename = "Segment")]
    #[tabled(rename = "Segment")]
    pub segment: Segment,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct SegmentTotal {
    #[serde(rename = "Segment")]
    #[tabled(rename = "Segment")]
    pub segment: Segment,
    #[serde(rename = "Total Spend")]
    #[tabled(rename = "Total Spend", display_with = "display_amount")]
    pub total_spend: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategoryProfit {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Total Sales")]
    #[tabled(rename = "Total Sales", display_with = "display_amount")]
    pub total_sales: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ProductSales {
    #[serde(rename = "Product Name")]
    #[tabled(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Total Sales")]
    #[tabled(rename = "Total Sales", display_with = "display_amount")]
    pub total_sales: f64,
}

/// A record that shares its (customer, date, product) key with at least one other.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DuplicateRecord {
    #[serde(rename = "Row")]
    #[tabled(rename = "Row")]
    pub row: usize,
    #[serde(rename = "Customer Name")]
    #[tabled(rename = "Customer Name")]
    pub customer_name: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Product Name")]
    #[tabled(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Sales Amount")]
    #[tabled(rename = "Sales Amount", display_with = "display_amount")]
    pub sales_amount: f64,
    #[serde(rename = "Quantity")]
    #[tabled(rename = "Quantity", display_with = "display_amount")]
    pub quantity: f64,
    #[serde(rename = "GroupSize")]
    #[tabled(rename = "GroupSize")]
    pub group_size: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SummaryStats {
    pub total_records: usize,
    pub total_customers: usize,
    pub total_categories: usize,
    pub total_products: usize,
    pub duplicate_records: usize,
    pub total_sales: f64,
    pub low_thresh: f64,
    pub high_thresh: f64,
}
