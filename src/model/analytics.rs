use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::models::Sale;

/**
 * Key used for sales without a value in an optional grouping column.
 */
pub const UNKNOWN_KEY: &str = "Unknown";

/**
 * Column sales can be grouped by.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Branch,
    City,
    Category,
    PaymentMethod,
    CustomerType,
    Gender,
}

impl Dimension {
    /**
     * Grouping key of the sale for this dimension.
     */
    pub fn key<'a>(&self, sale: &'a Sale) -> &'a str {
        match self {
            Dimension::Branch => &sale.branch,
            Dimension::Category => &sale.category,
            Dimension::PaymentMethod => &sale.payment_method,
            Dimension::City => sale.city.as_deref().unwrap_or(UNKNOWN_KEY),
            Dimension::CustomerType => sale.customer_type.as_deref().unwrap_or(UNKNOWN_KEY),
            Dimension::Gender => sale.gender.as_deref().unwrap_or(UNKNOWN_KEY),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Branch => "Branch",
            Dimension::City => "City",
            Dimension::Category => "Product Category",
            Dimension::PaymentMethod => "Payment Method",
            Dimension::CustomerType => "Customer Type",
            Dimension::Gender => "Gender",
        }
    }
}

/**
 * Resampling interval of a time series.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "W")]
    Week,
    #[serde(rename = "M")]
    Month,
    #[serde(rename = "Q")]
    Quarter,
    #[serde(rename = "Y")]
    Year,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallMetrics {
    pub total_sales: Decimal,
    pub total_transactions: usize,
    pub average_order_value: Decimal,
    pub total_quantity: i64,
    pub unique_categories: usize,
    pub average_rating: Option<Decimal>,
}

/**
 * Aggregates of all sales sharing one key of a dimension.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetric {
    pub key: String,
    pub total_sales: Decimal,
    pub transaction_count: usize,
    pub average_order_value: Decimal,
    pub total_quantity: i64,
    pub average_unit_price: Decimal,
    pub average_rating: Option<Decimal>,
    /**
     * Percentage of all sales in the set.
     */
    pub share_of_sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub dimension: Dimension,
    pub groups: Vec<GroupMetric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /**
     * Last day of the bucket.
     */
    pub period: NaiveDate,
    pub total_sales: Decimal,
    pub transaction_count: usize,
    pub average_order_value: Decimal,
    pub total_quantity: i64,
    pub growth_rate: Option<Decimal>,
    pub rolling_average: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesSummary {
    pub total_sales: Decimal,
    pub average_period_sales: Decimal,
    pub max_period_sales: Decimal,
    pub min_period_sales: Decimal,
    pub total_transactions: usize,
    pub average_transactions_per_period: Decimal,
    pub average_order_value: Decimal,
    pub total_quantity: i64,
    pub average_growth_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub interval: Interval,
    pub points: Vec<TimeSeriesPoint>,
    pub summary: TimeSeriesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub category: String,
    pub total_sales: Decimal,
    pub total_quantity: i64,
    pub average_price: Decimal,
    pub transaction_count: usize,
    pub average_rating: Option<Decimal>,
    pub sales_per_transaction: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub total_products: usize,
    pub total_sales: Decimal,
    pub total_quantity: i64,
    pub average_price: Decimal,
    pub total_transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAnalysis {
    pub products: Vec<ProductPerformance>,
    pub summary: ProductSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegment {
    pub customer_type: String,
    pub gender: String,
    pub transaction_count: usize,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub unique_visits: usize,
    pub average_rating: Option<Decimal>,
    pub visit_frequency: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub total_segments: usize,
    pub total_transactions: usize,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub average_rating: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalysis {
    pub customers: Vec<CustomerSegment>,
    pub summary: CustomerSummary,
}

/**
 * Headline metrics together with the per category and per customer type breakdowns.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetrics {
    pub overall: OverallMetrics,
    pub products: Vec<GroupMetric>,
    pub customers: Vec<GroupMetric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub total_rows: usize,
    pub missing_values: BTreeMap<String, usize>,
}
