use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardPage {
    Overview,
    Sales,
    Products,
    Customers,
}

/**
 * Everything a front-end needs to draw one dashboard page.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub page: DashboardPage,
    pub title: String,
    pub metrics: Vec<MetricCard>,
    pub charts: Vec<Chart>,
    pub tables: Vec<Table>,
    /**
     * Informational messages, e.g. about columns without data.
     */
    pub notices: Vec<String>,
}

impl Dashboard {
    pub fn new(page: DashboardPage, title: &str) -> Self {
        Dashboard { page, title: title.to_string(), metrics: vec![], charts: vec![], tables: vec![], notices: vec![] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCard {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub x: String,
    pub y: Decimal,
    /**
     * Marker size, scatter charts only.
     */
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
