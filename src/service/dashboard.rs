use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    model::{
        analytics::{Dimension, GroupMetric, Interval},
        dashboard::{Chart, ChartKind, ChartPoint, ChartSeries, Dashboard, DashboardPage, MetricCard, Table},
        models::Sale,
    },
    service::analytics::AnalyticsService,
};

/**
 * Number of sales in the data preview table.
 */
const PREVIEW_ROWS: usize = 5;

const NO_DATA_NOTICE: &str = "No sales data available for the selected filter";

/**
 * Formats an amount as US dollars, e.g. `$1,234.56`.
 */
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}${}.{fraction}", group_thousands(integer))
}

/**
 * Inserts a comma between every group of three digits.
 */
pub fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn format_optional(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), format_amount)
}

fn metric(label: &str, value: String) -> MetricCard {
    MetricCard { label: label.to_string(), value }
}

fn bar_chart(title: &str, dimension: Dimension, groups: &[GroupMetric]) -> Chart {
    Chart {
        kind: ChartKind::Bar,
        title: title.to_string(),
        x_label: dimension.label().to_string(),
        y_label: "Total Sales".to_string(),
        series: vec![ChartSeries {
            name: "Total Sales".to_string(),
            points: groups.iter().map(|group| ChartPoint { x: group.key.clone(), y: group.total_sales, size: None }).collect(),
        }],
    }
}

/**
 * Assembles dashboard pages from analytics results.
 */
#[derive(Debug, Clone)]
pub struct DashboardService {
    analytics: AnalyticsService,
}

impl DashboardService {
    /**
     * Creates a new instance of `DashboardService`.
     *
     * # Arguments
     * `analytics`: Analytics used to compute the page contents.
     */
    pub fn new(analytics: AnalyticsService) -> Self {
        DashboardService { analytics }
    }

    /**
     * Builds a dashboard page.
     *
     * # Arguments
     * `page`: Page to build.
     * `sales`: Filtered sales shown on the page.
     *
     * # Returns
     * The page contents. An empty sales set gives a page with zero values and a notice.
     */
    pub fn build(&self, page: DashboardPage, sales: &[Sale]) -> Dashboard {
        let mut dashboard = match page {
            DashboardPage::Overview => self.overview(sales),
            DashboardPage::Sales => self.sales(sales),
            DashboardPage::Products => self.products(sales),
            DashboardPage::Customers => self.customers(sales),
        };
        if sales.is_empty() {
            dashboard.notices.insert(0, NO_DATA_NOTICE.to_string());
        }
        debug!("Built {:?} dashboard with {} charts and {} tables", page, dashboard.charts.len(), dashboard.tables.len());
        dashboard
    }

    fn overview(&self, sales: &[Sale]) -> Dashboard {
        let mut dashboard = Dashboard::new(DashboardPage::Overview, "Sales Overview");
        let overall = self.analytics.overall_metrics(sales);
        dashboard.metrics = vec![
            metric("Total Sales", format_currency(overall.total_sales)),
            metric("Total Transactions", group_thousands(&overall.total_transactions.to_string())),
            metric("Average Order Value", format_currency(overall.average_order_value)),
            metric("Unique Products", overall.unique_categories.to_string()),
        ];
        dashboard.tables.push(Table {
            title: "Data Preview".to_string(),
            columns: ["Invoice ID", "Date", "Branch", "Category", "Unit Price", "Quantity", "Total", "Payment Method"].map(str::to_string).to_vec(),
            rows: sales
                .iter()
                .take(PREVIEW_ROWS)
                .map(|sale| {
                    vec![
                        sale.invoice_id.clone(),
                        sale.date.format("%Y-%m-%d").to_string(),
                        sale.branch.clone(),
                        sale.category.clone(),
                        format_amount(sale.unit_price),
                        sale.quantity.to_string(),
                        format_amount(sale.total),
                        sale.payment_method.clone(),
                    ]
                })
                .collect(),
        });
        let quality = self.analytics.data_quality(sales);
        dashboard.tables.push(Table {
            title: "Data Quality".to_string(),
            columns: vec!["Column".to_string(), "Missing Values".to_string()],
            rows: quality.missing_values.iter().map(|(column, missing)| vec![column.clone(), missing.to_string()]).collect(),
        });
        dashboard
    }

    fn sales(&self, sales: &[Sale]) -> Dashboard {
        let mut dashboard = Dashboard::new(DashboardPage::Sales, "Sales Analysis");
        let series = self.analytics.time_series(sales, Interval::Day);
        let day = |period: chrono::NaiveDate| period.format("%Y-%m-%d").to_string();
        dashboard.charts.push(Chart {
            kind: ChartKind::Line,
            title: "Daily Sales Trend".to_string(),
            x_label: "Date".to_string(),
            y_label: "Total Sales".to_string(),
            series: vec![
                ChartSeries {
                    name: "Total Sales".to_string(),
                    points: series.points.iter().map(|point| ChartPoint { x: day(point.period), y: point.total_sales, size: None }).collect(),
                },
                ChartSeries {
                    name: "Rolling Average".to_string(),
                    points: series.points.iter().filter_map(|point| point.rolling_average.map(|average| ChartPoint { x: day(point.period), y: average, size: None })).collect(),
                },
            ],
        });
        dashboard.charts.push(bar_chart("Total Sales by Product Category", Dimension::Category, &self.analytics.group_metrics(sales, Dimension::Category)));
        dashboard.charts.push(bar_chart("Total Sales by Branch", Dimension::Branch, &self.analytics.group_metrics(sales, Dimension::Branch)));
        dashboard.charts.push(bar_chart("Total Sales by Payment Method", Dimension::PaymentMethod, &self.analytics.group_metrics(sales, Dimension::PaymentMethod)));
        dashboard
    }

    fn products(&self, sales: &[Sale]) -> Dashboard {
        let mut dashboard = Dashboard::new(DashboardPage::Products, "Product Analysis");
        let groups = self.analytics.group_metrics(sales, Dimension::Category);
        dashboard.charts.push(Chart {
            kind: ChartKind::Scatter,
            title: "Product Performance: Quantity vs Total Sales".to_string(),
            x_label: "Total Quantity".to_string(),
            y_label: "Total Sales".to_string(),
            series: groups
                .iter()
                .map(|group| ChartSeries {
                    name: group.key.clone(),
                    points: vec![ChartPoint { x: group.total_quantity.to_string(), y: group.total_sales, size: Some(group.average_unit_price) }],
                })
                .collect(),
        });
        let rows = groups
            .iter()
            .map(|group| {
                let category_sales: Vec<Sale> = sales.iter().filter(|sale| sale.category == group.key).cloned().collect();
                let average_quantity = (Decimal::from(group.total_quantity) / Decimal::from(group.transaction_count.max(1))).round_dp(2);
                vec![
                    group.key.clone(),
                    format_amount(group.total_sales),
                    format_amount(group.average_order_value),
                    group.transaction_count.to_string(),
                    group.total_quantity.to_string(),
                    format_amount(average_quantity),
                    format_amount(group.average_unit_price),
                    format_optional(self.analytics.unit_price_std_dev(&category_sales)),
                ]
            })
            .collect();
        dashboard.tables.push(Table {
            title: "Category Metrics".to_string(),
            columns: ["Category", "Total Sales", "Average Sale", "Transactions", "Total Quantity", "Average Quantity", "Average Unit Price", "Unit Price Std Dev"].map(str::to_string).to_vec(),
            rows,
        });
        dashboard
    }

    fn customers(&self, sales: &[Sale]) -> Dashboard {
        let mut dashboard = Dashboard::new(DashboardPage::Customers, "Customer Analysis");
        if !sales.is_empty() && sales.iter().all(|sale| sale.customer_type.is_none()) {
            dashboard.notices.push("Customer type information is not available".to_string());
        }
        let customer_types = self.analytics.group_metrics(sales, Dimension::CustomerType);
        dashboard.tables.push(Table {
            title: "Customer Type Analysis".to_string(),
            columns: ["Customer Type", "Total Sales", "Average Sale", "Transactions", "Average Rating"].map(str::to_string).to_vec(),
            rows: customer_types
                .iter()
                .map(|group| vec![group.key.clone(), format_amount(group.total_sales), format_amount(group.average_order_value), group.transaction_count.to_string(), format_optional(group.average_rating)])
                .collect(),
        });
        dashboard.charts.push(Chart {
            kind: ChartKind::Pie,
            title: "Sales Distribution by Customer Type".to_string(),
            x_label: Dimension::CustomerType.label().to_string(),
            y_label: "Total Sales".to_string(),
            series: vec![ChartSeries {
                name: "Total Sales".to_string(),
                points: customer_types.iter().map(|group| ChartPoint { x: group.key.clone(), y: group.total_sales, size: None }).collect(),
            }],
        });
        let payment_methods = self.analytics.group_metrics(sales, Dimension::PaymentMethod);
        dashboard.tables.push(Table {
            title: "Payment Method Analysis".to_string(),
            columns: ["Payment Method", "Total Sales", "Transactions", "Share of Sales"].map(str::to_string).to_vec(),
            rows: payment_methods
                .iter()
                .map(|group| vec![group.key.clone(), format_amount(group.total_sales), group.transaction_count.to_string(), format!("{}%", format_amount(group.share_of_sales))])
                .collect(),
        });
        dashboard
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::service::analytics::test::sample_sales;

    fn service() -> DashboardService {
        DashboardService::new(AnalyticsService::new(7))
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::new(123456, 2)), "$1,234.56");
        assert_eq!(format_currency(Decimal::new(1234567891, 1)), "$123,456,789.10");
        assert_eq!(format_currency(Decimal::new(5, 1)), "$0.50");
        assert_eq!(format_currency(Decimal::new(-10005, 1)), "-$1,000.50");
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_overview_page() {
        let dashboard = service().build(DashboardPage::Overview, &sample_sales());
        assert_eq!(dashboard.page, DashboardPage::Overview);
        assert_eq!(dashboard.metrics.len(), 4);
        assert_eq!(dashboard.metrics[0], MetricCard { label: "Total Sales".to_string(), value: "$110.00".to_string() });
        assert_eq!(dashboard.metrics[2].value, "$36.67");
        assert_eq!(dashboard.metrics[3].value, "2");
        assert_eq!(dashboard.tables[0].title, "Data Preview");
        assert_eq!(dashboard.tables[0].rows.len(), 3);
        assert_eq!(dashboard.tables[0].rows[0][0], "INV001");
        assert_eq!(dashboard.tables[0].rows[0][6], "20.00");
        assert!(dashboard.tables[1].rows.contains(&vec!["city".to_string(), "1".to_string()]));
        assert!(dashboard.notices.is_empty());
    }

    #[test]
    fn test_sales_page() {
        let dashboard = service().build(DashboardPage::Sales, &sample_sales());
        let titles: Vec<&str> = dashboard.charts.iter().map(|chart| chart.title.as_str()).collect();
        assert_eq!(titles, vec!["Daily Sales Trend", "Total Sales by Product Category", "Total Sales by Branch", "Total Sales by Payment Method"]);
        assert_eq!(dashboard.charts[0].kind, ChartKind::Line);
        assert_eq!(dashboard.charts[0].series[0].points.len(), 4);
        assert!(dashboard.charts[0].series[1].points.is_empty());
        assert_eq!(dashboard.charts[2].series[0].points[0].x, "B");
    }

    #[test]
    fn test_products_page() {
        let dashboard = service().build(DashboardPage::Products, &sample_sales());
        assert_eq!(dashboard.charts[0].kind, ChartKind::Scatter);
        assert_eq!(dashboard.charts[0].series.len(), 2);
        assert_eq!(dashboard.charts[0].series[1].points[0].size, Some(Decimal::new(20, 0)));
        let food = dashboard.tables[0].rows.iter().find(|row| row[0] == "Food").unwrap();
        assert_eq!(food[5], "1.50");
        assert_eq!(food[7], "14.14");
        let electronics = dashboard.tables[0].rows.iter().find(|row| row[0] == "Electronics").unwrap();
        assert_eq!(electronics[7], "-");
    }

    #[test]
    fn test_customers_page() {
        let dashboard = service().build(DashboardPage::Customers, &sample_sales());
        assert_eq!(dashboard.tables[0].title, "Customer Type Analysis");
        assert_eq!(dashboard.tables[0].rows.len(), 3);
        assert_eq!(dashboard.charts[0].kind, ChartKind::Pie);
        assert_eq!(dashboard.tables[1].rows[0], vec!["Ewallet".to_string(), "60.00".to_string(), "1".to_string(), "54.55%".to_string()]);
        assert!(dashboard.notices.is_empty());
    }

    #[test]
    fn test_customers_page_without_customer_types() {
        let mut sales = sample_sales();
        sales.iter_mut().for_each(|sale| sale.customer_type = None);
        let dashboard = service().build(DashboardPage::Customers, &sales);
        assert_eq!(dashboard.notices, vec!["Customer type information is not available".to_string()]);
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = service().build(DashboardPage::Overview, &[]);
        assert_eq!(dashboard.metrics[0].value, "$0.00");
        assert!(dashboard.tables[0].rows.is_empty());
        assert_eq!(dashboard.notices, vec![NO_DATA_NOTICE.to_string()]);
    }
}
