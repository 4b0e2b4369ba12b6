use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use tracing::debug;

use crate::model::{
    analytics::{
        Breakdown, CustomerAnalysis, CustomerSegment, CustomerSummary, DataQuality, Dimension, GroupMetric, Interval, OverallMetrics, ProductAnalysis, ProductPerformance, ProductSummary, SalesMetrics,
        TimeSeries, TimeSeriesPoint, TimeSeriesSummary, UNKNOWN_KEY,
    },
    models::Sale,
};

/**
 * Decimal places of averages and ratios.
 */
const AVERAGE_SCALE: u32 = 2;

/**
 * Running sums over a set of sales.
 */
#[derive(Debug, Clone, Default)]
struct Accumulator {
    total_sales: Decimal,
    transactions: usize,
    quantity: i64,
    unit_price_sum: Decimal,
    rating_sum: Decimal,
    rating_count: usize,
}

impl Accumulator {
    fn add(&mut self, sale: &Sale) {
        self.total_sales += sale.total;
        self.transactions += 1;
        self.quantity += i64::from(sale.quantity);
        self.unit_price_sum += sale.unit_price;
        if let Some(rating) = sale.rating {
            self.rating_sum += rating;
            self.rating_count += 1;
        }
    }

    fn average_order_value(&self) -> Decimal {
        mean(self.total_sales, self.transactions)
    }

    fn average_unit_price(&self) -> Decimal {
        mean(self.unit_price_sum, self.transactions)
    }

    fn average_rating(&self) -> Option<Decimal> {
        (self.rating_count > 0).then(|| mean(self.rating_sum, self.rating_count))
    }
}

/**
 * Mean rounded to two decimals, zero for an empty set.
 */
fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (sum / Decimal::from(count)).round_dp(AVERAGE_SCALE)
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part * Decimal::ONE_HUNDRED / whole).round_dp(AVERAGE_SCALE)
}

fn accumulate<'a, K, F>(sales: &'a [Sale], key: F) -> HashMap<K, Accumulator>
where
    K: Eq + std::hash::Hash,
    F: Fn(&'a Sale) -> K,
{
    let mut groups: HashMap<K, Accumulator> = HashMap::new();
    for sale in sales {
        groups.entry(key(sale)).or_default().add(sale);
    }
    groups
}

/**
 * Last day of the bucket the date falls in.
 *
 * Weeks end on Sunday, months, quarters and years on their last day.
 */
pub fn bucket_end(date: NaiveDate, interval: Interval) -> Option<NaiveDate> {
    match interval {
        Interval::Day => Some(date),
        Interval::Week => date.checked_add_signed(Duration::days(i64::from(6 - date.weekday().num_days_from_monday()))),
        Interval::Month => last_day_of_month(date.year(), date.month()),
        Interval::Quarter => last_day_of_month(date.year(), date.month0() / 3 * 3 + 3),
        Interval::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31),
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        return NaiveDate::from_ymd_opt(year, 12, 31);
    }
    NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()
}

/**
 * Computes descriptive aggregates over a set of sales. All operations are pure and work on data already loaded and filtered.
 */
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    rolling_window: usize,
}

impl AnalyticsService {
    /**
     * Creates a new instance of `AnalyticsService`.
     *
     * # Arguments
     * `rolling_window`: Number of buckets in the rolling sales average of a time series.
     */
    pub fn new(rolling_window: usize) -> Self {
        AnalyticsService { rolling_window: rolling_window.max(1) }
    }

    /**
     * Headline metrics of the sales set.
     */
    pub fn overall_metrics(&self, sales: &[Sale]) -> OverallMetrics {
        let mut accumulator = Accumulator::default();
        sales.iter().for_each(|sale| accumulator.add(sale));
        let unique_categories = sales.iter().map(|sale| sale.category.as_str()).collect::<HashSet<&str>>().len();
        OverallMetrics {
            total_sales: accumulator.total_sales,
            total_transactions: accumulator.transactions,
            average_order_value: accumulator.average_order_value(),
            total_quantity: accumulator.quantity,
            unique_categories,
            average_rating: accumulator.average_rating(),
        }
    }

    /**
     * Aggregates per key of a dimension.
     *
     * # Arguments
     * `sales`: Sales to aggregate.
     * `dimension`: Column to group by.
     *
     * # Returns
     * Groups ordered by total sales descending, ties ordered by key.
     */
    pub fn group_metrics(&self, sales: &[Sale], dimension: Dimension) -> Vec<GroupMetric> {
        let grand_total: Decimal = sales.iter().map(|sale| sale.total).sum();
        let mut groups: Vec<GroupMetric> = accumulate(sales, |sale| dimension.key(sale))
            .into_iter()
            .map(|(key, accumulator)| GroupMetric {
                key: key.to_string(),
                total_sales: accumulator.total_sales,
                transaction_count: accumulator.transactions,
                average_order_value: accumulator.average_order_value(),
                total_quantity: accumulator.quantity,
                average_unit_price: accumulator.average_unit_price(),
                average_rating: accumulator.average_rating(),
                share_of_sales: percentage(accumulator.total_sales, grand_total),
            })
            .collect();
        groups.sort_by(|first, second| second.total_sales.cmp(&first.total_sales).then_with(|| first.key.cmp(&second.key)));
        groups
    }

    pub fn breakdown(&self, sales: &[Sale], dimension: Dimension) -> Breakdown {
        Breakdown { dimension, groups: self.group_metrics(sales, dimension) }
    }

    /**
     * Resamples the sales into contiguous buckets of the given interval.
     *
     * Buckets without sales are included with zero values. The growth rate is the percent change of total sales
     * from the previous bucket and is absent for the first bucket and after an empty bucket. The rolling average is
     * absent until enough buckets are available.
     */
    pub fn time_series(&self, sales: &[Sale], interval: Interval) -> TimeSeries {
        let mut buckets: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
        for sale in sales {
            if let Some(period) = bucket_end(sale.date, interval) {
                buckets.entry(period).or_default().add(sale);
            }
        }
        let (Some(first), Some(last)) = (buckets.keys().next().copied(), buckets.keys().next_back().copied()) else {
            return TimeSeries { interval, points: vec![], summary: TimeSeriesSummary::default() };
        };

        let mut points: Vec<TimeSeriesPoint> = Vec::new();
        let mut period = first;
        while period <= last {
            let accumulator = buckets.remove(&period).unwrap_or_default();
            let growth_rate = points.last().and_then(|previous| {
                (!previous.total_sales.is_zero()).then(|| percentage(accumulator.total_sales - previous.total_sales, previous.total_sales))
            });
            let rolling_average = (points.len() + 1 >= self.rolling_window).then(|| {
                let window_sum: Decimal = points.iter().rev().take(self.rolling_window - 1).map(|point| point.total_sales).sum::<Decimal>() + accumulator.total_sales;
                mean(window_sum, self.rolling_window)
            });
            points.push(TimeSeriesPoint {
                period,
                total_sales: accumulator.total_sales,
                transaction_count: accumulator.transactions,
                average_order_value: accumulator.average_order_value(),
                total_quantity: accumulator.quantity,
                growth_rate,
                rolling_average,
            });
            let Some(next) = period.succ_opt().and_then(|date| bucket_end(date, interval)) else {
                break;
            };
            period = next;
        }
        debug!("Time series with {} buckets of interval {:?}", points.len(), interval);
        let summary = Self::time_series_summary(&points);
        TimeSeries { interval, points, summary }
    }

    fn time_series_summary(points: &[TimeSeriesPoint]) -> TimeSeriesSummary {
        let total_sales: Decimal = points.iter().map(|point| point.total_sales).sum();
        let total_transactions: usize = points.iter().map(|point| point.transaction_count).sum();
        let growth_rates: Vec<Decimal> = points.iter().filter_map(|point| point.growth_rate).collect();
        TimeSeriesSummary {
            total_sales,
            average_period_sales: mean(total_sales, points.len()),
            max_period_sales: points.iter().map(|point| point.total_sales).max().unwrap_or_default(),
            min_period_sales: points.iter().map(|point| point.total_sales).min().unwrap_or_default(),
            total_transactions,
            average_transactions_per_period: mean(Decimal::from(total_transactions), points.len()),
            average_order_value: mean(total_sales, total_transactions),
            total_quantity: points.iter().map(|point| point.total_quantity).sum(),
            average_growth_rate: (!growth_rates.is_empty()).then(|| mean(growth_rates.iter().sum(), growth_rates.len())),
        }
    }

    /**
     * Performance per product category.
     */
    pub fn product_analysis(&self, sales: &[Sale]) -> ProductAnalysis {
        let products: Vec<ProductPerformance> = self
            .group_metrics(sales, Dimension::Category)
            .into_iter()
            .map(|group| ProductPerformance {
                category: group.key,
                total_sales: group.total_sales,
                total_quantity: group.total_quantity,
                average_price: group.average_unit_price,
                transaction_count: group.transaction_count,
                average_rating: group.average_rating,
                sales_per_transaction: group.average_order_value,
            })
            .collect();
        let summary = ProductSummary {
            total_products: products.len(),
            total_sales: products.iter().map(|product| product.total_sales).sum(),
            total_quantity: products.iter().map(|product| product.total_quantity).sum(),
            average_price: mean(products.iter().map(|product| product.average_price).sum(), products.len()),
            total_transactions: products.iter().map(|product| product.transaction_count).sum(),
        };
        ProductAnalysis { products, summary }
    }

    /**
     * Behaviour per customer segment, a segment being a combination of customer type and gender.
     */
    pub fn customer_analysis(&self, sales: &[Sale]) -> CustomerAnalysis {
        let segment_key = |sale: &Sale| (sale.customer_type.clone().unwrap_or_else(|| UNKNOWN_KEY.to_string()), sale.gender.clone().unwrap_or_else(|| UNKNOWN_KEY.to_string()));
        let mut visits: HashMap<(String, String), HashSet<&str>> = HashMap::new();
        for sale in sales {
            visits.entry(segment_key(sale)).or_default().insert(sale.invoice_id.as_str());
        }
        let mut customers: Vec<CustomerSegment> = accumulate(sales, segment_key)
            .into_iter()
            .map(|(key, accumulator)| {
                let unique_visits = visits.get(&key).map_or(0, HashSet::len);
                CustomerSegment {
                    transaction_count: accumulator.transactions,
                    total_spent: accumulator.total_sales,
                    average_order_value: accumulator.average_order_value(),
                    unique_visits,
                    average_rating: accumulator.average_rating(),
                    visit_frequency: mean(Decimal::from(accumulator.transactions), unique_visits),
                    customer_type: key.0,
                    gender: key.1,
                }
            })
            .collect();
        customers.sort_by(|first, second| {
            second.total_spent.cmp(&first.total_spent).then_with(|| first.customer_type.cmp(&second.customer_type)).then_with(|| first.gender.cmp(&second.gender))
        });
        let ratings: Vec<Decimal> = customers.iter().filter_map(|customer| customer.average_rating).collect();
        let summary = CustomerSummary {
            total_segments: customers.len(),
            total_transactions: customers.iter().map(|customer| customer.transaction_count).sum(),
            total_revenue: customers.iter().map(|customer| customer.total_spent).sum(),
            average_order_value: mean(customers.iter().map(|customer| customer.average_order_value).sum(), customers.len()),
            average_rating: (!ratings.is_empty()).then(|| mean(ratings.iter().sum(), ratings.len())),
        };
        CustomerAnalysis { customers, summary }
    }

    /**
     * Overall metrics with the per category and per customer type breakdowns.
     */
    pub fn sales_metrics(&self, sales: &[Sale]) -> SalesMetrics {
        SalesMetrics { overall: self.overall_metrics(sales), products: self.group_metrics(sales, Dimension::Category), customers: self.group_metrics(sales, Dimension::CustomerType) }
    }

    /**
     * Missing value counts of the optional columns.
     */
    pub fn data_quality(&self, sales: &[Sale]) -> DataQuality {
        let count = |missing: fn(&Sale) -> bool| sales.iter().filter(|sale| missing(sale)).count();
        let missing_values = BTreeMap::from([
            ("city".to_string(), count(|sale| sale.city.is_none())),
            ("customer_type".to_string(), count(|sale| sale.customer_type.is_none())),
            ("gender".to_string(), count(|sale| sale.gender.is_none())),
            ("time".to_string(), count(|sale| sale.time.is_none())),
            ("cogs".to_string(), count(|sale| sale.cogs.is_none())),
            ("gross_margin_percentage".to_string(), count(|sale| sale.gross_margin_percentage.is_none())),
            ("gross_income".to_string(), count(|sale| sale.gross_income.is_none())),
            ("rating".to_string(), count(|sale| sale.rating.is_none())),
        ]);
        DataQuality { total_rows: sales.len(), missing_values }
    }

    /**
     * Sample standard deviation of the unit price, absent with fewer than two sales.
     */
    pub fn unit_price_std_dev(&self, sales: &[Sale]) -> Option<Decimal> {
        if sales.len() < 2 {
            return None;
        }
        let count = Decimal::from(sales.len());
        let average = sales.iter().map(|sale| sale.unit_price).sum::<Decimal>() / count;
        let squares: Decimal = sales.iter().map(|sale| (sale.unit_price - average).powi(2)).sum();
        (squares / (count - Decimal::ONE)).sqrt().map(|deviation| deviation.round_dp(AVERAGE_SCALE))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use chrono::NaiveTime;

    use super::*;

    pub(crate) fn sale(invoice_id: &str, branch: &str, category: &str, unit_price: i64, quantity: i32, date: &str) -> Sale {
        let unit_price = Decimal::new(unit_price, 2);
        Sale {
            invoice_id: invoice_id.to_string(),
            branch: branch.to_string(),
            city: Some("Yangon".to_string()),
            customer_type: Some("Member".to_string()),
            gender: Some("Female".to_string()),
            category: category.to_string(),
            unit_price,
            quantity,
            total: unit_price * Decimal::from(quantity),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0),
            payment_method: "Cash".to_string(),
            cogs: None,
            gross_margin_percentage: None,
            gross_income: None,
            rating: Some(Decimal::new(80, 1)),
        }
    }

    pub(crate) fn sample_sales() -> Vec<Sale> {
        let mut second = sale("INV002", "B", "Electronics", 2000, 3, "2023-01-02");
        second.customer_type = Some("Normal".to_string());
        second.gender = Some("Male".to_string());
        second.payment_method = "Ewallet".to_string();
        second.rating = None;
        let mut third = sale("INV003", "A", "Food", 3000, 1, "2023-01-04");
        third.city = None;
        third.customer_type = None;
        third.rating = Some(Decimal::new(60, 1));
        vec![sale("INV001", "A", "Food", 1000, 2, "2023-01-01"), second, third]
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_overall_metrics() {
        let metrics = AnalyticsService::new(7).overall_metrics(&sample_sales());
        assert_eq!(metrics.total_sales, Decimal::new(110, 0));
        assert_eq!(metrics.total_transactions, 3);
        assert_eq!(metrics.average_order_value, Decimal::new(3667, 2));
        assert_eq!(metrics.total_quantity, 6);
        assert_eq!(metrics.unique_categories, 2);
        assert_eq!(metrics.average_rating, Some(Decimal::new(7, 0)));
    }

    #[test]
    fn test_overall_metrics_empty() {
        let metrics = AnalyticsService::new(7).overall_metrics(&[]);
        assert_eq!(metrics.total_sales, Decimal::ZERO);
        assert_eq!(metrics.total_transactions, 0);
        assert_eq!(metrics.average_order_value, Decimal::ZERO);
        assert_eq!(metrics.average_rating, None);
    }

    #[test]
    fn test_group_metrics_by_branch() {
        let groups = AnalyticsService::new(7).group_metrics(&sample_sales(), Dimension::Branch);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "B");
        assert_eq!(groups[0].total_sales, Decimal::new(60, 0));
        assert_eq!(groups[0].share_of_sales, Decimal::new(5455, 2));
        assert_eq!(groups[1].key, "A");
        assert_eq!(groups[1].total_sales, Decimal::new(50, 0));
        assert_eq!(groups[1].transaction_count, 2);
        assert_eq!(groups[1].average_order_value, Decimal::new(25, 0));
        assert_eq!(groups[1].average_unit_price, Decimal::new(20, 0));
        assert_eq!(groups[1].average_rating, Some(Decimal::new(7, 0)));
    }

    #[test]
    fn test_group_metrics_ties_and_unknown_keys() {
        let sales = vec![sale("INV001", "B", "Food", 1000, 1, "2023-01-01"), sale("INV002", "A", "Food", 1000, 1, "2023-01-01")];
        let groups = AnalyticsService::new(7).group_metrics(&sales, Dimension::Branch);
        assert_eq!(groups.iter().map(|group| group.key.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);

        let groups = AnalyticsService::new(7).group_metrics(&sample_sales(), Dimension::City);
        assert!(groups.iter().any(|group| group.key == UNKNOWN_KEY && group.transaction_count == 1));
    }

    #[test]
    fn test_bucket_end() {
        let wednesday = date("2023-02-15");
        assert_eq!(bucket_end(wednesday, Interval::Day), Some(wednesday));
        assert_eq!(bucket_end(wednesday, Interval::Week), Some(date("2023-02-19")));
        assert_eq!(bucket_end(date("2023-02-19"), Interval::Week), Some(date("2023-02-19")));
        assert_eq!(bucket_end(wednesday, Interval::Month), Some(date("2023-02-28")));
        assert_eq!(bucket_end(date("2024-02-01"), Interval::Month), Some(date("2024-02-29")));
        assert_eq!(bucket_end(wednesday, Interval::Quarter), Some(date("2023-03-31")));
        assert_eq!(bucket_end(date("2023-12-01"), Interval::Quarter), Some(date("2023-12-31")));
        assert_eq!(bucket_end(wednesday, Interval::Year), Some(date("2023-12-31")));
    }

    #[test]
    fn test_daily_time_series_fills_gaps() {
        let series = AnalyticsService::new(2).time_series(&sample_sales(), Interval::Day);
        let periods: Vec<NaiveDate> = series.points.iter().map(|point| point.period).collect();
        assert_eq!(periods, vec![date("2023-01-01"), date("2023-01-02"), date("2023-01-03"), date("2023-01-04")]);
        let totals: Vec<Decimal> = series.points.iter().map(|point| point.total_sales).collect();
        assert_eq!(totals, vec![Decimal::new(20, 0), Decimal::new(60, 0), Decimal::ZERO, Decimal::new(30, 0)]);

        assert_eq!(series.points[0].growth_rate, None);
        assert_eq!(series.points[1].growth_rate, Some(Decimal::new(200, 0)));
        assert_eq!(series.points[2].growth_rate, Some(Decimal::new(-100, 0)));
        assert_eq!(series.points[3].growth_rate, None);

        assert_eq!(series.points[0].rolling_average, None);
        assert_eq!(series.points[1].rolling_average, Some(Decimal::new(40, 0)));
        assert_eq!(series.points[2].rolling_average, Some(Decimal::new(30, 0)));
        assert_eq!(series.points[3].rolling_average, Some(Decimal::new(15, 0)));
        assert_eq!(series.points[2].average_order_value, Decimal::ZERO);
    }

    #[test]
    fn test_time_series_summary() {
        let series = AnalyticsService::new(7).time_series(&sample_sales(), Interval::Day);
        assert!(series.points.iter().all(|point| point.rolling_average.is_none()));
        let summary = series.summary;
        assert_eq!(summary.total_sales, Decimal::new(110, 0));
        assert_eq!(summary.average_period_sales, Decimal::new(2750, 2));
        assert_eq!(summary.max_period_sales, Decimal::new(60, 0));
        assert_eq!(summary.min_period_sales, Decimal::ZERO);
        assert_eq!(summary.total_transactions, 3);
        assert_eq!(summary.average_transactions_per_period, Decimal::new(75, 2));
        assert_eq!(summary.average_order_value, Decimal::new(3667, 2));
        assert_eq!(summary.total_quantity, 6);
        assert_eq!(summary.average_growth_rate, Some(Decimal::new(50, 0)));
    }

    #[test]
    fn test_monthly_time_series() {
        let sales = vec![sale("INV001", "A", "Food", 1000, 1, "2023-01-15"), sale("INV002", "A", "Food", 1500, 2, "2023-03-02")];
        let series = AnalyticsService::new(7).time_series(&sales, Interval::Month);
        let periods: Vec<NaiveDate> = series.points.iter().map(|point| point.period).collect();
        assert_eq!(periods, vec![date("2023-01-31"), date("2023-02-28"), date("2023-03-31")]);
        assert_eq!(series.points[1].transaction_count, 0);
        assert_eq!(series.points[2].total_sales, Decimal::new(30, 0));
    }

    #[test]
    fn test_time_series_empty() {
        let series = AnalyticsService::new(7).time_series(&[], Interval::Week);
        assert!(series.points.is_empty());
        assert_eq!(series.summary, TimeSeriesSummary::default());
    }

    #[test]
    fn test_product_analysis() {
        let analysis = AnalyticsService::new(7).product_analysis(&sample_sales());
        assert_eq!(analysis.products.len(), 2);
        assert_eq!(analysis.products[0].category, "Electronics");
        assert_eq!(analysis.products[0].sales_per_transaction, Decimal::new(60, 0));
        assert_eq!(analysis.products[1].category, "Food");
        assert_eq!(analysis.products[1].total_quantity, 3);
        assert_eq!(analysis.products[1].average_price, Decimal::new(20, 0));
        assert_eq!(analysis.summary.total_products, 2);
        assert_eq!(analysis.summary.total_sales, Decimal::new(110, 0));
        assert_eq!(analysis.summary.total_quantity, 6);
        assert_eq!(analysis.summary.average_price, Decimal::new(20, 0));
        assert_eq!(analysis.summary.total_transactions, 3);
    }

    #[test]
    fn test_customer_analysis() {
        let mut sales = sample_sales();
        sales.push(sale("INV001", "A", "Food", 500, 2, "2023-01-05"));
        let analysis = AnalyticsService::new(7).customer_analysis(&sales);
        assert_eq!(analysis.customers.len(), 3);
        let member = analysis.customers.iter().find(|customer| customer.customer_type == "Member").unwrap();
        assert_eq!(member.gender, "Female");
        assert_eq!(member.transaction_count, 2);
        assert_eq!(member.unique_visits, 1);
        assert_eq!(member.visit_frequency, Decimal::new(2, 0));
        assert_eq!(member.total_spent, Decimal::new(30, 0));
        let unknown = analysis.customers.iter().find(|customer| customer.customer_type == UNKNOWN_KEY).unwrap();
        assert_eq!(unknown.total_spent, Decimal::new(30, 0));
        assert_eq!(analysis.summary.total_segments, 3);
        assert_eq!(analysis.summary.total_transactions, 4);
        assert_eq!(analysis.summary.total_revenue, Decimal::new(120, 0));
        assert_eq!(analysis.summary.average_order_value, Decimal::new(35, 0));
        assert_eq!(analysis.summary.average_rating, Some(Decimal::new(7, 0)));
    }

    #[test]
    fn test_sales_metrics_and_breakdown() {
        let service = AnalyticsService::new(7);
        let metrics = service.sales_metrics(&sample_sales());
        assert_eq!(metrics.overall.total_transactions, 3);
        assert_eq!(metrics.products.len(), 2);
        assert_eq!(metrics.customers.len(), 3);
        let breakdown = service.breakdown(&sample_sales(), Dimension::PaymentMethod);
        assert_eq!(breakdown.dimension, Dimension::PaymentMethod);
        assert_eq!(breakdown.groups[0].key, "Ewallet");
    }

    #[test]
    fn test_data_quality() {
        let quality = AnalyticsService::new(7).data_quality(&sample_sales());
        assert_eq!(quality.total_rows, 3);
        assert_eq!(quality.missing_values.get("city"), Some(&1));
        assert_eq!(quality.missing_values.get("rating"), Some(&1));
        assert_eq!(quality.missing_values.get("cogs"), Some(&3));
        assert_eq!(quality.missing_values.get("time"), Some(&0));
    }

    #[test]
    fn test_unit_price_std_dev() {
        let service = AnalyticsService::new(7);
        assert_eq!(service.unit_price_std_dev(&sample_sales()), Some(Decimal::new(10, 0)));
        assert_eq!(service.unit_price_std_dev(&sample_sales()[..1]), None);
    }
}
