use std::collections::HashSet;
use std::str::FromStr;

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, instrument, warn};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    config::ProcessingConfig,
    models::{CleaningReport, ExpectationResult, Sale, ValidationReport},
};

/**
 * Columns every uploaded file must contain (after normalization).
 */
const REQUIRED_COLUMNS: [&str; 7] = ["invoice_id", "branch", "category", "unit_price", "quantity", "date", "payment_method"];

/**
 * Cell contents treated as a missing value (compared lowercase).
 */
const MISSING_MARKERS: [&str; 5] = ["na", "n/a", "nan", "null", "none"];

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%I:%M %p"];

const RATING_MAX: Decimal = Decimal::TEN;

/**
 * Years accepted for a sale date. Dates outside make the row invalid.
 */
const SALE_YEARS: RangeInclusive<i32> = 1900..=2100;

/**
 * Uploaded file before cleaning. Column names are normalized, cells trimmed and missing cells are `None`.
 */
#[derive(Debug, Clone, Default)]
pub struct RawSalesTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawSalesTable {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

/**
 * Cleaned sales together with what was removed on the way.
 */
#[derive(Debug, Clone)]
pub struct CleanedSales {
    pub sales: Vec<Sale>,
    pub report: CleaningReport,
}

/**
 * Cleaned and validated upload.
 */
#[derive(Debug, Clone)]
pub struct ProcessedSales {
    pub sales: Vec<Sale>,
    pub cleaning: CleaningReport,
    pub validation: ValidationReport,
}

/**
 * Positions of the known columns in a raw table.
 */
struct ColumnIndex {
    invoice_id: usize,
    branch: usize,
    category: usize,
    unit_price: usize,
    quantity: usize,
    date: usize,
    payment_method: usize,
    city: Option<usize>,
    customer_type: Option<usize>,
    gender: Option<usize>,
    time: Option<usize>,
    cogs: Option<usize>,
    gross_margin_percentage: Option<usize>,
    gross_income: Option<usize>,
    rating: Option<usize>,
}

impl ColumnIndex {
    fn new(table: &RawSalesTable) -> Result<Self, ApplicationError> {
        let missing: Vec<&str> = REQUIRED_COLUMNS.iter().copied().filter(|column| table.column_index(column).is_none()).collect();
        if !missing.is_empty() {
            return Err(ApplicationError::new(ErrorType::DataProcessing, format!("Missing required column(s): {}", missing.join(", "))));
        }
        let required = |name: &str| table.column_index(name).ok_or_else(|| ApplicationError::new(ErrorType::DataProcessing, format!("Missing required column(s): {name}")));
        Ok(ColumnIndex {
            invoice_id: required("invoice_id")?,
            branch: required("branch")?,
            category: required("category")?,
            unit_price: required("unit_price")?,
            quantity: required("quantity")?,
            date: required("date")?,
            payment_method: required("payment_method")?,
            city: table.column_index("city"),
            customer_type: table.column_index("customer_type"),
            gender: table.column_index("gender"),
            time: table.column_index("time"),
            cogs: table.column_index("cogs"),
            gross_margin_percentage: table.column_index("gross_margin_percentage"),
            gross_income: table.column_index("gross_income"),
            rating: table.column_index("rating"),
        })
    }
}

enum RowOutcome {
    Kept { sale: Box<Sale>, invalid_time: bool },
    MissingRequired,
    Invalid(String),
}

/**
 * Reads, cleans and validates uploaded sales files.
 */
#[derive(Debug, Clone)]
pub struct SalesDataProcessor {
    config: ProcessingConfig,
}

impl SalesDataProcessor {
    /**
     * Creates a new instance of `SalesDataProcessor`.
     *
     * # Arguments
     * `config`: Processing configuration.
     */
    pub fn new(config: ProcessingConfig) -> Self {
        SalesDataProcessor { config }
    }

    /**
     * Runs the complete pipeline on an uploaded file: read, clean and validate.
     *
     * # Arguments
     * `contents`: Raw file contents.
     *
     * # Returns
     * The cleaned sales with cleaning and validation reports, or an `ApplicationError` if the file cannot be read
     * or lacks required columns.
     */
    #[instrument(level = "debug", skip(self, contents), fields(bytes = contents.len()))]
    pub fn process(&self, contents: &[u8]) -> Result<ProcessedSales, ApplicationError> {
        let table = self.read_csv(contents)?;
        let cleaned = self.clean(table)?;
        let validation = self.validate(&cleaned.sales, &cleaned.report);
        if validation.success {
            info!("Processed {} sales rows, kept {}", cleaned.report.rows_read, cleaned.report.rows_kept);
        } else {
            warn!("Sales data validation failed");
        }
        Ok(ProcessedSales { sales: cleaned.sales, cleaning: cleaned.report, validation })
    }

    /**
     * Parses CSV contents into a raw table.
     *
     * Invalid UTF-8 sequences are dropped, rows shorter than the header are padded with missing cells and
     * completely empty rows are skipped.
     */
    pub fn read_csv(&self, contents: &[u8]) -> Result<RawSalesTable, ApplicationError> {
        let delimiter = u8::try_from(self.config.delimiter).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Delimiter must be a single byte character: {err}")))?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).trim(csv::Trim::All).delimiter(delimiter).from_reader(contents);
        let columns: Vec<String> = reader.byte_headers()?.iter().map(|header| normalize_column_name(&decode_lossy(header))).collect();
        if columns.iter().all(String::is_empty) {
            return Err(ApplicationError::new(ErrorType::DataProcessing, "File has no header row".to_string()));
        }
        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let row: Vec<Option<String>> = (0..columns.len()).map(|index| record.get(index).and_then(cell_value)).collect();
            if row.iter().all(Option::is_none) {
                continue;
            }
            rows.push(row);
        }
        debug!("Read {} rows with columns {:?}", rows.len(), columns);
        Ok(RawSalesTable { columns, rows })
    }

    /**
     * Cleans a raw table.
     *
     * Exact duplicate rows are removed, rows without a required value or with a required value that cannot be
     * converted are dropped, and `total`, `gross_income` and `cogs` are derived.
     *
     * # Returns
     * The cleaned sales or an `ApplicationError` if required columns are missing.
     */
    pub fn clean(&self, table: RawSalesTable) -> Result<CleanedSales, ApplicationError> {
        let columns = ColumnIndex::new(&table)?;
        let mut report = CleaningReport { rows_read: table.rows.len(), ..CleaningReport::default() };
        for (index, column) in table.columns.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            let missing = table.rows.iter().filter(|row| row.get(index).is_none_or(Option::is_none)).count();
            report.missing_values.entry(column.clone()).or_insert(missing);
        }

        let mut seen: HashSet<&Vec<Option<String>>> = HashSet::new();
        let mut sales = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            if !seen.insert(row) {
                report.duplicates_removed += 1;
                continue;
            }
            match self.clean_row(&columns, row) {
                RowOutcome::Kept { sale, invalid_time } => {
                    if invalid_time {
                        report.invalid_times += 1;
                    }
                    sales.push(*sale);
                }
                RowOutcome::MissingRequired => report.rows_missing_required += 1,
                RowOutcome::Invalid(reason) => {
                    debug!("Dropping row: {reason}");
                    report.rows_invalid += 1;
                }
            }
        }
        report.rows_kept = sales.len();
        Ok(CleanedSales { sales, report })
    }

    fn clean_row(&self, columns: &ColumnIndex, row: &[Option<String>]) -> RowOutcome {
        let (Some(invoice_id), Some(branch), Some(category), Some(unit_price), Some(quantity), Some(date), Some(payment_method)) = (
            cell(row, columns.invoice_id),
            cell(row, columns.branch),
            cell(row, columns.category),
            cell(row, columns.unit_price),
            cell(row, columns.quantity),
            cell(row, columns.date),
            cell(row, columns.payment_method),
        ) else {
            return RowOutcome::MissingRequired;
        };
        let Some(parsed_unit_price) = parse_decimal(unit_price) else {
            return RowOutcome::Invalid(format!("invoice {invoice_id} has unit price '{unit_price}'"));
        };
        let Some(parsed_quantity) = parse_quantity(quantity) else {
            return RowOutcome::Invalid(format!("invoice {invoice_id} has quantity '{quantity}'"));
        };
        let Some(parsed_date) = parse_date(date, self.config.day_first) else {
            return RowOutcome::Invalid(format!("invoice {invoice_id} has date '{date}'"));
        };
        if !SALE_YEARS.contains(&parsed_date.year()) {
            return RowOutcome::Invalid(format!("invoice {invoice_id} has date {parsed_date} outside {}-{}", SALE_YEARS.start(), SALE_YEARS.end()));
        }
        let Some(total) = parsed_unit_price.checked_mul(Decimal::from(parsed_quantity)) else {
            return RowOutcome::Invalid(format!("invoice {invoice_id} total overflows"));
        };
        let optional = |index: Option<usize>| index.and_then(|index| cell(row, index));
        let gross_margin_percentage = optional(columns.gross_margin_percentage).and_then(parse_decimal);
        let gross_income = optional(columns.gross_income)
            .and_then(parse_decimal)
            .or_else(|| gross_margin_percentage.and_then(|margin| total.checked_mul(margin)).and_then(|value| value.checked_div(Decimal::ONE_HUNDRED)));
        let cogs = optional(columns.cogs).and_then(parse_decimal).or_else(|| gross_income.and_then(|income| total.checked_sub(income)));
        let time_cell = optional(columns.time);
        let time = time_cell.and_then(parse_time);

        RowOutcome::Kept {
            invalid_time: time_cell.is_some() && time.is_none(),
            sale: Box::new(Sale {
                invoice_id: invoice_id.to_string(),
                branch: branch.to_string(),
                city: optional(columns.city).map(str::to_string),
                customer_type: optional(columns.customer_type).map(str::to_string),
                gender: optional(columns.gender).map(str::to_string),
                category: category.to_string(),
                unit_price: parsed_unit_price,
                quantity: parsed_quantity,
                total,
                date: parsed_date,
                time,
                payment_method: payment_method.to_string(),
                cogs,
                gross_margin_percentage,
                gross_income,
                rating: optional(columns.rating).and_then(parse_decimal),
            }),
        }
    }

    /**
     * Checks the cleaned sales against the expectations a loadable dataset must meet.
     *
     * # Arguments
     * `sales`: Cleaned sales.
     * `report`: Cleaning report of the same upload, provides the count of unparsable times.
     */
    pub fn validate(&self, sales: &[Sale], report: &CleaningReport) -> ValidationReport {
        let element_count = sales.len();
        let mut invoices: HashSet<&str> = HashSet::with_capacity(element_count);
        let duplicate_invoices = sales.iter().filter(|sale| !invoices.insert(sale.invoice_id.as_str())).count();
        let negative_prices = sales.iter().filter(|sale| sale.unit_price.is_sign_negative() && !sale.unit_price.is_zero()).count();
        let non_positive_quantities = sales.iter().filter(|sale| sale.quantity < 1).count();
        let negative_totals = sales.iter().filter(|sale| sale.total.is_sign_negative() && !sale.total.is_zero()).count();

        let ratings: Vec<Decimal> = sales.iter().filter_map(|sale| sale.rating).collect();
        let ratings_out_of_range = ratings.iter().filter(|rating| **rating < Decimal::ZERO || **rating > RATING_MAX).count();
        #[allow(clippy::cast_precision_loss)]
        let ratings_in_range = ratings.is_empty() || ((ratings.len() - ratings_out_of_range) as f64 / ratings.len() as f64) >= self.config.rating_mostly;

        ValidationReport::new(vec![
            ExpectationResult { name: "dataset_not_empty".to_string(), success: element_count > 0, element_count, unexpected_count: usize::from(element_count == 0) },
            strict_expectation("invoice_id_unique", element_count, duplicate_invoices),
            strict_expectation("unit_price_non_negative", element_count, negative_prices),
            strict_expectation("quantity_positive", element_count, non_positive_quantities),
            strict_expectation("total_non_negative", element_count, negative_totals),
            strict_expectation("time_valid", sales.iter().filter(|sale| sale.time.is_some()).count() + report.invalid_times, report.invalid_times),
            ExpectationResult { name: "rating_in_range".to_string(), success: ratings_in_range, element_count: ratings.len(), unexpected_count: ratings_out_of_range },
        ])
    }
}

fn strict_expectation(name: &str, element_count: usize, unexpected_count: usize) -> ExpectationResult {
    ExpectationResult { name: name.to_string(), success: unexpected_count == 0, element_count, unexpected_count }
}

/**
 * Normalizes a header to the snake case column vocabulary used internally.
 *
 * "Invoice ID" becomes "invoice_id", "Product line" becomes "category".
 */
pub fn normalize_column_name(name: &str) -> String {
    let normalized = name
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .split(|character: char| character.is_whitespace() || character == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>()
        .join("_");
    match normalized.as_str() {
        "product_line" => "category".to_string(),
        "payment" => "payment_method".to_string(),
        "profit_margin" => "gross_margin_percentage".to_string(),
        "invoice" => "invoice_id".to_string(),
        "unitprice" => "unit_price".to_string(),
        _ => normalized,
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace(char::REPLACEMENT_CHARACTER, "")
}

fn cell_value(bytes: &[u8]) -> Option<String> {
    let value = decode_lossy(bytes).trim().to_string();
    if value.is_empty() || MISSING_MARKERS.contains(&value.to_lowercase().as_str()) { None } else { Some(value) }
}

fn cell(row: &[Option<String>], index: usize) -> Option<&str> {
    row.get(index).and_then(|value| value.as_deref())
}

/**
 * Parses a decimal, tolerating a leading currency symbol, thousands separators and a trailing percent sign.
 */
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let cleaned: String = value.trim().trim_start_matches(['$', '€', '£']).trim_end_matches('%').chars().filter(|character| *character != ',' && !character.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).or_else(|_| Decimal::from_scientific(&cleaned)).ok()
}

fn parse_quantity(value: &str) -> Option<i32> {
    if let Ok(quantity) = value.trim().parse::<i32>() {
        return Some(quantity);
    }
    let quantity = parse_decimal(value)?;
    if quantity.fract().is_zero() { quantity.to_i32() } else { None }
}

/**
 * Parses a date.
 *
 * Year first dates (`2019-01-05`, `2019/01/05`) are unambiguous, optionally followed by a time part which is
 * ignored. Other dates are month first unless `day_first` is set. When the preferred order does not give a valid
 * date the other order is tried. Two digit years map to 1969-2068.
 */
pub fn parse_date(value: &str, day_first: bool) -> Option<NaiveDate> {
    let date_part = value.trim().split([' ', 'T']).next()?;
    let parts: Vec<&str> = date_part.split(['-', '/', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty() || !part.chars().all(|character| character.is_ascii_digit())) {
        return None;
    }
    let numbers: Vec<u32> = parts.iter().map(|part| part.parse().ok()).collect::<Option<Vec<u32>>>()?;
    if parts[0].len() == 4 {
        return NaiveDate::from_ymd_opt(i32::try_from(numbers[0]).ok()?, numbers[1], numbers[2]);
    }
    let year = match parts[2].len() {
        2 => two_digit_year(numbers[2]),
        4 => i32::try_from(numbers[2]).ok()?,
        _ => return None,
    };
    let (month, day) = if day_first { (numbers[1], numbers[0]) } else { (numbers[0], numbers[1]) };
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| NaiveDate::from_ymd_opt(year, day, month))
}

fn two_digit_year(year: u32) -> i32 {
    let year = i32::try_from(year).unwrap_or_default();
    if year < 69 { 2000 + year } else { 1900 + year }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS.iter().find_map(|format| NaiveTime::parse_from_str(value.trim(), format).ok())
}

#[cfg(test)]
mod test {
    use super::*;

    const SUPERMARKET_CSV: &str = "Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating
750-67-8428,A,Yangon,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,1/5/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1
226-31-3081,C,Naypyitaw,Normal,Female,Electronic accessories,15.28,5,3.82,80.22,3/8/2019,10:29,Cash,76.4,4.761904762,3.82,9.6
631-41-3108,A,Yangon,Normal,Male,Home and lifestyle,46.33,7,16.2155,340.5255,3/3/2019,13:23,Credit card,324.31,4.761904762,16.2155,7.4
";

    fn processor() -> SalesDataProcessor {
        SalesDataProcessor::new(ProcessingConfig::default())
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Invoice ID"), "invoice_id");
        assert_eq!(normalize_column_name("  Unit price "), "unit_price");
        assert_eq!(normalize_column_name("Product line"), "category");
        assert_eq!(normalize_column_name("Payment"), "payment_method");
        assert_eq!(normalize_column_name("payment_method"), "payment_method");
        assert_eq!(normalize_column_name("profit_margin"), "gross_margin_percentage");
        assert_eq!(normalize_column_name("\u{feff}Customer-Type"), "customer_type");
        assert_eq!(normalize_column_name("gross margin percentage"), "gross_margin_percentage");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("$74.69"), Some(Decimal::new(7469, 2)));
        assert_eq!(parse_decimal("1,234.5"), Some(Decimal::new(12345, 1)));
        assert_eq!(parse_decimal("48%"), Some(Decimal::new(48, 0)));
        assert_eq!(parse_decimal("-3"), Some(Decimal::new(-3, 0)));
        assert_eq!(parse_decimal("1e2"), Some(Decimal::new(100, 0)));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("$"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("7"), Some(7));
        assert_eq!(parse_quantity("7.0"), Some(7));
        assert_eq!(parse_quantity("7.5"), None);
        assert_eq!(parse_quantity("seven"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 1, 5);
        assert_eq!(parse_date("2019-01-05", false), expected);
        assert_eq!(parse_date("2019/01/05", true), expected);
        assert_eq!(parse_date("2019-01-05 00:00:00", false), expected);
        assert_eq!(parse_date("2019-01-05T10:00:00", false), expected);
        assert_eq!(parse_date("1/5/2019", false), expected);
        assert_eq!(parse_date("05/01/19", true), expected);
        assert_eq!(parse_date("05-01-2019", true), expected);
    }

    #[test]
    fn test_parse_date_falls_back_to_other_order() {
        assert_eq!(parse_date("25/12/2019", false), NaiveDate::from_ymd_opt(2019, 12, 25));
        assert_eq!(parse_date("12/25/2019", true), NaiveDate::from_ymd_opt(2019, 12, 25));
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date("invalid_date", false), None);
        assert_eq!(parse_date("2019-13-45", false), None);
        assert_eq!(parse_date("1/5/201", false), None);
        assert_eq!(parse_date("", false), None);
        assert_eq!(parse_date("70/01/01", false), None);
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_date("01/01/68", false), NaiveDate::from_ymd_opt(2068, 1, 1));
        assert_eq!(parse_date("01/01/69", false), NaiveDate::from_ymd_opt(1969, 1, 1));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("13:08"), NaiveTime::from_hms_opt(13, 8, 0));
        assert_eq!(parse_time("13:08:30"), NaiveTime::from_hms_opt(13, 8, 30));
        assert_eq!(parse_time("1:08 PM"), NaiveTime::from_hms_opt(13, 8, 0));
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_read_csv_normalizes_headers_and_missing_cells() {
        let contents = "Invoice ID,Branch,Rating\nINV001, A ,NA\nINV002,B\n,,\n";
        let table = processor().read_csv(contents.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["invoice_id", "branch", "rating"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec![Some("INV001".to_string()), Some("A".to_string()), None]);
        assert_eq!(table.rows[1], vec![Some("INV002".to_string()), Some("B".to_string()), None]);
    }

    #[test]
    fn test_read_csv_drops_invalid_utf8() {
        let mut contents = b"invoice_id,branch\nINV".to_vec();
        contents.push(0xff);
        contents.extend_from_slice(b"001,A\n");
        let table = processor().read_csv(&contents).unwrap();
        assert_eq!(table.rows[0][0], Some("INV001".to_string()));
    }

    #[test]
    fn test_read_csv_with_semicolon_delimiter() {
        let processor = SalesDataProcessor::new(ProcessingConfig { delimiter: ';', ..ProcessingConfig::default() });
        let table = processor.read_csv(b"invoice_id;branch\nINV001;A\n").unwrap();
        assert_eq!(table.columns, vec!["invoice_id", "branch"]);
        assert_eq!(table.rows[0][1], Some("A".to_string()));
    }

    #[test]
    fn test_read_csv_empty_file() {
        let result = processor().read_csv(b"");
        assert_eq!(result.unwrap_err().error_type, ErrorType::DataProcessing);
    }

    #[test]
    fn test_clean_supermarket_file() {
        let processor = processor();
        let table = processor.read_csv(SUPERMARKET_CSV.as_bytes()).unwrap();
        let cleaned = processor.clean(table).unwrap();
        assert_eq!(cleaned.report.rows_read, 3);
        assert_eq!(cleaned.report.rows_kept, 3);
        let sale = &cleaned.sales[0];
        assert_eq!(sale.invoice_id, "750-67-8428");
        assert_eq!(sale.category, "Health and beauty");
        assert_eq!(sale.payment_method, "Ewallet");
        assert_eq!(sale.total, Decimal::new(52283, 2));
        assert_eq!(sale.date, NaiveDate::from_ymd_opt(2019, 1, 5).unwrap());
        assert_eq!(sale.time, NaiveTime::from_hms_opt(13, 8, 0));
        assert_eq!(sale.gross_income, Some(Decimal::new(261415, 4)));
        assert_eq!(sale.cogs, Some(Decimal::new(52283, 2)));
        assert_eq!(sale.rating, Some(Decimal::new(91, 1)));
    }

    #[test]
    fn test_clean_removes_duplicates_and_incomplete_rows() {
        let contents = "invoice_id,branch,category,unit_price,quantity,date,payment_method
INV001,A,Food,10.00,2,2023-01-01,Cash
INV002,B,Food,20.00,3,2023-01-02,Cash
INV003,C,Sports,30.00,1,2023-01-03,Ewallet
INV003,C,Sports,30.00,1,2023-01-03,Ewallet
INV004,,Sports,30.00,1,2023-01-03,Ewallet
INV005,C,Sports,abc,1,2023-01-03,Ewallet
INV006,C,Sports,30.00,1,not a date,Ewallet
";
        let processor = processor();
        let cleaned = processor.clean(processor.read_csv(contents.as_bytes()).unwrap()).unwrap();
        assert_eq!(cleaned.report.rows_read, 7);
        assert_eq!(cleaned.report.duplicates_removed, 1);
        assert_eq!(cleaned.report.rows_missing_required, 1);
        assert_eq!(cleaned.report.rows_invalid, 2);
        assert_eq!(cleaned.report.rows_kept, 3);
        assert_eq!(cleaned.report.missing_values.get("branch"), Some(&1));
        assert_eq!(cleaned.report.missing_values.get("invoice_id"), Some(&0));
        assert_eq!(cleaned.sales.iter().map(|sale| sale.invoice_id.as_str()).collect::<Vec<_>>(), vec!["INV001", "INV002", "INV003"]);
    }

    #[test]
    fn test_clean_derives_total_from_unit_price_and_quantity() {
        let contents = "invoice_id,branch,category,unit_price,quantity,date,payment_method,total,profit_margin
INV001,A,Food,$12.50,4,2023-01-01,Cash,999,20
";
        let processor = processor();
        let cleaned = processor.clean(processor.read_csv(contents.as_bytes()).unwrap()).unwrap();
        let sale = &cleaned.sales[0];
        assert_eq!(sale.total, Decimal::new(50, 0));
        assert_eq!(sale.gross_margin_percentage, Some(Decimal::new(20, 0)));
        assert_eq!(sale.gross_income, Some(Decimal::new(10, 0)));
        assert_eq!(sale.cogs, Some(Decimal::new(40, 0)));
        assert_eq!(sale.city, None);
        assert_eq!(sale.rating, None);
    }

    #[test]
    fn test_clean_missing_required_columns() {
        let processor = processor();
        let table = processor.read_csv(b"invoice_id,branch,unit_price\nINV001,A,10\n").unwrap();
        let error = processor.clean(table).unwrap_err();
        assert_eq!(error.error_type, ErrorType::DataProcessing);
        assert!(error.message.contains("category"));
        assert!(error.message.contains("payment_method"));
        assert!(!error.message.contains("branch"));
    }

    #[test]
    fn test_validate_success() {
        let processed = processor().process(SUPERMARKET_CSV.as_bytes()).unwrap();
        assert!(processed.validation.success);
        assert_eq!(processed.validation.expectations.len(), 7);
        assert!(processed.validation.expectations.iter().all(|expectation| expectation.unexpected_count == 0));
    }

    #[test]
    fn test_validate_invalid_data() {
        let contents = "invoice_id,branch,category,unit_price,quantity,date,payment_method,rating
INV001,A,Food,-10.00,2,2023-01-01,Cash,4.5
INV001,B,Food,20.00,3,2023-01-02,Cash,3.5
INV003,C,Sports,30.00,0,2023-01-03,Ewallet,5.0
";
        let processed = processor().process(contents.as_bytes()).unwrap();
        assert!(!processed.validation.success);
        let failed: Vec<&str> = processed.validation.expectations.iter().filter(|expectation| !expectation.success).map(|expectation| expectation.name.as_str()).collect();
        assert_eq!(failed, vec!["invoice_id_unique", "unit_price_non_negative", "quantity_positive", "total_non_negative"]);
    }

    #[test]
    fn test_validate_rating_mostly_in_range() {
        let mut rows = String::from("invoice_id,branch,category,unit_price,quantity,date,payment_method,rating\n");
        for index in 0..20 {
            let rating = if index == 0 { "11" } else { "5" };
            rows.push_str(&format!("INV{index},A,Food,1.00,1,2023-01-01,Cash,{rating}\n"));
        }
        let processed = processor().process(rows.as_bytes()).unwrap();
        let rating = processed.validation.expectations.iter().find(|expectation| expectation.name == "rating_in_range").unwrap();
        assert!(rating.success);
        assert_eq!(rating.unexpected_count, 1);

        let strict = SalesDataProcessor::new(ProcessingConfig { rating_mostly: 1.0, ..ProcessingConfig::default() });
        let processed = strict.process(rows.as_bytes()).unwrap();
        assert!(!processed.validation.success);
    }

    #[test]
    fn test_validate_empty_dataset() {
        let processed = processor().process(b"invoice_id,branch,category,unit_price,quantity,date,payment_method\n").unwrap();
        assert!(!processed.validation.success);
        assert_eq!(processed.validation.expectations[0].name, "dataset_not_empty");
        assert!(!processed.validation.expectations[0].success);
    }

    #[test]
    fn test_clean_rejects_dates_outside_sale_years() {
        let contents = "invoice_id,branch,category,unit_price,quantity,date,payment_method
INV001,A,Food,10.00,2,01/01/0001,Cash
INV002,A,Food,10.00,2,12/31/9999,Cash
INV003,A,Food,10.00,2,2023-01-01,Cash
";
        let processor = processor();
        let cleaned = processor.clean(processor.read_csv(contents.as_bytes()).unwrap()).unwrap();
        assert_eq!(cleaned.report.rows_invalid, 2);
        assert_eq!(cleaned.report.rows_kept, 1);
        assert_eq!(cleaned.sales[0].invoice_id, "INV003");
    }

    #[test]
    fn test_validate_time_valid() {
        let contents = "invoice_id,branch,category,unit_price,quantity,date,payment_method,time
INV001,A,Food,10.00,2,2023-01-01,Cash,10:15
INV002,A,Food,10.00,2,2023-01-01,Cash,25:99
INV003,A,Food,10.00,2,2023-01-01,Cash,
";
        let processed = processor().process(contents.as_bytes()).unwrap();
        assert_eq!(processed.cleaning.invalid_times, 1);
        assert_eq!(processed.cleaning.rows_kept, 3);
        assert_eq!(processed.sales[1].time, None);
        let time_valid = processed.validation.expectations.iter().find(|expectation| expectation.name == "time_valid").unwrap();
        assert!(!time_valid.success);
        assert_eq!(time_valid.element_count, 2);
        assert_eq!(time_valid.unexpected_count, 1);
        assert!(!processed.validation.success);
    }
}
