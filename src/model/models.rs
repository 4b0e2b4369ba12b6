use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Largest page size accepted for list operations.
 */
const MAX_PAGE_SIZE: i64 = 1000;

/**
 * Default page size when none is given.
 */
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/**
 * A single cleaned sales transaction.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub invoice_id: String,
    pub branch: String,
    pub city: Option<String>,
    pub customer_type: Option<String>,
    pub gender: Option<String>,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total: Decimal,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub payment_method: String,
    pub cogs: Option<Decimal>,
    pub gross_margin_percentage: Option<Decimal>,
    pub gross_income: Option<Decimal>,
    pub rating: Option<Decimal>,
}

/**
 * Pagination input after validation.
 */
#[derive(Debug, Clone, Copy)]
pub struct PaginationInput {
    pub start_index: i64,
    pub page_size: i64,
}

impl PaginationInput {
    /**
     * Validates the pagination input.
     *
     * # Returns
     * The validated input or a validation error.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if self.start_index < 0 {
            return Err(ApplicationError::new(ErrorType::Validation, "startIndex cannot be negative".to_string()));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(ApplicationError::new(ErrorType::Validation, format!("pageSize must be between 1 and {MAX_PAGE_SIZE}")));
        }
        Ok(self)
    }
}

/**
 * Pagination information returned with list results.
 */
#[derive(Debug, Clone, Copy)]
pub struct PaginationOutput {
    pub start_index: i64,
    pub page_size: i64,
    pub has_more: bool,
}

impl PaginationOutput {
    pub fn new(start_index: i64, page_size: i64, has_more: bool) -> Self {
        PaginationOutput { start_index, page_size, has_more }
    }
}

/**
 * Filter applied to every sales query.
 */
#[derive(Debug, Clone, Default)]
pub struct SalesFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub branch: Option<String>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
}

impl SalesFilter {
    /**
     * Validates the filter. Blank text filters are treated as absent.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) {
            if start_date > end_date {
                return Err(ApplicationError::new(ErrorType::Validation, format!("startDate {start_date} is after endDate {end_date}")));
            }
        }
        Ok(SalesFilter {
            branch: non_blank(self.branch),
            category: non_blank(self.category),
            payment_method: non_blank(self.payment_method),
            ..self
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/**
 * A page of sales.
 */
#[derive(Debug)]
pub struct SalesListOutputType {
    pub sales: Vec<Sale>,
    pub pagination: PaginationOutput,
}

impl SalesListOutputType {
    pub fn new(sales: Vec<Sale>, pagination: PaginationOutput) -> Self {
        SalesListOutputType { sales, pagination }
    }
}

/**
 * Counters describing what happened while cleaning an uploaded file.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub rows_read: usize,
    pub duplicates_removed: usize,
    pub rows_missing_required: usize,
    pub rows_invalid: usize,
    pub rows_kept: usize,
    /**
     * Kept rows whose time cell could not be parsed. The time of those sales is missing.
     */
    pub invalid_times: usize,
    /**
     * Missing cell count per normalized column name.
     */
    pub missing_values: BTreeMap<String, usize>,
}

/**
 * Result of a single named expectation.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectationResult {
    pub name: String,
    pub success: bool,
    pub element_count: usize,
    pub unexpected_count: usize,
}

/**
 * Outcome of validating a cleaned dataset.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub success: bool,
    pub expectations: Vec<ExpectationResult>,
}

impl ValidationReport {
    pub fn new(expectations: Vec<ExpectationResult>) -> Self {
        let success = expectations.iter().all(|expectation| expectation.success);
        ValidationReport { success, expectations }
    }
}

/**
 * Outcome of a sales upload.
 */
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutputType {
    pub success: bool,
    pub records_processed: usize,
    pub cleaning: CleaningReport,
    pub validation: ValidationReport,
}
