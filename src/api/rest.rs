use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    model::{
        analytics::{Dimension, Interval},
        apperror::{ApplicationError, ErrorType},
        models::{CleaningReport, DEFAULT_PAGE_SIZE, IngestOutputType, PaginationInput, PaginationOutput, Sale, SalesFilter, SalesListOutputType, ValidationReport},
    },
    service::export::ExportFormat,
};

/***************** Sales filter models *********************/

/**
 * Filter sent in the body of the sales, analytics, dashboard and export requests. All fields are optional.
 */
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesFilterRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub branch: Option<String>,
    pub category: Option<String>,
    pub payment_method: Option<String>,
}

impl From<SalesFilterRequest> for SalesFilter {
    fn from(request: SalesFilterRequest) -> Self {
        SalesFilter { start_date: request.start_date, end_date: request.end_date, branch: request.branch, category: request.category, payment_method: request.payment_method }
    }
}

/***************** Sales:list models *********************/

/**
 * Response structure for listing sales.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesListResponse {
    sales: Vec<SaleElement>,
    pagination: PaginationResponse,
}

impl From<SalesListOutputType> for SalesListResponse {
    fn from(output: SalesListOutputType) -> Self {
        SalesListResponse { sales: output.sales.into_iter().map(SaleElement::from).collect(), pagination: PaginationResponse::from(output.pagination) }
    }
}

/**
 * A sale in API responses.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleElement {
    invoice_id: String,
    branch: String,
    city: Option<String>,
    customer_type: Option<String>,
    gender: Option<String>,
    category: String,
    unit_price: Decimal,
    quantity: i32,
    total: Decimal,
    date: NaiveDate,
    time: Option<NaiveTime>,
    payment_method: String,
    cogs: Option<Decimal>,
    gross_margin_percentage: Option<Decimal>,
    gross_income: Option<Decimal>,
    rating: Option<Decimal>,
}

impl From<Sale> for SaleElement {
    fn from(sale: Sale) -> Self {
        SaleElement {
            invoice_id: sale.invoice_id,
            branch: sale.branch,
            city: sale.city,
            customer_type: sale.customer_type,
            gender: sale.gender,
            category: sale.category,
            unit_price: sale.unit_price,
            quantity: sale.quantity,
            total: sale.total,
            date: sale.date,
            time: sale.time,
            payment_method: sale.payment_method,
            cogs: sale.cogs,
            gross_margin_percentage: sale.gross_margin_percentage,
            gross_income: sale.gross_income,
            rating: sale.rating,
        }
    }
}

/***************** Sales:upload models *********************/

/**
 * Response structure for a sales upload.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub records_processed: usize,
    pub cleaning: CleaningReport,
    pub validation: ValidationReport,
}

impl From<IngestOutputType> for UploadResponse {
    fn from(output: IngestOutputType) -> Self {
        let message = if output.success {
            format!("Successfully processed {} records", output.records_processed)
        } else {
            "Data validation failed, no records were stored".to_string()
        };
        UploadResponse { success: output.success, message, records_processed: output.records_processed, cleaning: output.cleaning, validation: output.validation }
    }
}

/***************** Analytics models *********************/

/**
 * Query parameters of the time series endpoint.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesQuery {
    /**
     * Resampling interval, `D`, `W`, `M`, `Q` or `Y`. Daily when absent.
     */
    pub interval: Option<Interval>,
}

/**
 * Query parameters of the breakdown endpoint.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownQuery {
    pub dimension: Dimension,
}

/***************** Export models *********************/

/**
 * Query parameters of the export endpoint.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    /**
     * Export format, csv when absent.
     */
    pub format: Option<ExportFormat>,
}

/***************** Service models *********************/

/**
 * Response of the health endpoint.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

impl HealthResponse {
    pub fn new(database_available: bool) -> Self {
        if database_available {
            HealthResponse { status: "healthy".to_string(), database: "connected".to_string() }
        } else {
            HealthResponse { status: "unhealthy".to_string(), database: "disconnected".to_string() }
        }
    }
}

/**
 * Response of the root endpoint.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub status: String,
}

impl Default for InfoResponse {
    fn default() -> Self {
        InfoResponse { name: "Sales Analytics API".to_string(), version: env!("CARGO_PKG_VERSION").to_string(), status: "running".to_string() }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::JwtAuthorization => StatusCode::UNAUTHORIZED,
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::ConstraintViolation => StatusCode::CONFLICT,
        ErrorType::DataProcessing => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorType::Initialization | ErrorType::DatabaseError | ErrorType::Export | ErrorType::Application => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::JwtAuthorization => 1000,
        ErrorType::Initialization => 1001,
        ErrorType::Validation => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::NotFound => 1004,
        ErrorType::ConstraintViolation => 1005,
        ErrorType::DataProcessing => 1006,
        ErrorType::Export => 1007,
        ErrorType::Application => 1008,
    }
}

/***************** Common models *********************/

/**
 * Pagination query parameters for API requests.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    /**
     * The index of the first item to return.
     */
    pub start_index: Option<i64>,
    /**
     * The size of the page to return.
     */
    pub page_size: Option<i64>,
}

impl From<PaginationQuery> for PaginationInput {
    fn from(query: PaginationQuery) -> Self {
        PaginationInput { start_index: query.start_index.unwrap_or(0), page_size: query.page_size.unwrap_or(DEFAULT_PAGE_SIZE) }
    }
}

/**
 * Pagination response structure.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    /**
     * The starting index of the returned items.
     */
    pub start_index: Option<i64>,
    /**
     * The size of the page.
     */
    pub page_size: Option<i64>,
    /**
     * Indicates if there are more items available.
     */
    pub has_more_elements: bool,
}

impl From<PaginationOutput> for PaginationResponse {
    fn from(pagination_output: PaginationOutput) -> Self {
        PaginationResponse { start_index: Some(pagination_output.start_index), page_size: Some(pagination_output.page_size), has_more_elements: pagination_output.has_more }
    }
}
