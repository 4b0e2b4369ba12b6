use actix_web::{
    HttpRequest, HttpResponse, delete, get, post,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{BreakdownQuery, ExportQuery, HealthResponse, InfoResponse, PaginationQuery, SalesFilterRequest, SalesListResponse, TimeSeriesQuery, UploadResponse},
        state::AppState,
    },
    model::{
        apperror::{ApplicationError, ErrorType},
        dashboard::DashboardPage,
        models::{PaginationInput, Sale, SalesFilter},
    },
    service::export::ExportFormat,
};

/**
 * Service information.
 */
#[get("/")]
pub async fn info() -> HttpResponse {
    HttpResponse::Ok().json(InfoResponse::default())
}

/**
 * Liveness and database status. Responds 503 when the database does not answer.
 */
#[instrument(level = "debug", skip(app_state))]
#[get("/health")]
pub async fn health(app_state: web::Data<AppState>) -> HttpResponse {
    let database_available = app_state.sales_service.database_available().await;
    let response = HealthResponse::new(database_available);
    if database_available { HttpResponse::Ok().json(response) } else { HttpResponse::ServiceUnavailable().json(response) }
}

/**
 * Upload a sales CSV file. The request body is the file contents.
 */
#[instrument(level = "info", skip(http_request, body, app_state), fields(service = "uploadSales", trace_id = get_trace_id(&http_request), bytes = body.len(), result))]
#[post("/api/services/v1_0/sales:upload")]
pub async fn sales_upload(http_request: HttpRequest, body: web::Bytes, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    if body.is_empty() {
        return Err(ApplicationError::new(ErrorType::Validation, "Uploaded file is empty".to_string()));
    }
    let output = app_state.sales_service.ingest_csv(body.to_vec(), &claim.user()).instrument(span).await?;
    let response = UploadResponse::from(output);
    if response.success { Ok(HttpResponse::Created().json(response)) } else { Ok(HttpResponse::UnprocessableEntity().json(response)) }
}

/**
 * Endpoint to retrieve a filtered page of sales.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "listSales", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/sales:list")]
pub async fn sales_list(
    http_request: HttpRequest,
    request_body: web::Json<SalesFilterRequest>,
    pagination: web::Query<PaginationQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let pagination_input = PaginationInput::from(pagination.into_inner());
    let output_values = app_state.sales_service.list_sales(SalesFilter::from(request_body.into_inner()), pagination_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(SalesListResponse::from(output_values)))
}

/**
 * Delete a sale by invoice id.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteSale", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/services/v1_0/sales/{invoiceId}")]
pub async fn sales_delete(path: Path<String>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let invoice_id = path.into_inner();
    app_state.sales_service.delete_sale(&invoice_id).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Overall, per product category and per customer type metrics.
 */
#[instrument(skip(http_request, app_state), fields(service = "salesMetrics", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/sales:metrics")]
pub async fn sales_metrics(http_request: HttpRequest, request_body: web::Json<SalesFilterRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let sales = load_sales(&app_state, request_body).instrument(span).await?;
    Ok(HttpResponse::Ok().json(app_state.analytics_service.sales_metrics(&sales)))
}

/**
 * Sales resampled to a time interval.
 */
#[instrument(skip(http_request, app_state), fields(service = "timeSeries", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/analytics:timeseries")]
pub async fn analytics_time_series(
    http_request: HttpRequest,
    request_body: web::Json<SalesFilterRequest>,
    query: web::Query<TimeSeriesQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let sales = load_sales(&app_state, request_body).instrument(span).await?;
    Ok(HttpResponse::Ok().json(app_state.analytics_service.time_series(&sales, query.interval.unwrap_or_default())))
}

/**
 * Performance per product category.
 */
#[instrument(skip(http_request, app_state), fields(service = "productAnalysis", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/analytics:products")]
pub async fn analytics_products(http_request: HttpRequest, request_body: web::Json<SalesFilterRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let sales = load_sales(&app_state, request_body).instrument(span).await?;
    Ok(HttpResponse::Ok().json(app_state.analytics_service.product_analysis(&sales)))
}

/**
 * Behaviour per customer segment.
 */
#[instrument(skip(http_request, app_state), fields(service = "customerAnalysis", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/analytics:customers")]
pub async fn analytics_customers(http_request: HttpRequest, request_body: web::Json<SalesFilterRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let sales = load_sales(&app_state, request_body).instrument(span).await?;
    Ok(HttpResponse::Ok().json(app_state.analytics_service.customer_analysis(&sales)))
}

/**
 * Aggregates per key of a dimension such as branch or payment method.
 */
#[instrument(skip(http_request, app_state), fields(service = "breakdown", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/analytics:breakdown")]
pub async fn analytics_breakdown(
    http_request: HttpRequest,
    request_body: web::Json<SalesFilterRequest>,
    query: web::Query<BreakdownQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let sales = load_sales(&app_state, request_body).instrument(span).await?;
    Ok(HttpResponse::Ok().json(app_state.analytics_service.breakdown(&sales, query.dimension)))
}

/**
 * Contents of a dashboard page.
 */
#[instrument(skip(http_request, app_state), fields(service = "dashboard", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/dashboard/{page}")]
pub async fn dashboard(path: Path<DashboardPage>, http_request: HttpRequest, request_body: web::Json<SalesFilterRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let sales = load_sales(&app_state, request_body).instrument(span).await?;
    Ok(HttpResponse::Ok().json(app_state.dashboard_service.build(path.into_inner(), &sales)))
}

/**
 * Export filtered sales to a file in the export directory.
 */
#[instrument(skip(http_request, app_state), fields(service = "exportSales", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/sales:export")]
pub async fn sales_export(
    http_request: HttpRequest,
    request_body: web::Json<SalesFilterRequest>,
    query: web::Query<ExportQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    app_state.jwt_service.validate(&http_request)?;
    let filter = SalesFilter::from(request_body.into_inner());
    let sales = app_state.sales_service.get_sales_with_limit(filter, app_state.export_service.fetch_limit()).instrument(span.clone()).await?;
    let output = app_state.export_service.export(&sales, query.format.unwrap_or(ExportFormat::Csv)).instrument(span).await?;
    Ok(HttpResponse::Created().json(output))
}

/**
 * Supported export formats.
 */
#[instrument(skip(http_request, app_state), fields(service = "exportFormats", trace_id = get_trace_id(&http_request)))]
#[get("/api/services/v1_0/export:formats")]
pub async fn export_formats(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    app_state.jwt_service.validate(&http_request)?;
    Ok(HttpResponse::Ok().json(app_state.export_service.formats()))
}

async fn load_sales(app_state: &AppState, request_body: web::Json<SalesFilterRequest>) -> Result<Vec<Sale>, ApplicationError> {
    app_state.sales_service.get_sales(SalesFilter::from(request_body.into_inner())).await
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
