use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    db::SaleRow,
    models::{PaginationInput, PaginationOutput, Sale, SalesFilter, SalesListOutputType},
};

/**
 * Columns selected by the sales queries.
 */
const SALE_COLUMNS: &str =
    "invoice_id, branch, city, customer_type, gender, category, unit_price, quantity, total, sale_date, sale_time, payment_method, cogs, gross_margin_percentage, gross_income, rating";

/**
 * Filter applied to the sales queries. Parameters $1 to $5 are start date, end date, branch, category and payment method.
 */
const SALES_FILTER: &str = "($1::date IS NULL OR sale_date >= $1) AND
                            ($2::date IS NULL OR sale_date <= $2) AND
                            ($3::text IS NULL OR branch = $3) AND
                            ($4::text IS NULL OR category = $4) AND
                            ($5::text IS NULL OR payment_method = $5)";

/**
 * SQL query to add a sale.
 */
const ADD_SALE: &str = "INSERT INTO sales (invoice_id, branch, city, customer_type, gender, category, unit_price, quantity, total, sale_date, sale_time, payment_method, cogs,
                        gross_margin_percentage, gross_income, rating, inserted_by, inserted_at)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, now())";

/**
 * SQL query to delete a sale.
 */
const DELETE_SALE: &str = "DELETE FROM sales WHERE invoice_id = $1";

/**
 * SQL query used to check that the database answers.
 */
const PING: &str = "SELECT 1";

fn query_sales_list() -> String {
    format!("SELECT {SALE_COLUMNS} FROM sales WHERE {SALES_FILTER} ORDER BY sale_date, sale_time, invoice_id LIMIT $6 OFFSET $7")
}

fn query_sales() -> String {
    format!("SELECT {SALE_COLUMNS} FROM sales WHERE {SALES_FILTER} ORDER BY sale_date, sale_time, invoice_id LIMIT $6")
}

/**
 * DAO for sales database operations.
 */
#[derive(Debug, Clone, Default)]
pub struct SalesDao {}

impl SalesDao {
    /**
     * Creates a new instance of `SalesDao`.
     *
     * # Returns
     * A new instance of `SalesDao`.
     */
    pub fn new() -> Self {
        SalesDao {}
    }

    /**
     * Retrieves a page of sales matching the filter.
     *
     * # Arguments
     * `connection`: The database connection.
     * `filter`: Filter on date range, branch, category and payment method.
     * `pagination_input`: `PaginationInput` containing pagination information.
     *
     * # Returns
     * A Result containing `SalesListOutputType` or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_sales_list(&self, connection: &mut PgConnection, filter: &SalesFilter, pagination_input: PaginationInput) -> Result<SalesListOutputType, ApplicationError> {
        let span = tracing::Span::current();
        let query = query_sales_list();
        let results: Vec<SaleRow> = sqlx::query_as(&query)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.branch.as_deref())
            .bind(filter.category.as_deref())
            .bind(filter.payment_method.as_deref())
            .bind(pagination_input.page_size + 1)
            .bind(pagination_input.start_index)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get sales list: {err}")))?;
        let mut elements: Vec<Sale> = results.into_iter().map(Sale::from).collect();
        let pagination_output = Self::get_pagination_output(
            &pagination_input,
            i64::try_from(elements.len()).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Failed to get pagination output: {err}")))?,
        );
        elements.truncate(usize::try_from(pagination_input.page_size).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Failed to truncate elements: {err}")))?);
        Ok(SalesListOutputType::new(elements, pagination_output))
    }

    /**
     * Retrieves all sales matching the filter, up to a limit.
     *
     * # Arguments
     * `connection`: The database connection.
     * `filter`: Filter on date range, branch, category and payment method.
     * `limit`: Maximum number of sales returned.
     *
     * # Returns
     * A Result containing the sales ordered by date or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_sales(&self, connection: &mut PgConnection, filter: &SalesFilter, limit: i64) -> Result<Vec<Sale>, ApplicationError> {
        let span = tracing::Span::current();
        let query = query_sales();
        let results: Vec<SaleRow> = sqlx::query_as(&query)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.branch.as_deref())
            .bind(filter.category.as_deref())
            .bind(filter.payment_method.as_deref())
            .bind(limit)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get sales: {err}")))?;
        tracing::debug!("Fetched {} sales", results.len());
        Ok(results.into_iter().map(Sale::from).collect())
    }

    /**
     * Adds sales to the database.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the inserts within.
     * `sales`: The sales to add.
     * `inserted_by`: Name of the user adding the sales.
     *
     * # Returns
     * The number of sales added, or an `ApplicationError` on the first failing insert.
     */
    #[instrument(skip(self, transaction, sales), fields(rows = sales.len()))]
    pub async fn add_sales(&self, transaction: &mut PgConnection, sales: &[Sale], inserted_by: &str) -> Result<usize, ApplicationError> {
        let span = tracing::Span::current();
        for sale in sales {
            sqlx::query(ADD_SALE)
                .bind(&sale.invoice_id)
                .bind(&sale.branch)
                .bind(sale.city.as_deref())
                .bind(sale.customer_type.as_deref())
                .bind(sale.gender.as_deref())
                .bind(&sale.category)
                .bind(sale.unit_price)
                .bind(sale.quantity)
                .bind(sale.total)
                .bind(sale.date)
                .bind(sale.time)
                .bind(&sale.payment_method)
                .bind(sale.cogs)
                .bind(sale.gross_margin_percentage)
                .bind(sale.gross_income)
                .bind(sale.rating)
                .bind(inserted_by)
                .execute(&mut *transaction)
                .instrument(span.clone())
                .await
                .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        }
        Ok(sales.len())
    }

    /**
     * Deletes a sale from the database by its invoice id.
     *
     * # Arguments
     * `transaction`: The database transaction.
     * `invoice_id`: Invoice id of the sale to be deleted.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn delete_sale(&self, transaction: &mut PgConnection, invoice_id: &str) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_SALE)
            .bind(invoice_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to delete sale: {err}")))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Sale with invoice id {} not found for deletion", invoice_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Sale not found".to_string()));
        }
        if result.rows_affected() > 1 {
            tracing::warn!("Multiple sales attempted deleted. Rolled back");
            return Err(ApplicationError::new(ErrorType::Application, "Multiple sales attempted deleted. Rolled back".to_string()));
        }
        Ok(())
    }

    /**
     * Checks that the database answers a trivial query.
     */
    #[instrument(level = "debug", skip(self, connection))]
    pub async fn ping(&self, connection: &mut PgConnection) -> Result<(), ApplicationError> {
        sqlx::query(PING).execute(connection).await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Database is not available: {err}")))?;
        Ok(())
    }

    /**
     * Constructs a `PaginationOutput` based on the pagination input and the number of elements.
     *
     * # Arguments
     * `pagination_input`: The input containing pagination parameters.
     * `elements_size`: The number of elements retrieved from the database.
     *
     * # Returns
     * A `PaginationOutput` instance containing pagination details.
     */
    fn get_pagination_output(pagination_input: &PaginationInput, elements_size: i64) -> PaginationOutput {
        let has_more_elements = elements_size > pagination_input.page_size;
        PaginationOutput::new(pagination_input.start_index, pagination_input.page_size, has_more_elements)
    }

    /**
     * Handles database errors and maps them to application errors.
     *
     * # Arguments
     * `error`: The database error to handle.
     *
     * # Returns
     * An `ApplicationError` corresponding to the database error.
     */
    fn handle_database_error(error: Option<&dyn sqlx::error::DatabaseError>) -> ApplicationError {
        if let Some(db_error) = error {
            tracing::debug!("Database error: {}", db_error);
            tracing::info!("Insert error: {:?}", db_error.code());
            if let Some(application_error) = db_error.code().as_deref().and_then(Self::error_for_code) {
                return application_error;
            }
            tracing::error!("Unhandled database error: {}", db_error);
            return ApplicationError::new(ErrorType::DatabaseError, "Unhandled database error".to_string());
        }
        ApplicationError::new(ErrorType::DatabaseError, "Failed to execute database operation".to_string())
    }

    /**
     * Maps a Postgres error code to the application error reported to the caller.
     *
     * # Returns
     * The `ApplicationError` for a known code, `None` otherwise.
     */
    fn error_for_code(code: &str) -> Option<ApplicationError> {
        match code {
            // Unique violation
            "23505" => Some(ApplicationError::new(ErrorType::ConstraintViolation, "Sale with the same invoice id already exists".to_string())),
            // Foreign key violation
            "23503" => Some(ApplicationError::new(ErrorType::ConstraintViolation, "Missing parent value".to_string())),
            "22001" => Some(ApplicationError::new(ErrorType::Validation, "Value too long".to_string())),
            "22003" => Some(ApplicationError::new(ErrorType::Validation, "Numeric value out of range".to_string())),
            _ => None,
        }
    }
}
