use prometheus::IntCounter;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};

use crate::{
    dao::sales::SalesDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{IngestOutputType, PaginationInput, Sale, SalesFilter, SalesListOutputType},
    },
    service::processing::SalesDataProcessor,
};

/**
 * Represents the service for managing sales.
 */
pub struct SalesService {
    /**
     * The DAO for sales operations.
     */
    sales_dao: SalesDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
    /**
     * Reads, cleans and validates uploaded files.
     */
    data_processor: SalesDataProcessor,
    /**
     * Upper limit of sales loaded for a single analytics request.
     */
    max_analysis_rows: i64,
    /**
     * Counts sales rows written by uploads.
     */
    ingested_rows: IntCounter,
}

impl SalesService {
    /**
     * Creates a new instance of `SalesService`.
     *
     * # Arguments
     * `sales_dao`: The DAO for sales operations.
     * `connection_pool`: Optional connection pool for database operations.
     * `data_processor`: Processor for uploaded files.
     * `max_analysis_rows`: Upper limit of sales loaded for analytics.
     * `ingested_rows`: Counter of ingested sales rows.
     *
     * # Returns
     * A new instance of `SalesService`.
     */
    pub fn new(sales_dao: SalesDao, connection_pool: Option<Pool<Postgres>>, data_processor: SalesDataProcessor, max_analysis_rows: i64, ingested_rows: IntCounter) -> Self {
        SalesService { sales_dao, connection_pool, data_processor, max_analysis_rows, ingested_rows }
    }

    fn connection_pool(&self) -> Result<&Pool<Postgres>, ApplicationError> {
        self.connection_pool.as_ref().ok_or_else(|| ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()))
    }

    /**
     * Processes an uploaded CSV file and stores the cleaned sales.
     *
     * Nothing is stored when validation fails, the returned output then has `success` set to false. All sales are
     * stored in one transaction, a duplicate invoice id rolls back the whole upload.
     *
     * # Arguments
     * `contents`: The uploaded file.
     * `inserted_by`: Name of the user uploading the file.
     *
     * # Returns
     * A Result containing `IngestOutputType` or an `ApplicationError`.
     */
    pub async fn ingest_csv(&self, contents: Vec<u8>, inserted_by: &str) -> Result<IngestOutputType, ApplicationError> {
        let data_processor = self.data_processor.clone();
        let processed = tokio::task::spawn_blocking(move || data_processor.process(&contents))
            .await
            .map_err(|err| ApplicationError::new(ErrorType::Application, format!("Failed to process uploaded file: {err}")))??;
        if !processed.validation.success {
            warn!("Upload rejected, validation failed");
            return Ok(IngestOutputType { success: false, records_processed: 0, cleaning: processed.cleaning, validation: processed.validation });
        }
        let connection_pool = self.connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let records_processed = match self.sales_dao.add_sales(&mut transaction, &processed.sales, inserted_by).await {
            Ok(records_processed) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                records_processed
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                return Err(err);
            }
        };
        self.ingested_rows.inc_by(u64::try_from(records_processed).unwrap_or(u64::MAX));
        info!("Stored {} sales uploaded by {}", records_processed, inserted_by);
        Ok(IngestOutputType { success: true, records_processed, cleaning: processed.cleaning, validation: processed.validation })
    }

    /**
     * Retrieves a page of sales matching the filter.
     *
     * # Arguments
     * `filter`: Sales filter.
     * `pagination_input`: `PaginationInput` containing pagination information.
     *
     * # Returns
     * A Result containing `SalesListOutputType` or an `ApplicationError`.
     */
    pub async fn list_sales(&self, filter: SalesFilter, pagination_input: PaginationInput) -> Result<SalesListOutputType, ApplicationError> {
        let filter = filter.validate()?;
        let pagination_input = pagination_input.validate()?;
        let mut connection = self.connection_pool()?.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.sales_dao.get_sales_list(&mut connection, &filter, pagination_input).await
    }

    /**
     * Retrieves the sales matching the filter for analytics and exports.
     *
     * # Arguments
     * `filter`: Sales filter.
     *
     * # Returns
     * A Result containing at most the configured number of sales or an `ApplicationError`.
     */
    pub async fn get_sales(&self, filter: SalesFilter) -> Result<Vec<Sale>, ApplicationError> {
        let sales = self.get_sales_with_limit(filter, self.max_analysis_rows).await?;
        if i64::try_from(sales.len()).is_ok_and(|rows| rows >= self.max_analysis_rows) {
            warn!("Sales query reached the limit of {} rows", self.max_analysis_rows);
        }
        Ok(sales)
    }

    /**
     * Retrieves at most `limit` sales matching the filter. Used by exports, which apply their own row limit.
     *
     * # Arguments
     * `filter`: Sales filter.
     * `limit`: Maximum number of sales returned.
     *
     * # Returns
     * A Result containing the sales or an `ApplicationError`.
     */
    pub async fn get_sales_with_limit(&self, filter: SalesFilter, limit: i64) -> Result<Vec<Sale>, ApplicationError> {
        let filter = filter.validate()?;
        let mut connection = self.connection_pool()?.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.sales_dao.get_sales(&mut connection, &filter, limit).await
    }

    /**
     * Deletes a sale by its invoice id.
     *
     * # Arguments
     * `invoice_id`: Invoice id of the sale to be deleted.
     *
     * # Returns
     * A Result indicating success or an `ApplicationError`.
     */
    pub async fn delete_sale(&self, invoice_id: &str) -> Result<(), ApplicationError> {
        let connection_pool = self.connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        match self.sales_dao.delete_sale(&mut transaction, invoice_id).await {
            Ok(()) => transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?,
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                return Err(err);
            }
        }
        Ok(())
    }

    /**
     * Whether the database answers.
     */
    pub async fn database_available(&self) -> bool {
        let Ok(connection_pool) = self.connection_pool() else {
            return false;
        };
        let Ok(mut connection) = connection_pool.acquire().await else {
            return false;
        };
        self.sales_dao.ping(&mut connection).await.is_ok()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::model::config::ProcessingConfig;

    pub(crate) fn service_without_database() -> SalesService {
        let ingested_rows = IntCounter::new("test_ingested_rows", "Ingested rows").unwrap();
        SalesService::new(SalesDao::new(), None, SalesDataProcessor::new(ProcessingConfig::default()), 1000, ingested_rows)
    }

    #[actix_web::test]
    async fn test_ingest_rejects_invalid_file_without_database() {
        let contents = b"invoice_id,branch,category,unit_price,quantity,date,payment_method\nINV001,A,Food,-1.00,1,2023-01-01,Cash\n".to_vec();
        let output = service_without_database().ingest_csv(contents, "test_user").await.unwrap();
        assert!(!output.success);
        assert_eq!(output.records_processed, 0);
        assert_eq!(output.cleaning.rows_kept, 1);
    }

    #[actix_web::test]
    async fn test_ingest_missing_columns() {
        let result = service_without_database().ingest_csv(b"invoice_id,branch\nINV001,A\n".to_vec(), "test_user").await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::DataProcessing);
    }

    #[actix_web::test]
    async fn test_ingest_valid_file_needs_database() {
        let contents = b"invoice_id,branch,category,unit_price,quantity,date,payment_method\nINV001,A,Food,1.00,1,2023-01-01,Cash\n".to_vec();
        let result = service_without_database().ingest_csv(contents, "test_user").await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::DatabaseError);
    }

    #[actix_web::test]
    async fn test_list_sales_validates_before_database() {
        let filter = SalesFilter { start_date: chrono::NaiveDate::from_ymd_opt(2023, 2, 1), end_date: chrono::NaiveDate::from_ymd_opt(2023, 1, 1), ..SalesFilter::default() };
        let result = service_without_database().list_sales(filter, PaginationInput { start_index: 0, page_size: 10 }).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::Validation);

        let result = service_without_database().list_sales(SalesFilter::default(), PaginationInput { start_index: 0, page_size: 0 }).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::Validation);
    }

    #[actix_web::test]
    async fn test_database_not_available() {
        let service = service_without_database();
        assert!(!service.database_available().await);
        assert_eq!(service.get_sales(SalesFilter::default()).await.unwrap_err().error_type, ErrorType::DatabaseError);
        assert_eq!(service.get_sales_with_limit(SalesFilter::default(), 10).await.unwrap_err().error_type, ErrorType::DatabaseError);
        assert_eq!(service.delete_sale("INV001").await.unwrap_err().error_type, ErrorType::DatabaseError);
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::model::config::ProcessingConfig;
    use crate::service::export::{ExportFormat, ExportService};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_export_over_limit_sees_all_matching_sales() {
        dotenv::from_filename("./sqlx-postgresql-migration/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&pool).await.unwrap();
        let ingested_rows = IntCounter::new("test_export_ingested_rows", "Ingested rows").unwrap();
        let service = SalesService::new(SalesDao::new(), Some(pool), SalesDataProcessor::new(ProcessingConfig::default()), 3, ingested_rows);

        let branch = format!("EXPORT-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        let mut contents = String::from("invoice_id,branch,category,unit_price,quantity,date,payment_method\n");
        for index in 0..5 {
            contents.push_str(&format!("{branch}-{index},{branch},Food,1.00,1,2023-01-01,Cash\n"));
        }
        let output = service.ingest_csv(contents.into_bytes(), "test_user").await.unwrap();
        assert_eq!(output.records_processed, 5);

        let export_service = ExportService::new(std::env::temp_dir(), 3);
        let filter = SalesFilter { branch: Some(branch.clone()), ..SalesFilter::default() };
        let sales = service.get_sales_with_limit(filter, export_service.fetch_limit()).await.unwrap();
        assert_eq!(sales.len(), 4);
        let result = export_service.export(&sales, ExportFormat::Csv).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::Validation);

        for index in 0..5 {
            service.delete_sale(&format!("{branch}-{index}")).await.unwrap();
        }
    }
}
