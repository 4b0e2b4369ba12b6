use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::Sale,
};

/**
 * Supported export file formats.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "Comma-separated values format",
            ExportFormat::Json => "JavaScript Object Notation format",
        }
    }
}

/**
 * Description of an export format.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFormatInfo {
    pub format: ExportFormat,
    pub description: String,
    pub extension: String,
}

/**
 * Result of a completed export.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutputType {
    pub file_name: String,
    pub path: String,
    pub format: ExportFormat,
    pub records_exported: usize,
}

/**
 * Writes sales to export files.
 */
#[derive(Debug, Clone)]
pub struct ExportService {
    export_dir: PathBuf,
    max_export_rows: usize,
}

impl ExportService {
    /**
     * Creates a new instance of `ExportService`.
     *
     * # Arguments
     * `export_dir`: Directory export files are written to. Created on first export.
     * `max_export_rows`: Maximum number of sales in one export.
     */
    pub fn new(export_dir: impl Into<PathBuf>, max_export_rows: usize) -> Self {
        ExportService { export_dir: export_dir.into(), max_export_rows }
    }

    /**
     * Number of sales to fetch for an export. One more than the limit so an oversized export is detected.
     */
    pub fn fetch_limit(&self) -> i64 {
        i64::try_from(self.max_export_rows).unwrap_or(i64::MAX).saturating_add(1)
    }

    /**
     * Lists the supported export formats.
     */
    pub fn formats(&self) -> Vec<ExportFormatInfo> {
        [ExportFormat::Csv, ExportFormat::Json]
            .into_iter()
            .map(|format| ExportFormatInfo { format, description: format.description().to_string(), extension: format!(".{}", format.extension()) })
            .collect()
    }

    /**
     * Renders sales in the given format.
     *
     * # Returns
     * The file contents or an `ApplicationError` if serialization fails.
     */
    pub fn render(&self, sales: &[Sale], format: ExportFormat) -> Result<Vec<u8>, ApplicationError> {
        match format {
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_writer(vec![]);
                for sale in sales {
                    writer.serialize(sale).map_err(|err| ApplicationError::new(ErrorType::Export, format!("Failed to write csv record: {err}")))?;
                }
                writer.into_inner().map_err(|err| ApplicationError::new(ErrorType::Export, format!("Failed to flush csv: {err}")))
            }
            ExportFormat::Json => serde_json::to_vec_pretty(sales).map_err(|err| ApplicationError::new(ErrorType::Export, format!("Failed to write json: {err}"))),
        }
    }

    /**
     * Writes sales to a new file in the export directory, named `sales_export_<timestamp>_<suffix>.<extension>`.
     * The random suffix keeps exports of the same second apart, an existing file is never overwritten.
     *
     * # Arguments
     * `sales`: Sales to export.
     * `format`: Export file format.
     *
     * # Returns
     * A Result containing the `ExportOutputType` or an `ApplicationError`.
     */
    pub async fn export(&self, sales: &[Sale], format: ExportFormat) -> Result<ExportOutputType, ApplicationError> {
        if sales.is_empty() {
            return Err(ApplicationError::new(ErrorType::NotFound, "No sales found to export".to_string()));
        }
        if sales.len() > self.max_export_rows {
            return Err(ApplicationError::new(ErrorType::Validation, format!("Export of {} rows exceeds the limit of {} rows", sales.len(), self.max_export_rows)));
        }
        let contents = self.render(sales, format)?;
        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::Export, format!("Failed to create export directory {}: {err}", self.export_dir.display())))?;
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let file_name = format!("sales_export_{}_{}.{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"), &suffix[..8], format.extension());
        let path = self.export_dir.join(&file_name);
        let write_error = |err: std::io::Error| ApplicationError::new(ErrorType::Export, format!("Failed to write export file {}: {err}", path.display()));
        let mut file = tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await.map_err(write_error)?;
        file.write_all(&contents).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;
        info!("Exported {} sales to {}", sales.len(), path.display());
        Ok(ExportOutputType { file_name, path: path.display().to_string(), format, records_exported: sales.len() })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::service::analytics::test::sample_sales;

    fn temp_export_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sales_export_test_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_formats() {
        let formats = ExportService::new("exports", 10).formats();
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[0].format, ExportFormat::Csv);
        assert_eq!(formats[0].extension, ".csv");
        assert_eq!(formats[1].description, "JavaScript Object Notation format");
    }

    #[test]
    fn test_render_csv() {
        let contents = ExportService::new("exports", 10).render(&sample_sales(), ExportFormat::Csv).unwrap();
        let text = String::from_utf8(contents).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("invoice_id,branch,city,customer_type,gender,category,unit_price,quantity,total,date,time,payment_method,cogs,gross_margin_percentage,gross_income,rating")
        );
        assert_eq!(lines.next(), Some("INV001,A,Yangon,Member,Female,Food,10.00,2,20.00,2023-01-01,10:00:00,Cash,,,,8.0"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_render_json() {
        let contents = ExportService::new("exports", 10).render(&sample_sales(), ExportFormat::Json).unwrap();
        let parsed: Vec<Sale> = serde_json::from_slice(&contents).unwrap();
        assert_eq!(parsed, sample_sales());
    }

    #[actix_web::test]
    async fn test_export_writes_file() {
        let export_dir = temp_export_dir();
        let service = ExportService::new(&export_dir, 10);
        let output = service.export(&sample_sales(), ExportFormat::Json).await.unwrap();
        assert!(output.file_name.starts_with("sales_export_"));
        assert!(output.file_name.ends_with(".json"));
        assert_eq!(output.records_exported, 3);
        let written = tokio::fs::read(&output.path).await.unwrap();
        assert_eq!(written, service.render(&sample_sales(), ExportFormat::Json).unwrap());
        tokio::fs::remove_dir_all(&export_dir).await.unwrap();
    }

    #[actix_web::test]
    async fn test_exports_in_same_second_get_own_files() {
        let export_dir = temp_export_dir();
        let service = ExportService::new(&export_dir, 10);
        let sales = sample_sales();
        let first = service.export(&sales[..1], ExportFormat::Csv).await.unwrap();
        let second = service.export(&sales, ExportFormat::Csv).await.unwrap();
        assert_ne!(first.path, second.path);
        assert_eq!(tokio::fs::read(&first.path).await.unwrap(), service.render(&sales[..1], ExportFormat::Csv).unwrap());
        assert_eq!(tokio::fs::read(&second.path).await.unwrap(), service.render(&sales, ExportFormat::Csv).unwrap());
        tokio::fs::remove_dir_all(&export_dir).await.unwrap();
    }

    #[test]
    fn test_fetch_limit_exceeds_max_export_rows() {
        assert_eq!(ExportService::new("exports", 3).fetch_limit(), 4);
        assert_eq!(ExportService::new("exports", usize::MAX).fetch_limit(), i64::MAX);
    }

    #[actix_web::test]
    async fn test_export_without_sales() {
        let result = ExportService::new(temp_export_dir(), 10).export(&[], ExportFormat::Csv).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::NotFound);
    }

    #[actix_web::test]
    async fn test_export_too_many_rows() {
        let result = ExportService::new(temp_export_dir(), 2).export(&sample_sales(), ExportFormat::Csv).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::Validation);
    }

    #[test]
    fn test_export_format_deserialization() {
        let format: ExportFormat = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(format, ExportFormat::Csv);
        assert!(serde_json::from_str::<ExportFormat>("\"excel\"").is_err());
    }
}
