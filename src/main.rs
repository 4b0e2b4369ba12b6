mod api;
mod dao;
mod model;
mod service;

use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::api::endpoints::{
    analytics_breakdown, analytics_customers, analytics_products, analytics_time_series, dashboard, export_formats, health, info, sales_delete, sales_export, sales_list, sales_metrics,
    sales_upload,
};
use crate::api::middleware::timing_middleware;
use crate::api::security::JwtSecurityService;
use crate::api::state::AppState;
use crate::dao::sales::SalesDao;
use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::config::{AppSecurity, ApplicationArguments, Config, DatabaseType, HttpsConfig, LoggingConfig};
use crate::service::analytics::AnalyticsService;
use crate::service::dashboard::DashboardService;
use crate::service::export::ExportService;
use crate::service::processing::SalesDataProcessor;
use crate::service::sales::SalesService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::core::Collector;
use prometheus::{IntCounter, IntGauge};
use rustls::pki_types::PrivateKeyDer;
use rustls::{ServerConfig, SupportedProtocolVersion};
use rustls_pemfile::{certs, pkcs8_private_keys};
use sqlx::{Pool, Postgres, pool};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/**
 * Main entry point for the application.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let connection_pool: Pool<Postgres> = match config.clone().database.db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime } => pool::PoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_millis(acquire_timeout))
            .acquire_slow_threshold(Duration::from_millis(acquire_slow_threshold))
            .idle_timeout(Duration::from_millis(idle_timeout))
            .max_lifetime(Duration::from_millis(max_lifetime))
            .connect(connection_string.as_str())
            .await
            .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?,
    };
    sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&connection_pool).await.map_err(|err| std::io::Error::other(format!("Failed to run database migrations: {err}")))?;

    let jwt_service = get_security_service(&config.security)?;

    let prometheus = PrometheusMetricsBuilder::new("sales_analytics_api")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    // Initialize custom metrics
    let max_connections_gauge = IntGauge::new("max_connections", "Connection pool maximum").map_err(|err| std::io::Error::other(format!("Failed to create max_connections gauge: {err}")))?;
    let min_connections_gauge = IntGauge::new("min_connections", "Connection pool minimum").map_err(|err| std::io::Error::other(format!("Failed to create min_connections gauge: {err}")))?;
    let active_connections_gauge = IntGauge::new("active_connections", "Connection pool active").map_err(|err| std::io::Error::other(format!("Failed to create active_connections gauge: {err}")))?;
    let idle_connections_gauge = IntGauge::new("idle_connections", "Connection pool idle").map_err(|err| std::io::Error::other(format!("Failed to create idle_connections gauge: {err}")))?;
    let ingested_rows_counter = IntCounter::new("ingested_sales_rows", "Sales rows stored by uploads").map_err(|err| std::io::Error::other(format!("Failed to create ingested_sales_rows counter: {err}")))?;
    //Register custom prometheus metrics
    register_prometheus_metric(&prometheus, Box::new(max_connections_gauge.clone()))?;
    register_prometheus_metric(&prometheus, Box::new(min_connections_gauge.clone()))?;
    register_prometheus_metric(&prometheus, Box::new(active_connections_gauge.clone()))?;
    register_prometheus_metric(&prometheus, Box::new(idle_connections_gauge.clone()))?;
    register_prometheus_metric(&prometheus, Box::new(ingested_rows_counter.clone()))?;

    gather_db_metrics(max_connections_gauge, min_connections_gauge, active_connections_gauge, idle_connections_gauge, connection_pool.clone());

    let sales_service = SalesService::new(
        SalesDao::new(),
        Some(connection_pool),
        SalesDataProcessor::new(config.processing.clone()),
        config.processing.max_analysis_rows,
        ingested_rows_counter,
    );
    let analytics_service = AnalyticsService::new(config.analytics.rolling_window);
    let dashboard_service = DashboardService::new(analytics_service.clone());
    let export_service = ExportService::new(config.export.export_dir.clone(), config.export.max_export_rows);

    let state = web::Data::new(AppState::new(jwt_service, sales_service, analytics_service, dashboard_service, export_service));
    let max_upload_bytes = config.server.max_upload_bytes;

    let server_init = HttpServer::new(move || {
        App::new()
            .wrap(from_fn(timing_middleware))
            .wrap(prometheus.clone())
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .service(info)
            .service(health)
            .service(sales_upload)
            .service(sales_list)
            .service(sales_delete)
            .service(sales_metrics)
            .service(sales_export)
            .service(analytics_time_series)
            .service(analytics_products)
            .service(analytics_customers)
            .service(analytics_breakdown)
            .service(dashboard)
            .service(export_formats)
    });

    let host = config.server.host.as_str();
    let server_init = if let Some(http_port) = &config.server.http_port {
        info!("Listening for http on {}:{}", host, http_port);
        server_init.bind((host, *http_port))?
    } else {
        server_init
    };
    let server_init = if let Some(https_config) = &config.server.https_config {
        let ssl_builder = ssl_builder(https_config).map_err(|err| std::io::Error::other(format!("Failed to create SSL/TLS configuration: {err}")))?;
        info!("Listening for https on {}:{}", host, https_config.port);
        server_init.bind_rustls_0_23((host, https_config.port), ssl_builder).map_err(|err| std::io::Error::other(format!("Failed to bind HTTPS server: {err}")))?
    } else {
        server_init
    };

    server_init.workers(config.server.workers).run().await
}

/**
 * Initializes logging for the application.
 *
 * #Arguments
 * `logging`: Logging configuration. Filter directives from `RUST_LOG` are combined with the configured directives.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let mut env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in &logging.directives {
        let directive: Directive = directive.parse().map_err(|err| std::io::Error::other(format!("Invalid logging directive {directive}: {err}")))?;
        env_filter = env_filter.add_directive(directive);
    }

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_ansi(logging.ansi)
        .with_file(logging.file);

    let file_layer = match &logging.logfile {
        Some(logfile) => {
            let file = OpenOptions::new().create(true).append(true).open(logfile).map_err(|err| std::io::Error::other(format!("Failed to open log file {logfile}: {err}")))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(logging.target)
                    .with_thread_ids(logging.thread_ids)
                    .with_thread_names(logging.thread_names)
                    .with_line_number(logging.line_number)
                    .with_level(logging.level)
                    .with_ansi(false)
                    .with_file(logging.file)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))?;
    Ok(())
}

/**
 * Registers a custom Prometheus metric.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the metric with.
 * `collector`: The gauge or counter to register.
 */
fn register_prometheus_metric(prometheus_metrics: &PrometheusMetrics, collector: Box<dyn Collector>) -> Result<(), std::io::Error> {
    prometheus_metrics.registry.register(collector).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus metric: {err}")))?;
    Ok(())
}

/**
 * Gathers database metrics in a separate thread.
 *
 * #Arguments
 * `max_connections_gauge`: Gauge for maximum connections.
 * `min_connections_gauge`: Gauge for minimum connections.
 * `active_connections_gauge`: Gauge for active connections.
 * `idle_connections_gauge`: Gauge for idle connections.
 * `connection_pool`: The connection pool to gather metrics from.
 */
fn gather_db_metrics(max_connections_gauge: IntGauge, min_connections_gauge: IntGauge, active_connections_gauge: IntGauge, idle_connections_gauge: IntGauge, connection_pool: Pool<Postgres>) {
    thread::spawn(move || {
        loop {
            max_connections_gauge.set(i64::from(connection_pool.options().get_max_connections()));
            min_connections_gauge.set(i64::from(connection_pool.options().get_min_connections()));
            active_connections_gauge.set(i64::from(connection_pool.size()));
            #[allow(clippy::cast_possible_wrap)]
            idle_connections_gauge.set(connection_pool.num_idle() as i64);
            thread::sleep(Duration::from_secs(1));
        }
    });
}

/**
 * Initializes the SSL/TLS configuration for the server.
 *
 * #Arguments
 * `https_config`: The HTTPS configuration containing the certificate and private key files.
 *
 * #Returns
 * A `Result` containing the initialized `ServerConfig` or an `ApplicationError` if initialization fails.
 */
fn ssl_builder(https_config: &HttpsConfig) -> Result<ServerConfig, ApplicationError> {
    let config_builder = ServerConfig::builder_with_protocol_versions(&get_protocol_versions());
    let cert_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.certificate_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read certificate file: {err}")))?,
    );
    let key_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.private_key_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read private key file: {err}")))?,
    );
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>().map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert certificate to der: {err}")))?;
    let mut keys = pkcs8_private_keys(key_file)
        .map(|key| key.map(PrivateKeyDer::Pkcs8))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert private key to der: {err}")))?;
    if keys.is_empty() {
        return Err(ApplicationError::new(ErrorType::Initialization, "No private key found in private key file".to_string()));
    }
    let config = config_builder
        .with_no_client_auth()
        .with_single_cert(cert_chain, keys.remove(0))
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create server config: {err}")))?;
    Ok(config)
}

/**
 * Returns the supported TLS protocol versions.
 *
 * #Returns
 * A vector of supported protocol versions.
 */
fn get_protocol_versions() -> Vec<&'static SupportedProtocolVersion> {
    vec![&rustls::version::TLS13]
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}

/**
 * Initializes the JWT security service.
 *
 * #Arguments
 * `app_security`: Application security configuration with the verification key file and algorithm.
 *
 * #Returns
 * A `Result` containing the initialized `JwtSecurityService` or an `std::io::Error` if initialization fails.
 */
fn get_security_service(app_security: &AppSecurity) -> Result<JwtSecurityService, std::io::Error> {
    let public_key = fs::read_to_string(&app_security.jwt_public_key_file).map_err(|err| std::io::Error::other(format!("Failed to read JWT public key file: {err}")))?;
    JwtSecurityService::new(&public_key, &app_security.jwt_algorithm).map_err(|err| std::io::Error::other(format!("Failed to initialize JWT security: {err}")))
}
