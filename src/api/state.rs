use crate::{
    api::security::JwtSecurityService,
    service::{analytics::AnalyticsService, dashboard::DashboardService, export::ExportService, sales::SalesService},
};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The JWT security service for handling authentication and authorization.
     */
    pub jwt_service: JwtSecurityService,
    /**
     * The sales service for uploads and sales queries.
     */
    pub sales_service: SalesService,
    /**
     * Aggregates over loaded sales.
     */
    pub analytics_service: AnalyticsService,
    /**
     * Dashboard page assembly.
     */
    pub dashboard_service: DashboardService,
    /**
     * Export file writer.
     */
    pub export_service: ExportService,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `jwt_service`: The JWT security service for handling authentication and authorization.
 * `sales_service`: The sales service for uploads and sales queries.
 * `analytics_service`: Aggregates over loaded sales.
 * `dashboard_service`: Dashboard page assembly.
 * `export_service`: Export file writer.
 */
impl AppState {
    pub fn new(jwt_service: JwtSecurityService, sales_service: SalesService, analytics_service: AnalyticsService, dashboard_service: DashboardService, export_service: ExportService) -> Self {
        AppState { jwt_service, sales_service, analytics_service, dashboard_service, export_service }
    }
}
