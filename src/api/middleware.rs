use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    middleware::Next,
};
use tracing::debug;

/**
 * Response header carrying the request processing time in seconds.
 */
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/**
 * Middleware for timing requests. Adds the processing time to the response headers.
 */
pub async fn timing_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = std::time::Instant::now();
    let path = &request.path().to_owned();
    let method = &request.method().to_owned();
    let response = next.call(request).await;
    let duration = start_time.elapsed();
    match response {
        Ok(mut service_response) => {
            debug!(target: "performance", "Request for {} {} with status {} processed in {}ms", method, path, service_response.status().as_u16(), duration.as_millis());
            if let Ok(value) = HeaderValue::from_str(&format!("{:.6}", duration.as_secs_f64())) {
                service_response.headers_mut().insert(HeaderName::from_static(PROCESS_TIME_HEADER), value);
            }
            Ok(service_response)
        }
        Err(err) => {
            debug!(target: "performance", "Request for {} {} failed after {}ms", method, path, duration.as_millis());
            Err(err)
        }
    }
}

#[cfg(test)]
mod test {
    use actix_web::{App, HttpResponse, middleware::from_fn, test, web};

    use super::*;

    #[actix_web::test]
    async fn test_process_time_header() {
        let app = test::init_service(App::new().wrap(from_fn(timing_middleware)).route("/", web::get().to(|| async { HttpResponse::Ok().finish() }))).await;
        let response = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(response.status().is_success());
        let header = response.headers().get(PROCESS_TIME_HEADER).unwrap().to_str().unwrap();
        assert!(header.parse::<f64>().unwrap() >= 0.0);
    }
}
