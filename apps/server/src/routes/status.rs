use actix_web::{HttpResponse, get, web};
use healthcheck::Aggregator;
use serde_json::json;
use tracing::debug;

use crate::error::ApiError;

macros_utils::routes! {
    route all_statuses,
    route service_status,
}

/// Status of every monitored service
#[get("/status")]
pub async fn all_statuses(aggregator: web::Data<Aggregator>) -> HttpResponse {
    let services = aggregator.get_all_statuses().await;
    HttpResponse::Ok().json(json!({ "services": services }))
}

#[get("/status/{service}")]
pub async fn service_status(
    aggregator: web::Data<Aggregator>,
    service: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let service = service.into_inner();
    debug!(service = %service, "Status requested");

    let status = aggregator.get_status(&service).await?;
    Ok(HttpResponse::Ok().json(status))
}
