use actix_web::{HttpResponse, get, web};
use healthcheck::Aggregator;
use serde_json::json;

macros_utils::routes! {
    route list_services,
}

/// Names of all monitored services, sorted
#[get("/services")]
pub async fn list_services(aggregator: web::Data<Aggregator>) -> HttpResponse {
    let mut services = aggregator.list_services().await;
    services.sort();

    HttpResponse::Ok().json(json!({ "count": services.len(), "services": services }))
}
