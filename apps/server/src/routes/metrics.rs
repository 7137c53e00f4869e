use actix_web::{HttpResponse, get, web};
use healthcheck::Aggregator;

use crate::prometheus;

macros_utils::routes! {
    route metrics_route,
}

/// Prometheus exposition of every monitored service
#[get("/metrics")]
pub async fn metrics_route(aggregator: web::Data<Aggregator>) -> HttpResponse {
    let metrics = aggregator.metrics().get_metrics().await;
    let statuses = aggregator.get_all_statuses().await;

    HttpResponse::Ok()
        .content_type(prometheus::CONTENT_TYPE)
        .body(prometheus::render(&statuses, &metrics))
}
