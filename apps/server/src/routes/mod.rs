//! HTTP routes: a thin mapping from requests onto aggregator calls.

pub mod health;
pub mod metrics;
pub mod services;
pub mod status;

macros_utils::routes! {
    configure health::routes,
    configure status::routes,
    configure services::routes,
    configure metrics::routes,
}
