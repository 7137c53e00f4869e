//! Small declarative helpers shared by the HTTP applications.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix_web;

/// Generate a `pub fn routes(&mut ServiceConfig)` for an actix-web module.
///
/// Each entry is either `route <handler>` for a handler annotated with one of
/// the actix routing macros (`#[get]`, `#[post]`, ...), or
/// `configure <path>` for another module's generated `routes` function.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     configure status::routes,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    (@register $cfg:ident, route $handler:path) => {
        $cfg.service($handler);
    };
    (@register $cfg:ident, configure $configure:path) => {
        $cfg.configure($configure);
    };
    ($($kind:ident $item:path),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix_web::web::ServiceConfig) {
            $( $crate::routes!(@register cfg, $kind $item); )*
        }
    };
}
