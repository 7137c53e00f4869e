use std::env::var;

use dotenvy::dotenv;

/// Variables whose `.env` / build-time value becomes the compiled-in default
const BAKED_DEFAULTS: [&str; 3] = ["BIND", "PORT", "HEALTHCHECK_CONFIG"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    dotenv().ok();

    for key in BAKED_DEFAULTS {
        println!("cargo:rerun-if-env-changed={key}");
        if let Ok(value) = var(key) {
            println!("cargo:rustc-env=DEFAULT_{key}={value}");
        }
    }
}
