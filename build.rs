//! Stamps the build time into `PLY2COLMAP_BUILD_STAMP` for `version`.
//!
//! `SOURCE_DATE_EPOCH` pins the stamp for reproducible builds.

use std::env;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn build_time() -> OffsetDateTime {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .unwrap_or_else(OffsetDateTime::now_utc)
}

fn main() {
    let stamp = build_time()
        .replace_nanosecond(0)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=PLY2COLMAP_BUILD_STAMP={stamp}");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=build.rs");
}
