use std::time::{SystemTime, UNIX_EPOCH};

#[path = "src/version/phonetic.rs"]
mod phonetic;

fn main() {
    // Reproducible builds pin the timestamp
    let timestamp = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

    println!(
        "cargo:rustc-env=BUILD_NAME={}",
        phonetic::phonetic_name(timestamp)
    );
}
