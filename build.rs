//! Build script for bpstats
//!
//! Embeds a build number and the compile timestamp. The number is kept in
//! `build_number.txt` and bumped whenever sources change; CI can pin it with
//! `BPSTATS_PIN_BUILD_NUMBER`.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn read_counter(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed=BPSTATS_PIN_BUILD_NUMBER");

    let counter_path = Path::new(COUNTER_FILE);

    let build_number = match std::env::var("BPSTATS_PIN_BUILD_NUMBER")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
    {
        Some(pinned) => pinned,
        None => {
            let next = read_counter(counter_path) + 1;
            if let Err(e) = fs::write(counter_path, next.to_string()) {
                println!("cargo:warning=could not persist build number: {}", e);
            }
            next
        }
    };

    let compiled_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=BPSTATS_BUILD_NUMBER={}", build_number);
    println!("cargo:rustc-env=BPSTATS_BUILD_TIMESTAMP={}", compiled_at);
}
