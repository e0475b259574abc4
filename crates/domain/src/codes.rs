//! Human-readable code generation.
//!
//! Codes are display identifiers only; uniqueness is enforced by the
//! caller (existence check plus retry), not by the generator.

use chrono::Utc;
use uuid::Uuid;

/// Generates a shipment tracking number: `SHP` + 8 digits derived from the
/// wall clock + 4 random digits.
pub fn tracking_number() -> String {
    let millis = (Utc::now().timestamp_millis() as u64) % 100_000_000;
    format!("SHP{:08}{:04}", millis, random_suffix())
}

/// Generates a return code: `RET` + wall-clock millis + 4 random digits.
pub fn return_code() -> String {
    let millis = Utc::now().timestamp_millis();
    format!("RET{}{:04}", millis, random_suffix())
}

fn random_suffix() -> u32 {
    let bytes = Uuid::new_v4().into_bytes();
    ((u32::from(bytes[0]) << 8) | u32::from(bytes[1])) % 10_000
}
