//! Shared filename generation for image hosts.

use chrono::Utc;

/// Generate a unique upload filename for the given owner.
///
/// Format: `{owner_id}_{unix_timestamp}_{random_hex}` with 4 random bytes hex-encoded.
pub fn upload_filename(owner_id: i64) -> String {
    filename_at(owner_id, Utc::now().timestamp(), rand::random::<[u8; 4]>())
}

fn filename_at(owner_id: i64, timestamp: i64, random: [u8; 4]) -> String {
    format!("{}_{}_{}", owner_id, timestamp, hex::encode(random))
}
