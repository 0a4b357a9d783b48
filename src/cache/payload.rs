use std::io::{Read, Write};

use chrono::{Datelike, NaiveDate};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{AppError, Result};
use crate::types::LeagueSnapshot;

/// Season a date belongs to: July onwards starts a new season.
///
/// `2024-08-10` → `"2024/2025"`, `2025-03-01` → `"2024/2025"`.
pub fn season_label(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= 7 {
        format!("{}/{}", year, year + 1)
    } else {
        format!("{}/{}", year - 1, year)
    }
}

/// JSON, gzip-compressed.
pub fn encode(snapshot: &LeagueSnapshot) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(snapshot)?;
    let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

pub fn decode(bytes: &[u8]) -> Result<LeagueSnapshot> {
    let mut json = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(|e| AppError::Payload(format!("corrupt snapshot payload: {e}")))?;
    serde_json::from_slice(&json).map_err(|e| AppError::Payload(format!("undecodable snapshot: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_boundaries() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(season_label(d(2024, 7, 1)), "2024/2025");
        assert_eq!(season_label(d(2024, 6, 30)), "2023/2024");
        assert_eq!(season_label(d(2025, 1, 15)), "2024/2025");
        assert_eq!(season_label(d(2024, 12, 31)), "2024/2025");
    }

    #[test]
    fn garbage_is_a_payload_error() {
        let err = decode(b"definitely not gzip").unwrap_err();
        assert!(matches!(err, AppError::Payload(_)));
        assert!(err.is_storage());
    }
}
