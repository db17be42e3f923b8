//! Verification payloads.
//!
//! A submitter hands the operator their record as base64-encoded JSON; the
//! operator pastes it into the registry on another device.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::errors::{RegistryError, RegistryResult};
use crate::types::IdentityRecord;

/// Encode a record for hand-off.
pub fn encode_payload(record: &IdentityRecord) -> RegistryResult<String> {
    let json = serde_json::to_vec(record).map_err(RegistryError::Encode)?;
    Ok(STANDARD.encode(json))
}

/// Decode a pasted payload back into a record.
pub fn decode_payload(payload: &str) -> RegistryResult<IdentityRecord> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::InvalidPayload("empty payload".to_string()));
    }

    let bytes = STANDARD
        .decode(trimmed)
        .map_err(|e| RegistryError::InvalidPayload(e.to_string()))?;
    let record: IdentityRecord = serde_json::from_slice(&bytes)
        .map_err(|e| RegistryError::InvalidPayload(e.to_string()))?;

    if record.email.trim().is_empty() {
        return Err(RegistryError::InvalidPayload("record has no email".to_string()));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Profile;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_payload_survives_arabic_profile_text() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let record = IdentityRecord::new(
            "jane@x.com",
            Profile {
                full_name: "جين".to_string(),
                city: "القاهرة".to_string(),
                ..Default::default()
            },
            created,
        );

        let payload = encode_payload(&record).unwrap();
        assert_eq!(decode_payload(&format!("  {payload}\n")).unwrap(), record);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode_payload(""),
            Err(RegistryError::InvalidPayload(_))
        ));
        assert!(matches!(
            decode_payload("not base64!!"),
            Err(RegistryError::InvalidPayload(_))
        ));

        let no_email = STANDARD.encode(r#"{"id":"x","email":"  ","createdAt":0}"#);
        assert!(matches!(
            decode_payload(&no_email),
            Err(RegistryError::InvalidPayload(_))
        ));
    }
}
