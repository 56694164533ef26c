//! # Operator Tag Codec
//!
//! The hosted backend's `movements` table has no dedicated column for the
//! operator identifier (matricula). When one is present it is encoded into a
//! structured prefix of the free-text note:
//!
//! ```text
//! obs:        "Retirada para evento"
//! matricula:  "007"
//!             │
//!             ▼  encode
//! wire obs:   "[Mat: 007] Retirada para evento"
//!             │
//!             ▼  decode (on every read)
//! (matricula: "007", obs: "Retirada para evento")
//! ```
//!
//! Decoding is applied only when the row carries no explicit matricula, so
//! rows written by a future schema with a real column pass through untouched.

// =============================================================================
// Encode
// =============================================================================

/// Encodes the operator tag into the note for the wire.
///
/// Without a matricula the note passes through unchanged. With one, the note
/// becomes `[Mat: <id>] <obs>`; a missing note yields just `[Mat: <id>]`.
pub fn encode(matricula: Option<&str>, obs: Option<&str>) -> Option<String> {
    match matricula {
        Some(mat) if !mat.is_empty() => {
            let tagged = format!("[Mat: {}] {}", mat, obs.unwrap_or_default());
            Some(tagged.trim_end().to_string())
        }
        _ => obs.map(|o| o.to_string()),
    }
}

// =============================================================================
// Decode
// =============================================================================

/// Splits a wire note back into `(matricula, obs)`.
///
/// Notes not carrying the `[Mat: ...]` prefix come back as
/// `(None, original)`. An empty remainder after the tag decodes to no note
/// rather than an empty string.
pub fn decode(obs: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(raw) = obs else {
        return (None, None);
    };

    let Some(rest) = raw.strip_prefix("[Mat: ") else {
        return (None, Some(raw.to_string()));
    };

    match rest.find(']') {
        Some(close) => {
            let matricula = rest[..close].to_string();
            let tail = rest[close + 1..].trim_start();
            let obs = if tail.is_empty() {
                None
            } else {
                Some(tail.to_string())
            };
            (Some(matricula), obs)
        }
        // Unterminated tag: treat the whole thing as a plain note.
        None => (None, Some(raw.to_string())),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let encoded = encode(Some("007"), Some("Retirada para evento"));
        assert_eq!(encoded.as_deref(), Some("[Mat: 007] Retirada para evento"));

        let (matricula, obs) = decode(encoded.as_deref());
        assert_eq!(matricula.as_deref(), Some("007"));
        assert_eq!(obs.as_deref(), Some("Retirada para evento"));
    }

    #[test]
    fn test_encode_without_obs() {
        let encoded = encode(Some("1234"), None);
        assert_eq!(encoded.as_deref(), Some("[Mat: 1234]"));

        let (matricula, obs) = decode(encoded.as_deref());
        assert_eq!(matricula.as_deref(), Some("1234"));
        assert_eq!(obs, None);
    }

    #[test]
    fn test_encode_without_matricula_passes_through() {
        assert_eq!(encode(None, Some("nota")), Some("nota".to_string()));
        assert_eq!(encode(None, None), None);
        assert_eq!(encode(Some(""), Some("nota")), Some("nota".to_string()));
    }

    #[test]
    fn test_decode_untagged_note() {
        let (matricula, obs) = decode(Some("apenas uma nota"));
        assert_eq!(matricula, None);
        assert_eq!(obs.as_deref(), Some("apenas uma nota"));
    }

    #[test]
    fn test_decode_unterminated_tag() {
        let (matricula, obs) = decode(Some("[Mat: 007 sem fechamento"));
        assert_eq!(matricula, None);
        assert_eq!(obs.as_deref(), Some("[Mat: 007 sem fechamento"));
    }

    #[test]
    fn test_decode_none() {
        assert_eq!(decode(None), (None, None));
    }
}
