//! Cached FairScore packing inside a profile bio.
//!
//! The profile store has no structured field for a reputation score, so the
//! last observed score rides along inside the free-text `bio` field as
//! `"<bio-text> |FAIRSCORE_META|{\"score\":<n>,\"ts\":<epoch-millis>}"`.
//! [`pack`] produces that composite form and [`extract`] recovers both
//! halves. The wire format must stay bit-exact: records packed by earlier
//! deployments are still stored upstream.
//!
//! User text that itself contains the sentinel literal is not escaped. A bio
//! that legitimately contains `|FAIRSCORE_META|` loses everything after the
//! first occurrence on extraction. Known limitation of the stored schema;
//! fixing it would require a structured side-channel on the profile record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Boundary between the human-readable bio and the encoded score payload.
const META_DIVIDER: &str = "|FAIRSCORE_META|";

/// Cached scores older than this are considered stale.
const MAX_SCORE_AGE_HOURS: i64 = 24;

/// A reputation score observed at a point in time.
///
/// Serialized inside the composite bio as `{"score":<n>,"ts":<epoch-millis>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedScore {
    pub score: i64,
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}

/// Result of decomposing a composite bio string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreExtraction {
    pub clean_bio: String,
    pub cached_score: Option<CachedScore>,
}

/// Appends the score metadata suffix to a trimmed bio.
///
/// The capture instant is read here rather than taken from the caller, so
/// repeated packs of the same score carry non-decreasing timestamps.
#[must_use]
pub fn pack(clean_bio: &str, score: i64) -> String {
    format!(
        "{} {META_DIVIDER}{{\"score\":{score},\"ts\":{}}}",
        clean_bio.trim(),
        Utc::now().timestamp_millis()
    )
}

/// Splits a stored bio into its clean text and the cached score, if any.
///
/// Only the first sentinel occurrence is honored: everything after it,
/// including any further sentinel literals, is handed whole to the JSON
/// parser. A payload that fails to parse, or that lacks numeric `score` and
/// `ts` fields, yields `cached_score: None`; corruption never surfaces as
/// an error, and the clean text recovered so far is always returned.
#[must_use]
pub fn extract(bio: Option<&str>) -> ScoreExtraction {
    let Some(bio) = bio else {
        return ScoreExtraction {
            clean_bio: String::new(),
            cached_score: None,
        };
    };

    match bio.split_once(META_DIVIDER) {
        None => ScoreExtraction {
            clean_bio: bio.to_owned(),
            cached_score: None,
        },
        Some((text, payload)) => ScoreExtraction {
            clean_bio: text.trim().to_owned(),
            cached_score: serde_json::from_str(payload).ok(),
        },
    }
}

/// Whether a cached score is still usable under the default 24-hour window.
#[must_use]
pub fn is_fresh(cached: Option<&CachedScore>) -> bool {
    is_fresh_within(cached, Duration::hours(MAX_SCORE_AGE_HOURS))
}

/// Whether a cached score was captured less than `max_age` ago.
///
/// `None` is never fresh. Pure function of wall-clock time.
#[must_use]
pub fn is_fresh_within(cached: Option<&CachedScore>, max_age: Duration) -> bool {
    cached.is_some_and(|meta| Utc::now() - meta.captured_at < max_age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_extract_round_trips() {
        let packed = pack("on-chain since 2021", 842);
        let extraction = extract(Some(&packed));
        assert_eq!(extraction.clean_bio, "on-chain since 2021");
        let cached = extraction.cached_score.expect("score should decode");
        assert_eq!(cached.score, 842);
    }

    #[test]
    fn pack_trims_the_bio() {
        let packed = pack("  hello world  ", 5);
        assert!(packed.starts_with("hello world |FAIRSCORE_META|"));
        assert_eq!(extract(Some(&packed)).clean_bio, "hello world");
    }

    #[test]
    fn pack_emits_wire_field_names() {
        let packed = pack("bio", 7);
        let (_, payload) = packed.split_once("|FAIRSCORE_META|").expect("sentinel");
        let json: serde_json::Value = serde_json::from_str(payload).expect("valid JSON");
        assert_eq!(json["score"].as_i64(), Some(7));
        assert!(json["ts"].as_i64().is_some(), "ts must be epoch millis");
    }

    #[test]
    fn repacking_does_not_decrease_capture_instant() {
        let first = extract(Some(&pack("bio", 1))).cached_score.unwrap();
        let second = extract(Some(&pack("bio", 1))).cached_score.unwrap();
        assert!(second.captured_at >= first.captured_at);
    }

    #[test]
    fn extract_absent_input_is_empty() {
        let extraction = extract(None);
        assert_eq!(extraction.clean_bio, "");
        assert!(extraction.cached_score.is_none());
    }

    #[test]
    fn extract_without_sentinel_passes_input_through() {
        // No sentinel means the whole input is the bio, untrimmed.
        let extraction = extract(Some("  just a bio  "));
        assert_eq!(extraction.clean_bio, "  just a bio  ");
        assert!(extraction.cached_score.is_none());
    }

    #[test]
    fn extract_swallows_malformed_payload() {
        let extraction = extract(Some("hello |FAIRSCORE_META|not-json"));
        assert_eq!(extraction.clean_bio, "hello");
        assert!(extraction.cached_score.is_none());
    }

    #[test]
    fn extract_rejects_non_numeric_fields() {
        let extraction = extract(Some(r#"hello |FAIRSCORE_META|{"score":"high","ts":1}"#));
        assert_eq!(extraction.clean_bio, "hello");
        assert!(extraction.cached_score.is_none());
    }

    #[test]
    fn extract_requires_both_fields() {
        let extraction = extract(Some(r#"hello |FAIRSCORE_META|{"score":9}"#));
        assert_eq!(extraction.clean_bio, "hello");
        assert!(extraction.cached_score.is_none());
    }

    #[test]
    fn extract_splits_on_first_sentinel_only() {
        // The remainder, second sentinel included, goes whole to the JSON
        // parser; the trailing garbage makes it unparseable.
        let bio = r#"a |FAIRSCORE_META|{"score":1,"ts":1}|FAIRSCORE_META|{"score":2,"ts":2}"#;
        let extraction = extract(Some(bio));
        assert_eq!(extraction.clean_bio, "a");
        assert!(extraction.cached_score.is_none());
    }

    #[test]
    fn reextracting_a_clean_bio_is_a_noop() {
        let first = extract(Some("plain bio |FAIRSCORE_META|junk"));
        let second = extract(Some(&first.clean_bio));
        assert_eq!(second.clean_bio, first.clean_bio);
    }

    #[test]
    fn is_fresh_none_is_false() {
        assert!(!is_fresh(None));
    }

    #[test]
    fn is_fresh_just_inside_the_window() {
        let cached = CachedScore {
            score: 5,
            captured_at: Utc::now() - Duration::hours(24) + Duration::seconds(1),
        };
        assert!(is_fresh(Some(&cached)));
    }

    #[test]
    fn is_fresh_just_outside_the_window() {
        let cached = CachedScore {
            score: 5,
            captured_at: Utc::now() - Duration::hours(24) - Duration::seconds(1),
        };
        assert!(!is_fresh(Some(&cached)));
    }

    #[test]
    fn is_fresh_within_respects_custom_window() {
        let cached = CachedScore {
            score: 5,
            captured_at: Utc::now() - Duration::minutes(10),
        };
        assert!(is_fresh_within(Some(&cached), Duration::hours(1)));
        assert!(!is_fresh_within(Some(&cached), Duration::minutes(5)));
    }
}
