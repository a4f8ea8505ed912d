//! Wire format tests.
//!
//! These pin the JSON shape callers and the state snapshot depend on:
//! - Structs serialize with camelCase field names
//! - Enum values serialize as snake_case strings
//! - History records written by an older build still deserialize

use chrono::{TimeZone, Utc};
use guardian_common::*;
use serde_json::json;

fn sample_result() -> ScanResult {
    ScanResult {
        content_id: "youtube:dQw4w9WgXcQ".into(),
        platform: Platform::Youtube,
        canonical_id: "dQw4w9WgXcQ".into(),
        creator_id: "youtube_creator_UC1".into(),
        verdict: Verdict::LikelyAi,
        final_score: 0.75,
        confidence_band: ConfidenceBand::High,
        platform_score: 1.0,
        community_score: 0.5,
        model_score: 0.5,
        evidence: vec![
            EvidenceItem {
                source: EvidenceSource::Platform,
                message: "YouTube containsSyntheticMedia is true.".into(),
                strength: Strength::High,
            },
            EvidenceItem {
                source: EvidenceSource::UserList,
                message: "x".into(),
                strength: Strength::High,
            },
        ],
        scanned_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
    }
}

#[test]
fn scan_result_uses_camel_case_fields() {
    let value = serde_json::to_value(sample_result()).unwrap();
    let obj = value.as_object().unwrap();
    for key in [
        "contentId",
        "platform",
        "canonicalId",
        "creatorId",
        "verdict",
        "finalScore",
        "confidenceBand",
        "platformScore",
        "communityScore",
        "modelScore",
        "evidence",
        "scannedAt",
    ] {
        assert!(obj.contains_key(key), "missing key {key}");
    }
    assert_eq!(obj.len(), 12);
}

#[test]
fn enums_serialize_snake_case() {
    let value = serde_json::to_value(sample_result()).unwrap();
    assert_eq!(value["verdict"], "likely_ai");
    assert_eq!(value["platform"], "youtube");
    assert_eq!(value["confidenceBand"], "high");
    assert_eq!(value["evidence"][1]["source"], "user_list");

    assert_eq!(serde_json::to_value(VoteChoice::NotAi).unwrap(), "not_ai");
    assert_eq!(serde_json::to_value(Verdict::LikelyHuman).unwrap(), "likely_human");
    assert_eq!(serde_json::to_value(ListType::Allow).unwrap(), "allow");
}

#[test]
fn older_history_record_deserializes() {
    let raw = json!({
        "contentId": "other:0123456789abcdef",
        "platform": "other",
        "canonicalId": "0123456789abcdef",
        "creatorId": "creator_01234567",
        "verdict": "unclear",
        "finalScore": 0.5,
        "confidenceBand": "medium",
        "platformScore": 0.5,
        "communityScore": 0.5,
        "modelScore": 0.5,
        "evidence": [
            {
                "source": "settings",
                "message": "Conservative mode is ON (stricter AI threshold).",
                "strength": "medium"
            }
        ],
        "scannedAt": "2026-02-10T08:00:00Z"
    });

    let result: ScanResult = serde_json::from_value(raw).unwrap();
    assert_eq!(result.verdict, Verdict::Unclear);
    assert_eq!(result.evidence[0].source, EvidenceSource::Settings);
    assert_eq!(result.content_id, "other:0123456789abcdef");
}

#[test]
fn vote_and_list_entry_shapes() {
    let vote = Vote {
        content_id: "tiktok:7301".into(),
        user_fingerprint: "trusted_abc".into(),
        vote: VoteChoice::Unsure,
        weight: 1.5,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
    };
    let value = serde_json::to_value(&vote).unwrap();
    assert_eq!(value["userFingerprint"], "trusted_abc");
    assert_eq!(value["vote"], "unsure");
    assert!(value.get("createdAt").is_some());

    let entry = ListEntry {
        user_fingerprint: "abc".into(),
        creator_id: "tiktok_creator_x".into(),
        list_type: ListType::Block,
    };
    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(
        value,
        json!({"userFingerprint": "abc", "creatorId": "tiktok_creator_x", "listType": "block"})
    );

    let outcome = VoteOutcome {
        ok: true,
        updated_community_score: 0.625,
    };
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"ok": true, "updatedCommunityScore": 0.625})
    );
}

#[test]
fn community_signal_flattens_base_signal() {
    let community = CommunitySignal {
        signal: Signal::neutral("No community votes yet."),
        has_votes: false,
        ai_weight: 0.0,
        not_ai_weight: 0.0,
        unsure_weight: 0.0,
        reputation: Some(ReputationList::Warn),
    };
    let value = serde_json::to_value(&community).unwrap();
    assert_eq!(value["score"], 0.5);
    assert_eq!(value["strength"], "low");
    assert_eq!(value["hasVotes"], false);
    assert_eq!(value["reputation"], "warn");
}
