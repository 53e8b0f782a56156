//! Golden vectors for the canonical JSON encoding and its SHA-256 digest.
//!
//! External verifiers recompute these hashes, so the expected strings are
//! fixed byte for byte.

use oracle_consensus::{
    canonical_json, compute_digest, hashable, sha256_hex, to_canonical_json, ConsensusResult,
    Hashable, OracleError, Outcome, ResearchSource, SourceCategory,
};
use serde_json::json;

#[test]
fn mixed_document_vector() {
    let value = json!({
        "b": [true, false, null],
        "a": { "z": 1.5, "y": -0.0, "x": 1e21, "w": 1e-7 },
        "é": "x\u{1}",
        "A": 100
    });
    let canonical = canonical_json(&value).unwrap();
    assert_eq!(
        canonical,
        r#"{"A":100,"a":{"w":1e-7,"x":1e+21,"y":0,"z":1.5},"b":[true,false,null],"é":"x\u0001"}"#
    );
    assert_eq!(
        compute_digest(&value).unwrap(),
        "3d49e10c1a1c21a25ed9a505988e75a16ee56721b03549f09005a716fba9af71"
    );
}

#[test]
fn consensus_result_vector() {
    let result = ConsensusResult {
        reached: true,
        outcome: Outcome::Yes,
        confidence: 0.85,
        agreement_ratio: 2.0 / 3.0,
        weighted_ratio: 0.75,
        total_sources: 100,
        unique_sources: 98,
        source_overlap: 0.02,
        agent_count: 3,
        requires_human_review: false,
        reason: None,
    };
    let (canonical, digest) = result.hash_data().unwrap();
    assert_eq!(
        canonical,
        r#"{"agent_count":3,"agreement_ratio":0.6666666666666666,"confidence":0.85,"outcome":"YES","reached":true,"requires_human_review":false,"source_overlap":0.02,"total_sources":100,"unique_sources":98,"weighted_ratio":0.75}"#
    );
    assert_eq!(
        digest,
        "1b55c0db8148f2d02bd6e1dee6edee875bfd24339a9258a2a2cb65f3479488cf"
    );
}

#[test]
fn research_source_vector_keeps_unicode_raw() {
    let mut source = ResearchSource::new(
        "https://www.sec.gov/news/press-release/2024-1",
        "SEC approves",
        SourceCategory::Official,
    )
    .with_scores(0.95, 1.0)
    .with_snippet("Ünïcode “quotes”");
    source.add_citation("agent-2");
    source.add_citation("agent-1");

    let (bytes, digest) = hashable(&source).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        r#"{"category":"official","cited_by":["agent-2","agent-1"],"credibility_score":1,"relevance_score":0.95,"snippet":"Ünïcode “quotes”","title":"SEC approves","url":"https://www.sec.gov/news/press-release/2024-1"}"#
    );
    assert_eq!(
        digest,
        "9e133b153b50e37da85a03c25f0a23f8253ff2fea096d25482a42fea27d4b4f7"
    );
}

#[test]
fn empty_containers() {
    assert_eq!(
        sha256_hex(to_canonical_json(&json!({})).unwrap().as_bytes()),
        "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
    );
    assert_eq!(
        sha256_hex(to_canonical_json(&json!([])).unwrap().as_bytes()),
        "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
    );
}

#[test]
fn parsed_text_hashes_like_the_record() {
    let result = ConsensusResult {
        reached: false,
        outcome: Outcome::Undetermined,
        confidence: 0.0,
        agreement_ratio: 0.4,
        weighted_ratio: 0.41234567890123456,
        total_sources: 250,
        unique_sources: 200,
        source_overlap: 0.2,
        agent_count: 5,
        requires_human_review: true,
        reason: Some("No supermajority".into()),
    };
    let pretty = serde_json::to_string_pretty(&result).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(compute_digest(&reparsed).unwrap(), result.content_hash().unwrap());
}

#[test]
fn non_finite_numbers_are_rejected() {
    let mut source = ResearchSource::new("https://x.example", "x", SourceCategory::Social);
    source.credibility_score = f64::NAN;
    assert!(matches!(
        to_canonical_json(&source),
        Err(OracleError::NonCanonical(_))
    ));

    source.credibility_score = f64::INFINITY;
    assert!(hashable(&source).is_err());
}
