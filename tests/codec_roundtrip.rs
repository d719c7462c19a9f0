//! Round-trip and size-bound tests for the URL state codec.
//!
//! These tests verify that every directive the model can emit survives the
//! encode/decode/validate pipeline losslessly, and that the emitted strings
//! always respect the URL-safety and size contracts.

use proptest::prelude::*;
use viewstate_kernel::{
    decode_state, encode_state, validate_directive, CompareVariant, Directive, DirectiveData,
    ExploreVariant, LandingVariant, NodeId, ProjectsVariant, ResumeVariant, SkillsVariant,
    ThemeCatalog, ThemeName, TimelineVariant, ValuesVariant, HARD_CAP, UNCOMPRESSED_THRESHOLD,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn catalog() -> ThemeCatalog {
    ThemeCatalog::new(["cold", "warm", "mono"])
}

fn base64url_clean(s: &str) -> bool {
    let body = s.strip_prefix("c:").unwrap_or(s);
    body.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Build a directive for an arbitrary mode index with the given fields.
fn directive_for(
    mode_idx: usize,
    narration: String,
    highlights: Vec<NodeId>,
    theme: &str,
    confidence: f64,
) -> Directive {
    let theme = ThemeName::from(theme);
    macro_rules! data {
        ($variant:expr) => {
            DirectiveData::new($variant)
                .with_narration(narration)
                .with_highlights(highlights)
                .with_theme(theme)
                .with_confidence(confidence)
        };
    }
    match mode_idx % 8 {
        0 => Directive::Landing(data!(LandingVariant::Neutral)),
        1 => Directive::Timeline(data!(TimelineVariant::Flow)),
        2 => Directive::Projects(data!(ProjectsVariant::Radial)),
        3 => Directive::Skills(data!(SkillsVariant::Clusters)),
        4 => Directive::Values(data!(ValuesVariant::Orbit)),
        5 => Directive::Compare(data!(CompareVariant::SideBySide)),
        6 => Directive::Explore(data!(ExploreVariant::Focus)),
        _ => Directive::Resume(data!(ResumeVariant::Summary)),
    }
}

fn node_ids(ids: Vec<String>) -> Vec<NodeId> {
    ids.into_iter().map(NodeId::from).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// PROPERTY TESTS
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_roundtrip_is_lossless(
        mode_idx in 0..8usize,
        narration in ".{0,400}",
        ids in proptest::collection::vec("[a-z][a-z0-9-]{0,20}", 0..8),
        theme_idx in 0..3usize,
        confidence in 0.0..=1.0f64,
    ) {
        let theme = ["cold", "warm", "mono"][theme_idx];
        let directive = directive_for(mode_idx, narration, node_ids(ids), theme, confidence);

        let encoded = encode_state(&directive).unwrap();
        let decoded = decode_state(&encoded).expect("own output must decode");
        let validated = validate_directive(decoded, &catalog()).expect("own output must validate");

        prop_assert_eq!(validated, directive);
    }

    #[test]
    fn prop_encoded_is_url_safe_and_bounded(
        mode_idx in 0..8usize,
        narration in ".{0,800}",
        ids in proptest::collection::vec("[a-z][a-z0-9-]{0,20}", 0..12),
    ) {
        let directive = directive_for(mode_idx, narration, node_ids(ids), "cold", 0.7);
        let encoded = encode_state(&directive).unwrap();

        prop_assert!(base64url_clean(&encoded), "not URL-safe: {}", encoded);
        prop_assert!(encoded.len() <= HARD_CAP);
    }

    #[test]
    fn prop_garbage_never_panics(input in ".{0,200}") {
        // Decoding arbitrary input either succeeds or returns None; it must
        // never panic.
        let _ = decode_state(&input);
    }

    #[test]
    fn prop_compression_kicks_in_above_threshold(repeat in 50..200usize) {
        // Highly repetitive narration compresses well, so long payloads must
        // come back as compressed strings shorter than their raw encoding.
        let narration = "the same sentence over and over again ".repeat(repeat);
        let directive = directive_for(1, narration, Vec::new(), "warm", 0.7);

        let encoded = encode_state(&directive).unwrap();
        if encoded.starts_with("c:") {
            prop_assert!(encoded.len() < HARD_CAP);
        } else {
            prop_assert!(encoded.len() <= UNCOMPRESSED_THRESHOLD);
        }
        let decoded = decode_state(&encoded).unwrap();
        let validated = validate_directive(decoded, &catalog()).unwrap();
        prop_assert_eq!(validated, directive);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DETERMINISM TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_encoding_is_deterministic_100_runs() {
    let directive = directive_for(
        2,
        "a radial layout of the three systems projects".to_string(),
        node_ids(vec!["proj-one".into(), "proj-two".into()]),
        "cold",
        0.85,
    );

    let first = encode_state(&directive).unwrap();
    for run in 1..100 {
        let next = encode_state(&directive).unwrap();
        assert_eq!(first, next, "encoding must be deterministic (run {run})");
    }
}

#[test]
fn test_small_state_stays_uncompressed() {
    let directive = directive_for(0, String::new(), Vec::new(), "cold", 0.7);
    let encoded = encode_state(&directive).unwrap();
    assert!(!encoded.starts_with("c:"));
    assert!(encoded.len() <= UNCOMPRESSED_THRESHOLD);
}

#[test]
fn test_unknown_theme_rejected_by_validation() {
    let directive = directive_for(3, String::new(), Vec::new(), "neon", 0.7);
    let encoded = encode_state(&directive).unwrap();
    let decoded = decode_state(&encoded).unwrap();
    assert!(validate_directive(decoded, &catalog()).is_none());
}
