/*!
 * Tests for segmentation and line reconstruction working together
 */

use pagetrans::errors::PipelineError;
use pagetrans::layout::LayoutDocument;
use pagetrans::translation::reconstruct::{merge_full_matches, reconstruct_lines};
use pagetrans::translation::{OverflowPolicy, SentenceSegmenter, SentenceSnapshot};

fn snapshot_of(regions: &[Vec<&str>], language: &str) -> SentenceSnapshot {
    let document = LayoutDocument::from_region_lines(regions);
    SentenceSnapshot::from_source(&document, &SentenceSegmenter::new(language))
}

fn source_texts(snapshot: &SentenceSnapshot) -> Vec<String> {
    snapshot.sentences().map(|s| s.text.clone()).collect()
}

#[test]
fn test_reconstruct_withWrappedSentence_shouldRestoreOriginalLines() {
    let snapshot = snapshot_of(&[vec!["This is a", "test sentence."]], "en");
    assert_eq!(source_texts(&snapshot), vec!["This is a test sentence."]);

    let lines = reconstruct_lines(&snapshot, &source_texts(&snapshot), OverflowPolicy::Distribute).unwrap();

    assert_eq!(lines, vec![vec!["This is a", "test sentence."]]);
}

#[test]
fn test_reconstruct_withSourceText_shouldBeIdentityOnEveryRegion() {
    let regions = vec![
        vec!["Dr. Jones met Mr. Smith", "yesterday. They talked", "for hours."],
        vec!["Short."],
        vec![],
        vec!["One line with two sentences. And more."],
        vec!["A list:", "first item", "second item."],
    ];
    let snapshot = snapshot_of(&regions, "en");

    let lines = reconstruct_lines(&snapshot, &source_texts(&snapshot), OverflowPolicy::Distribute).unwrap();

    let expected: Vec<Vec<String>> = regions
        .iter()
        .map(|r| r.iter().map(|l| l.to_string()).collect())
        .collect();
    assert_eq!(lines, expected);
}

#[test]
fn test_reconstruct_withKeepWhole_shouldLeaveContinuationLinesEmpty() {
    let snapshot = snapshot_of(&[vec!["This is a", "test sentence."]], "en");
    let texts = vec!["Dit is een testzin.".to_string()];

    let lines = reconstruct_lines(&snapshot, &texts, OverflowPolicy::KeepWhole).unwrap();

    assert_eq!(lines, vec![vec!["Dit is een testzin.", ""]]);
}

#[test]
fn test_mergeFullMatches_shouldIgnoreMachineTranslationAtMatchedPositions() {
    let mut snapshot = snapshot_of(&[vec!["This is a test.", "Something else."]], "en");
    snapshot
        .apply_full_matches(vec![Some("dit is een test".to_string()), None])
        .unwrap();

    let texts = merge_full_matches(
        &snapshot,
        vec!["WRONG".to_string(), "Iets anders.".to_string()],
    )
    .unwrap();
    let lines = reconstruct_lines(&snapshot, &texts, OverflowPolicy::Distribute).unwrap();

    assert_eq!(lines, vec![vec!["dit is een test", "Iets anders."]]);
}

#[test]
fn test_mergeFullMatches_withTooFewTranslations_shouldReportMismatch() {
    let snapshot = snapshot_of(&[vec!["One.", "Two."]], "en");

    let result = merge_full_matches(&snapshot, vec!["Een.".to_string()]);

    assert!(matches!(
        result,
        Err(PipelineError::ReconstructionMismatch { expected: 2, actual: 1 })
    ));
}
