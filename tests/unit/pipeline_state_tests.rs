/*!
 * Tests for the file pipeline state machine and routing branches
 */

use csvbridge::encoding::EncodingName;
use csvbridge::pipeline::{transition, Branch, PipelineEvent, PipelineState};

fn run(events: &[PipelineEvent]) -> Option<PipelineState> {
    events
        .iter()
        .try_fold(PipelineState::Detected, |state, event| transition(&state, event))
}

#[test]
fn test_transition_iso_withoutCjk_shouldReachReplaced() {
    let state = run(&[
        PipelineEvent::Classified(EncodingName::Iso8859_9),
        PipelineEvent::Converted,
        PipelineEvent::ScriptChecked { contains_cjk: false },
        PipelineEvent::TranslationSkipped,
        PipelineEvent::ConvertedBack,
        PipelineEvent::Replaced,
    ]);
    assert_eq!(state, Some(PipelineState::Replaced));
}

#[test]
fn test_transition_withCjk_shouldNotAllowSkippingTranslation() {
    let state = run(&[
        PipelineEvent::Classified(EncodingName::Utf8),
        PipelineEvent::Converted,
        PipelineEvent::ScriptChecked { contains_cjk: true },
        PipelineEvent::TranslationSkipped,
    ]);
    assert_eq!(state, None);
}

#[test]
fn test_transition_replaceBeforeConvertBack_shouldBeIllegal() {
    let state = run(&[
        PipelineEvent::Classified(EncodingName::Gbk),
        PipelineEvent::Converted,
        PipelineEvent::ScriptChecked { contains_cjk: false },
        PipelineEvent::TranslationSkipped,
        PipelineEvent::Replaced,
    ]);
    assert_eq!(state, None);
}

#[test]
fn test_transition_unknownEncoding_shouldBeUnsupported() {
    let state = run(&[PipelineEvent::Classified(EncodingName::Unknown)]);
    assert_eq!(state, Some(PipelineState::Unsupported));
    assert_eq!(state.unwrap().branch(), None);
}

#[test]
fn test_transition_abandonMidway_shouldSkip() {
    let state = run(&[
        PipelineEvent::Classified(EncodingName::Gbk),
        PipelineEvent::Converted,
        PipelineEvent::ScriptChecked { contains_cjk: true },
        PipelineEvent::Abandoned,
    ]);
    assert_eq!(state, Some(PipelineState::Skipped));
}

#[test]
fn test_branch_shouldRouteOutputEncoding() {
    assert_eq!(Branch::for_encoding(&EncodingName::Utf8), Some(Branch::Utf8));
    assert_eq!(Branch::Utf8.output_encoding(), EncodingName::Gbk);
    assert_eq!(Branch::Gbk.output_encoding(), EncodingName::Gbk);
    assert_eq!(Branch::Iso8859_9.output_encoding(), EncodingName::Iso8859_9);
    assert!(!Branch::Iso8859_9.allows_cell_repair());
    assert_eq!(
        Branch::for_encoding(&EncodingName::Unsupported("UTF-16".to_string())),
        None
    );
}

#[test]
fn test_state_display_shouldBeReadable() {
    let state = PipelineState::ScriptChecked {
        branch: Branch::Gbk,
        contains_cjk: true,
    };
    assert_eq!(state.to_string(), "script-checked(Gbk, cjk=true)");
    assert!(PipelineState::Replaced.is_terminal());
    assert!(!PipelineState::Converted(Branch::Gbk).is_terminal());
}
