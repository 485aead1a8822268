use std::collections::HashSet;
use std::sync::Once;

use pdfdesk_core::{
    update, AppState, CandidateFile, Effect, FileIdentity, IntakePolicy, Msg, Notice, PhaseKind,
    ResultPayload, Tool,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(pdfdesk_logging::initialize_for_tests);
}

fn pdf(name: &str, len: usize) -> CandidateFile {
    CandidateFile::new(name, Some("application/pdf".to_string()), vec![7u8; len])
}

fn merge_session() -> AppState {
    let (state, effects) = update(AppState::new(), Msg::ToolSelected(Tool::Merge));
    assert!(effects.is_empty());
    state
}

fn drop_files(state: AppState, files: Vec<CandidateFile>) -> (AppState, Vec<Effect>) {
    update(state, Msg::FilesDropped(files))
}

#[test]
fn merge_intake_deduplicates_by_name_and_size() {
    init_logging();
    let (state, effects) = drop_files(merge_session(), vec![pdf("a.pdf", 10), pdf("b.pdf", 20)]);
    assert!(effects.is_empty(), "merge waits for submit");

    let (state, _) = drop_files(
        state,
        vec![pdf("a.pdf", 10), pdf("a.pdf", 11), pdf("c.pdf", 30)],
    );

    let view = state.view();
    let names: Vec<_> = view.files.iter().map(|f| (f.name.as_str(), f.size)).collect();
    assert_eq!(
        names,
        vec![("a.pdf", 10), ("b.pdf", 20), ("a.pdf", 11), ("c.pdf", 30)]
    );
    let unique: HashSet<_> = state.files().iter().map(|f| f.identity()).collect();
    assert_eq!(unique.len(), state.files().len());
    assert_eq!(view.phase, PhaseKind::Ready);
}

#[test]
fn merge_intake_truncates_to_capacity_without_error() {
    init_logging();
    let policy = IntakePolicy {
        merge_max_files: 3,
        ..IntakePolicy::default()
    };
    let state = update(AppState::new().with_policy(policy), Msg::ToolSelected(Tool::Merge)).0;
    let (state, _) = drop_files(state, vec![pdf("a.pdf", 1), pdf("b.pdf", 2)]);
    let (state, _) = drop_files(
        state,
        vec![pdf("c.pdf", 3), pdf("d.pdf", 4), pdf("e.pdf", 5)],
    );

    let view = state.view();
    assert_eq!(view.files.len(), 3);
    assert_eq!(view.files[2].name, "c.pdf");
    assert_eq!(view.remaining_capacity, 0);
    assert_eq!(view.notice, None);

    // Full session: further drops are silently ignored.
    let (state, effects) = drop_files(state, vec![pdf("f.pdf", 6)]);
    assert_eq!(state.files().len(), 3);
    assert!(effects.is_empty());
}

#[test]
fn non_pdf_batch_is_rejected_without_touching_files() {
    init_logging();
    let (state, _) = drop_files(merge_session(), vec![pdf("keep.pdf", 4)]);
    let before: Vec<FileIdentity> = state.files().iter().map(|f| f.identity()).collect();

    let (state, effects) = drop_files(
        state,
        vec![CandidateFile::new(
            "photo.png",
            Some("image/png".to_string()),
            vec![1u8, 2, 3],
        )],
    );

    let after: Vec<FileIdentity> = state.files().iter().map(|f| f.identity()).collect();
    assert_eq!(before, after);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, PhaseKind::Failed);
    assert_eq!(
        view.notice,
        Some(Notice::Error {
            message: "no supported files".to_string()
        })
    );

    let (state, _) = update(state, Msg::NoticeDismissed);
    assert_eq!(state.view().phase, PhaseKind::Ready);
    assert_eq!(state.view().notice, None);
}

#[test]
fn lone_non_pdf_on_empty_session_leaves_it_empty() {
    init_logging();
    let (state, effects) = drop_files(
        AppState::new(),
        vec![CandidateFile::new("notes.txt", None, vec![1u8])],
    );
    assert!(state.files().is_empty());
    assert!(effects.is_empty());
    let (state, _) = update(state, Msg::NoticeDismissed);
    assert_eq!(state.view().phase, PhaseKind::Idle);
}

fn not_a_pdf() -> CandidateFile {
    CandidateFile::new("notes.txt", Some("text/plain".to_string()), vec![1u8])
}

fn unsupported_notice() -> Option<Notice> {
    Some(Notice::Error {
        message: "no supported files".to_string(),
    })
}

#[test]
fn rejected_drop_keeps_running_request() {
    init_logging();
    let (state, effects) = drop_files(AppState::new(), vec![pdf("a.pdf", 10)]);
    assert!(effects.contains(&Effect::StartProgressTimer { request_id: 1 }));

    let (state, effects) = drop_files(state, vec![not_a_pdf()]);
    assert!(effects.is_empty(), "no cancel or abandon: {effects:?}");
    let view = state.view();
    assert_eq!(view.phase, PhaseKind::Processing);
    assert_eq!(view.active_request, Some(1));
    assert_eq!(view.notice, unsupported_notice());

    let (state, _) = update(
        state,
        Msg::TransportSucceeded {
            request_id: 1,
            payload: ResultPayload::Inline(vec![0u8; 4].into()),
        },
    );
    let view = state.view();
    assert_eq!(view.phase, PhaseKind::Succeeded);
    assert_eq!(view.result.unwrap().file_name, "a_compressed.pdf");
}

#[test]
fn rejected_drop_keeps_unsaved_result() {
    init_logging();
    let (state, _) = drop_files(AppState::new(), vec![pdf("a.pdf", 10)]);
    let (state, _) = update(
        state,
        Msg::TransportSucceeded {
            request_id: 1,
            payload: ResultPayload::Inline(vec![0u8; 4].into()),
        },
    );

    let (state, effects) = drop_files(state, vec![not_a_pdf()]);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, PhaseKind::Succeeded);
    assert_eq!(view.notice, unsupported_notice());
    let result = view.result.unwrap();
    assert_eq!(result.file_name, "a_compressed.pdf");
    assert_eq!(result.reduction_percent, Some(60));

    let (state, _) = update(state, Msg::NoticeDismissed);
    assert_eq!(state.view().phase, PhaseKind::Succeeded);
    let (_, effects) = update(state, Msg::SaveClicked);
    assert!(matches!(
        effects.as_slice(),
        [Effect::SaveArtifact { file_name, .. }] if file_name == "a_compressed.pdf"
    ));
}

#[test]
fn suffix_check_is_case_insensitive() {
    init_logging();
    let (state, _) = drop_files(
        merge_session(),
        vec![CandidateFile::new("SCAN.PDF", None, vec![1u8])],
    );
    assert_eq!(state.files().len(), 1);
}

#[test]
fn single_file_tools_replace_the_current_file() {
    init_logging();
    let state = update(AppState::new(), Msg::ToolSelected(Tool::Split)).0;
    let (state, _) = drop_files(state, vec![pdf("first.pdf", 5)]);
    let (state, effects) = drop_files(state, vec![pdf("second.pdf", 6), pdf("third.pdf", 7)]);

    assert!(effects.is_empty(), "split waits for submit");
    let view = state.view();
    assert_eq!(view.files.len(), 1);
    assert_eq!(view.files[0].name, "second.pdf");
}

#[test]
fn removing_and_reordering_files() {
    init_logging();
    let (state, _) = drop_files(
        merge_session(),
        vec![pdf("a.pdf", 1), pdf("b.pdf", 2), pdf("c.pdf", 3)],
    );

    let (state, _) = update(state, Msg::FileMoved { from: 2, to: 0 });
    let order: Vec<_> = state.view().files.into_iter().map(|f| f.name).collect();
    assert_eq!(order, vec!["c.pdf", "a.pdf", "b.pdf"]);

    let (state, _) = update(
        state,
        Msg::FileRemoved(FileIdentity {
            name: "a.pdf".to_string(),
            size: 1,
        }),
    );
    let order: Vec<_> = state.view().files.into_iter().map(|f| f.name).collect();
    assert_eq!(order, vec!["c.pdf", "b.pdf"]);

    // Out of range moves are ignored.
    let (mut state, effects) = update(state, Msg::FileMoved { from: 0, to: 9 });
    assert!(effects.is_empty());
    assert_eq!(state.files().len(), 2);
    state.consume_dirty();
    let (mut state, _) = update(state, Msg::FileMoved { from: 1, to: 1 });
    assert!(!state.consume_dirty());
}

#[test]
fn reset_drops_files_and_options() {
    init_logging();
    let (state, _) = drop_files(merge_session(), vec![pdf("a.pdf", 1), pdf("b.pdf", 2)]);
    let (state, _) = update(state, Msg::ResetClicked);
    let view = state.view();
    assert!(view.files.is_empty());
    assert_eq!(view.phase, PhaseKind::Idle);
    assert_eq!(view.tool, Tool::Merge);
}
