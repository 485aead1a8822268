use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::FilesDropped(candidates) => state.intake(candidates, &mut effects),
        Msg::FileRemoved(identity) => state.remove_file(&identity, &mut effects),
        Msg::FileMoved { from, to } => state.move_file(from, to, &mut effects),
        Msg::ToolSelected(tool) => state.select_tool(tool, &mut effects),
        Msg::OptionChanged(change) => state.change_option(change, &mut effects),
        Msg::SubmitClicked => state.submit(&mut effects),
        Msg::SaveClicked => state.save(&mut effects),
        Msg::NoticeDismissed => state.dismiss_notice(),
        Msg::ResetClicked => state.reset(&mut effects),
        Msg::Shutdown => state.shutdown(&mut effects),
        Msg::TransportProgress {
            request_id,
            percent,
        } => state.transport_progress(request_id, percent, &mut effects),
        Msg::ProgressTick {
            request_id,
            increment,
        } => state.progress_tick(request_id, increment),
        Msg::TransportSucceeded {
            request_id,
            payload,
        } => state.transport_succeeded(request_id, payload, &mut effects),
        Msg::TransportFailed {
            request_id,
            failure,
        } => state.transport_failed(request_id, failure, &mut effects),
        Msg::ReferenceResolved { request_id, result } => {
            state.reference_resolved(request_id, result, &mut effects)
        }
        Msg::SuccessNoticeDue { request_id } => state.success_notice_due(request_id),
        Msg::ArtifactSaved { path } => state.artifact_saved(path),
        Msg::SaveFailed { message } => state.save_failed(&message),
        Msg::Tick | Msg::NoOp => {}
    }

    (state, effects)
}
