use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use pdfdesk_core::{
    update, AppState, AppViewModel, CandidateFile, Msg, Notice, OptionChange, PhaseKind, Tool,
    PDF_CONTENT_TYPE,
};
use pdfdesk_engine::EngineHandle;
use pdfdesk_logging::{desk_info, desk_warn};

use super::effects::EffectRunner;
use super::render::{status_text, Renderer};
use super::shell::{parse_command, ShellCommand, HELP};
use crate::settings::Settings;

/// Everything the session loop reacts to.
pub enum Input {
    Msg(Msg),
    Shell(ShellCommand),
    /// Standard input reached end of file.
    Closed,
}

impl From<Msg> for Input {
    fn from(msg: Msg) -> Self {
        Input::Msg(msg)
    }
}

/// A one-shot command: which tool, which options, which files.
#[derive(Debug, Clone)]
pub struct OneShot {
    pub tool: Tool,
    pub options: Vec<OptionChange>,
    pub files: Vec<PathBuf>,
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    inbox: mpsc::Receiver<Input>,
    outbox: mpsc::Sender<Input>,
}

impl Session {
    fn start(settings: &Settings) -> Result<Self> {
        let (outbox, inbox) = mpsc::channel();
        let engine =
            EngineHandle::new(settings.engine_settings()).context("could not start the engine")?;
        let runner = EffectRunner::new(engine, outbox.clone());
        desk_info!("session started against {}", settings.api_url);
        Ok(Self {
            state: AppState::new().with_policy(settings.intake_policy()),
            runner,
            renderer: Renderer::new(),
            inbox,
            outbox,
        })
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.run(effects);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
    }

    fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn close(mut self) {
        self.dispatch(Msg::Shutdown);
        self.runner.shutdown();
        self.renderer.finish();
    }
}

/// Runs one command to completion and saves its result.
///
/// Returns `Ok(false)` when the operation failed; the notice has already been printed.
pub fn run_one_shot(settings: &Settings, command: OneShot) -> Result<bool> {
    let candidates = command
        .files
        .iter()
        .map(|path| read_candidate(path))
        .collect::<Result<Vec<_>>>()?;

    let mut session = Session::start(settings)?;
    session.dispatch(Msg::ToolSelected(command.tool));
    for change in command.options {
        session.dispatch(Msg::OptionChanged(change));
    }
    session.dispatch(Msg::FilesDropped(candidates));
    if !command.tool.auto_runs() {
        session.dispatch(Msg::SubmitClicked);
    }

    let mut save_requested = false;
    let succeeded = loop {
        let view = session.view();
        match view.phase {
            PhaseKind::Failed => break false,
            PhaseKind::Idle | PhaseKind::Ready => {
                eprintln!("nothing to process");
                break false;
            }
            PhaseKind::Succeeded => {
                if matches!(view.notice, Some(Notice::Error { .. })) {
                    break false;
                }
                if !save_requested {
                    save_requested = true;
                    session.dispatch(Msg::SaveClicked);
                    continue;
                }
                if view.last_saved.is_some()
                    && matches!(view.notice, Some(Notice::Success { .. }))
                {
                    break true;
                }
            }
            PhaseKind::Processing => {}
        }

        match session.inbox.recv() {
            Ok(Input::Msg(msg)) => session.dispatch(msg),
            Ok(_) => {}
            Err(_) => break false,
        }
    };

    session.close();
    Ok(succeeded)
}

/// Interactive session reading commands from standard input.
pub fn run_shell(settings: &Settings) -> Result<()> {
    let mut session = Session::start(settings)?;
    spawn_stdin_reader(session.outbox.clone());
    eprintln!("pdfdesk shell, service at {} (type help)", settings.api_url);

    while let Ok(input) = session.inbox.recv() {
        match input {
            Input::Msg(msg) => session.dispatch(msg),
            Input::Shell(ShellCommand::Quit) | Input::Closed => break,
            Input::Shell(command) => handle_shell_command(&mut session, command),
        }
    }

    session.close();
    Ok(())
}

fn handle_shell_command(session: &mut Session, command: ShellCommand) {
    let msg = match command {
        ShellCommand::Add(paths) => {
            let mut candidates = Vec::new();
            for path in &paths {
                match read_candidate(path) {
                    Ok(candidate) => candidates.push(candidate),
                    Err(err) => eprintln!("  {err:#}"),
                }
            }
            if candidates.is_empty() {
                return;
            }
            Msg::FilesDropped(candidates)
        }
        ShellCommand::Remove(index) => match session.state.files().get(index) {
            Some(file) => Msg::FileRemoved(file.identity()),
            None => {
                eprintln!("  no file at index {index}");
                return;
            }
        },
        ShellCommand::Move { from, to } => {
            let count = session.state.files().len();
            if from >= count || to >= count {
                eprintln!("  indices must be below {count}");
                return;
            }
            Msg::FileMoved { from, to }
        }
        ShellCommand::Tool(tool) => Msg::ToolSelected(tool),
        ShellCommand::Level(level) => Msg::OptionChanged(OptionChange::CompressionLevel(level)),
        ShellCommand::Mode(mode) => Msg::OptionChanged(OptionChange::SplitMode(mode)),
        ShellCommand::Pages(pages) => Msg::OptionChanged(OptionChange::PageRange(pages)),
        ShellCommand::Submit => Msg::SubmitClicked,
        ShellCommand::Save => {
            if session.view().phase != PhaseKind::Succeeded {
                eprintln!("  no result to save yet");
                return;
            }
            Msg::SaveClicked
        }
        ShellCommand::Dismiss => Msg::NoticeDismissed,
        ShellCommand::Reset => Msg::ResetClicked,
        ShellCommand::Status => {
            println!("{}", status_text(&session.view()));
            return;
        }
        ShellCommand::Help => {
            println!("{HELP}");
            return;
        }
        ShellCommand::Quit => return,
    };
    session.dispatch(msg);
}

fn spawn_stdin_reader(outbox: mpsc::Sender<Input>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    desk_warn!("stdin read failed: {}", err);
                    break;
                }
            };
            match parse_command(&line) {
                Ok(Some(command)) => {
                    if outbox.send(Input::Shell(command)).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("  {message}"),
            }
        }
        let _ = outbox.send(Input::Closed);
    });
}

/// Loads a file from disk as an intake candidate.
///
/// Files starting with the PDF signature are declared `application/pdf`; the rest rely on
/// their extension.
pub(crate) fn read_candidate(path: &Path) -> Result<CandidateFile> {
    let content = fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let content_type = content
        .starts_with(b"%PDF-")
        .then(|| PDF_CONTENT_TYPE.to_string());
    Ok(CandidateFile::new(name, content_type, content))
}
