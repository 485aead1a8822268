use std::path::PathBuf;

use pdfdesk_core::{CompressionLevel, SplitMode, Tool};

pub const HELP: &str = "\
commands:
  add <path>...        add PDF files (compress runs right away);
                       quote paths with spaces: add \"my scan.pdf\"
  remove <index>       drop a file from the list
  move <from> <to>     reorder the merge list
  tool <compress|merge|split>
  level <1-4>          compression level (re-runs compress)
  mode <all|range>     split mode
  pages <range>        pages to extract, e.g. 1,3,5-9
  submit               run the current tool
  save                 save the last result
  dismiss              close the current notice
  reset                start over
  status               show the session
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(Vec<PathBuf>),
    Remove(usize),
    Move { from: usize, to: usize },
    Tool(Tool),
    Level(CompressionLevel),
    Mode(SplitMode),
    Pages(String),
    Submit,
    Save,
    Dismiss,
    Reset,
    Status,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "add" => {
            let paths = split_args(rest)?;
            if paths.is_empty() {
                return Err("add needs at least one path".to_string());
            }
            ShellCommand::Add(paths.into_iter().map(PathBuf::from).collect())
        }
        "remove" | "rm" => ShellCommand::Remove(single_index(&args, "remove <index>")?),
        "move" | "mv" => match args.as_slice() {
            [from, to] => ShellCommand::Move {
                from: index(from)?,
                to: index(to)?,
            },
            _ => return Err("usage: move <from> <to>".to_string()),
        },
        "tool" => ShellCommand::Tool(rest.parse()?),
        "level" => {
            let level: u8 = rest
                .parse()
                .map_err(|_| format!("'{rest}' is not a compression level (1-4)"))?;
            ShellCommand::Level(CompressionLevel::new(level).map_err(|err| err.to_string())?)
        }
        "mode" => ShellCommand::Mode(rest.parse()?),
        "pages" => ShellCommand::Pages(rest.to_string()),
        "submit" | "run" => ShellCommand::Submit,
        "save" => ShellCommand::Save,
        "dismiss" | "ok" => ShellCommand::Dismiss,
        "reset" => ShellCommand::Reset,
        "status" | "ls" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try help)")),
    };
    Ok(Some(command))
}

/// Splits on whitespace, keeping `"..."` and `'...'` spans together.
fn split_args(text: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    for ch in text.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_arg = true;
            }
            None if ch.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(ch);
                in_arg = true;
            }
        }
    }
    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

fn index(text: &str) -> Result<usize, String> {
    text.parse()
        .map_err(|_| format!("'{text}' is not a file index"))
}

fn single_index(args: &[&str], usage: &str) -> Result<usize, String> {
    match args {
        [one] => index(one),
        _ => Err(format!("usage: {usage}")),
    }
}
