// src/console.rs

//! Line-oriented interactive console.
//!
//! Each stdin line is parsed into a [`ConsoleCommand`] and forwarded to the
//! orchestrator. This is the text counterpart of the tool window: the
//! build toggle, the run buttons, and add/delete of entries.

use crate::config::LaunchTarget;
use crate::engine::Action;
use crate::host::split_args;
use crate::sched::LaunchId;
use crate::types::TARGET_DIR_PLACEHOLDER;

pub const HELP: &str = "\
commands:
  build [TARGET]           toggle the full build, or build one target
  stop                     stop the running build
  clean                    clean build outputs
  run GROUP INDEX          launch one entry
  group GROUP              launch every entry of a group
  all                      launch every entry of every group
  cancel ID                cancel a pending launch
  add GROUP TARGET DELAY [ARGS...]
                           add an entry (working dir ${TargetDir})
  del GROUP INDEX          delete an entry
  status                   show build state and pending launches
  list                     show groups
  help                     this text
  quit                     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Action(Action),
    List,
    Help,
    Quit,
    /// Blank line.
    Nothing,
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let words = split_args(line);
    let Some((head, rest)) = words.split_first() else {
        return Ok(ConsoleCommand::Nothing);
    };

    let cmd = match (head.to_lowercase().as_str(), rest) {
        ("build", []) => ConsoleCommand::Action(Action::ToggleBuild),
        ("build", [target]) => ConsoleCommand::Action(Action::StartBuild {
            target: Some(target.clone()),
        }),
        ("stop", []) => ConsoleCommand::Action(Action::StopBuild),
        ("clean", []) => ConsoleCommand::Action(Action::Clean),
        ("run", [group, index]) => ConsoleCommand::Action(Action::RunEntry {
            group: group.clone(),
            index: parse_number(index, "INDEX")?,
        }),
        ("group", [group]) => ConsoleCommand::Action(Action::RunGroup(group.clone())),
        ("all", []) => ConsoleCommand::Action(Action::RunAll),
        ("cancel", [id]) => {
            // Ids print as `#N`; accept them back in that form.
            let id = id.strip_prefix('#').unwrap_or(id);
            ConsoleCommand::Action(Action::CancelLaunch(LaunchId(parse_number(id, "ID")?)))
        }
        ("add", [group, target, delay, args @ ..]) => {
            ConsoleCommand::Action(Action::AddTarget(LaunchTarget {
                group: group.clone(),
                target_name: target.clone(),
                args: join_args(args),
                working_dir: TARGET_DIR_PLACEHOLDER.to_string(),
                delay_seconds: parse_number(delay, "DELAY")?,
            }))
        }
        ("del", [group, index]) => ConsoleCommand::Action(Action::RemoveEntry {
            group: group.clone(),
            index: parse_number(index, "INDEX")?,
        }),
        ("status", []) => ConsoleCommand::Action(Action::Status),
        ("list", []) => ConsoleCommand::List,
        ("help" | "?", []) => ConsoleCommand::Help,
        ("quit" | "exit", []) => ConsoleCommand::Quit,
        (other, _) => return Err(format!("unknown or malformed command '{other}' (try 'help')")),
    };
    Ok(cmd)
}

fn parse_number<T: std::str::FromStr>(s: &str, what: &str) -> Result<T, String> {
    s.parse()
        .map_err(|_| format!("{what} must be a non-negative number, got '{s}'"))
}

/// Re-quote words containing whitespace so the stored string splits back
/// into the same arguments.
fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|a| {
            if a.contains(char::is_whitespace) {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
