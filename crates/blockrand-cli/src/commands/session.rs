use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use blockrand_alloc::{AllocationRequest, Allocator, QueueState, RetryPolicy, SessionState};
use blockrand_core::{LogStore, RandError, FACTORS};
use blockrand_log::export_csv;
use clap::Args;

use crate::commands::log::render_log;
use crate::commands::{open_store, strata};
use crate::config::SessionConfig;

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Do not print a prompt before each command
    #[arg(long)]
    pub no_prompt: bool,
}

const HELP: &str = "commands:
  assign <subject_id> <age> <duration> <bev_free>   allocate a subject
  status                                             remaining slots per stratum
  log                                                show the assignment log
  export <path>                                      write the log as CSV
  strata                                             list factor levels and strata
  help                                               show this message
  quit                                               end the session
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Assign {
        subject_id: String,
        age: String,
        duration: String,
        bev_free: String,
    },
    Status,
    Log,
    Export(PathBuf),
    Strata,
    Help,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [] => Ok(SessionCommand::Empty),
        ["assign", age, duration, bev_free] => Ok(SessionCommand::Assign {
            subject_id: String::new(),
            age: age.to_string(),
            duration: duration.to_string(),
            bev_free: bev_free.to_string(),
        }),
        ["assign", subject_id, age, duration, bev_free] => Ok(SessionCommand::Assign {
            subject_id: subject_id.to_string(),
            age: age.to_string(),
            duration: duration.to_string(),
            bev_free: bev_free.to_string(),
        }),
        ["assign", ..] => Err("usage: assign <subject_id> <age> <duration> <bev_free>".into()),
        ["status"] => Ok(SessionCommand::Status),
        ["log"] => Ok(SessionCommand::Log),
        ["export", path] => Ok(SessionCommand::Export(PathBuf::from(path))),
        ["export", ..] => Err("usage: export <path>".into()),
        ["strata"] => Ok(SessionCommand::Strata),
        ["help"] => Ok(SessionCommand::Help),
        ["quit"] | ["exit"] => Ok(SessionCommand::Quit),
        [other, ..] => Err(format!("unknown command '{other}', type 'help'")),
    }
}

/// One interactive allocation session over an initialized state.
pub(crate) struct Session<'a, S: LogStore + ?Sized> {
    state: &'a SessionState,
    store: &'a S,
    retry: RetryPolicy,
    prompt: bool,
}

impl<'a, S: LogStore + ?Sized> Session<'a, S> {
    pub(crate) fn new(state: &'a SessionState, store: &'a S, retry: RetryPolicy) -> Self {
        Self {
            state,
            store,
            retry,
            prompt: true,
        }
    }

    fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Processes commands until `quit` or end of input. Returns the number of
    /// successful allocations.
    pub(crate) fn run_loop<R: BufRead, W: Write>(
        &self,
        input: R,
        mut output: W,
    ) -> io::Result<usize> {
        let mut allocated = 0;
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(output, "> ")?;
                output.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    writeln!(output, "{message}")?;
                    continue;
                }
            };
            match command {
                SessionCommand::Empty => {}
                SessionCommand::Quit => break,
                SessionCommand::Help => write!(output, "{HELP}")?,
                SessionCommand::Strata => write!(output, "{}", strata::render())?,
                SessionCommand::Log => write!(output, "{}", render_log(self.store, None))?,
                SessionCommand::Status => write!(output, "{}", self.render_status())?,
                SessionCommand::Export(path) => match export_csv(self.store, &path) {
                    Ok(rows) => {
                        writeln!(output, "exported {rows} assignments to {}", path.display())?
                    }
                    Err(err) => writeln!(output, "error: export failed: {err}")?,
                },
                SessionCommand::Assign {
                    subject_id,
                    age,
                    duration,
                    bev_free,
                } => {
                    match self.assign(&subject_id, &age, &duration, &bev_free) {
                        Ok(message) => {
                            allocated += 1;
                            writeln!(output, "{message}")?;
                        }
                        Err(message) => writeln!(output, "{message}")?,
                    }
                }
            }
        }
        Ok(allocated)
    }

    /// Returns the operator-facing outcome line; `Err` when nothing was allocated.
    fn assign(
        &self,
        subject_id: &str,
        age: &str,
        duration: &str,
        bev_free: &str,
    ) -> Result<String, String> {
        let outcome = AllocationRequest::from_labels(subject_id, age, duration, bev_free).and_then(
            |request| {
                Allocator::new(self.state, self.store)
                    .with_retry(self.retry.clone())
                    .allocate(&request)
            },
        );
        match outcome {
            Ok(allocation) => Ok(format!(
                "ok: {} assigned to {} (stratum: {})",
                allocation.subject_id(),
                allocation.assigned_group(),
                allocation.stratum_key()
            )),
            Err(RandError::Validation(info)) => Err(match &info.hint {
                Some(hint) => format!("warning: {} ({hint})", info.message),
                None => format!("warning: {}", info.message),
            }),
            Err(RandError::Exhausted(info)) => Err(format!("error: {}", info.message)),
            Err(RandError::Persistence(info)) => Err(format!(
                "error: assignment was not recorded ({}); no slot was consumed, retry the submission",
                info.message
            )),
            Err(err) => Err(format!("error: {err}")),
        }
    }

    fn render_status(&self) -> String {
        match self.state.status() {
            Ok(status) => {
                let mut out = String::new();
                for entry in status {
                    let state = match entry.state {
                        QueueState::HasCapacity => "open",
                        QueueState::Exhausted => "EXHAUSTED",
                    };
                    out.push_str(&format!(
                        "{:<20} {:>3} remaining  {:>3} used  {state}\n",
                        entry.stratum_key.as_str(),
                        entry.remaining,
                        entry.consumed
                    ));
                }
                out
            }
            Err(err) => format!("error: {err}\n"),
        }
    }
}

/// Warns when the log already holds records: this session's queues are
/// generated fresh and know nothing about earlier allocations.
fn warn_on_prior_records<S: LogStore + ?Sized>(store: &S) {
    match store.read_all_records() {
        Ok(records) if !records.is_empty() => tracing::warn!(
            prior_records = records.len(),
            "assignment log already holds records from earlier sessions; this session's queues are independent of them"
        ),
        Ok(_) => {}
        Err(err) => {
            tracing::error!(error = %err, "could not read the assignment log at session start")
        }
    }
}

pub fn run(args: &SessionArgs, config: &SessionConfig) -> Result<(), Box<dyn Error>> {
    let store = open_store(config)?;
    let state = SessionState::start()?;
    warn_on_prior_records(&store);
    let levels: Vec<String> = FACTORS
        .iter()
        .map(|factor| format!("{} [{}]", factor.name, factor.levels.join("|")))
        .collect();
    println!("allocation session started; factors: {}", levels.join(", "));
    println!("type 'help' for commands");
    let session = Session::new(&state, &store, config.retry.clone()).with_prompt(!args.no_prompt);
    let stdin = io::stdin();
    let allocated = session.run_loop(stdin.lock(), io::stdout().lock())?;
    tracing::info!(allocated, "allocation session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockrand_log::MemoryLogStore;
    use std::io::Cursor;

    fn state() -> SessionState {
        SessionState::start().expect("start")
    }

    fn run_script(state: &SessionState, store: &MemoryLogStore, script: &str) -> (usize, String) {
        let session = Session::new(state, store, RetryPolicy::no_retry()).with_prompt(false);
        let mut out = Vec::new();
        let allocated = session
            .run_loop(Cursor::new(script.to_string()), &mut out)
            .expect("loop");
        (allocated, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn assign_reports_group_and_stratum() {
        let state = state();
        let store = MemoryLogStore::new();
        let (allocated, out) = run_script(&state, &store, "assign S-001 <75 <18mo >=2mo\nquit\n");
        assert_eq!(allocated, 1);
        assert!(out.starts_with("ok: S-001 assigned to Group "));
        assert!(out.contains("(stratum: <75_<18mo_>=2mo)"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_subject_id_is_a_warning() {
        let state = state();
        let store = MemoryLogStore::new();
        let (allocated, out) = run_script(&state, &store, "assign <75 <18mo >=2mo\n");
        assert_eq!(allocated, 0);
        assert!(out.starts_with("warning: subject identifier is required"));
        assert_eq!(store.append_calls(), 0);
    }

    #[test]
    fn exhaustion_names_the_stratum() {
        let state = state();
        let store = MemoryLogStore::new();
        let mut script = String::new();
        for idx in 0..61 {
            script.push_str(&format!("assign S-{idx} >=75 >=18mo <2mo\n"));
        }
        let (allocated, out) = run_script(&state, &store, &script);
        assert_eq!(allocated, 60);
        let last = out.lines().last().expect("last line");
        assert_eq!(last, "error: no allocation slots left for stratum >=75_>=18mo_<2mo");
    }

    #[test]
    fn failed_append_tells_operator_to_retry() {
        let state = state();
        let store = MemoryLogStore::new();
        store.fail_next_appends(1);
        let (allocated, out) = run_script(&state, &store, "assign S-1 <75 <18mo <2mo\n");
        assert_eq!(allocated, 0);
        assert!(out.contains("assignment was not recorded"));
        assert!(out.contains("no slot was consumed"));
    }

    #[test]
    fn status_and_log_views() {
        let state = state();
        let store = MemoryLogStore::new();
        let (_, out) = run_script(&state, &store, "log\nassign S-1 <75 <18mo <2mo\nstatus\n");
        assert!(out.starts_with("No assignments recorded yet."));
        let line = out
            .lines()
            .find(|line| line.starts_with("<75_<18mo_<2mo "))
            .expect("status line");
        assert!(line.contains("59 remaining"));
        assert!(line.ends_with("1 used  open"));
    }

    #[test]
    fn unknown_commands_and_levels_are_reported() {
        let state = state();
        let store = MemoryLogStore::new();
        let (_, out) = run_script(&state, &store, "enrol S-1\nassign S-1 old <18mo <2mo\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "unknown command 'enrol', type 'help'");
        assert!(lines[1].starts_with("warning: unknown age level 'old'"));
    }

    #[test]
    fn export_writes_csv() {
        let state = state();
        let store = MemoryLogStore::new();
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("log.csv");
        let script = format!("assign S-1 <75 <18mo <2mo\nexport {}\n", path.display());
        let (_, out) = run_script(&state, &store, &script);
        assert!(out.contains("exported 1 assignments"));
        let csv = std::fs::read_to_string(path).expect("csv");
        assert_eq!(csv.lines().count(), 2);
    }
}
