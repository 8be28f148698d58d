//! Commit-detail fetch collaborator.
//!
//! Materializing a commit means running an external "show" command keyed by the
//! commit id and capturing its whole output. The call blocks until the child
//! exits; a spawn failure or a non-zero exit is fatal.

use crate::commit::CommitId;
use crate::error::{LoglessError, Result};
use std::collections::HashMap;
use std::process::{ChildStdout, Command, Stdio};

/// Fetches the full textual rendering of a commit.
pub trait DetailSource {
    fn fetch(&mut self, commit_id: &CommitId) -> Result<Vec<u8>>;
}

/// Runs `git show <id>` (or a configured equivalent) per fetch.
#[derive(Debug, Clone)]
pub struct GitShow {
    program: String,
    args: Vec<String>,
}

impl GitShow {
    /// Build from a command line; the commit id is appended as the last argument.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| LoglessError::config("show command must not be empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn display(&self, commit_id: &CommitId) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(commit_id.as_str());
        parts.join(" ")
    }
}

impl Default for GitShow {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            args: vec!["show".to_string()],
        }
    }
}

impl DetailSource for GitShow {
    fn fetch(&mut self, commit_id: &CommitId) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(commit_id.as_str())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| LoglessError::CommandSpawn {
                command: self.display(commit_id),
                source,
            })?;

        if !output.status.success() {
            return Err(LoglessError::CommandFailed {
                command: self.display(commit_id),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        log::debug!(
            "fetched {} ({} bytes)",
            commit_id.short(),
            output.stdout.len()
        );
        Ok(output.stdout)
    }
}

/// In-memory detail source keyed by commit id.
///
/// Used when the bodies are already known, e.g. in tests and benches.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    bodies: HashMap<CommitId, Vec<u8>>,
    fetches: usize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, commit_id: CommitId, body: impl Into<Vec<u8>>) {
        self.bodies.insert(commit_id, body.into());
    }

    /// Number of successful fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }
}

impl DetailSource for StaticSource {
    fn fetch(&mut self, commit_id: &CommitId) -> Result<Vec<u8>> {
        let body = self.bodies.get(commit_id).cloned().ok_or_else(|| {
            LoglessError::malformed(format!("no details known for commit {commit_id}"))
        })?;
        self.fetches += 1;
        Ok(body)
    }
}

/// Spawn the log command and hand back its stdout as the input stream.
pub fn spawn_log(command: &[String]) -> Result<ChildStdout> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| LoglessError::config("log command must not be empty"))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| LoglessError::CommandSpawn {
            command: command.join(" "),
            source,
        })?;

    log::info!("spawned `{}` (pid {})", command.join(" "), child.id());
    child
        .stdout
        .take()
        .ok_or_else(|| LoglessError::ui(format!("`{}` has no stdout pipe", command.join(" "))))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn test_static_source_serves_known_bodies() {
        let id = CommitId::parse(ID.as_bytes()).unwrap();
        let mut source = StaticSource::new();
        source.insert(id.clone(), "commit body");

        assert_eq!(source.fetch(&id).unwrap(), b"commit body");
        assert_eq!(source.fetch_count(), 1);

        let other = CommitId::parse(&[b'f'; 40]).unwrap();
        assert!(source.fetch(&other).is_err());
    }

    #[test]
    fn test_git_show_rejects_empty_command() {
        assert!(GitShow::new(&[]).is_err());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let id = CommitId::parse(ID.as_bytes()).unwrap();
        let mut show = GitShow::new(&["logless-no-such-program".to_string()]).unwrap();
        assert!(matches!(
            show.fetch(&id),
            Err(LoglessError::CommandSpawn { .. })
        ));
    }

    #[test]
    fn test_spawn_log_missing_program() {
        assert!(spawn_log(&["logless-no-such-program".to_string()]).is_err());
    }
}
