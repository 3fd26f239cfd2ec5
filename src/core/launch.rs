use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::info;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Nothing to launch.")]
    EmptyCommand,
    #[error("Failed to launch {0}: command not found")]
    NotFound(String),
    #[error("Failed to launch {command}: {source}")]
    Spawn { command: String, source: io::Error },
}

/// Starts a configured command as an independent process.
pub trait Spawn {
    fn spawn(&self, command: &str) -> Result<(), LaunchError>;
}

/// Runs commands directly (no shell), detached from the launcher's stdio.
///
/// The whole command string is tried as a path first so that paths with
/// spaces work unquoted. A program wrapped in double quotes may be followed
/// by arguments. Otherwise the first word is the program and the rest are
/// its arguments. Arguments themselves are split on whitespace only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSpawner;

impl Spawn for ProcessSpawner {
    fn spawn(&self, command: &str) -> Result<(), LaunchError> {
        let (program, args) = resolve_command(command)?;
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: command.to_string(),
                source,
            })?;
        info!(program = %program.display(), pid = child.id(), "launched");
        // Reap the child in the background; its exit status is not reported.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Split a command into a resolved program path and its arguments.
pub fn resolve_command(command: &str) -> Result<(PathBuf, Vec<String>), LaunchError> {
    let command = command.trim();
    if command.is_empty() {
        return Err(LaunchError::EmptyCommand);
    }

    let whole = Path::new(command);
    if is_runnable(whole) {
        return Ok((whole.to_path_buf(), Vec::new()));
    }

    if let Some((program, rest)) = command
        .strip_prefix('"')
        .and_then(|quoted| quoted.split_once('"'))
    {
        let args = rest.split_whitespace().map(str::to_string).collect();
        return find_program(program)
            .map(|program| (program, args))
            .ok_or_else(|| LaunchError::NotFound(command.to_string()));
    }

    let mut words = command.split_whitespace();
    let first = words.next().ok_or(LaunchError::EmptyCommand)?;
    let args = words.map(str::to_string).collect();
    find_program(first)
        .map(|program| (program, args))
        .ok_or_else(|| LaunchError::NotFound(command.to_string()))
}

/// Locate `name` as a path (when it has a directory part) or on `PATH`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return is_runnable(candidate).then(|| candidate.to_path_buf());
    }

    let path_env = env::var_os("PATH")?;
    for dir in env::split_paths(&path_env) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        for file in program_names(name) {
            let path = dir.join(&file);
            if is_runnable(&path) {
                return Some(path);
            }
        }
    }
    None
}

#[cfg(windows)]
fn program_names(name: &str) -> Vec<String> {
    if Path::new(name).extension().is_some() {
        vec![name.to_string()]
    } else {
        vec![format!("{name}.exe"), format!("{name}.bat"), name.to_string()]
    }
}

#[cfg(not(windows))]
fn program_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

fn is_runnable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && is_executable(&meta),
        Err(_) => false,
    }
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}
