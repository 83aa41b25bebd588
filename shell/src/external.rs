use crate::command::{Context, ExecutableCommand, ExitCode};
use crate::env::Environment;
use anyhow::{Context as _, Result};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Command that is not a builtin: a program found on disk.
pub struct ExternalCommand {
    /// Name as typed by the user, passed to the program as argv[0].
    name: String,
    /// Resolved location of the executable.
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(name: String, program: PathBuf, args: Vec<String>) -> Self {
        Self {
            name,
            program,
            args,
        }
    }

    /// Resolve `argv[0]` against `PATH` the same way the `type` builtin does.
    ///
    /// Returns `None` for an empty argument list or when no executable matches.
    pub fn resolve(env: &Environment, argv: &[String]) -> Option<Self> {
        let (name, args) = argv.split_first()?;
        let search_paths = env.get_var("PATH");
        let program = find_command_path(search_paths, Path::new(name))?.into_owned();
        Some(Self::new(name.clone(), program, args.to_vec()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let mut cmd = std::process::Command::new(&self.program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.arg0(&self.name);
        }
        // stdin, stdout and stderr are inherited from the shell
        let mut child = cmd
            .args(&self.args)
            .env_clear()
            .envs(ctx.env.vars.iter())
            .spawn()
            .with_context(|| format!("{}: failed to start", self.name))?;
        let exit_status = child
            .wait()
            .with_context(|| format!("{}: failed to wait for process", self.name))?;
        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Name containing a `/` (absolute, `./foo`, `bin/sh`): used as is if it is an executable
///   file; `PATH` is not consulted.
/// - Otherwise: search each directory of `search_paths` (PATH) in order and return the first
///   executable regular file with that name. An unset `PATH` finds nothing.
/// - Empty name: returns `None`.
///
/// This is the single lookup shared by the `type` builtin and the process launcher, so
/// both always agree on what a name refers to.
pub fn find_command_path<'a>(search_paths: Option<&OsStr>, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.as_os_str().is_empty() {
        return None;
    }

    if path.as_os_str().as_encoded_bytes().contains(&b'/') {
        return is_executable(path).then_some(Cow::Borrowed(path));
    }

    find_in_path(search_paths?, path.as_os_str()).map(Cow::Owned)
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

/// Whether `path` is a regular file with any execute bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}
