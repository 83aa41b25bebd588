use crate::command::ExitCode;
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};

/// Snapshot of the process environment shared by builtins and the process launcher.
///
/// The environment contains:
/// - `vars`: variables captured once at startup. They are never modified by the shell and
///   are passed unchanged to spawned programs. Names and values are kept as `OsString`
///   so variables that are not valid UTF-8 survive untouched.
/// - `exit_code`: set by the `exit` builtin, checked by the REPL loop after each command.
///
/// The working directory is not stored here: it is process-wide state owned by the OS,
/// changed by `cd` and inherited by children.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<OsString, OsString>,
    /// When set, the interactive loop terminates with this code.
    pub exit_code: Option<ExitCode>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn new() -> Self {
        Self::from_vars(stdenv::vars_os())
    }

    /// Build an environment from explicit variables, e.g. to run without `PATH` in tests.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            exit_code: None,
        }
    }

    /// Get the value of an environment variable from the snapshot.
    pub fn get_var(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    /// Ask the interactive loop to stop after the current command.
    pub fn request_exit(&mut self, code: ExitCode) {
        self.exit_code = Some(code);
    }
}
