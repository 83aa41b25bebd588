use crate::env::Environment;
use crate::registry::BuiltinTable;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Everything a command may touch while it runs.
///
/// `stdout` and `stderr` are the shell's own output streams. Builtins write to them;
/// external programs ignore them and inherit the real process streams instead.
pub struct Context<'a> {
    pub env: &'a mut Environment,
    pub builtins: &'a BuiltinTable,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command, consuming it.
    fn execute(self: Box<Self>, ctx: &mut Context<'_>) -> Result<ExitCode>;
}

/// Factory that creates a command instance from its trailing arguments.
///
/// One factory is registered per builtin name in the [`BuiltinTable`].
pub trait CommandFactory {
    /// Name the command is invoked by.
    fn name(&self) -> &'static str;

    /// Create a command for the arguments following the command name.
    fn create(&self, args: &[String]) -> Box<dyn ExecutableCommand>;
}
