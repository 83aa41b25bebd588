use crate::command::{Context, ExecutableCommand, ExitCode};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::external::ExternalCommand;
use crate::lexer::{self, LexingError};
use crate::reader::LineReader;
use crate::registry::BuiltinTable;
use anyhow::Result;
use std::io::Write;

/// Status recorded when a program was found but could not be started.
const SPAWN_FAILURE_STATUS: ExitCode = 126;
/// Status recorded when no builtin or program matches the command name.
const NOT_FOUND_STATUS: ExitCode = 127;

/// Result of handling one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command ran and finished with this status.
    Status(ExitCode),
    /// No builtin or executable matches the command name.
    NotFound,
    /// The line could not be lexed; nothing ran.
    ParseError(LexingError),
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns the [`Environment`] snapshot and an immutable [`BuiltinTable`].
/// Builtins always take precedence over programs of the same name found on `PATH`.
///
/// Example
/// ```
/// use minishell::{CommandOutcome, Interpreter};
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let outcome = sh.execute_line("echo 'hello   world'", &mut out, &mut Vec::new()).unwrap();
/// assert_eq!(outcome, Some(CommandOutcome::Status(0)));
/// assert_eq!(out, b"hello   world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: BuiltinTable,
    config: ShellConfig,
    last_status: ExitCode,
}

impl Interpreter {
    /// Create a new interpreter from its collaborators.
    pub fn new(env: Environment, builtins: BuiltinTable, config: ShellConfig) -> Self {
        Self {
            env,
            builtins,
            config,
            last_status: 0,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Status of the most recent command that ran, or 127 if it was not found.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    /// Run a single command given as already lexed arguments.
    ///
    /// `argv` must not be empty. Builtin output and the `command not found` message go to
    /// `stdout`, other diagnostics to `stderr`; external programs write to the inherited
    /// process streams.
    pub fn run(
        &mut self,
        argv: &[String],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<CommandOutcome> {
        let Some((name, args)) = argv.split_first() else {
            anyhow::bail!("cannot run an empty command");
        };

        let command: Box<dyn ExecutableCommand> = if let Some(factory) = self.builtins.resolve(name)
        {
            log::debug!("dispatching builtin {}", name);
            factory.create(args)
        } else if let Some(external) = ExternalCommand::resolve(&self.env, argv) {
            log::debug!("resolved {} to {}", name, external.program().display());
            // builtin output must reach the terminal before the child writes to it
            stdout.flush()?;
            Box::new(external)
        } else {
            log::debug!("{} not found", name);
            writeln!(stdout, "{}: command not found", name)?;
            self.last_status = NOT_FOUND_STATUS;
            return Ok(CommandOutcome::NotFound);
        };

        let mut ctx = Context {
            env: &mut self.env,
            builtins: &self.builtins,
            stdout: &mut *stdout,
            stderr: &mut *stderr,
        };
        let status = match command.execute(&mut ctx) {
            Ok(status) => status,
            Err(e) => {
                log::warn!("{:#}", e);
                writeln!(stderr, "{e:#}")?;
                SPAWN_FAILURE_STATUS
            }
        };
        stdout.flush()?;

        log::debug!("{} finished with status {}", name, status);
        self.last_status = status;
        Ok(CommandOutcome::Status(status))
    }

    /// Lex and run one input line.
    ///
    /// Returns `None` for a blank line. A lexing error is printed to `stderr` and nothing
    /// of the line runs.
    pub fn execute_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<Option<CommandOutcome>> {
        let argv = match lexer::split_into_args(line, self.config.limits) {
            Ok(argv) => argv,
            Err(e) => {
                writeln!(stderr, "{}", e)?;
                return Ok(Some(CommandOutcome::ParseError(e)));
            }
        };
        if argv.is_empty() {
            return Ok(None);
        }
        self.run(&argv, stdout, stderr).map(Some)
    }

    /// Read-Eval-Print Loop.
    ///
    /// Prompts through `reader` until the `exit` builtin runs or the input ends, and returns
    /// the status the whole shell should exit with.
    pub fn repl(
        &mut self,
        reader: &mut dyn LineReader,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode> {
        loop {
            let Some(line) = reader.read_line(&self.config.prompt)? else {
                log::debug!("end of input");
                return Ok(0);
            };

            self.execute_line(&line, stdout, stderr)?;

            if let Some(code) = self.env.exit_code {
                log::debug!("exit requested with status {}", code);
                return Ok(code);
            }
        }
    }
}

impl Default for Interpreter {
    /// Interpreter over the current process environment with the standard builtins.
    fn default() -> Self {
        Self::new(
            Environment::new(),
            BuiltinTable::default(),
            ShellConfig::default(),
        )
    }
}
