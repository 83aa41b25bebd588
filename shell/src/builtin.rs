use crate::command::{Context, ExecutableCommand, ExitCode};
use crate::external::find_command_path;
use anyhow::{Context as _, Result, anyhow};
use std::env;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins receive the arguments following their name and run directly in-process
/// without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Builds the command from its trailing arguments.
    ///
    /// Parsing is permissive: builtins never refuse to be constructed, malformed input is
    /// handled when the command runs.
    fn from_args(args: &[String]) -> Self;

    /// Executes the command.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    /// An `Err` is reported on the error stream and turned into status 1.
    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, ctx: &mut Context<'_>) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, ctx) {
            Ok(x) => Ok(x),
            Err(e) => {
                // a failed diagnostic write must not turn a builtin error into another status
                let _ = writeln!(ctx.stderr, "{e:#}");
                Ok(1)
            }
        }
    }
}

/// Exit the shell process.
pub struct Exit {
    pub code: Option<String>,
}

impl Exit {
    /// Status requested by the argument: non-numeric or absent means 0, wrapped to 0..=255.
    fn status(&self) -> ExitCode {
        let code = self
            .code
            .as_deref()
            .and_then(|c| c.parse::<i64>().ok())
            .unwrap_or(0);
        code.rem_euclid(256) as ExitCode
    }
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn from_args(args: &[String]) -> Self {
        // extra arguments are ignored
        Self {
            code: args.first().cloned(),
        }
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let status = self.status();
        ctx.env.request_exit(status);
        Ok(status)
    }
}

/// Change the current working directory.
/// If no target is provided, or the target is `~`, changes to the directory in `HOME`.
pub struct Cd {
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_args(args: &[String]) -> Self {
        Self {
            target: args.first().cloned(),
        }
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let target = match self.target.as_deref() {
            None | Some("~") => ctx
                .env
                .get_var("HOME")
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("cd: HOME not set"))?,
            Some(t) => PathBuf::from(t),
        };

        env::set_current_dir(&target)
            .map_err(|e| anyhow!("cd: {}: {}", target.display(), describe_io_error(&e)))?;
        log::debug!("working directory changed to {}", target.display());
        Ok(0)
    }
}

/// Print the current working directory to standard output.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn from_args(_args: &[String]) -> Self {
        Pwd
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let cwd = env::current_dir().context("pwd: error retrieving current directory")?;
        writeln!(ctx.stdout, "{}", cwd.display())?;
        Ok(0)
    }
}

/// Write the arguments to standard output, separated by single spaces, then a newline.
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn from_args(args: &[String]) -> Self {
        Self {
            args: args.to_vec(),
        }
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        writeln!(ctx.stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}

/// Describe how each name would be interpreted if used as a command.
pub struct Type {
    pub names: Vec<String>,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn from_args(args: &[String]) -> Self {
        Self {
            names: args.to_vec(),
        }
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        if self.names.is_empty() {
            writeln!(ctx.stderr, "type: missing argument")?;
            return Ok(2);
        }

        let search_paths = ctx.env.get_var("PATH");
        let mut status = 0;
        for name in &self.names {
            if ctx.builtins.is_builtin(name) {
                writeln!(ctx.stdout, "{} is a shell builtin", name)?;
            } else if let Some(path) = find_command_path(search_paths, Path::new(name)) {
                writeln!(ctx.stdout, "{} is {}", name, path.display())?;
            } else {
                writeln!(ctx.stdout, "{}: not found", name)?;
                status = 1;
            }
        }
        Ok(status)
    }
}

/// Message text for an OS error, without the `(os error N)` suffix.
fn describe_io_error(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => "No such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        io::ErrorKind::NotADirectory => "Not a directory".to_string(),
        _ => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::registry::BuiltinTable;
    use std::env as stdenv;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    struct Captured {
        code: ExitCode,
        stdout: String,
        stderr: String,
    }

    fn run<T: BuiltinCommand + 'static>(cmd: T, env: &mut Environment) -> Captured {
        let builtins = BuiltinTable::default();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = {
            let mut ctx = Context {
                env,
                builtins: &builtins,
                stdout: &mut stdout,
                stderr: &mut stderr,
            };
            let boxed: Box<dyn ExecutableCommand> = Box::new(cmd);
            boxed.execute(&mut ctx).unwrap()
        };
        Captured {
            code,
            stdout: String::from_utf8(stdout).unwrap(),
            stderr: String::from_utf8(stderr).unwrap(),
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn make_unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let p = stdenv::temp_dir().join(format!(
            "minishell_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&p).unwrap();
        fs::canonicalize(&p).unwrap()
    }

    #[test]
    fn test_echo_joins_with_single_space() {
        let mut env = Environment::default();
        let out = run(Echo::from_args(&strings(&["hello", "world"])), &mut env);
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout, "hello world\n");

        let out = run(Echo::from_args(&[]), &mut env);
        assert_eq!(out.stdout, "\n");
    }

    #[test]
    fn test_exit_codes() {
        let cases: &[(&[&str], ExitCode)] = &[
            (&[], 0),
            (&["7"], 7),
            (&["42", "ignored"], 42),
            (&["foo"], 0),
            (&["256"], 0),
            (&["257"], 1),
            (&["-1"], 255),
        ];
        for (args, expected) in cases {
            let mut env = Environment::default();
            let out = run(Exit::from_args(&strings(args)), &mut env);
            assert_eq!(out.code, *expected, "exit {:?}", args);
            assert_eq!(env.exit_code, Some(*expected));
        }
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = stdenv::current_dir().unwrap();

        let mut env = Environment::default();
        let out = run(Pwd, &mut env);

        assert_eq!(out.code, 0);
        assert_eq!(out.stdout, format!("{}\n", cur.display()));
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_abs");
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::default();
        let out = run(Cd::from_args(&[temp.to_string_lossy().to_string()]), &mut env);

        assert_eq!(out.code, 0);
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_to_home_when_none_or_tilde() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_home");
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::from_vars([("HOME", temp.to_string_lossy().to_string())]);

        for args in [strings(&[]), strings(&["~"])] {
            stdenv::set_current_dir(&orig).unwrap();
            let out = run(Cd::from_args(&args), &mut env);
            assert_eq!(out.code, 0);
            assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), temp);
        }

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_without_home_fails_and_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::default();
        let out = run(Cd::from_args(&[]), &mut env);

        assert_eq!(out.code, 1);
        assert_eq!(out.stderr, "cd: HOME not set\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let mut env = Environment::default();
        let out = run(Cd::from_args(&strings(&["/does/not/exist"])), &mut env);

        assert_eq!(out.code, 1);
        assert_eq!(out.stderr, "cd: /does/not/exist: No such file or directory\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    struct ClosedStream;

    impl Write for ClosedStream {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_builtin_error_is_status_one_even_if_stderr_is_closed() {
        let mut env = Environment::default();
        let builtins = BuiltinTable::default();
        let mut stdout = Vec::new();
        let mut stderr = ClosedStream;
        let mut ctx = Context {
            env: &mut env,
            builtins: &builtins,
            stdout: &mut stdout,
            stderr: &mut stderr,
        };
        // cd without HOME fails and tries to report it
        let boxed: Box<dyn ExecutableCommand> = Box::new(Cd::from_args(&[]));
        assert_eq!(boxed.execute(&mut ctx).unwrap(), 1);
    }

    #[test]
    fn test_type_reports_builtins_and_missing() {
        let mut env = Environment::from_vars([("PATH", "/nonexistent_minishell_dir")]);

        let out = run(Type::from_args(&strings(&["cd"])), &mut env);
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout, "cd is a shell builtin\n");

        let out = run(Type::from_args(&strings(&["echo", "nope_cmd"])), &mut env);
        assert_eq!(out.code, 1);
        assert_eq!(out.stdout, "echo is a shell builtin\nnope_cmd: not found\n");
        assert!(out.stderr.is_empty());

        let out = run(Type::from_args(&[]), &mut env);
        assert_eq!(out.code, 2);
        assert_eq!(out.stderr, "type: missing argument\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_type_reports_resolved_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = make_unique_temp_dir("type_path");
        let exe = dir.join("my_tool");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

        let mut env = Environment::from_vars([("PATH", dir.to_string_lossy().to_string())]);
        let out = run(Type::from_args(&strings(&["my_tool"])), &mut env);
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout, format!("my_tool is {}\n", exe.display()));

        let _ = fs::remove_dir_all(&dir);
    }
}
