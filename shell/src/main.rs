use anyhow::Result;
use minishell::config::Args;
use minishell::env::Environment;
use minishell::reader::{EditorReader, LineReader, PlainReader};
use minishell::{BuiltinTable, Interpreter, ShellConfig};
use std::io::{self, IsTerminal};

fn main() -> Result<()> {
    env_logger::init();
    let config = ShellConfig::from(argh::from_env::<Args>());

    let mut reader: Box<dyn LineReader> = if config.line_editing && io::stdin().is_terminal() {
        Box::new(EditorReader::new()?)
    } else {
        Box::new(PlainReader::new(io::stdin().lock(), io::stdout()))
    };

    let mut shell = Interpreter::new(Environment::new(), BuiltinTable::default(), config);
    let code = shell.repl(reader.as_mut(), &mut io::stdout(), &mut io::stderr())?;
    drop(reader);
    std::process::exit(code)
}
