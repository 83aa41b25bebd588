use crate::lexer::LexerLimits;
use argh::FromArgs;

/// Prompt shown before every line.
pub const DEFAULT_PROMPT: &str = "$ ";

/// Runtime settings of the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Bounds applied by the lexer to every line.
    pub limits: LexerLimits,
    pub prompt: String,
    /// Use the terminal line editor when standard input is a terminal.
    pub line_editing: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            limits: LexerLimits::default(),
            prompt: DEFAULT_PROMPT.to_string(),
            line_editing: true,
        }
    }
}

#[derive(FromArgs, Debug)]
/// A small interactive shell with builtins and external programs.
pub struct Args {
    #[argh(option)]
    /// maximum number of arguments on one line, command name included
    pub max_args: Option<usize>,

    #[argh(option)]
    /// maximum length of a single argument in bytes
    pub max_arg_len: Option<usize>,

    #[argh(switch)]
    /// read standard input line by line without the line editor
    pub plain: bool,
}

impl From<Args> for ShellConfig {
    fn from(args: Args) -> Self {
        let defaults = ShellConfig::default();
        Self {
            limits: LexerLimits {
                max_args: args.max_args.unwrap_or(defaults.limits.max_args),
                max_arg_len: args.max_arg_len.unwrap_or(defaults.limits.max_arg_len),
            },
            line_editing: !args.plain,
            ..defaults
        }
    }
}
