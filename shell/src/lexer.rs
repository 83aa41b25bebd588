//! Lexical analysis of a single input line into shell arguments.
//!
//! The lexer is a five-state machine. Each step is described by [`transition`], which maps
//! the current [`LexerState`] and one input character to the next state and an [`Action`]
//! that says what happens to the argument being accumulated. [`split_into_args`] drives the
//! machine over a whole line and enforces the configured [`LexerLimits`].

use std::fmt;

/// State of the lexing machine at a given position of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerState {
    /// Outside of any quotes.
    Default,
    /// Inside `'...'`. No escape processing happens here.
    InSingleQuote,
    /// Inside `"..."`.
    InDoubleQuote,
    /// Right after an unquoted backslash.
    EscapeInDefault,
    /// Right after a backslash inside double quotes.
    EscapeInDoubleQuote,
}

/// What a single transition does to the argument under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing is emitted.
    Skip,
    /// An unquoted separator: finishes the current argument, if any.
    Boundary,
    /// Starts an argument without emitting a character (opening quote or backslash).
    Open,
    /// Appends the character.
    Push(char),
    /// Appends a backslash followed by the character (an escape that did not fire).
    PushWithBackslash(char),
}

/// Kind of quote left open at the end of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    Single,
    Double,
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteKind::Single => f.write_str("single"),
            QuoteKind::Double => f.write_str("double"),
        }
    }
}

/// Errors that abort lexing of a whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A quote was opened but never closed.
    UnmatchedQuote(QuoteKind),
    /// The line ends with an unquoted backslash.
    TrailingBackslash,
    /// A single argument grew beyond the configured length in bytes.
    ArgumentTooLong { limit: usize },
    /// The line holds more arguments than allowed.
    TooManyArguments { limit: usize },
}

impl fmt::Display for LexingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexingError::UnmatchedQuote(kind) => write!(f, "unmatched {kind} quote"),
            LexingError::TrailingBackslash => f.write_str("trailing backslash"),
            LexingError::ArgumentTooLong { limit } => {
                write!(f, "argument too long (limit is {limit} bytes)")
            }
            LexingError::TooManyArguments { limit } => {
                write!(f, "too many arguments (limit is {limit})")
            }
        }
    }
}

impl std::error::Error for LexingError {}

/// Bounds applied to every lexed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerLimits {
    /// Maximum number of arguments, command name included.
    pub max_args: usize,
    /// Maximum length of one argument in bytes.
    pub max_arg_len: usize,
}

impl Default for LexerLimits {
    fn default() -> Self {
        Self {
            max_args: 256,
            max_arg_len: 4096,
        }
    }
}

/// Computes one step of the lexing machine.
pub fn transition(state: LexerState, ch: char) -> (LexerState, Action) {
    use LexerState::*;
    match (state, ch) {
        (Default, ' ') => (Default, Action::Boundary),
        (Default, '\'') => (InSingleQuote, Action::Open),
        (Default, '"') => (InDoubleQuote, Action::Open),
        (Default, '\\') => (EscapeInDefault, Action::Open),
        (Default, c) => (Default, Action::Push(c)),

        (InSingleQuote, '\'') => (Default, Action::Skip),
        (InSingleQuote, c) => (InSingleQuote, Action::Push(c)),

        (InDoubleQuote, '"') => (Default, Action::Skip),
        (InDoubleQuote, '\\') => (EscapeInDoubleQuote, Action::Skip),
        (InDoubleQuote, c) => (InDoubleQuote, Action::Push(c)),

        (EscapeInDefault, c) => (Default, Action::Push(c)),

        (EscapeInDoubleQuote, c @ ('"' | '\\' | '$' | '`')) => (InDoubleQuote, Action::Push(c)),
        (EscapeInDoubleQuote, c) => (InDoubleQuote, Action::PushWithBackslash(c)),
    }
}

struct LexingFSM {
    limits: LexerLimits,
    state: LexerState,
    out: Vec<String>,
    buffer: String,
    // An opening quote starts an argument even if nothing is pushed to it.
    in_word: bool,
}

impl LexingFSM {
    fn new(limits: LexerLimits) -> Self {
        LexingFSM {
            limits,
            state: LexerState::Default,
            out: Vec::new(),
            buffer: String::new(),
            in_word: false,
        }
    }

    fn make_args(mut self, line: &str) -> Result<Vec<String>, LexingError> {
        for ch in line.chars() {
            let (next, action) = transition(self.state, ch);
            self.apply(action)?;
            self.state = next;
        }

        match self.state {
            LexerState::Default => {}
            LexerState::InSingleQuote => {
                return Err(LexingError::UnmatchedQuote(QuoteKind::Single));
            }
            LexerState::InDoubleQuote | LexerState::EscapeInDoubleQuote => {
                return Err(LexingError::UnmatchedQuote(QuoteKind::Double));
            }
            LexerState::EscapeInDefault => return Err(LexingError::TrailingBackslash),
        }

        self.finish_word()?;
        Ok(self.out)
    }

    fn apply(&mut self, action: Action) -> Result<(), LexingError> {
        match action {
            Action::Skip => {}
            Action::Boundary => self.finish_word()?,
            Action::Open => self.in_word = true,
            Action::Push(c) => self.push(c)?,
            Action::PushWithBackslash(c) => {
                self.push('\\')?;
                self.push(c)?;
            }
        }
        Ok(())
    }

    fn push(&mut self, c: char) -> Result<(), LexingError> {
        if self.buffer.len() + c.len_utf8() > self.limits.max_arg_len {
            return Err(LexingError::ArgumentTooLong {
                limit: self.limits.max_arg_len,
            });
        }
        self.buffer.push(c);
        self.in_word = true;
        Ok(())
    }

    fn finish_word(&mut self) -> Result<(), LexingError> {
        if !self.in_word {
            return Ok(());
        }
        if self.out.len() >= self.limits.max_args {
            return Err(LexingError::TooManyArguments {
                limit: self.limits.max_args,
            });
        }
        self.out.push(std::mem::take(&mut self.buffer));
        self.in_word = false;
        Ok(())
    }
}

/// Splits `line` into fully unescaped arguments.
///
/// Returns an empty vector for a blank line. On error nothing of the line is returned.
pub fn split_into_args(line: &str, limits: LexerLimits) -> Result<Vec<String>, LexingError> {
    let args = LexingFSM::new(limits).make_args(line)?;
    log::trace!("lexed {} argument(s) from {:?}", args.len(), line);
    Ok(args)
}
