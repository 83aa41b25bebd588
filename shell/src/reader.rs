//! Sources of input lines for the interactive loop.

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};

/// Something that can show a prompt and hand back one line of input.
pub trait LineReader {
    /// Read one line with its trailing newline removed.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Terminal reader with line editing, backed by rustyline.
///
/// Lines are not recorded in any history.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialise line editor")?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C abandons the current line only
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            // a line that is not valid UTF-8 is dropped, the loop goes on
            Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("discarding unreadable line: {}", e);
                Ok(Some(String::new()))
            }
            Err(err) => Err(err).context("failed to read line"),
        }
    }
}

/// Reader for non-interactive input: prints the prompt to `output` and reads `input` line by line.
pub struct PlainReader<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PlainReader<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the prompt sink, e.g. to inspect what was written.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> LineReader for PlainReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut buf = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut buf)
            .context("failed to read line")?;
        if read == 0 {
            return Ok(None);
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        // invalid UTF-8 is replaced rather than rejected
        let line = String::from_utf8_lossy(&buf).into_owned();
        Ok(Some(line))
    }
}
