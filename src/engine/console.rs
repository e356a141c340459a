//! Console I/O - numbered menus and line input

use anyhow::Result;
use std::io::{BufRead, Write};

/// Label printed next to the exit marker
pub const EXIT_LABEL: &str = "Save and Exit";

/// Exit marker for a menu with `option_count` entries
///
/// Never collides with a zero-based option index: "9" for up to 8 options,
/// "99" up to 98, "999" beyond.
pub fn exit_marker(option_count: usize) -> &'static str {
    if option_count > 98 {
        "999"
    } else if option_count > 8 {
        "99"
    } else {
        "9"
    }
}

/// A menu answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Option(usize),
    Exit,
}

/// Line-oriented console over any reader/writer pair
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Read one line without its terminator; `None` once input is exhausted
    ///
    /// Bytes that are not UTF-8 become U+FFFD instead of failing the read.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }
        while raw.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
            raw.pop();
        }
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    /// Print `index: label` lines followed by the exit entry
    pub fn print_menu<S: AsRef<str>>(&mut self, labels: &[S], exit: &str) -> Result<()> {
        for (i, label) in labels.iter().enumerate() {
            writeln!(self.output, "{}: {}", i, label.as_ref())?;
        }
        writeln!(self.output, "{}: {}", exit, EXIT_LABEL)?;
        Ok(())
    }

    /// Block until the answer is a listed index or the exit marker
    ///
    /// End of input counts as exit.
    pub fn choose(&mut self, option_count: usize) -> Result<Selection> {
        let exit = exit_marker(option_count);
        loop {
            let Some(answer) = self.read_line()? else {
                log::info!("Input closed, exiting");
                return Ok(Selection::Exit);
            };
            if answer == exit {
                return Ok(Selection::Exit);
            }
            if let Some(index) = parse_index(&answer, option_count) {
                return Ok(Selection::Option(index));
            }
            log::debug!("Ignoring invalid choice {:?}", answer);
        }
    }
}

/// Exact decimal index below `count`; no signs, spaces or leading zeros
fn parse_index(answer: &str, count: usize) -> Option<usize> {
    if answer.is_empty() || !answer.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if answer.len() > 1 && answer.starts_with('0') {
        return None;
    }
    answer.parse::<usize>().ok().filter(|i| *i < count)
}
