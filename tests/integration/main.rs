//! Integration tests across layers
//!
//! Scripts driven through the REPL, diagrams saved and reopened, and layered
//! views surviving the whole trip.

mod layered_views;
mod persistence;
mod scripts;

use genogram_foundation::Result;
use genogram_runtime::{LineEditor, ReadResult, Repl, Reply};

/// Line editor that plays back a fixed list of lines.
pub struct MockEditor {
    inputs: Vec<String>,
    index: usize,
}

impl MockEditor {
    pub fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(ToString::to_string).collect(),
            index: 0,
        }
    }
}

impl LineEditor for MockEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        match self.inputs.get(self.index) {
            Some(line) => {
                self.index += 1;
                Ok(ReadResult::Line(line.clone()))
            }
            None => Ok(ReadResult::Eof),
        }
    }

    fn add_history(&mut self, _line: &str) {}

    fn set_keywords(&mut self, _keywords: Vec<String>) {}
}

pub fn repl() -> Repl<MockEditor> {
    Repl::with_editor(MockEditor::new(&[])).without_banner()
}

/// Evaluates a line that must print something.
pub fn output(repl: &mut Repl<MockEditor>, line: &str) -> String {
    match repl.eval(line) {
        Ok(Reply::Output(text)) => text,
        other => panic!("expected output from '{line}', got {other:?}"),
    }
}

/// Runs a script that must succeed.
pub fn script(repl: &mut Repl<MockEditor>, text: &str) {
    if let Err((line, err)) = repl.run_script(text.as_bytes()) {
        panic!("script failed at line {line}: {err}");
    }
}
