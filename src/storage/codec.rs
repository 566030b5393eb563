//! Text encoding of the ordered favorites list
//!
//! The persisted form is a flat array of records, one per favorite, in
//! display order:
//!
//! ```text
//! [{"path":"/ws/a.txt","workspace":true,"workspacePath":"/a.txt",
//!   "label":"a.txt","comment":null,"status":"OK"}, ...]
//! ```
//!
//! Strings escape only `"` and `\`; absent values are written as `null`.
//! Decoding is a single pass over the input driven by a `State` machine:
//!
//! | State | Accepts | Next |
//! |-------|---------|------|
//! | `ExpectOpenBracket` | `[` | `ExpectObjectOrClose` |
//! | `ExpectObjectOrClose` | `{` / `]` (not after a comma) | `ExpectKey` / done |
//! | `ExpectKey` | string / `}` (empty record only) | `ExpectColon` / `ExpectCommaOrClose` |
//! | `ExpectColon` | `:` | `ExpectValue` |
//! | `ExpectValue` | string, `true`, `false`, `null` | `ExpectCommaOrClose` |
//! | `ExpectCommaOrClose` | `,` / `}` in a record, `,` / `]` in the array | ... |
//!
//! Anything else is a [`CodecError`]; a decode never returns a partial list.

use thiserror::Error;

use crate::domain::{Entry, EntryStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("Unexpected character {found:?} at offset {offset}, expected {expected}")]
    UnexpectedChar {
        found: char,
        offset: usize,
        expected: &'static str,
    },

    #[error("Invalid literal at offset {offset}")]
    InvalidLiteral { offset: usize },

    #[error("Field '{field}' at offset {offset} has the wrong type")]
    FieldType { field: &'static str, offset: usize },

    #[error("Unknown status {value:?} at offset {offset}")]
    UnknownStatus { value: String, offset: usize },

    #[error("Record {index} has no path")]
    MissingPath { index: usize },

    #[error("Trailing characters at offset {offset}")]
    TrailingCharacters { offset: usize },
}

/// Encodes entries in order
pub fn encode(entries: &[Entry]) -> String {
    let mut out = String::with_capacity(2 + entries.len() * 128);
    out.push('[');

    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push('{');
        write_string(&mut out, "path", Some(entry.absolute_path()));
        out.push(',');
        write_bool(&mut out, "workspace", entry.is_workspace_member());
        out.push(',');
        write_string(&mut out, "workspacePath", entry.workspace_path());
        out.push(',');
        write_string(&mut out, "label", entry.label());
        out.push(',');
        write_string(&mut out, "comment", entry.comment());
        out.push(',');
        write_string(&mut out, "status", Some(entry.status().as_str()));
        out.push('}');
    }

    out.push(']');
    out
}

fn write_string(out: &mut String, name: &str, value: Option<&str>) {
    write_name(out, name);
    match value {
        Some(text) => {
            out.push('"');
            escape_into(out, text);
            out.push('"');
        }
        None => out.push_str("null"),
    }
}

fn write_bool(out: &mut String, name: &str, value: bool) {
    write_name(out, name);
    out.push_str(if value { "true" } else { "false" });
}

fn write_name(out: &mut String, name: &str) {
    out.push('"');
    escape_into(out, name);
    out.push_str("\":");
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Decodes an encoded list, preserving order
pub fn decode(text: &str) -> Result<Vec<Entry>, CodecError> {
    let mut scanner = Scanner::new(text);
    let mut state = State::ExpectOpenBracket;
    let mut entries = Vec::new();
    let mut record = Record::default();
    let mut field = String::new();

    loop {
        scanner.skip_whitespace();
        let offset = scanner.pos;

        state = match state {
            State::ExpectOpenBracket => match scanner.bump() {
                Some('[') => State::ExpectObjectOrClose { allow_close: true },
                other => return Err(unexpected(other, offset, "'['")),
            },

            State::ExpectObjectOrClose { allow_close } => match scanner.bump() {
                Some('{') => {
                    record = Record::default();
                    State::ExpectKey { allow_close: true }
                }
                Some(']') if allow_close => State::Done,
                other => {
                    let expected = if allow_close { "'{' or ']'" } else { "'{'" };
                    return Err(unexpected(other, offset, expected));
                }
            },

            State::ExpectKey { allow_close } => match scanner.peek() {
                Some('"') => {
                    field = scanner.string()?;
                    State::ExpectColon
                }
                Some('}') if allow_close => {
                    scanner.bump();
                    entries.push(std::mem::take(&mut record).finish(entries.len())?);
                    State::ExpectCommaOrClose { in_record: false }
                }
                other => {
                    let expected = if allow_close { "a key or '}'" } else { "a key" };
                    return Err(unexpected(other, offset, expected));
                }
            },

            State::ExpectColon => match scanner.bump() {
                Some(':') => State::ExpectValue,
                other => return Err(unexpected(other, offset, "':'")),
            },

            State::ExpectValue => {
                let value = scanner.value()?;
                record.assign(&field, value, offset)?;
                State::ExpectCommaOrClose { in_record: true }
            }

            State::ExpectCommaOrClose { in_record: true } => match scanner.bump() {
                Some(',') => State::ExpectKey { allow_close: false },
                Some('}') => {
                    entries.push(std::mem::take(&mut record).finish(entries.len())?);
                    State::ExpectCommaOrClose { in_record: false }
                }
                other => return Err(unexpected(other, offset, "',' or '}'")),
            },

            State::ExpectCommaOrClose { in_record: false } => match scanner.bump() {
                Some(',') => State::ExpectObjectOrClose { allow_close: false },
                Some(']') => State::Done,
                other => return Err(unexpected(other, offset, "',' or ']'")),
            },

            State::Done => {
                return match scanner.peek() {
                    None => Ok(entries),
                    Some(_) => Err(CodecError::TrailingCharacters { offset }),
                };
            }
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectOpenBracket,
    ExpectObjectOrClose { allow_close: bool },
    ExpectKey { allow_close: bool },
    ExpectColon,
    ExpectValue,
    ExpectCommaOrClose { in_record: bool },
    Done,
}

fn unexpected(found: Option<char>, offset: usize, expected: &'static str) -> CodecError {
    match found {
        Some(found) => CodecError::UnexpectedChar {
            found,
            offset,
            expected,
        },
        None => CodecError::UnexpectedEof { expected },
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Value {
    Str(String),
    Bool(bool),
    Null,
}

/// Fields of the record being decoded
#[derive(Debug, Default)]
struct Record {
    path: Option<String>,
    workspace: bool,
    workspace_path: Option<String>,
    label: Option<String>,
    comment: Option<String>,
    status: EntryStatus,
}

impl Record {
    fn assign(&mut self, field: &str, value: Value, offset: usize) -> Result<(), CodecError> {
        match field {
            "path" => self.path = optional_string("path", value, offset)?,
            "workspacePath" => {
                self.workspace_path = optional_string("workspacePath", value, offset)?
            }
            "label" => self.label = optional_string("label", value, offset)?,
            "comment" => self.comment = optional_string("comment", value, offset)?,
            "workspace" => {
                self.workspace = match value {
                    Value::Bool(flag) => flag,
                    Value::Null => false,
                    Value::Str(_) => {
                        return Err(CodecError::FieldType {
                            field: "workspace",
                            offset,
                        })
                    }
                }
            }
            "status" => {
                self.status = match optional_string("status", value, offset)? {
                    Some(name) => EntryStatus::parse(&name)
                        .ok_or(CodecError::UnknownStatus { value: name, offset })?,
                    None => EntryStatus::Ok,
                }
            }
            // Unknown fields from newer writers are skipped
            _ => {}
        }
        Ok(())
    }

    fn finish(self, index: usize) -> Result<Entry, CodecError> {
        let path = self.path.ok_or(CodecError::MissingPath { index })?;
        let entry = Entry::new(path, self.workspace)
            .map_err(|_| CodecError::MissingPath { index })?;

        Ok(entry
            .with_workspace_path(self.workspace_path)
            .with_label(self.label)
            .with_comment(self.comment)
            .with_status(self.status))
    }
}

fn optional_string(
    field: &'static str,
    value: Value,
    offset: usize,
) -> Result<Option<String>, CodecError> {
    match value {
        Value::Str(text) => Ok(Some(text)),
        Value::Null => Ok(None),
        Value::Bool(_) => Err(CodecError::FieldType { field, offset }),
    }
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Reads a quoted string; the scanner sits on the opening quote
    fn string(&mut self) -> Result<String, CodecError> {
        let offset = self.pos;
        match self.bump() {
            Some('"') => {}
            other => return Err(unexpected(other, offset, "'\"'")),
        }

        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some(escaped) => text.push(escaped),
                    None => {
                        return Err(CodecError::UnexpectedEof {
                            expected: "an escaped character",
                        })
                    }
                },
                Some(c) => text.push(c),
                None => {
                    return Err(CodecError::UnexpectedEof {
                        expected: "closing '\"'",
                    })
                }
            }
        }
    }

    fn value(&mut self) -> Result<Value, CodecError> {
        let offset = self.pos;
        match self.peek() {
            Some('"') => self.string().map(Value::Str),
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
                    self.bump();
                }
                match &self.text[start..self.pos] {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    _ => Err(CodecError::InvalidLiteral { offset }),
                }
            }
            other => Err(unexpected(other, offset, "a string, true, false or null")),
        }
    }
}
