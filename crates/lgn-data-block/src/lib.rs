//! Key/value block container.
//!
//! A [`DataBlock`] holds ordered, typed parameters and ordered named
//! sub-blocks. Compiled asset records are written in its text form:
//!
//! ```text
//! dummy:t="dummyPhys"
//! density:r=2.5
//! layers:i=3
//! enabled:b=yes
//! collider{
//!     shape:t="box"
//! }
//! ```
//!
//! The text form is deterministic: the same block always produces the same
//! bytes, in insertion order.

// crate-specific lint exceptions:
//#![allow()]

use std::{
    fmt::{self, Write as _},
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Error returned by [`DataBlock`] operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Parameter or block name is empty or has unsupported characters.
    #[error("invalid name '{0}'")]
    InvalidName(String),
    /// IO failure while saving or loading a block.
    #[error("IO on '{0}' failed with {1}")]
    Io(PathBuf, #[source] std::io::Error),
    /// Malformed block text.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line of the error.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// Result type of data block operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// String, type tag `t`.
    Str(String),
    /// Integer, type tag `i`.
    Int(i64),
    /// Real, type tag `r`.
    Real(f64),
    /// Boolean, type tag `b`.
    Bool(bool),
}

impl Param {
    fn type_tag(&self) -> &'static str {
        match self {
            Self::Str(_) => "t",
            Self::Int(_) => "i",
            Self::Real(_) => "r",
            Self::Bool(_) => "b",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => {
                f.write_char('"')?;
                for c in value.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => f.write_char(c)?,
                    }
                }
                f.write_char('"')
            }
            Self::Int(value) => write!(f, "{}", value),
            // `{:?}` always keeps a fractional part, so reals never read back as integers.
            Self::Real(value) => write!(f, "{:?}", value),
            Self::Bool(value) => f.write_str(if *value { "yes" } else { "no" }),
        }
    }
}

/// Ordered container of named parameters and named sub-blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBlock {
    params: Vec<(String, Param)>,
    blocks: Vec<(String, DataBlock)>,
}

fn validate_name(name: &str) -> Result<()> {
    if !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_owned()))
    }
}

impl DataBlock {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the block has neither parameters nor sub-blocks.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.blocks.is_empty()
    }

    /// Sets parameter `name`, replacing an existing parameter in place.
    pub fn set(&mut self, name: &str, value: Param) -> Result<&mut Self> {
        validate_name(name)?;
        match self.params.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((name.to_owned(), value)),
        }
        Ok(self)
    }

    /// Sets a string parameter.
    pub fn set_str(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Self> {
        self.set(name, Param::Str(value.into()))
    }

    /// Sets an integer parameter.
    pub fn set_int(&mut self, name: &str, value: i64) -> Result<&mut Self> {
        self.set(name, Param::Int(value))
    }

    /// Sets a real parameter.
    pub fn set_real(&mut self, name: &str, value: f64) -> Result<&mut Self> {
        self.set(name, Param::Real(value))
    }

    /// Sets a boolean parameter.
    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<&mut Self> {
        self.set(name, Param::Bool(value))
    }

    /// Appends a new sub-block and returns it.
    pub fn add_block(&mut self, name: &str) -> Result<&mut Self> {
        validate_name(name)?;
        let index = self.blocks.len();
        self.blocks.push((name.to_owned(), Self::new()));
        Ok(&mut self.blocks[index].1)
    }

    /// Returns parameter `name`.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Returns string parameter `name`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.param(name)? {
            Param::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns integer parameter `name`.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.param(name)? {
            Param::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns real parameter `name`.
    pub fn get_real(&self, name: &str) -> Option<f64> {
        match self.param(name)? {
            Param::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns boolean parameter `name`.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.param(name)? {
            Param::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the first sub-block called `name`.
    pub fn get_block(&self, name: &str) -> Option<&Self> {
        self.blocks.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    /// All parameters, in insertion order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.params.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// All sub-blocks, in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.blocks.iter().map(|(n, b)| (n.as_str(), b))
    }

    /// Text form of the block.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        self.write_text(&mut text, 0);
        text
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        let indent = "    ".repeat(depth);
        for (name, param) in &self.params {
            // writing to a String cannot fail.
            let _ = writeln!(out, "{}{}:{}={}", indent, name, param.type_tag(), param);
        }
        for (name, block) in &self.blocks {
            let _ = writeln!(out, "{}{}{{", indent, name);
            block.write_text(out, depth + 1);
            let _ = writeln!(out, "{}}}", indent);
        }
    }

    /// Writes the text form of the block to `path`.
    pub fn save_to_text_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_text()).map_err(|e| Error::Io(path.to_owned(), e))
    }

    /// Reads a block from a text file.
    pub fn load_text_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::Io(path.to_owned(), e))?;
        Self::parse_text(&text)
    }

    /// Parses the text form of a block.
    pub fn parse_text(text: &str) -> Result<Self> {
        let mut reader = TextReader {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
        };
        let block = reader.read_block(false)?;
        Ok(block)
    }
}

struct TextReader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl TextReader {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '/' && self.chars.get(self.pos + 1) == Some(&'/') {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn read_name(&mut self) -> Result<String> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if name.is_empty() {
            Err(self.error("expected a name"))
        } else {
            Ok(name)
        }
    }

    fn read_block(&mut self, nested: bool) -> Result<DataBlock> {
        let mut block = DataBlock::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None if nested => return Err(self.error("unterminated block")),
                None => return Ok(block),
                Some('}') if nested => {
                    self.bump();
                    return Ok(block);
                }
                Some(_) => {}
            }

            let name = self.read_name()?;
            self.skip_trivia();
            match self.bump() {
                Some('{') => {
                    let child = self.read_block(true)?;
                    block.blocks.push((name, child));
                }
                Some(':') => {
                    let tag = self.read_name()?;
                    self.skip_trivia();
                    if self.bump() != Some('=') {
                        return Err(self.error(format!("expected '=' after '{}'", name)));
                    }
                    self.skip_trivia();
                    let value = self.read_value(&tag)?;
                    block.set(&name, value)?;
                }
                _ => return Err(self.error(format!("expected ':' or '{{' after '{}'", name))),
            }
        }
    }

    fn read_value(&mut self, tag: &str) -> Result<Param> {
        if tag == "t" {
            return self.read_string().map(Param::Str);
        }

        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '}' {
                break;
            }
            raw.push(c);
            self.bump();
        }

        let invalid = || self.error(format!("invalid '{}' value '{}'", tag, raw));
        match tag {
            "i" => raw.parse().map(Param::Int).map_err(|_e| invalid()),
            "r" => raw.parse().map(Param::Real).map_err(|_e| invalid()),
            "b" => match raw.as_str() {
                "yes" | "true" | "on" | "1" => Ok(Param::Bool(true)),
                "no" | "false" | "off" | "0" => Ok(Param::Bool(false)),
                _ => Err(invalid()),
            },
            _ => Err(self.error(format!("unknown type tag '{}'", tag))),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        if self.bump() != Some('"') {
            return Err(self.error("expected '\"'"));
        }
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c @ ('"' | '\\')) => value.push(c),
                    _ => return Err(self.error("invalid escape sequence")),
                },
                Some(c) => value.push(c),
            }
        }
    }
}
