//! Paths address a location inside a value tree.
//!
//! A path is a sequence of segments, each either a field name (document
//! descent) or an array index (array descent). The canonical text form is
//! `a.b[0].c`; field names that are not plain identifiers are quoted with
//! back-ticks, e.g. `` a.`long "path"` ``.

use std::fmt;
use std::str::FromStr;

use crate::{ValueError, ValueResult};

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Descend into a document field.
    Field(String),
    /// Descend into an array element.
    Index(usize),
}

impl PathSegment {
    pub fn is_field(&self) -> bool {
        matches!(self, PathSegment::Field(_))
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write_field(f, name),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// An ordered sequence of path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// A single-segment path naming one top-level field, used verbatim.
    ///
    /// Unlike [`Path::parse`], dots and brackets in `name` are not
    /// interpreted: `Path::field("a.b")` addresses the field literally
    /// named `a.b`.
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Field(name.into())])
    }

    /// Parse the canonical text form of a path.
    pub fn parse(input: &str) -> ValueResult<Self> {
        PathParser::new(input).parse()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// Returns a new path extended with a field segment.
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Field(name.into()));
        self
    }

    /// Returns a new path extended with an index segment.
    pub fn with_index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write_field(f, name)?;
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_field(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_identifier(name) {
        f.write_str(name)
    } else {
        write!(f, "`{}`", name.replace('`', "``"))
    }
}

struct PathParser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ValueError {
        ValueError::invalid_path(self.input, message)
    }

    fn parse(mut self) -> ValueResult<Path> {
        let mut segments = vec![self.parse_field()?];

        while let Some((_, c)) = self.chars.next() {
            match c {
                '.' => segments.push(self.parse_field()?),
                '[' => segments.push(self.parse_index()?),
                other => return Err(self.error(format!("unexpected character {:?}", other))),
            }
        }

        Ok(Path(segments))
    }

    fn parse_field(&mut self) -> ValueResult<PathSegment> {
        if let Some(&(_, '`')) = self.chars.peek() {
            self.chars.next();
            return self.parse_quoted_field();
        }

        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '.' || c == '[' {
                break;
            }
            name.push(c);
            self.chars.next();
        }

        if name.is_empty() {
            return Err(self.error("empty field name"));
        }
        Ok(PathSegment::Field(name))
    }

    fn parse_quoted_field(&mut self) -> ValueResult<PathSegment> {
        let mut name = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated quoted field")),
                Some((_, '`')) => {
                    // a doubled back-tick is a literal back-tick
                    if let Some(&(_, '`')) = self.chars.peek() {
                        self.chars.next();
                        name.push('`');
                    } else {
                        return Ok(PathSegment::Field(name));
                    }
                }
                Some((_, c)) => name.push(c),
            }
        }
    }

    fn parse_index(&mut self) -> ValueResult<PathSegment> {
        let mut digits = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated array index")),
                Some((_, ']')) => break,
                Some((_, c)) if c.is_ascii_digit() => digits.push(c),
                Some((_, c)) => {
                    return Err(self.error(format!("invalid array index character {:?}", c)))
                }
            }
        }

        digits
            .parse::<usize>()
            .map(PathSegment::Index)
            .map_err(|_| self.error("array index must be a non-negative integer"))
    }
}
