//! Field paths over JSON payloads (`a.b[0].c`, `items["x.y"]`).
//!
//! A small recursive-descent parser turns the text into segments once; the
//! resolver is then a plain typed walk that yields `None` on any mismatch.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let segments = Parser::new(raw).parse()?;
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolve against a payload. A top-level key equal to the raw path text
    /// wins over descent, so `"a.b"` stored verbatim is still reachable.
    pub fn resolve<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        if let Some(v) = root.get(&self.raw) {
            return Some(v);
        }
        let (first, rest) = self.segments.split_first()?;
        let start = match first {
            Segment::Key(k) => root.get(k)?,
            Segment::Index(_) => return None,
        };
        walk(start, rest)
    }
}

fn walk<'a>(mut cur: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    for seg in segments {
        cur = match (seg, cur) {
            (Segment::Key(k), Value::Object(map)) => map.get(k)?,
            (Segment::Index(i), Value::Array(items)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(cur)
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

struct Parser<'a> {
    raw: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            chars: raw.chars().collect(),
            pos: 0,
        }
    }

    fn fail(&self, reason: impl Into<String>) -> Error {
        Error::FieldPath {
            path: self.raw.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn parse(mut self) -> Result<Vec<Segment>> {
        if self.raw.trim().is_empty() {
            return Err(self.fail("empty path"));
        }
        let mut out = Vec::new();
        match self.peek() {
            Some('[') => out.push(self.bracket()?),
            _ => out.push(self.key()?),
        }
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    out.push(self.key()?);
                }
                '[' => out.push(self.bracket()?),
                other => return Err(self.fail(format!("unexpected '{other}' at {}", self.pos))),
            }
        }
        Ok(out)
    }

    fn key(&mut self) -> Result<Segment> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            if c == ']' {
                return Err(self.fail(format!("unbalanced ']' at {}", self.pos)));
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.fail(format!("empty key at {start}")));
        }
        Ok(Segment::Key(self.chars[start..self.pos].iter().collect()))
    }

    fn bracket(&mut self) -> Result<Segment> {
        self.bump(); // '['
        let seg = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == q => break,
                        Some(_) => {}
                        None => return Err(self.fail("unterminated quoted key")),
                    }
                }
                Segment::Key(self.chars[start..self.pos - 1].iter().collect())
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.fail(format!("expected index at {start}")));
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let idx = digits
                    .parse::<usize>()
                    .map_err(|e| self.fail(format!("bad index '{digits}': {e}")))?;
                Segment::Index(idx)
            }
        };
        match self.bump() {
            Some(']') => Ok(seg),
            _ => Err(self.fail("missing ']'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn parses_mixed_segments() {
        let p = FieldPath::parse("a.b[0].c").unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::Key("a".into()),
                Segment::Key("b".into()),
                Segment::Index(0),
                Segment::Key("c".into()),
            ]
        );
    }

    #[test]
    fn parses_quoted_keys() {
        let p = FieldPath::parse(r#"meta["x.y"]['z']"#).unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::Key("meta".into()),
                Segment::Key("x.y".into()),
                Segment::Key("z".into()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", "a..b", "a.", "a[", "a[x]", "a[1", "a]b", "a['x]"] {
            assert!(FieldPath::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn resolves_nested_values() {
        let root = obj(json!({"a": {"b": [{"c": 7}, {"c": 8}]}}));
        let p: FieldPath = "a.b[1].c".parse().unwrap();
        assert_eq!(p.resolve(&root), Some(&json!(8)));
        assert_eq!(FieldPath::parse("a.b[5].c").unwrap().resolve(&root), None);
        assert_eq!(FieldPath::parse("a.b.c").unwrap().resolve(&root), None);
    }

    #[test]
    fn verbatim_key_wins() {
        let root = obj(json!({"a.b": 1, "a": {"b": 2}}));
        assert_eq!(FieldPath::parse("a.b").unwrap().resolve(&root), Some(&json!(1)));
    }
}
