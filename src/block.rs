//! Request blocks: locating the request under the cursor and breaking it
//! down into method, URL, headers and body.
//!
//! A document holds any number of requests. Each one starts at a request
//! line (`GET http://...`) and runs until the line before the next request
//! line, or the end of the document:
//!
//! ```text
//! POST http://{{HOST}}/users      <- request line
//! content-type: application/json  <- headers, up to the first blank line
//! # comments are ignored anywhere
//!
//! {"name": "{{USER}}"}            <- inline body
//!
//! PUT http://{{HOST}}/users/1
//! <./user.json                    <- body imported from a file
//! ```
//!
//! All line numbers in this module are 1-based, as a cursor would report them.

use crate::error::{Error, Result};
use crate::url;
use crate::vars::{replace_vars, Variables};

use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

const REGEX_PATTERNS_REQUEST_LINE: &str = r"^(GET|POST|PUT|PATCH|DELETE)\b";
const COMMENT_MARKERS: [&str; 2] = ["#", "//"];
const IMPORT_MARKER: char = '<';

static REQUEST_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(REGEX_PATTERNS_REQUEST_LINE).expect("request line pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// Any other token; the transport decides whether to accept it.
    Extension(String),
}

impl Method {
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            other => Method::Extension(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Extension(token) => token,
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BodySource {
    Inline(String),
    File(PathBuf),
}

impl BodySource {
    /// Loads the body in full. Imported files are read at this point, not
    /// while parsing.
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            BodySource::Inline(text) => Ok(text.as_bytes().to_vec()),
            BodySource::File(path) => std::fs::read(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::ImportFileNotFound(path.clone()),
                _ => Error::Io(e),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestBlock {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    body: Option<BodySource>,
    start_line: usize,
    end_line: usize,
}

impl RequestBlock {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&BodySource> {
        self.body.as_ref()
    }
}

#[cfg(test)]
impl RequestBlock {
    pub fn lines(&self) -> (usize, usize) {
        (self.start_line, self.end_line)
    }
}

/// Something odd in the document that did not stop the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

impl Display for ParseWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

#[derive(Debug)]
pub struct ParsedRequest {
    pub block: RequestBlock,
    pub warnings: Vec<ParseWarning>,
}

pub fn is_request_line(line: &str) -> bool {
    REQUEST_LINE.is_match(line)
}

pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m))
}

pub fn is_import_marker(line: &str) -> bool {
    line.starts_with(IMPORT_MARKER)
}

fn line_at<S: AsRef<str>>(lines: &[S], n: usize) -> &str {
    lines[n - 1].as_ref()
}

/// Finds the bounds of the request block containing `cursor_line`.
///
/// The block starts at the nearest request line at or above the cursor and
/// ends right before the next request line, or at the last line.
pub fn locate_block<S: AsRef<str>>(lines: &[S], cursor_line: usize) -> Result<(usize, usize)> {
    if lines.is_empty() {
        return Err(Error::NoRequestFound(cursor_line));
    }
    let cursor = cursor_line.clamp(1, lines.len());

    let start = (1..=cursor)
        .rev()
        .find(|&n| is_request_line(line_at(lines, n)))
        .ok_or(Error::NoRequestFound(cursor))?;

    let end = (start + 1..=lines.len())
        .find(|&n| is_request_line(line_at(lines, n)))
        .map(|n| n - 1)
        .unwrap_or(lines.len());

    Ok((start, end))
}

pub fn first_request_line<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines
        .iter()
        .position(|l| is_request_line(l.as_ref()))
        .map(|i| i + 1)
}

pub struct RequestBlockParser<'a> {
    vars: &'a Variables,
    base_dir: PathBuf,
}

impl<'a> RequestBlockParser<'a> {
    /// `base_dir` is where relative `<file` imports are looked up, normally
    /// the directory holding the document.
    pub fn new(vars: &'a Variables, base_dir: impl Into<PathBuf>) -> Self {
        RequestBlockParser {
            vars,
            base_dir: base_dir.into(),
        }
    }

    pub fn parse<S: AsRef<str>>(&self, lines: &[S], cursor_line: usize) -> Result<ParsedRequest> {
        let (start, end) = locate_block(lines, cursor_line)?;
        tracing::debug!(start, end, "located request block");

        let (method, url) = self.parse_request_line(line_at(lines, start));
        let mut warnings = Vec::new();
        let (headers, body_start) = self.parse_headers(lines, start, end, &mut warnings);
        let body = self.parse_body(lines, body_start, end);

        Ok(ParsedRequest {
            block: RequestBlock {
                method,
                url,
                headers,
                body,
                start_line: start,
                end_line: end,
            },
            warnings,
        })
    }

    pub fn parse_request_line(&self, line: &str) -> (Method, String) {
        let (token, rest) = line.split_once(' ').unwrap_or((line, ""));
        let url = url::encode(&replace_vars(rest.trim(), self.vars));
        (Method::from_token(token.trim()), url)
    }

    /// Collects headers after the request line. Returns them with the line
    /// that ended the header section (`end + 1` when nothing did).
    pub fn parse_headers<S: AsRef<str>>(
        &self,
        lines: &[S],
        start: usize,
        end: usize,
        warnings: &mut Vec<ParseWarning>,
    ) -> (HashMap<String, String>, usize) {
        let mut headers = HashMap::new();

        for n in start + 1..=end {
            let text = line_at(lines, n);
            if is_comment(text) {
                continue;
            }
            if text.trim().is_empty() || is_import_marker(text) || is_request_line(text) {
                return (headers, n);
            }

            match text.split_once(':') {
                Some((key, value)) if !key.trim().is_empty() => {
                    headers.insert(
                        key.trim().to_lowercase(),
                        replace_vars(value.trim(), self.vars),
                    );
                }
                _ => warnings.push(ParseWarning {
                    line: n,
                    message: format!("skipping malformed header '{}'", text.trim()),
                }),
            }
        }

        (headers, end + 1)
    }

    pub fn parse_body<S: AsRef<str>>(
        &self,
        lines: &[S],
        body_start: usize,
        end: usize,
    ) -> Option<BodySource> {
        if body_start > end {
            return None;
        }

        let region: Vec<&str> = (body_start..=end)
            .map(|n| line_at(lines, n))
            .filter(|l| !is_comment(l))
            .collect();

        if let Some(marker) = region.iter().find(|l| is_import_marker(l)) {
            return Some(BodySource::File(self.resolve_import(marker)));
        }

        let body: Vec<String> = region.iter().map(|l| replace_vars(l, self.vars)).collect();
        let first = body.iter().position(|l| !l.trim().is_empty())?;
        let last = body.iter().rposition(|l| !l.trim().is_empty())?;
        Some(BodySource::Inline(body[first..=last].join("\n")))
    }

    fn resolve_import(&self, marker: &str) -> PathBuf {
        let raw = marker.strip_prefix(IMPORT_MARKER).unwrap_or(marker).trim();
        let expanded = shellexpand::tilde(&replace_vars(raw, self.vars)).to_string();
        let path = Path::new(&expanded);

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            let relative: PathBuf = path
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect();
            self.base_dir.join(relative)
        }
    }
}
