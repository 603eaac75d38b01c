use crate::block::is_request_line;
use crate::error::{Error, Result};

use std::io::Read;
use std::path::{Path, PathBuf};

/// The text the requests are written in, with where it came from.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<String>,
    origin: Option<PathBuf>,
}

impl Document {
    pub fn from_text(text: &str, origin: Option<PathBuf>) -> Self {
        Document {
            lines: text.lines().map(|l| l.to_string()).collect(),
            origin,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text, Some(path.to_path_buf())))
    }

    /// Reads a document piped into stdin. A terminal is refused rather than
    /// waited on.
    pub fn from_stdin() -> Result<Self> {
        if atty::is(atty::Stream::Stdin) {
            return Err(Error::InvalidArgument(
                "'-' reads the document from stdin, but stdin is a terminal".to_string(),
            ));
        }
        Self::from_reader(&mut std::io::stdin())
    }

    pub fn from_reader(reader: &mut impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::from_text(&text, None))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Directory relative body imports resolve against.
    pub fn base_dir(&self) -> PathBuf {
        let dir = self
            .origin
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty());

        match dir {
            Some(dir) => std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf()),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn request_lines(&self) -> Vec<(usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| is_request_line(l))
            .map(|(i, l)| (i + 1, l.as_str()))
            .collect()
    }
}
