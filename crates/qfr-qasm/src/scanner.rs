//! Token stream over chained input sources.
//!
//! The scanner holds a stack of token buffers: an `include` statement
//! pushes a new source, exhaustion pops it. The standard header
//! `qelib1.inc` never reaches the stack; its declarations are preloaded
//! into the gate store by the parser.

use std::fs;
use std::path::PathBuf;

use crate::error::ParseResult;
use crate::lexer::{tokenize, SpannedToken};

struct Buffer {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

/// A stack of tokenized input sources.
pub struct Scanner {
    stack: Vec<Buffer>,
    include_dir: Option<PathBuf>,
}

impl Scanner {
    /// Create a scanner over a single source buffer. `include_dir` is the
    /// directory include paths are resolved against.
    pub fn new(source: &str, include_dir: Option<PathBuf>) -> ParseResult<Self> {
        let mut scanner = Self {
            stack: vec![],
            include_dir,
        };
        scanner.push_source(source)?;
        Ok(scanner)
    }

    /// Push a raw source buffer onto the stack.
    pub fn push_source(&mut self, source: &str) -> ParseResult<()> {
        let tokens = tokenize(source)?;
        self.stack.push(Buffer { tokens, pos: 0 });
        Ok(())
    }

    /// Push the contents of an included file onto the stack.
    pub fn push_file(&mut self, path: &str) -> ParseResult<()> {
        let resolved = match &self.include_dir {
            Some(dir) => dir.join(path),
            None => PathBuf::from(path),
        };
        tracing::debug!(path, "pushing include file");
        let source = fs::read_to_string(resolved)?;
        self.push_source(&source)
    }

    /// The next token, popping exhausted sources. `None` at the end of the
    /// outermost source.
    pub fn next(&mut self) -> Option<SpannedToken> {
        loop {
            let buffer = self.stack.last_mut()?;
            if buffer.pos < buffer.tokens.len() {
                let token = buffer.tokens[buffer.pos].clone();
                buffer.pos += 1;
                return Some(token);
            }
            self.stack.pop();
        }
    }
}
