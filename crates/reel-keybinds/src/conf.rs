//! Line-preserving reader/writer for input.conf binding files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::binding::Binding;
use crate::error::{LoadError, SaveError};

/// Comment prefix that marks a player-extended command line.
pub const EXTENDED_PREFIX: &str = "#@reel";

/// Hard cap on conf file length; longer files refuse to load.
pub const MAX_CONF_LINES: usize = 10_000;

/// How a conf file may be used once opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfAccess {
    ReadWrite,
    /// Saving fails with [`SaveError::ReadOnly`].
    ReadOnly,
}

/// One line of a conf file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfLine {
    /// Verbatim file text, written back untouched on save.
    Persisted(String),
    /// An in-memory edit that does not round-trip through the file grammar
    /// yet; skipped on save.
    PendingEdit(Binding),
}

/// Parse one conf line into a binding.
///
/// Grammar:
/// - blank lines and `#` comments yield `None`
/// - lines starting with `#@reel ` parse as extended-command bindings
/// - otherwise `<key> <action tokens...>[#<comment>]`; the first unescaped
///   `#` starts the trailing comment, `\#` is a literal hash
/// - fewer than two fields yield `None` (malformed lines are skipped)
pub fn parse_line(raw: &str) -> Option<Binding> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    let (line, extended) = if let Some(rest) = line.strip_prefix(EXTENDED_PREFIX) {
        if rest.starts_with(|c: char| c.is_whitespace()) {
            (rest.trim_start(), true)
        } else {
            // Some unrelated comment that happens to share the prefix chars.
            return None;
        }
    } else if line.starts_with('#') {
        return None;
    } else {
        (line, false)
    };

    let (content, comment) = split_comment(line);
    let content = content.trim();

    let mut fields = content.splitn(2, char::is_whitespace);
    let key = fields.next()?;
    let rest = fields.next().map(str::trim).unwrap_or("");
    if key.is_empty() || rest.is_empty() {
        return None;
    }

    let action: Vec<String> = rest.split_whitespace().map(String::from).collect();
    let mut binding = Binding::new(key, action);
    binding.extended_command = extended;
    binding.comment = comment;
    Some(binding)
}

/// Render a binding back into conf-line text.
pub fn render_line(binding: &Binding) -> String {
    let mut out = String::new();
    if binding.extended_command {
        out.push_str(EXTENDED_PREFIX);
        out.push(' ');
    }
    out.push_str(&binding.raw_key);
    out.push(' ');
    out.push_str(&binding.action.join(" ").replace('#', "\\#"));
    if let Some(comment) = &binding.comment {
        out.push_str("   #");
        out.push_str(comment);
    }
    out
}

/// Split line content from its trailing comment, honoring `\#` escapes.
fn split_comment(line: &str) -> (String, Option<String>) {
    let mut content = String::new();
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'#') {
            content.push('#');
            chars.next();
        } else if ch == '#' {
            let rest: String = chars.collect();
            return (content, Some(rest.trim().to_string()));
        } else {
            content.push(ch);
        }
    }
    (content, None)
}

fn header_lines() -> Vec<ConfLine> {
    vec![
        ConfLine::Persisted("# Key bindings for reel.".to_string()),
        ConfLine::Persisted("# Edits made inside the player are written back to this file.".to_string()),
        ConfLine::Persisted(String::new()),
    ]
}

/// True when the rendering is one physical line that parses back into the
/// same binding content. A comment with an embedded line break reparses
/// equal (trim only strips the ends) but would split into two file lines
/// on save, so multi-line renderings never pass.
fn round_trips(binding: &Binding, rendered: &str) -> bool {
    if rendered.contains('\n') || rendered.contains('\r') {
        return false;
    }
    match parse_line(rendered) {
        Some(reparsed) => {
            reparsed.raw_key == binding.raw_key
                && reparsed.action == binding.action
                && reparsed.comment == binding.comment
                && reparsed.extended_command == binding.extended_command
        }
        None => false,
    }
}

fn serialize_with_sources(bindings: &[Binding]) -> (Vec<ConfLine>, Vec<Binding>) {
    let mut lines = header_lines();
    let mut parsed = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let mut binding = binding.clone();
        binding.ensure_stable_id();
        let rendered = render_line(&binding);
        if round_trips(&binding, &rendered) {
            binding.source_line = Some(lines.len());
            lines.push(ConfLine::Persisted(rendered));
        } else {
            warn!(binding = %binding, "binding does not round-trip, keeping as pending edit");
            binding.source_line = None;
            lines.push(ConfLine::PendingEdit(binding.clone()));
        }
        parsed.push(binding);
    }
    (lines, parsed)
}

/// Regenerate conf lines for a binding list: a fixed generated header, then
/// one rendered line per binding. Each rendering is re-parsed as a
/// self-check; a binding that fails the round-trip (a key containing
/// whitespace, an empty action, a comment spanning lines) stays in memory
/// as a pending edit.
pub fn serialize_bindings(bindings: &[Binding]) -> Vec<ConfLine> {
    serialize_with_sources(bindings).0
}

/// A loaded conf file: every source line kept verbatim, plus the bindings
/// parsed out of it.
#[derive(Debug, Clone)]
pub struct ConfFile {
    path: PathBuf,
    access: ConfAccess,
    lines: Vec<ConfLine>,
    parsed: Vec<Binding>,
}

impl ConfFile {
    /// Read and parse a conf file from disk.
    pub fn load(path: impl Into<PathBuf>, access: ConfAccess) -> Result<Self, LoadError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Unreadable {
            path: path.clone(),
            source,
        })?;
        Self::from_text(path, &text, access)
    }

    /// Parse conf text that is already in memory. The path is used for
    /// error reporting and a later save.
    pub fn from_text(
        path: impl Into<PathBuf>,
        text: &str,
        access: ConfAccess,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        let mut lines = Vec::new();
        let mut parsed = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            if index >= MAX_CONF_LINES {
                return Err(LoadError::TooManyLines {
                    path,
                    max: MAX_CONF_LINES,
                });
            }
            if let Some(mut binding) = parse_line(raw) {
                binding.source_line = Some(index);
                binding.ensure_stable_id();
                parsed.push(binding);
            }
            lines.push(ConfLine::Persisted(raw.to_string()));
        }
        Ok(Self {
            path,
            access,
            lines,
            parsed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn access(&self) -> ConfAccess {
        self.access
    }

    /// The line list, verbatim text and pending edits alike.
    pub fn lines(&self) -> &[ConfLine] {
        &self.lines
    }

    /// Ordered clones of every binding parsed from this file.
    pub fn bindings(&self) -> Vec<Binding> {
        self.parsed.clone()
    }

    /// Replace the whole line list with a regenerated one for `bindings`,
    /// persisting before the in-memory state is committed. On failure the
    /// store is left exactly as it was.
    pub fn overwrite_bindings(&mut self, bindings: &[Binding]) -> Result<(), SaveError> {
        let (lines, parsed) = serialize_with_sources(bindings);
        let candidate = Self {
            path: self.path.clone(),
            access: self.access,
            lines,
            parsed,
        };
        candidate.save()?;
        *self = candidate;
        Ok(())
    }

    /// Write the persisted lines back to disk, atomically (temp file in the
    /// same directory, then rename). Pending edits are skipped.
    pub fn save(&self) -> Result<(), SaveError> {
        if self.access == ConfAccess::ReadOnly {
            return Err(SaveError::ReadOnly(self.path.clone()));
        }
        let mut text = String::new();
        for line in &self.lines {
            if let ConfLine::Persisted(raw) = line {
                text.push_str(raw);
                text.push('\n');
            }
        }
        let tmp = self.path.with_extension("conf.tmp");
        fs::write(&tmp, text.as_bytes()).map_err(|source| SaveError::Io {
            path: self.path.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| SaveError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}
