//! Key binding types and key normalization.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where a binding row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingOrigin {
    /// Parsed from the user's input.conf file.
    ConfFile,
    /// Contributed at runtime by an extension.
    Extension,
}

impl fmt::Display for BindingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingOrigin::ConfFile => write!(f, "config"),
            BindingOrigin::Extension => write!(f, "extension"),
        }
    }
}

static NEXT_STABLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_stable_id() -> u64 {
    NEXT_STABLE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A single key-to-action mapping.
///
/// The key token and action tokens are kept exactly as written; the action
/// is opaque text as far as this crate is concerned. Conflict comparisons
/// go through [`Binding::normalized_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    /// Key token exactly as written in the conf file.
    pub raw_key: String,
    /// Action tokens, treated as opaque text.
    pub action: Vec<String>,
    /// Parsed from the `#@reel` extended-command prefix.
    pub extended_command: bool,
    /// Trailing inline comment, without the leading `#`.
    pub comment: Option<String>,
    /// Line index in the originating conf file, if any.
    pub source_line: Option<usize>,
    stable_id: Option<u64>,
}

impl Binding {
    /// Create a binding from a key token and action tokens.
    ///
    /// The binding carries no stable identifier until it is admitted into a
    /// file store or registry.
    pub fn new(raw_key: impl Into<String>, action: Vec<String>) -> Self {
        Self {
            raw_key: raw_key.into(),
            action,
            extended_command: false,
            comment: None,
            source_line: None,
            stable_id: None,
        }
    }

    /// Session-scoped identifier, assigned on admission and never reused.
    pub fn id(&self) -> Option<u64> {
        self.stable_id
    }

    pub(crate) fn ensure_stable_id(&mut self) {
        if self.stable_id.is_none() {
            self.stable_id = Some(next_stable_id());
        }
    }

    /// Take over another binding's identity, for in-place edits that should
    /// keep addressing the same row.
    pub(crate) fn inherit_id(&mut self, from: &Binding) {
        self.stable_id = from.stable_id;
    }

    /// Canonical key form used for conflict comparison.
    ///
    /// Modifier aliases are folded to `Ctrl`/`Alt`/`Shift`/`Meta` in that
    /// order, multi-character key names are uppercased, single characters
    /// keep their case, and `Shift` over an ASCII letter folds into the
    /// uppercase letter. Unrecognized modifier names are lowercased and
    /// sorted after the known ones. A trailing `+` denotes the literal
    /// plus key.
    pub fn normalized_key(&self) -> String {
        normalize_key(&self.raw_key)
    }

    /// Content of a `{section}` marker in the first action token, if any.
    pub fn destination_section(&self) -> Option<&str> {
        let first = self.action.first()?;
        first
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|name| !name.is_empty())
    }

    /// Copy of this binding with the leading `{section}` marker removed.
    ///
    /// Keeps the stable identifier: it is still the same logical row.
    pub fn strip_section_marker(&self) -> Self {
        if self.destination_section().is_none() {
            return self.clone();
        }
        let mut stripped = self.clone();
        stripped.action.remove(0);
        stripped
    }

    /// True for mpv's `ignore` action, which holds a key without doing
    /// anything. Ignored bindings do not block extension contributions.
    pub fn is_ignored(&self) -> bool {
        self.action.len() == 1 && self.action[0] == "ignore"
    }

    /// Action tokens joined back into display text.
    pub fn action_text(&self) -> String {
        self.action.join(" ")
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.raw_key, self.action.join(" "))
    }
}

/// Normalize a raw key token into its canonical conflict-comparison form.
pub fn normalize_key(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    // Split on '+'; a '+' in separator position is the literal plus key.
    let mut segments: Vec<String> = Vec::new();
    let mut cur = String::new();
    for ch in raw.chars() {
        if ch == '+' && !cur.is_empty() {
            segments.push(std::mem::take(&mut cur));
        } else if ch == '+' {
            cur.push('+');
        } else {
            cur.push(ch);
        }
    }
    if !cur.is_empty() {
        segments.push(cur);
    }

    let key = match segments.pop() {
        Some(key) => key,
        None => return String::new(),
    };

    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut meta = false;
    let mut unknown: Vec<String> = Vec::new();
    for part in segments {
        let folded = part.to_ascii_lowercase();
        match folded.as_str() {
            "ctrl" | "control" => ctrl = true,
            "alt" | "option" | "opt" => alt = true,
            "shift" => shift = true,
            "meta" | "cmd" | "command" | "super" | "win" => meta = true,
            _ => unknown.push(folded),
        }
    }
    // Unknown modifiers compare case- and order-insensitively too.
    unknown.sort();
    unknown.dedup();

    let mut key = if key.chars().count() == 1 {
        key
    } else {
        key.to_ascii_uppercase()
    };

    // Shift over a plain letter is just the uppercase letter.
    if shift && key.len() == 1 && key.as_bytes()[0].is_ascii_alphabetic() {
        key = key.to_ascii_uppercase();
        shift = false;
    }

    let mut parts: Vec<String> = Vec::new();
    if ctrl {
        parts.push("Ctrl".to_string());
    }
    if alt {
        parts.push("Alt".to_string());
    }
    if shift {
        parts.push("Shift".to_string());
    }
    if meta {
        parts.push("Meta".to_string());
    }
    parts.extend(unknown);
    parts.push(key);
    parts.join("+")
}

/// A binding decorated with everything the presentation layer needs.
///
/// Rebuilt from scratch on every recompute; only `enabled` and `status`
/// change after construction, when the resolver disables a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotatedBinding {
    pub binding: Binding,
    pub origin: BindingOrigin,
    /// Conf-file section or extension identifier the row belongs to.
    pub source_name: String,
    /// Whether the contributing extension wants the action in a menu.
    pub menu_exposed: bool,
    pub enabled: bool,
    /// Human-readable reason when the row is disabled.
    pub status: Option<String>,
}

impl AnnotatedBinding {
    /// Wrap a conf-file binding, enabled until the resolver says otherwise.
    pub fn from_conf(binding: Binding) -> Self {
        Self {
            binding,
            origin: BindingOrigin::ConfFile,
            source_name: "default".to_string(),
            menu_exposed: false,
            enabled: true,
            status: None,
        }
    }

    /// Wrap an accepted extension binding.
    pub fn from_extension(binding: Binding, source_name: String, menu_exposed: bool) -> Self {
        Self {
            binding,
            origin: BindingOrigin::Extension,
            source_name,
            menu_exposed,
            enabled: true,
            status: None,
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.binding.id()
    }

    pub(crate) fn disable(&mut self, status: impl Into<String>) {
        self.enabled = false;
        self.status = Some(status.into());
    }
}
