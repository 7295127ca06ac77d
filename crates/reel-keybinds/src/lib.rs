//! # reel-keybinds
//!
//! Key binding configuration for the reel media player.
//!
//! ## Features
//!
//! - Line-preserving reader/writer for the `input.conf` grammar
//! - Last-write-wins conflict resolution with human-readable statuses
//! - A registry merging config-file and extension-contributed bindings,
//!   with substring-filtered views, CRUD, and change notifications
//! - A list diff engine producing minimal remove/insert/move scripts for
//!   incremental table updates
//! - The built-in default binding set

mod binding;
mod conf;
mod diff;
mod error;
mod extension;
mod preset;
mod registry;
mod resolver;

pub use binding::{normalize_key, AnnotatedBinding, Binding, BindingOrigin};
pub use conf::{
    parse_line, render_line, serialize_bindings, ConfAccess, ConfFile, ConfLine, EXTENDED_PREFIX,
    MAX_CONF_LINES,
};
pub use diff::{diff, diff_with_hint, plan_move, select_after_removal, ChangeSet, DiffHint};
pub use error::{LoadError, RegistryError, RegistryResult, SaveError};
pub use extension::{ExtensionBinding, MergeOutcome, RejectedBinding};
pub use preset::{default_bindings, default_conf_text};
pub use registry::{BindingRegistry, BindingsChanged, SharedRegistry};
pub use resolver::{resolve, ResolvedConf};
