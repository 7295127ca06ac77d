//! Bindings contributed by extensions at runtime.

use serde::Deserialize;

use crate::binding::{AnnotatedBinding, Binding};

/// A key binding submitted by an extension.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtensionBinding {
    /// Identifier of the contributing extension.
    pub extension_id: String,
    /// Key token, same grammar as the conf file.
    pub key: String,
    /// Action text; split on whitespace like a conf line.
    pub action: String,
    /// Whether the extension wants this action exposed in a menu.
    #[serde(default)]
    pub show_in_menu: bool,
    /// Human-readable description of what the binding does.
    #[serde(default)]
    pub description: Option<String>,
}

impl ExtensionBinding {
    /// Convert into a registry binding, tagged with a fresh stable
    /// identifier on admission. The description doubles as the binding
    /// comment so it shows up in the editor.
    pub(crate) fn to_binding(&self) -> Binding {
        let action = self.action.split_whitespace().map(String::from).collect();
        let mut binding = Binding::new(self.key.clone(), action);
        binding.comment = self.description.clone();
        binding.ensure_stable_id();
        binding
    }
}

/// An extension binding that was turned away, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedBinding {
    pub submitted: ExtensionBinding,
    pub reason: String,
}

impl RejectedBinding {
    pub(crate) fn from_row(row: &AnnotatedBinding) -> Self {
        Self {
            submitted: ExtensionBinding {
                extension_id: row.source_name.clone(),
                key: row.binding.raw_key.clone(),
                action: row.binding.action_text(),
                show_in_menu: row.menu_exposed,
                description: row.binding.comment.clone(),
            },
            reason: row
                .status
                .clone()
                .unwrap_or_else(|| "inactive".to_string()),
        }
    }
}

/// Result of one merge call. Rejections are data for the caller to
/// surface, not errors.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Number of bindings admitted.
    pub accepted: usize,
    /// Bindings turned away, with the reason for each.
    pub rejected: Vec<RejectedBinding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Manifest {
            binding: Vec<ExtensionBinding>,
        }

        let manifest: Manifest = toml::from_str(
            r#"
            [[binding]]
            extension_id = "subtitle-tools"
            key = "Ctrl+e"
            action = "sub-reload"
            show_in_menu = true
            description = "Reload subtitles"

            [[binding]]
            extension_id = "subtitle-tools"
            key = "Ctrl+E"
            action = "sub-remove"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.binding.len(), 2);
        assert_eq!(manifest.binding[0].key, "Ctrl+e");
        assert!(manifest.binding[0].show_in_menu);
        assert!(!manifest.binding[1].show_in_menu);
        assert_eq!(manifest.binding[1].description, None);
    }

    #[test]
    fn test_to_binding_splits_action_and_tags() {
        let ext = ExtensionBinding {
            extension_id: "x".to_string(),
            key: "Ctrl+e".to_string(),
            action: "sub-seek 1".to_string(),
            show_in_menu: false,
            description: Some("next subtitle".to_string()),
        };
        let binding = ext.to_binding();
        assert_eq!(binding.action, vec!["sub-seek".to_string(), "1".to_string()]);
        assert_eq!(binding.comment.as_deref(), Some("next subtitle"));
        assert!(binding.id().is_some());
    }
}
