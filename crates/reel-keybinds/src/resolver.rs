//! Conflict resolution over an ordered conf-file binding list.

use std::collections::HashMap;

use crate::binding::{AnnotatedBinding, Binding};

/// Output of a resolution pass.
#[derive(Debug, Clone)]
pub struct ResolvedConf {
    /// Every surviving input binding in order, annotated for display.
    pub annotated: Vec<AnnotatedBinding>,
    /// The enabled subset, in order, ready to feed key dispatch.
    pub enabled: Vec<Binding>,
}

/// Resolve an ordered binding list into display rows and a dispatch set.
///
/// A single left-to-right pass:
/// 1. mpv's weak-binding start marker (`default-bindings start`) carries no
///    binding semantics here; the row is kept but disabled.
/// 2. A `{default}` destination marker is redundant and stripped; any other
///    destination section disables the row, naming the section.
/// 3. A later enabled binding retroactively disables an earlier one with
///    the same normalized key. Disabled rows never claim a key.
pub fn resolve(bindings: Vec<Binding>) -> ResolvedConf {
    let mut annotated: Vec<AnnotatedBinding> = Vec::with_capacity(bindings.len());
    let mut holder: HashMap<String, usize> = HashMap::new();

    for binding in bindings {
        if is_weak_marker(&binding) {
            let mut row = AnnotatedBinding::from_conf(binding);
            row.disable("weak default bindings are not supported");
            annotated.push(row);
            continue;
        }

        let binding = match binding.destination_section() {
            Some("default") => binding.strip_section_marker(),
            Some(section) => {
                let status = format!("destination section {{{section}}} is not supported");
                let mut row = AnnotatedBinding::from_conf(binding);
                row.disable(status);
                annotated.push(row);
                continue;
            }
            None => binding,
        };

        let index = annotated.len();
        if let Some(previous) = holder.insert(binding.normalized_key(), index) {
            annotated[previous].disable("overridden by a later binding with the same key");
        }
        annotated.push(AnnotatedBinding::from_conf(binding));
    }

    let enabled = annotated
        .iter()
        .filter(|row| row.enabled)
        .map(|row| row.binding.clone())
        .collect();
    ResolvedConf { annotated, enabled }
}

fn is_weak_marker(binding: &Binding) -> bool {
    binding.raw_key == "default-bindings" && binding.action == ["start"]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{parse_line, ConfAccess, ConfFile};

    fn bindings(lines: &[&str]) -> Vec<Binding> {
        lines.iter().filter_map(|l| parse_line(l)).collect()
    }

    #[test]
    fn test_last_write_wins() {
        let resolved = resolve(bindings(&["a up", "b down", "a left"]));
        assert_eq!(resolved.annotated.len(), 3);
        assert!(!resolved.annotated[0].enabled);
        assert_eq!(
            resolved.annotated[0].status.as_deref(),
            Some("overridden by a later binding with the same key")
        );
        assert!(resolved.annotated[1].enabled);
        assert!(resolved.annotated[2].enabled);

        let enabled: Vec<String> = resolved.enabled.iter().map(|b| b.to_string()).collect();
        assert_eq!(enabled, vec!["b down".to_string(), "a left".to_string()]);
    }

    #[test]
    fn test_comment_lines_never_reach_resolution() {
        let store = ConfFile::from_text(
            "t.conf",
            "a up\n# comment\nb down\na left\n",
            ConfAccess::ReadWrite,
        )
        .unwrap();
        let resolved = resolve(store.bindings());
        assert_eq!(resolved.annotated.len(), 3);
        assert_eq!(resolved.enabled.len(), 2);
        assert_eq!(resolved.enabled[0].to_string(), "b down");
        assert_eq!(resolved.enabled[1].to_string(), "a left");
    }

    #[test]
    fn test_weak_marker_disabled() {
        let resolved = resolve(bindings(&["default-bindings start", "a up"]));
        assert!(!resolved.annotated[0].enabled);
        assert_eq!(
            resolved.annotated[0].status.as_deref(),
            Some("weak default bindings are not supported")
        );
        assert_eq!(resolved.enabled.len(), 1);
    }

    #[test]
    fn test_default_section_stripped() {
        let resolved = resolve(bindings(&["q {default} quit"]));
        assert!(resolved.annotated[0].enabled);
        assert_eq!(resolved.annotated[0].binding.action, vec!["quit".to_string()]);
    }

    #[test]
    fn test_other_section_disabled() {
        let resolved = resolve(bindings(&["q {encode} quit", "q quit"]));
        assert!(!resolved.annotated[0].enabled);
        assert_eq!(
            resolved.annotated[0].status.as_deref(),
            Some("destination section {encode} is not supported")
        );
        // The disabled row never claimed the key, so no override status.
        assert!(resolved.annotated[1].enabled);
        assert_eq!(resolved.enabled.len(), 1);
    }

    #[test]
    fn test_equivalent_key_spellings_conflict() {
        let resolved = resolve(bindings(&["ctrl+s screenshot", "Ctrl+S screenshot video"]));
        // Shift folding keeps these distinct: ctrl+s vs Ctrl+S differ only
        // in letter case, which is significant for single characters.
        assert!(resolved.annotated[0].enabled);
        assert!(resolved.annotated[1].enabled);

        let resolved = resolve(bindings(&["ctrl+s screenshot", "control+s screenshot video"]));
        assert!(!resolved.annotated[0].enabled);
        assert!(resolved.annotated[1].enabled);
    }

    #[test]
    fn test_shift_folding_conflicts() {
        let resolved = resolve(bindings(&["Shift+a one", "A two"]));
        assert!(!resolved.annotated[0].enabled);
        assert!(resolved.annotated[1].enabled);
    }
}
