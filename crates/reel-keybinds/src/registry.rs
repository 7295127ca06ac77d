//! The merged registry of active key bindings.
//!
//! One registry instance owns the conf file, the resolver output for it,
//! and the extension-contributed rows, and is the only place bindings are
//! mutated. Concurrent callers go through [`SharedRegistry`].

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::binding::{AnnotatedBinding, Binding, BindingOrigin};
use crate::conf::{ConfAccess, ConfFile};
use crate::diff::{self, ChangeSet, DiffHint};
use crate::error::{LoadError, RegistryResult};
use crate::extension::{ExtensionBinding, MergeOutcome, RejectedBinding};
use crate::resolver;

/// Payload delivered to subscribers after every successful mutation.
#[derive(Debug, Clone)]
pub struct BindingsChanged {
    /// What changed relative to the previously published visible list.
    pub change: ChangeSet,
    /// The visible list after the change.
    pub visible: Vec<AnnotatedBinding>,
}

/// Owner of all binding state. Mutations persist the conf-file subset to
/// disk before committing, re-run conflict resolution, and notify
/// subscribers with an incremental change.
pub struct BindingRegistry {
    conf: ConfFile,
    /// Resolver output for the conf-file bindings, in file order.
    config_rows: Vec<AnnotatedBinding>,
    /// Accepted extension rows, in admission order.
    extension_rows: Vec<AnnotatedBinding>,
    filter: String,
    visible: Vec<AnnotatedBinding>,
    subscribers: Vec<Sender<BindingsChanged>>,
}

impl BindingRegistry {
    /// Build a registry over a loaded conf file.
    pub fn new(conf: ConfFile) -> Self {
        let resolved = resolver::resolve(conf.bindings());
        let mut registry = Self {
            conf,
            config_rows: resolved.annotated,
            extension_rows: Vec::new(),
            filter: String::new(),
            visible: Vec::new(),
            subscribers: Vec::new(),
        };
        registry.visible = registry.derive_visible();
        debug!(
            path = %registry.conf.path().display(),
            rows = registry.config_rows.len(),
            "binding registry ready"
        );
        registry
    }

    /// Load a conf file from disk and build a registry over it.
    pub fn open(path: impl Into<PathBuf>, access: ConfAccess) -> Result<Self, LoadError> {
        Ok(Self::new(ConfFile::load(path, access)?))
    }

    pub fn conf_path(&self) -> &Path {
        self.conf.path()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// The rows currently visible under the active filter: extension rows
    /// first, then conf-file rows in file order.
    pub fn visible_rows(&self) -> &[AnnotatedBinding] {
        &self.visible
    }

    pub fn visible_row_count(&self) -> usize {
        self.visible.len()
    }

    pub fn visible_row(&self, index: usize) -> Option<&AnnotatedBinding> {
        self.visible.get(index)
    }

    /// Whether the row at a visible index can be edited: only conf-file
    /// rows with a stable identifier can.
    pub fn is_editable(&self, index: usize) -> bool {
        self.visible
            .get(index)
            .map(|row| row.origin == BindingOrigin::ConfFile && row.id().is_some())
            .unwrap_or(false)
    }

    /// Enabled rows, extension and config alike, cloned out as the
    /// dispatch snapshot.
    pub fn active_bindings(&self) -> Vec<Binding> {
        self.extension_rows
            .iter()
            .chain(&self.config_rows)
            .filter(|row| row.enabled)
            .map(|row| row.binding.clone())
            .collect()
    }

    /// Register a listener. Every successful mutation delivers one
    /// [`BindingsChanged`]; dropped receivers are pruned on the next send.
    pub fn subscribe(&mut self) -> Receiver<BindingsChanged> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Set the case-insensitive substring filter over key and action text.
    /// An empty string clears it.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        let filter = filter.into();
        if filter == self.filter {
            return;
        }
        self.filter = filter;
        self.publish(DiffHint::Edit, None);
    }

    /// Insert bindings into the conf file at a visible position. Any
    /// active filter is cleared first (with its own notification) so the
    /// insertion point is not hidden. Returns the unfiltered index the
    /// first binding landed at.
    pub fn insert_bindings(
        &mut self,
        visible_index: usize,
        after: bool,
        bindings: Vec<Binding>,
    ) -> RegistryResult<usize> {
        let target = self.config_insertion_index(visible_index, after);
        if !self.filter.is_empty() {
            self.filter.clear();
            self.publish(DiffHint::Edit, None);
        }
        if bindings.is_empty() {
            return Ok(self.extension_rows.len() + target);
        }

        let mut incoming = bindings;
        for binding in &mut incoming {
            binding.ensure_stable_id();
        }
        let ids: Vec<u64> = incoming.iter().filter_map(Binding::id).collect();

        let mut config = self.config_bindings();
        config.splice(target..target, incoming);
        self.commit_config(config, Some(&ids))?;
        Ok(self.extension_rows.len() + target)
    }

    /// Remove the rows at these visible indices. Rows that are not
    /// editable are skipped with a log entry, never an error.
    pub fn remove_rows(&mut self, visible_indices: &[usize]) -> RegistryResult<()> {
        let mut ids = Vec::new();
        for &index in visible_indices {
            match self.visible.get(index) {
                Some(row) if row.origin == BindingOrigin::ConfFile => match row.id() {
                    Some(id) => ids.push(id),
                    None => warn!(index, "row has no stable id, skipping removal"),
                },
                Some(row) => {
                    warn!(index, source = %row.source_name, "row is not editable, skipping removal");
                }
                None => warn!(index, "no row at visible index, skipping removal"),
            }
        }
        self.remove_bindings(&ids)
    }

    /// Remove the conf-file bindings with these stable identifiers.
    pub fn remove_bindings(&mut self, ids: &[u64]) -> RegistryResult<()> {
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        let config: Vec<Binding> = self
            .config_bindings()
            .into_iter()
            .filter(|b| !b.id().map(|id| wanted.contains(&id)).unwrap_or(false))
            .collect();
        if config.len() == self.config_rows.len() {
            return Ok(());
        }
        self.commit_config(config, None)?;
        Ok(())
    }

    /// Replace the binding at a visible row, keeping the row's identity.
    /// Returns false (logged, nothing changed) when the row is not
    /// editable.
    pub fn update_binding(
        &mut self,
        visible_index: usize,
        new_binding: Binding,
    ) -> RegistryResult<bool> {
        let Some(row) = self.visible.get(visible_index) else {
            warn!(visible_index, "update addressed a row that does not exist");
            return Ok(false);
        };
        if row.origin != BindingOrigin::ConfFile {
            warn!(source = %row.source_name, "extension rows cannot be edited");
            return Ok(false);
        }
        let Some(id) = row.id() else {
            warn!(visible_index, "row has no stable id, cannot be edited");
            return Ok(false);
        };

        let mut config = self.config_bindings();
        let Some(position) = config.iter().position(|b| b.id() == Some(id)) else {
            warn!(id, "row vanished from the conf file, cannot be edited");
            return Ok(false);
        };
        let mut replacement = new_binding;
        replacement.inherit_id(&config[position]);
        config[position] = replacement;
        self.commit_config(config, Some(&[id]))?;
        Ok(true)
    }

    /// Move the conf-file bindings with these identifiers to sit together
    /// at the given visible position. The reorder is planned in a single
    /// left-to-right pass over the conf-file list.
    pub fn move_bindings(
        &mut self,
        ids: &[u64],
        visible_index: usize,
        after: bool,
    ) -> RegistryResult<()> {
        let config = self.config_bindings();
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        let moved: Vec<usize> = config
            .iter()
            .enumerate()
            .filter(|(_, b)| b.id().map(|id| wanted.contains(&id)).unwrap_or(false))
            .map(|(index, _)| index)
            .collect();
        if moved.is_empty() {
            warn!("none of the rows to move are editable conf-file rows");
            return Ok(());
        }

        let target = self.config_insertion_index(visible_index, after);
        let (reordered, pairs) = diff::plan_move(&config, &moved, target);
        debug!(?pairs, "planned binding move");
        self.commit_config(reordered, Some(ids))?;
        Ok(())
    }

    /// Merge a batch of extension bindings into the registry.
    ///
    /// A binding is rejected when its normalized key is already claimed by
    /// an enabled, non-`ignore` conf-file binding, or by a previously
    /// accepted extension row. Rejections are returned, not raised.
    pub fn merge_extension_bindings(&mut self, batch: Vec<ExtensionBinding>) -> MergeOutcome {
        let config_claimed = self.config_claims();
        let mut extension_claimed: HashSet<String> = self
            .extension_rows
            .iter()
            .map(|row| row.binding.normalized_key())
            .collect();

        let mut outcome = MergeOutcome::default();
        for submitted in batch {
            let binding = submitted.to_binding();
            let key = binding.normalized_key();
            if config_claimed.contains(&key) {
                warn!(key = %key, extension = %submitted.extension_id, "extension binding rejected: key bound in conf file");
                outcome.rejected.push(RejectedBinding {
                    reason: format!("key {key} is already bound in the configuration file"),
                    submitted,
                });
            } else if extension_claimed.contains(&key) {
                warn!(key = %key, extension = %submitted.extension_id, "extension binding rejected: key taken by another extension");
                outcome.rejected.push(RejectedBinding {
                    reason: format!("key {key} is already taken by another extension"),
                    submitted,
                });
            } else {
                extension_claimed.insert(key);
                self.extension_rows.push(AnnotatedBinding::from_extension(
                    binding,
                    submitted.extension_id.clone(),
                    submitted.show_in_menu,
                ));
                outcome.accepted += 1;
            }
        }

        if outcome.accepted > 0 {
            self.publish(DiffHint::Edit, None);
        }
        outcome
    }

    /// Drop every row contributed by one extension.
    pub fn retract_extension(&mut self, extension_id: &str) {
        let before = self.extension_rows.len();
        self.extension_rows.retain(|row| row.source_name != extension_id);
        let removed = before - self.extension_rows.len();
        if removed > 0 {
            debug!(extension_id, removed, "retracted extension bindings");
            self.publish(DiffHint::Edit, None);
        }
    }

    /// Re-read the conf file and rebuild everything. Extension rows whose
    /// key the new file claims are disabled and reported.
    pub fn reload(&mut self) -> Result<Vec<RejectedBinding>, LoadError> {
        let conf = ConfFile::load(self.conf.path(), self.conf.access())?;
        self.conf = conf;
        let resolved = resolver::resolve(self.conf.bindings());
        self.config_rows = resolved.annotated;
        let inactive = self.revalidate_extensions();
        self.publish(DiffHint::Edit, None);
        Ok(inactive)
    }

    fn config_bindings(&self) -> Vec<Binding> {
        self.config_rows.iter().map(|row| row.binding.clone()).collect()
    }

    /// Normalized keys claimed by enabled, non-`ignore` conf-file rows.
    fn config_claims(&self) -> HashSet<String> {
        self.config_rows
            .iter()
            .filter(|row| row.enabled && !row.binding.is_ignored())
            .map(|row| row.binding.normalized_key())
            .collect()
    }

    /// Translate a visible index into an insertion point in the conf-file
    /// binding list. The anchor is the stable identifier of the addressed
    /// row; a row without one falls back to the end of the list.
    fn config_insertion_index(&self, visible_index: usize, after: bool) -> usize {
        let merged_len = self.extension_rows.len() + self.config_rows.len();
        let merged = match self.visible.get(visible_index) {
            Some(row) => match row.id().and_then(|id| self.merged_position(id)) {
                Some(position) => position + usize::from(after),
                None => {
                    warn!(visible_index, "row has no stable id, inserting at the end");
                    merged_len
                }
            },
            None => merged_len,
        };
        merged
            .saturating_sub(self.extension_rows.len())
            .min(self.config_rows.len())
    }

    fn merged_position(&self, id: u64) -> Option<usize> {
        self.extension_rows
            .iter()
            .chain(&self.config_rows)
            .position(|row| row.id() == Some(id))
    }

    /// Persist a new conf-file binding list, then commit it: re-resolve,
    /// re-validate extension rows, and publish one change. A save failure
    /// aborts with every piece of state untouched.
    fn commit_config(&mut self, bindings: Vec<Binding>, select_ids: Option<&[u64]>) -> RegistryResult<()> {
        self.conf.overwrite_bindings(&bindings)?;
        let resolved = resolver::resolve(self.conf.bindings());
        self.config_rows = resolved.annotated;
        self.revalidate_extensions();
        self.publish(DiffHint::Edit, select_ids);
        Ok(())
    }

    /// Toggle extension rows against the current conf-file claims. Rows
    /// are never dropped once admitted, only disabled while the file holds
    /// their key.
    fn revalidate_extensions(&mut self) -> Vec<RejectedBinding> {
        let claimed = self.config_claims();
        let mut inactive = Vec::new();
        for row in &mut self.extension_rows {
            if claimed.contains(&row.binding.normalized_key()) {
                if row.enabled {
                    warn!(
                        key = %row.binding.raw_key,
                        extension = %row.source_name,
                        "extension binding lost its key to the conf file"
                    );
                }
                row.enabled = false;
                row.status = Some("key is claimed by the configuration file".to_string());
                inactive.push(RejectedBinding::from_row(row));
            } else {
                row.enabled = true;
                row.status = None;
            }
        }
        inactive
    }

    fn derive_visible(&self) -> Vec<AnnotatedBinding> {
        let merged = self.extension_rows.iter().chain(&self.config_rows);
        if self.filter.is_empty() {
            return merged.cloned().collect();
        }
        let needle = self.filter.to_lowercase();
        merged
            .filter(|row| {
                row.binding.raw_key.to_lowercase().contains(&needle)
                    || row.binding.action_text().to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Recompute the visible list, diff it against the previous snapshot,
    /// and notify subscribers. When `select_ids` is given, the selection
    /// is overridden to those rows' new visible positions.
    fn publish(&mut self, hint: DiffHint, select_ids: Option<&[u64]>) {
        let new_visible = self.derive_visible();
        let mut change = diff::diff_with_hint(&self.visible, &new_visible, hint);
        if let Some(ids) = select_ids {
            let wanted: HashSet<u64> = ids.iter().copied().collect();
            let selection: BTreeSet<usize> = new_visible
                .iter()
                .enumerate()
                .filter(|(_, row)| row.id().map(|id| wanted.contains(&id)).unwrap_or(false))
                .map(|(index, _)| index)
                .collect();
            if !selection.is_empty() {
                change.selection_after = Some(selection);
            }
        }
        self.visible = new_visible;
        let payload = BindingsChanged {
            change,
            visible: self.visible.clone(),
        };
        self.subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
    }
}

/// Cloneable handle to the single registry instance. All mutation goes
/// through the one mutex, so operations run to completion in order.
#[derive(Clone)]
pub struct SharedRegistry(Arc<Mutex<BindingRegistry>>);

impl SharedRegistry {
    pub fn new(registry: BindingRegistry) -> Self {
        Self(Arc::new(Mutex::new(registry)))
    }

    /// Lock the registry. A poisoned lock is recovered: registry state is
    /// only ever replaced whole, never left half-written.
    pub fn lock(&self) -> MutexGuard<'_, BindingRegistry> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ext(id: &str, key: &str, action: &str) -> ExtensionBinding {
        ExtensionBinding {
            extension_id: id.to_string(),
            key: key.to_string(),
            action: action.to_string(),
            show_in_menu: false,
            description: None,
        }
    }

    fn registry(text: &str) -> BindingRegistry {
        BindingRegistry::new(
            ConfFile::from_text("test.conf", text, ConfAccess::ReadOnly).unwrap(),
        )
    }

    fn registry_on_disk(dir: &TempDir, text: &str) -> BindingRegistry {
        let path = dir.path().join("input.conf");
        std::fs::write(&path, text).unwrap();
        BindingRegistry::open(&path, ConfAccess::ReadWrite).unwrap()
    }

    fn keys(rows: &[AnnotatedBinding]) -> Vec<&str> {
        rows.iter().map(|row| row.binding.raw_key.as_str()).collect()
    }

    #[test]
    fn test_visible_puts_extension_rows_first() {
        let mut reg = registry("a up\nb down\n");
        reg.merge_extension_bindings(vec![ext("pl", "x", "shuffle")]);
        assert_eq!(keys(reg.visible_rows()), vec!["x", "a", "b"]);
        assert_eq!(reg.visible_rows()[0].origin, BindingOrigin::Extension);
        assert_eq!(reg.visible_rows()[0].source_name, "pl");
    }

    #[test]
    fn test_merge_precedence() {
        let mut reg = registry("a up\nb ignore\nc {venc} x\n");
        let outcome = reg.merge_extension_bindings(vec![
            ext("pl", "a", "shuffle"),
            ext("pl", "b", "next"),
            ext("pl", "c", "prev"),
            ext("pl", "d", "stop"),
            ext("other", "d", "start"),
        ]);

        // "a" is claimed; "b" is ignore so it does not claim; "c" is a
        // disabled row (unsupported section) so it does not claim either;
        // the second "d" loses to the first within the extension set.
        assert_eq!(outcome.accepted, 3);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.rejected[0].submitted.key, "a");
        assert!(outcome.rejected[0].reason.contains("configuration file"));
        assert_eq!(outcome.rejected[1].submitted.key, "d");
        assert!(outcome.rejected[1].reason.contains("another extension"));
    }

    #[test]
    fn test_filter_is_case_insensitive_over_key_and_action() {
        let mut reg = registry("UP seek 5\nDOWN seek -5\nq quit\n");
        reg.set_filter("SEEK");
        assert_eq!(keys(reg.visible_rows()), vec!["UP", "DOWN"]);
        reg.set_filter("down");
        assert_eq!(keys(reg.visible_rows()), vec!["DOWN"]);
        reg.set_filter("");
        assert_eq!(reg.visible_row_count(), 3);
    }

    #[test]
    fn test_is_editable() {
        let mut reg = registry("a up\n");
        reg.merge_extension_bindings(vec![ext("pl", "x", "shuffle")]);
        assert!(!reg.is_editable(0));
        assert!(reg.is_editable(1));
        assert!(!reg.is_editable(9));
    }

    #[test]
    fn test_insert_at_visible_position() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\nc left\n");

        let landed = reg
            .insert_bindings(0, true, vec![Binding::new("b", vec!["down".into()])])
            .unwrap();
        assert_eq!(landed, 1);
        assert_eq!(keys(reg.visible_rows()), vec!["a", "b", "c"]);

        let text = std::fs::read_to_string(reg.conf_path()).unwrap();
        assert!(text.contains("a up\nb down\nc left\n"));
    }

    #[test]
    fn test_insert_under_filter_lands_adjacent_to_anchor() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\nb down\nc left\n");
        let rx = reg.subscribe();

        reg.set_filter("down");
        assert_eq!(reg.visible_row_count(), 1);
        let anchor_id = reg.visible_row(0).unwrap().id();

        let landed = reg
            .insert_bindings(0, true, vec![Binding::new("z", vec!["stop".into()])])
            .unwrap();

        // Filter cleared, and the new row sits right below the anchor.
        assert_eq!(reg.filter(), "");
        assert_eq!(keys(reg.visible_rows()), vec!["a", "b", "z", "c"]);
        assert_eq!(landed, 2);
        assert_eq!(reg.visible_row(1).unwrap().id(), anchor_id);

        // Three notifications: filter on, filter cleared, insert.
        let events: Vec<BindingsChanged> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        let insert = &events[2];
        assert_eq!(insert.change.inserted.len(), 1);
        assert!(insert.change.inserted.contains(&2));
        assert_eq!(
            insert.change.selection_after,
            Some(BTreeSet::from([2]))
        );
    }

    #[test]
    fn test_remove_restores_overridden_binding() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\na down\n");
        assert!(!reg.visible_rows()[0].enabled);

        reg.remove_rows(&[1]).unwrap();
        assert_eq!(reg.visible_row_count(), 1);
        assert!(reg.visible_rows()[0].enabled);
        assert_eq!(reg.visible_rows()[0].status, None);
    }

    #[test]
    fn test_remove_skips_non_editable_rows() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\n");
        reg.merge_extension_bindings(vec![ext("pl", "x", "shuffle")]);

        // Index 0 is the extension row; nothing should change.
        reg.remove_rows(&[0]).unwrap();
        assert_eq!(reg.visible_row_count(), 2);
    }

    #[test]
    fn test_update_keeps_row_identity() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\nb down\n");
        let id = reg.visible_row(0).unwrap().id();

        let updated = reg
            .update_binding(0, Binding::new("a", vec!["seek".into(), "30".into()]))
            .unwrap();
        assert!(updated);
        assert_eq!(reg.visible_row(0).unwrap().id(), id);
        assert_eq!(reg.visible_row(0).unwrap().binding.action_text(), "seek 30");

        let text = std::fs::read_to_string(reg.conf_path()).unwrap();
        assert!(text.contains("a seek 30\n"));
    }

    #[test]
    fn test_update_rejects_extension_row() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\n");
        reg.merge_extension_bindings(vec![ext("pl", "x", "shuffle")]);

        let updated = reg
            .update_binding(0, Binding::new("y", vec!["stop".into()]))
            .unwrap();
        assert!(!updated);
        assert_eq!(reg.visible_rows()[0].binding.raw_key, "x");
    }

    #[test]
    fn test_move_keeps_relative_order() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\nb down\nc left\nd right\n");
        let b = reg.visible_row(1).unwrap().id().unwrap();
        let d = reg.visible_row(3).unwrap().id().unwrap();

        reg.move_bindings(&[b, d], 0, false).unwrap();
        assert_eq!(keys(reg.visible_rows()), vec!["b", "d", "a", "c"]);

        let text = std::fs::read_to_string(reg.conf_path()).unwrap();
        assert!(text.contains("b down\nd right\na up\nc left\n"));
    }

    #[test]
    fn test_move_selection_follows_rows() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\nb down\nc left\n");
        let rx = reg.subscribe();
        let c = reg.visible_row(2).unwrap().id().unwrap();

        reg.move_bindings(&[c], 0, false).unwrap();
        let event = rx.try_iter().last().unwrap();
        assert_eq!(
            event.change.selection_after,
            Some(BTreeSet::from([0]))
        );
        assert_eq!(event.change.moved, vec![(2, 0)]);
    }

    #[test]
    fn test_mutation_on_read_only_conf_aborts() {
        let mut reg = registry("a up\nb down\n");
        let rx = reg.subscribe();

        let err = reg.insert_bindings(0, false, vec![Binding::new("q", vec!["quit".into()])]);
        assert!(err.is_err());
        assert_eq!(reg.visible_row_count(), 2);
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn test_notifications_carry_removal_changeset() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\nb down\nc left\n");
        let rx = reg.subscribe();

        reg.remove_rows(&[1]).unwrap();
        let event = rx.try_iter().last().unwrap();
        assert_eq!(event.change.removed, BTreeSet::from([1]));
        assert!(event.change.inserted.is_empty());
        assert_eq!(event.visible.len(), 2);
        // Removal selection falls on the row that slid into the gap.
        assert_eq!(
            event.change.selection_after,
            Some(BTreeSet::from([1]))
        );
    }

    #[test]
    fn test_active_bindings_drop_disabled_rows() {
        let mut reg = registry("a up\na down\nx {venc} y\n");
        reg.merge_extension_bindings(vec![ext("pl", "z", "shuffle")]);

        let active = reg.active_bindings();
        let keys: Vec<String> = active.iter().map(|b| b.raw_key.clone()).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(active[1].action_text(), "down");
    }

    #[test]
    fn test_conf_edit_disables_conflicting_extension_row() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\n");
        reg.merge_extension_bindings(vec![ext("pl", "x", "shuffle")]);

        reg.insert_bindings(1, true, vec![Binding::new("x", vec!["stop".into()])])
            .unwrap();
        let row = &reg.visible_rows()[0];
        assert_eq!(row.origin, BindingOrigin::Extension);
        assert!(!row.enabled);
        assert_eq!(
            row.status.as_deref(),
            Some("key is claimed by the configuration file")
        );

        // Removing the conflicting line brings the extension row back.
        let stop_id = reg
            .visible_rows()
            .iter()
            .find(|r| r.binding.action_text() == "stop")
            .and_then(|r| r.id())
            .unwrap();
        reg.remove_bindings(&[stop_id]).unwrap();
        assert!(reg.visible_rows()[0].enabled);
    }

    #[test]
    fn test_retract_extension() {
        let mut reg = registry("a up\n");
        reg.merge_extension_bindings(vec![ext("pl", "x", "shuffle"), ext("eq", "y", "boost")]);
        assert_eq!(reg.visible_row_count(), 3);

        reg.retract_extension("pl");
        assert_eq!(keys(reg.visible_rows()), vec!["y", "a"]);
    }

    #[test]
    fn test_reload_picks_up_disk_changes() {
        let dir = TempDir::new().unwrap();
        let mut reg = registry_on_disk(&dir, "a up\n");
        reg.merge_extension_bindings(vec![ext("pl", "x", "shuffle")]);

        std::fs::write(reg.conf_path(), "a up\nx stop\n").unwrap();
        let inactive = reg.reload().unwrap();

        assert_eq!(keys(reg.visible_rows()), vec!["x", "a", "x"]);
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].submitted.key, "x");
        assert!(!reg.visible_rows()[0].enabled);
    }

    #[test]
    fn test_shared_registry_is_cloneable() {
        let shared = SharedRegistry::new(registry("a up\n"));
        let other = shared.clone();
        other.lock().set_filter("up");
        assert_eq!(shared.lock().visible_row_count(), 1);
    }
}
