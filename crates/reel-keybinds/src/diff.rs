//! List diffing for incremental table updates.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::hash::Hash;

/// What kind of operation produced the snapshots being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffHint {
    /// An ordinary edit.
    #[default]
    Edit,
    /// Rows are being brought back (an undo-style change); an
    /// insertion-only result selects every inserted row.
    Restore,
}

/// The difference between two list snapshots.
///
/// Application order is strictly remove, then insert, then move, where a
/// move vacates its origin during the removal phase and lands at its
/// destination during the insertion phase. [`ChangeSet::apply`] is the
/// reference implementation of that contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Indices into the old snapshot, ascending.
    pub removed: BTreeSet<usize>,
    /// Indices into the new snapshot, ascending.
    pub inserted: BTreeSet<usize>,
    /// `(old index, new index)` pairs, sorted by destination.
    pub moved: Vec<(usize, usize)>,
    /// Rows the table should select once the change lands (new-snapshot
    /// indices).
    pub selection_after: Option<BTreeSet<usize>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.inserted.is_empty() && self.moved.is_empty()
    }

    /// Apply this change to the snapshot it was computed from.
    ///
    /// Removals (including move origins) are taken out in descending index
    /// order; insertions (including move destinations) then land in
    /// ascending order with values from the new snapshot. For a change
    /// produced by [`diff`] the result equals `new` exactly. Out-of-range
    /// indices are ignored.
    pub fn apply<T: Clone>(&self, old: &[T], new: &[T]) -> Vec<T> {
        let mut out: Vec<T> = old.to_vec();

        let mut removals: Vec<usize> = self
            .removed
            .iter()
            .copied()
            .chain(self.moved.iter().map(|&(from, _)| from))
            .collect();
        removals.sort_unstable();
        removals.dedup();
        for index in removals.into_iter().rev() {
            if index < out.len() {
                out.remove(index);
            }
        }

        let mut insertions: Vec<usize> = self
            .inserted
            .iter()
            .copied()
            .chain(self.moved.iter().map(|&(_, to)| to))
            .collect();
        insertions.sort_unstable();
        insertions.dedup();
        for index in insertions {
            if index <= out.len() && index < new.len() {
                out.insert(index, new[index].clone());
            }
        }
        out
    }
}

/// Diff two snapshots. See [`diff_with_hint`].
pub fn diff<T: Hash + Eq>(old: &[T], new: &[T]) -> ChangeSet {
    diff_with_hint(old, new, DiffHint::Edit)
}

/// Diff two snapshots with a hint about the operation behind the change.
///
/// Myers O(ND) shortest edit script: elements outside the common
/// subsequence classify as removed or inserted, and a value that is both
/// removed and inserted pairs up into a move (first removal to first
/// insertion when a value repeats).
///
/// Selection heuristics:
/// - a removal-only change selects the row now occupying the position
///   after the last removed run, clamped to the last row
/// - an insertion-only change under [`DiffHint::Restore`] selects every
///   inserted row
pub fn diff_with_hint<T: Hash + Eq>(old: &[T], new: &[T], hint: DiffHint) -> ChangeSet {
    let (removed_raw, inserted_raw) = edit_script(old, new);

    // Pair removals and insertions of the same value into moves.
    let mut removed_by_value: HashMap<&T, VecDeque<usize>> = HashMap::new();
    for &index in &removed_raw {
        removed_by_value.entry(&old[index]).or_default().push_back(index);
    }
    let mut moved: Vec<(usize, usize)> = Vec::new();
    let mut inserted: BTreeSet<usize> = BTreeSet::new();
    for &index in &inserted_raw {
        match removed_by_value.get_mut(&new[index]).and_then(VecDeque::pop_front) {
            Some(from) => moved.push((from, index)),
            None => {
                inserted.insert(index);
            }
        }
    }
    let removed: BTreeSet<usize> = removed_by_value.into_values().flatten().collect();

    let selection_after = if inserted.is_empty() && moved.is_empty() && !removed.is_empty() {
        select_after_removal(&removed, new.len())
    } else if hint == DiffHint::Restore
        && removed.is_empty()
        && moved.is_empty()
        && !inserted.is_empty()
    {
        Some(inserted.clone())
    } else {
        None
    };

    ChangeSet {
        removed,
        inserted,
        moved,
        selection_after,
    }
}

/// Myers O(ND) shortest edit script over the two snapshots, as the old
/// indices removed and the new indices inserted.
fn edit_script<T: Eq>(old: &[T], new: &[T]) -> (Vec<usize>, Vec<usize>) {
    let n = old.len();
    let m = new.len();
    if n == 0 {
        return (Vec::new(), (0..m).collect());
    }
    if m == 0 {
        return ((0..n).collect(), Vec::new());
    }

    let max_d = n + m;
    let offset = max_d as isize;
    let mut v = vec![0usize; 2 * max_d + 1];
    let mut trace: Vec<Vec<usize>> = Vec::new();

    'search: for d in 0..=max_d {
        trace.push(v.clone());
        let mut k = -(d as isize);
        while k <= d as isize {
            let ki = (k + offset) as usize;
            let mut x = if k == -(d as isize) || (k != d as isize && v[ki - 1] < v[ki + 1]) {
                v[ki + 1]
            } else {
                v[ki - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            while x < n && y < m && old[x] == new[y] {
                x += 1;
                y += 1;
            }
            v[ki] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    // Walk the trace backwards; every round past d = 0 contributed one edit.
    let mut removed: Vec<usize> = Vec::new();
    let mut inserted: Vec<usize> = Vec::new();
    let mut x = n;
    let mut y = m;
    let mut d = trace.len() - 1;
    while d > 0 {
        let v = &trace[d];
        let k = x as isize - y as isize;
        let prev_k = if k == -(d as isize)
            || (k != d as isize && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = (prev_x as isize - prev_k) as usize;
        if prev_k == k - 1 {
            removed.push(prev_x);
        } else {
            inserted.push(prev_y);
        }
        x = prev_x;
        y = prev_y;
        d -= 1;
    }
    removed.reverse();
    inserted.reverse();
    (removed, inserted)
}

/// Row to select once a removal lands: the one now occupying the position
/// after the last removed run, clamped to the last row. `None` when the
/// list ends up empty.
pub fn select_after_removal(removed: &BTreeSet<usize>, new_len: usize) -> Option<BTreeSet<usize>> {
    if new_len == 0 {
        return None;
    }
    let last = *removed.iter().next_back()?;
    let target = (last + 1 - removed.len()).min(new_len - 1);
    Some(BTreeSet::from([target]))
}

/// Plan a stable reorder: take the rows at `moved` (current indices) out of
/// the list and reinsert them, in their original relative order, at
/// `target` (an insertion point in pre-move coordinates).
///
/// One left-to-right pass classifies each moved row as sitting before or
/// after the target and adjusts the insertion offset accordingly. Returns
/// the new order and one `(from, to)` pair per moved row, sorted by
/// destination.
pub fn plan_move<T: Clone>(
    rows: &[T],
    moved: &[usize],
    target: usize,
) -> (Vec<T>, Vec<(usize, usize)>) {
    let target = target.min(rows.len());
    let mut moved_sorted: Vec<usize> = moved.iter().copied().filter(|&i| i < rows.len()).collect();
    moved_sorted.sort_unstable();
    moved_sorted.dedup();

    let before = moved_sorted.iter().filter(|&&index| index < target).count();
    let adjusted = target - before;

    let mut remaining: Vec<T> = Vec::with_capacity(rows.len() - moved_sorted.len());
    let mut block: Vec<T> = Vec::with_capacity(moved_sorted.len());
    let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(moved_sorted.len());
    let mut next = 0;
    for (index, row) in rows.iter().enumerate() {
        if next < moved_sorted.len() && moved_sorted[next] == index {
            pairs.push((index, adjusted + block.len()));
            block.push(row.clone());
            next += 1;
        } else {
            remaining.push(row.clone());
        }
    }

    let mut out = remaining;
    let tail = out.split_off(adjusted);
    out.extend(block);
    out.extend(tail);
    (out, pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_identical() {
        let empty: [u8; 0] = [];
        assert!(diff(&empty, &empty).is_empty());
        let same = [1, 2, 3];
        let change = diff(&same, &same);
        assert!(change.is_empty());
        assert_eq!(change.selection_after, None);
    }

    #[test]
    fn test_pure_insertion() {
        let change = diff(&["a"], &["a", "b", "c"]);
        assert!(change.removed.is_empty());
        assert!(change.moved.is_empty());
        assert_eq!(change.inserted, BTreeSet::from([1, 2]));
        assert_eq!(change.selection_after, None);
    }

    #[test]
    fn test_restore_hint_selects_inserted() {
        let change = diff_with_hint(&["a"], &["a", "b", "c"], DiffHint::Restore);
        assert_eq!(change.selection_after, Some(BTreeSet::from([1, 2])));
    }

    #[test]
    fn test_removal_selects_row_after_gap() {
        // Removing b and c leaves d at index 1.
        let change = diff(&["a", "b", "c", "d"], &["a", "d"]);
        assert_eq!(change.removed, BTreeSet::from([1, 2]));
        assert_eq!(change.selection_after, Some(BTreeSet::from([1])));
    }

    #[test]
    fn test_removal_selection_clamps_to_end() {
        let change = diff(&["a", "b"], &["a"]);
        assert_eq!(change.selection_after, Some(BTreeSet::from([0])));

        let change = diff(&["a"], &[] as &[&str]);
        assert_eq!(change.selection_after, None);
    }

    #[test]
    fn test_move_pairing() {
        let change = diff(&["a", "b", "c"], &["c", "a", "b"]);
        assert!(change.removed.is_empty());
        assert!(change.inserted.is_empty());
        assert_eq!(change.moved, vec![(2, 0)]);
    }

    #[test]
    fn test_replace_is_remove_plus_insert() {
        let change = diff(&["x"], &["y"]);
        assert_eq!(change.removed, BTreeSet::from([0]));
        assert_eq!(change.inserted, BTreeSet::from([0]));
        assert!(change.moved.is_empty());
        assert_eq!(change.selection_after, None);
    }

    #[test]
    fn test_apply_swap() {
        let old = ["a", "b"];
        let new = ["b", "a"];
        assert_eq!(diff(&old, &new).apply(&old, &new), new);
    }

    #[test]
    fn test_apply_move_across_insertion() {
        let old = ["b", "a"];
        let new = ["a", "x", "b"];
        let change = diff(&old, &new);
        assert_eq!(change.apply(&old, &new), new);
    }

    #[test]
    fn test_apply_with_duplicates() {
        let old = ["a", "b", "a"];
        let new = ["a", "a", "b"];
        assert_eq!(diff(&old, &new).apply(&old, &new), new);
    }

    #[test]
    fn test_plan_move_down() {
        let (order, pairs) = plan_move(&["a", "b", "c"], &[0], 3);
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(pairs, vec![(0, 2)]);
    }

    #[test]
    fn test_plan_move_up() {
        let (order, pairs) = plan_move(&["a", "b", "c"], &[2], 0);
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(pairs, vec![(2, 0)]);
    }

    #[test]
    fn test_plan_move_block_keeps_relative_order() {
        let (order, pairs) = plan_move(&["a", "b", "c", "d"], &[3, 1], 1);
        assert_eq!(order, vec!["a", "b", "d", "c"]);
        assert_eq!(pairs, vec![(1, 1), (3, 2)]);
    }

    #[test]
    fn test_plan_move_clamps_and_filters() {
        let (order, pairs) = plan_move(&["a", "b"], &[0, 9], 99);
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    proptest! {
        #[test]
        fn prop_apply_reconstructs_new(
            old in proptest::collection::vec(0u8..6, 0..12),
            new in proptest::collection::vec(0u8..6, 0..12),
        ) {
            let change = diff(&old, &new);
            prop_assert_eq!(change.apply(&old, &new), new);
        }

        #[test]
        fn prop_plan_move_preserves_rows(
            rows in proptest::collection::vec(0u16..1000, 1..10),
            moved in proptest::collection::vec(0usize..10, 0..4),
            target in 0usize..11,
        ) {
            let (order, _) = plan_move(&rows, &moved, target);
            let mut expected = rows.clone();
            expected.sort_unstable();
            let mut got = order;
            got.sort_unstable();
            prop_assert_eq!(got, expected);
        }
    }
}
