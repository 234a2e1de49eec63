//! List projection: the display-ordered view of every crime, and the diff
//! between two such views.
//!
//! Two records are the *same item* when their ids match, and have the *same
//! content* when title, date and solved flag match. Suspect and photo changes
//! are invisible to the list and never produce an update.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crime::Crime;

// ─── Ordering ────────────────────────────────────────────────────────────────

/// How the list is ordered. Every order breaks ties on id, so it is total.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
  #[default]
  NewestFirst,
  OldestFirst,
  /// Case-insensitive by title, newest first among equal titles.
  Title,
}

impl SortOrder {
  fn sort(self, crimes: &mut [Crime]) {
    match self {
      Self::NewestFirst => {
        crimes.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)))
      }
      Self::OldestFirst => {
        crimes.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)))
      }
      Self::Title => crimes.sort_by_cached_key(|c| {
        (c.title.to_lowercase(), std::cmp::Reverse(c.date), c.id)
      }),
    }
  }
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// An ordered snapshot of the record set, ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
  order: SortOrder,
  items: Vec<Crime>,
}

impl Projection {
  /// Sort `crimes` into display order.
  pub fn new(mut crimes: Vec<Crime>, order: SortOrder) -> Self {
    order.sort(&mut crimes);
    Self { order, items: crimes }
  }

  pub fn order(&self) -> SortOrder { self.order }

  pub fn items(&self) -> &[Crime] { &self.items }

  pub fn get(&self, index: usize) -> Option<&Crime> { self.items.get(index) }

  pub fn len(&self) -> usize { self.items.len() }

  /// True when there is nothing to list; the UI shows its empty state.
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Display index of the crime with `id`.
  pub fn position(&self, id: Uuid) -> Option<usize> {
    self.items.iter().position(|c| c.id == id)
  }

  /// The changes that turn `self` into `next`.
  pub fn diff(&self, next: &Projection) -> ListDiff { diff(&self.items, &next.items) }
}

/// Whether `a` and `b` are the same record.
pub fn same_item(a: &Crime, b: &Crime) -> bool { a.id == b.id }

/// Whether `a` and `b` look identical in the list.
pub fn same_content(a: &Crime, b: &Crime) -> bool {
  a.title == b.title && a.date == b.date && a.is_solved == b.is_solved
}

// ─── Diff ────────────────────────────────────────────────────────────────────

/// What happened to an item of the new list relative to the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
  Unchanged,
  /// Same position relative to its neighbours, visible content differs.
  Changed,
  Inserted,
  /// Left the stable order; `from` is its index in the old list.
  Moved { from: usize, changed: bool },
}

/// One item of the new list, in new-list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffItem {
  pub id:    Uuid,
  pub state: ItemState,
}

/// An item of the old list that is absent from the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
  pub id:    Uuid,
  /// Index in the old list.
  pub index: usize,
}

/// A single instruction for an incremental renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
  Remove { index: usize, id: Uuid },
  Insert { index: usize, id: Uuid },
  /// Remove at `from`, then insert at `to` in the shortened list.
  Move { from: usize, to: usize, id: Uuid },
  Update { index: usize, id: Uuid },
}

/// Tally of a [`ListDiff`], handy for status lines and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
  pub inserted: usize,
  pub removed:  usize,
  pub moved:    usize,
  pub changed:  usize,
}

/// The result of diffing two lists of crimes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDiff {
  /// Every item of the new list, in order, with its state.
  pub items:    Vec<DiffItem>,
  /// Items dropped from the old list, in ascending old index.
  pub removals: Vec<Removal>,
}

impl ListDiff {
  /// True when the new list renders exactly like the old one.
  pub fn is_empty(&self) -> bool {
    self.removals.is_empty()
      && self.items.iter().all(|i| i.state == ItemState::Unchanged)
  }

  /// State of the item with `id` in the new list.
  pub fn state_of(&self, id: Uuid) -> Option<ItemState> {
    self.items.iter().find(|i| i.id == id).map(|i| i.state)
  }

  pub fn counts(&self) -> DiffCounts {
    let mut counts = DiffCounts { removed: self.removals.len(), ..Default::default() };
    for item in &self.items {
      match item.state {
        ItemState::Unchanged => {}
        ItemState::Changed => counts.changed += 1,
        ItemState::Inserted => counts.inserted += 1,
        ItemState::Moved { changed, .. } => {
          counts.moved += 1;
          if changed {
            counts.changed += 1;
          }
        }
      }
    }
    counts
  }

  /// Flatten into renderer operations that turn the old list into the new
  /// one when applied in order. Every index refers to the list as it stands
  /// when that op is applied; a move removes at `from`, then inserts at `to`.
  ///
  /// Removals come first, highest index first. Inserts and moves follow in
  /// new-list order, each placing its item right after its new predecessor.
  /// Items on the stable run never move. Updates come last, at final
  /// indices.
  pub fn ops(&self) -> Vec<DiffOp> {
    let mut ops: Vec<DiffOp> = Vec::new();

    let mut working: Vec<Uuid> = self.old_ids();
    for removal in self.removals.iter().rev() {
      working.remove(removal.index);
      ops.push(DiffOp::Remove { index: removal.index, id: removal.id });
    }

    let mut prev: Option<Uuid> = None;
    for item in &self.items {
      let id = item.id;
      let target = match prev {
        Some(p) => position_of(&working, p).map_or(0, |i| i + 1),
        None => 0,
      };
      match item.state {
        ItemState::Unchanged | ItemState::Changed => {}
        ItemState::Inserted => {
          working.insert(target, id);
          ops.push(DiffOp::Insert { index: target, id });
        }
        ItemState::Moved { .. } => {
          if let Some(from) = position_of(&working, id) {
            let to = if from < target { target - 1 } else { target };
            if from != to {
              working.remove(from);
              working.insert(to, id);
              ops.push(DiffOp::Move { from, to, id });
            }
          }
        }
      }
      prev = Some(id);
    }

    for (index, item) in self.items.iter().enumerate() {
      let changed = match item.state {
        ItemState::Changed => true,
        ItemState::Moved { changed, .. } => changed,
        ItemState::Unchanged | ItemState::Inserted => false,
      };
      if changed {
        ops.push(DiffOp::Update { index, id: item.id });
      }
    }
    ops
  }

  /// Rebuild the old list's ids from the surviving items and the removals.
  fn old_ids(&self) -> Vec<Uuid> {
    let mut old: Vec<(usize, Uuid)> = self
      .removals
      .iter()
      .map(|r| (r.index, r.id))
      .collect();

    // Surviving items keep their old relative order: stable ones in
    // new-list order, moved ones at their recorded `from`.
    let stable: Vec<Uuid> = self
      .items
      .iter()
      .filter(|i| matches!(i.state, ItemState::Unchanged | ItemState::Changed))
      .map(|i| i.id)
      .collect();
    for item in &self.items {
      if let ItemState::Moved { from, .. } = item.state {
        old.push((from, item.id));
      }
    }
    old.sort_unstable_by_key(|(index, _)| *index);

    // Stable items fill the gaps left by removals and moves, in order.
    let len = old.len() + stable.len();
    let mut ids = Vec::with_capacity(len);
    let mut fixed = old.into_iter().peekable();
    let mut stable = stable.into_iter();
    for index in 0..len {
      match fixed.peek() {
        Some(&(at, id)) if at == index => {
          ids.push(id);
          fixed.next();
        }
        _ => ids.extend(stable.next()),
      }
    }
    ids
  }
}

fn position_of(ids: &[Uuid], id: Uuid) -> Option<usize> {
  ids.iter().position(|&i| i == id)
}

/// Diff two ordered lists of crimes.
///
/// Items shared by both lists that lie on a longest common subsequence keep
/// their relative order and are never reported as moved; the remaining
/// shared items are moves.
pub fn diff(old: &[Crime], new: &[Crime]) -> ListDiff {
  let old_index: HashMap<Uuid, usize> =
    old.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
  let new_ids: HashSet<Uuid> = new.iter().map(|c| c.id).collect();

  // Old indices of shared items, in new-list order.
  let shared: Vec<usize> =
    new.iter().filter_map(|c| old_index.get(&c.id).copied()).collect();
  let stable = longest_increasing(&shared);

  let mut shared_pos = 0;
  let items = new
    .iter()
    .map(|crime| {
      let state = match old_index.get(&crime.id) {
        None => ItemState::Inserted,
        Some(&from) => {
          let keep = stable[shared_pos];
          shared_pos += 1;
          let changed = !same_content(&old[from], crime);
          match (keep, changed) {
            (true, false) => ItemState::Unchanged,
            (true, true) => ItemState::Changed,
            (false, changed) => ItemState::Moved { from, changed },
          }
        }
      };
      DiffItem { id: crime.id, state }
    })
    .collect();

  let removals = old
    .iter()
    .enumerate()
    .filter(|(_, c)| !new_ids.contains(&c.id))
    .map(|(index, c)| Removal { id: c.id, index })
    .collect();

  ListDiff { items, removals }
}

/// Mark the members of one longest strictly increasing subsequence of `seq`.
fn longest_increasing(seq: &[usize]) -> Vec<bool> {
  // tails[k]: position in `seq` of the smallest tail of an increasing run of
  // length k + 1.
  let mut tails: Vec<usize> = Vec::new();
  let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

  for (i, &value) in seq.iter().enumerate() {
    let k = tails.partition_point(|&t| seq[t] < value);
    if k > 0 {
      prev[i] = Some(tails[k - 1]);
    }
    if k == tails.len() {
      tails.push(i);
    } else {
      tails[k] = i;
    }
  }

  let mut keep = vec![false; seq.len()];
  let mut cursor = tails.last().copied();
  while let Some(i) = cursor {
    keep[i] = true;
    cursor = prev[i];
  }
  keep
}
