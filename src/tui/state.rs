use thiserror::Error;
use tracing::{debug, info, warn};

use crate::stat::{
    Closet, LedgerError, RunLogEntry, Shoe, ShoeDraft, ShoeId, ShoePatch, ShoeStore, StoreError,
    reindex_selection,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("select a shoe first")]
    NoSelection,

    #[error("shoe has not been saved yet")]
    NotPersisted,

    #[error("no run is being edited")]
    NothingToEdit,
}

/// Everything the tracker knows about the user's shoes, independent of how it
/// is drawn. Reducers below take one of these and hand back the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub closet: Closet,
    pub selected: Option<usize>,
    pub editing_log: Option<usize>,
}

/// The write that has to be acknowledged before `Transition::next` is adopted.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Create { index: usize, shoe: Shoe },
    Update { id: ShoeId, patch: ShoePatch },
    Delete { id: ShoeId },
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub action: &'static str,
    pub next: AppState,
    pub write: Write,
}

#[derive(Debug)]
pub enum Commit {
    Applied {
        state: AppState,
        action: &'static str,
    },
    RolledBack {
        state: AppState,
        failed: Transition,
        error: StoreError,
    },
}

impl AppState {
    pub fn new(closet: Closet) -> Self {
        Self {
            closet,
            selected: None,
            editing_log: None,
        }
    }

    pub fn selected_shoe(&self) -> Option<&Shoe> {
        self.selected.and_then(|i| self.closet.get(i))
    }

    pub fn editing_entry(&self) -> Option<&RunLogEntry> {
        let shoe = self.selected_shoe()?;
        self.editing_log.and_then(|i| shoe.logs.get(i))
    }

    fn selected_parts(&self) -> Result<(usize, &Shoe), ActionError> {
        let index = self.selected.ok_or(ActionError::NoSelection)?;
        let shoe = self.closet.get(index).ok_or(ActionError::NoSelection)?;
        Ok((index, shoe))
    }

    /// Swaps in an updated copy of the selected shoe and builds the matching
    /// mileage write.
    fn with_selected(
        &self,
        action: &'static str,
        updated: Shoe,
        editing_log: Option<usize>,
    ) -> Result<Transition, ActionError> {
        let (index, current) = self.selected_parts()?;
        let id = current.id.ok_or(ActionError::NotPersisted)?;
        let patch = ShoePatch::mileage_of(&updated);
        let closet = self.closet.replace(index, updated)?;
        Ok(Transition {
            action,
            next: AppState {
                closet,
                selected: self.selected,
                editing_log,
            },
            write: Write::Update { id, patch },
        })
    }
}

pub fn select_shoe(state: &AppState, index: usize) -> Result<AppState, ActionError> {
    if index >= state.closet.len() {
        return Err(LedgerError::IndexOutOfRange {
            index,
            len: state.closet.len(),
        }
        .into());
    }
    let editing_log = if state.selected == Some(index) {
        state.editing_log
    } else {
        None
    };
    Ok(AppState {
        closet: state.closet.clone(),
        selected: Some(index),
        editing_log,
    })
}

pub fn clear_selection(state: &AppState) -> AppState {
    AppState {
        closet: state.closet.clone(),
        selected: None,
        editing_log: None,
    }
}

/// Creates a shoe and selects it.
pub fn add_shoe(state: &AppState, draft: ShoeDraft) -> Result<Transition, ActionError> {
    let shoe = Shoe::new(draft)?;
    let (closet, index) = state.closet.push(shoe.clone());
    debug!(index, brand = %shoe.brand, model = %shoe.model, "add shoe");
    Ok(Transition {
        action: "add shoe",
        next: AppState {
            closet,
            selected: Some(index),
            editing_log: None,
        },
        write: Write::Create { index, shoe },
    })
}

pub fn add_miles(state: &AppState, entry: RunLogEntry) -> Result<Transition, ActionError> {
    let (_, shoe) = state.selected_parts()?;
    let updated = shoe.add_run(entry)?;
    debug!(miles = updated.miles, runs = updated.logs.len(), "add miles");
    state.with_selected("add miles", updated, state.editing_log)
}

pub fn begin_edit_log(state: &AppState, index: usize) -> Result<AppState, ActionError> {
    let (_, shoe) = state.selected_parts()?;
    if index >= shoe.logs.len() {
        return Err(LedgerError::IndexOutOfRange {
            index,
            len: shoe.logs.len(),
        }
        .into());
    }
    Ok(AppState {
        editing_log: Some(index),
        ..state.clone()
    })
}

pub fn cancel_edit_log(state: &AppState) -> AppState {
    AppState {
        editing_log: None,
        ..state.clone()
    }
}

pub fn save_log_edit(state: &AppState, entry: RunLogEntry) -> Result<Transition, ActionError> {
    let index = state.editing_log.ok_or(ActionError::NothingToEdit)?;
    let (_, shoe) = state.selected_parts()?;
    let updated = shoe.edit_run(index, entry)?;
    debug!(index, miles = updated.miles, "edit run");
    state.with_selected("edit run", updated, None)
}

pub fn delete_log(state: &AppState, index: usize) -> Result<Transition, ActionError> {
    let (_, shoe) = state.selected_parts()?;
    let updated = shoe.delete_run(index)?;
    debug!(index, miles = updated.miles, "delete run");
    state.with_selected("delete run", updated, reindex_selection(index, state.editing_log))
}

pub fn delete_shoe(state: &AppState, index: usize) -> Result<Transition, ActionError> {
    let id = state.closet.get(index).and_then(|i| i.id);
    let (closet, selected) = state.closet.delete_shoe(index, state.selected)?;
    // the edited run belongs to the selected shoe, so it survives only with it
    let editing_log = selected.and(state.editing_log);
    debug!(index, ?selected, "delete shoe");
    Ok(Transition {
        action: "delete shoe",
        next: AppState {
            closet,
            selected,
            editing_log,
        },
        write: match id {
            Some(id) => Write::Delete { id },
            None => Write::Nothing,
        },
    })
}

/// Replaces the closet with what the store returned, keeping the selection
/// when it still points at a shoe.
pub fn reload(state: &AppState, shoes: Vec<Shoe>) -> AppState {
    for shoe in &shoes {
        if let Err(e) = shoe.check_record() {
            warn!(id = ?shoe.id, error = %e, "loaded record is inconsistent");
        }
    }
    let closet = Closet::new(shoes);
    let selected = state.selected.filter(|i| *i < closet.len());
    let editing_log = match selected.and_then(|i| closet.get(i)) {
        Some(shoe) => state.editing_log.filter(|i| *i < shoe.logs.len()),
        None => None,
    };
    AppState {
        closet,
        selected,
        editing_log,
    }
}

/// Second phase: perform the write and adopt `transition.next` only once the
/// store has acknowledged it. On failure `current` stays the source of truth.
pub async fn commit<S: ShoeStore>(store: &S, current: &AppState, transition: Transition) -> Commit {
    let outcome = match &transition.write {
        Write::Create { index, shoe } => store.create_record(shoe).await.map(|id| {
            let mut next = transition.next.clone();
            if let Some(created) = next.closet.shoes.get_mut(*index) {
                created.id = Some(id);
            }
            next
        }),
        Write::Update { id, patch } => store
            .update_record(*id, patch)
            .await
            .map(|_| transition.next.clone()),
        Write::Delete { id } => store
            .delete_record(*id)
            .await
            .map(|_| transition.next.clone()),
        Write::Nothing => Ok(transition.next.clone()),
    };

    match outcome {
        Ok(state) => {
            info!(action = transition.action, "write acknowledged");
            Commit::Applied {
                state,
                action: transition.action,
            }
        }
        Err(error) => {
            warn!(action = transition.action, %error, "write failed, keeping previous state");
            Commit::RolledBack {
                state: current.clone(),
                failed: transition,
                error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::{ErrorKind, MemoryStore};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn draft(model: &str) -> ShoeDraft {
        ShoeDraft {
            brand: "Asics".into(),
            model: model.into(),
            color: "blue".into(),
            first_run_date: day(1),
            expected_lifecycle: 500.0,
        }
    }

    fn saved(model: &str) -> Shoe {
        let mut shoe = Shoe::new(draft(model)).unwrap();
        shoe.id = Some(Uuid::new_v4());
        shoe
    }

    fn three_shoes() -> AppState {
        AppState::new(Closet::new(vec![saved("a"), saved("b"), saved("c")]))
    }

    struct DownStore;

    impl ShoeStore for DownStore {
        async fn create_record(&self, _: &Shoe) -> Result<ShoeId, StoreError> {
            Err(StoreError::Transport("offline".into()))
        }
        async fn update_record(&self, _: ShoeId, _: &ShoePatch) -> Result<(), StoreError> {
            Err(StoreError::Transport("offline".into()))
        }
        async fn delete_record(&self, _: ShoeId) -> Result<(), StoreError> {
            Err(StoreError::Transport("offline".into()))
        }
        async fn list_records(&self) -> Result<Vec<Shoe>, StoreError> {
            Err(StoreError::Transport("offline".into()))
        }
    }

    #[test]
    fn add_shoe_selects_it() {
        let state = three_shoes();
        let t = add_shoe(&state, draft("d")).unwrap();
        assert_eq!(t.next.selected, Some(3));
        assert!(matches!(t.write, Write::Create { index: 3, .. }));
        assert_eq!(state.closet.len(), 3);
    }

    #[test]
    fn add_miles_needs_a_selection() {
        let state = three_shoes();
        let err = add_miles(&state, RunLogEntry::new(3.0, day(2))).unwrap_err();
        assert_eq!(err, ActionError::NoSelection);
    }

    #[test]
    fn add_miles_rejects_bad_input_without_change() {
        let state = select_shoe(&three_shoes(), 0).unwrap();
        let err = add_miles(&state, RunLogEntry::new(0.0, day(2))).unwrap_err();
        match err {
            ActionError::Ledger(e) => assert_eq!(e.kind(), ErrorKind::InvalidInput),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(state.closet.shoes[0].miles, 0.0);
    }

    #[test]
    fn add_miles_builds_mileage_patch() {
        let state = select_shoe(&three_shoes(), 1).unwrap();
        let t = add_miles(&state, RunLogEntry::new(4.5, day(2))).unwrap();
        let shoe = &t.next.closet.shoes[1];
        assert_eq!(shoe.miles, 4.5);
        match t.write {
            Write::Update { id, patch } => {
                assert_eq!(Some(id), shoe.id);
                assert_eq!(patch.miles, Some(4.5));
                assert_eq!(patch.logs.map(|l| l.len()), Some(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unsaved_shoe_cannot_log_miles() {
        let state = AppState::new(Closet::new(vec![Shoe::new(draft("x")).unwrap()]));
        let state = select_shoe(&state, 0).unwrap();
        let err = add_miles(&state, RunLogEntry::new(1.0, day(2))).unwrap_err();
        assert_eq!(err, ActionError::NotPersisted);
    }

    #[test]
    fn edit_flow_clears_editing() {
        let state = select_shoe(&three_shoes(), 0).unwrap();
        let state = add_miles(&state, RunLogEntry::new(2.0, day(2))).unwrap().next;
        let state = add_miles(&state, RunLogEntry::new(3.0, day(3))).unwrap().next;

        assert_eq!(
            save_log_edit(&state, RunLogEntry::new(1.0, day(2))).unwrap_err(),
            ActionError::NothingToEdit
        );

        let editing = begin_edit_log(&state, 1).unwrap();
        assert_eq!(editing.editing_entry().map(|e| e.miles), Some(3.0));
        let t = save_log_edit(&editing, RunLogEntry::new(6.0, day(3))).unwrap();
        assert_eq!(t.next.editing_log, None);
        assert_eq!(t.next.closet.shoes[0].miles, 8.0);
        assert_eq!(cancel_edit_log(&editing).editing_log, None);
    }

    #[test]
    fn delete_log_reindexes_editing() {
        let mut state = select_shoe(&three_shoes(), 0).unwrap();
        for miles in [1.0, 2.0, 3.0] {
            state = add_miles(&state, RunLogEntry::new(miles, day(4))).unwrap().next;
        }
        let editing = begin_edit_log(&state, 2).unwrap();

        let t = delete_log(&editing, 0).unwrap();
        assert_eq!(t.next.editing_log, Some(1));
        assert_eq!(t.next.closet.shoes[0].miles, 5.0);

        let t = delete_log(&editing, 2).unwrap();
        assert_eq!(t.next.editing_log, None);
    }

    #[test]
    fn delete_shoe_follows_selection_rule() {
        let state = select_shoe(&three_shoes(), 2).unwrap();
        let t = delete_shoe(&state, 1).unwrap();
        assert_eq!(t.next.selected, Some(1));
        assert_eq!(t.next.closet.shoes[1].model, "c");
        assert!(matches!(t.write, Write::Delete { .. }));

        let state = select_shoe(&three_shoes(), 0).unwrap();
        assert_eq!(delete_shoe(&state, 2).unwrap().next.selected, Some(0));
        assert_eq!(delete_shoe(&state, 0).unwrap().next.selected, None);
    }

    #[test]
    fn reload_keeps_valid_selection() {
        let state = select_shoe(&three_shoes(), 2).unwrap();
        let shorter = vec![saved("a")];
        assert_eq!(reload(&state, shorter).selected, None);

        let state = select_shoe(&three_shoes(), 0).unwrap();
        let same = state.closet.shoes.clone();
        assert_eq!(reload(&state, same).selected, Some(0));
    }

    #[tokio::test]
    async fn commit_adopts_acknowledged_state() {
        let store = MemoryStore::new();
        let state = AppState::default();
        let t = add_shoe(&state, draft("new")).unwrap();
        let Commit::Applied { state, .. } = commit(&store, &state, t).await else {
            panic!("memory store should accept");
        };
        let id = state.closet.shoes[0].id.expect("id stamped after create");
        assert_eq!(store.list_records().await.unwrap()[0].id, Some(id));

        let t = add_miles(&state, RunLogEntry::new(7.0, day(5))).unwrap();
        let Commit::Applied { state, .. } = commit(&store, &state, t).await else {
            panic!("memory store should accept");
        };
        assert_eq!(state.closet.shoes[0].miles, 7.0);
        assert_eq!(store.list_records().await.unwrap()[0].miles, 7.0);
    }

    #[tokio::test]
    async fn commit_rolls_back_on_failure() {
        let state = select_shoe(&three_shoes(), 0).unwrap();
        let t = add_miles(&state, RunLogEntry::new(5.0, day(6))).unwrap();
        match commit(&DownStore, &state, t.clone()).await {
            Commit::RolledBack {
                state: kept,
                failed,
                error,
            } => {
                assert_eq!(kept, state);
                assert_eq!(failed, t);
                assert_eq!(error, StoreError::Transport("offline".into()));
            }
            Commit::Applied { .. } => panic!("down store cannot acknowledge"),
        }
    }
}
