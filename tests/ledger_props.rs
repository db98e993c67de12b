//! Property tests for the mileage ledger: whatever sequence of run-log
//! operations is applied, a shoe's miles stay equal to the sum of its log.

use chrono::NaiveDate;
use proptest::prelude::*;

use shoe_ledger::stat::{ErrorKind, RunLogEntry, Shoe, ShoeDraft, reindex_selection};

#[derive(Debug, Clone)]
enum Op {
    Add(f64),
    Edit(usize, f64),
    Delete(usize),
}

fn new_shoe() -> Shoe {
    Shoe::new(ShoeDraft {
        brand: "Nike".into(),
        model: "Pegasus 41".into(),
        color: "red".into(),
        first_run_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        expected_lifecycle: 500.0,
    })
    .unwrap()
}

fn entry(miles: f64) -> RunLogEntry {
    RunLogEntry::new(miles, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
}

fn arb_miles() -> impl Strategy<Value = f64> {
    (1u32..=50_000).prop_map(|m| m as f64 / 100.0)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_miles().prop_map(Op::Add),
        2 => (0usize..12, arb_miles()).prop_map(|(i, m)| Op::Edit(i, m)),
        2 => (0usize..12).prop_map(Op::Delete),
    ]
}

fn apply(shoe: &Shoe, op: &Op) -> Shoe {
    let result = match *op {
        Op::Add(m) => shoe.add_run(entry(m)),
        Op::Edit(i, m) => shoe.edit_run(i, entry(m)),
        Op::Delete(i) => shoe.delete_run(i),
    };
    match result {
        Ok(next) => next,
        Err(e) => {
            assert_eq!(e.kind(), ErrorKind::IndexOutOfRange);
            shoe.clone()
        }
    }
}

proptest! {
    #[test]
    fn miles_track_log_sum(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut shoe = new_shoe();
        for op in &ops {
            let before = shoe.logs.len();
            shoe = apply(&shoe, op);
            let sum: f64 = shoe.logs.iter().map(|e| e.miles).sum();
            prop_assert!((shoe.miles - sum).abs() < 1e-9);
            prop_assert_eq!(shoe.miles, shoe.logged_miles());
            if let Op::Edit(..) = op {
                prop_assert_eq!(shoe.logs.len(), before);
            }
            let pct = shoe.life_remaining_percent().unwrap();
            prop_assert!((0.0..=100.0).contains(&pct));
        }
    }

    #[test]
    fn add_then_delete_is_identity(
        seed in prop::collection::vec(arb_miles(), 0..10),
        extra in arb_miles(),
    ) {
        let mut shoe = new_shoe();
        for m in seed {
            shoe = shoe.add_run(entry(m)).unwrap();
        }
        let grown = shoe.add_run(entry(extra)).unwrap();
        let back = grown.delete_run(grown.logs.len() - 1).unwrap();
        prop_assert_eq!(back.miles, shoe.miles);
        prop_assert_eq!(back.logs, shoe.logs);
    }

    #[test]
    fn non_positive_miles_never_enter(bad in prop_oneof![Just(0.0), -1000.0f64..=0.0]) {
        let shoe = new_shoe().add_run(entry(3.0)).unwrap();
        let err = shoe.add_run(entry(bad)).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = shoe.edit_run(0, entry(bad)).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
        prop_assert_eq!(shoe.miles, 3.0);
    }

    #[test]
    fn selection_follows_its_shoe(len in 1usize..10, deleted in 0usize..10, selected in 0usize..10) {
        prop_assume!(deleted < len && selected < len);
        let ids: Vec<usize> = (0..len).collect();
        let mut remaining = ids.clone();
        remaining.remove(deleted);
        match reindex_selection(deleted, Some(selected)) {
            None => prop_assert_eq!(selected, deleted),
            Some(i) => prop_assert_eq!(remaining[i], ids[selected]),
        }
    }
}
