//! Property-based tests for the change algebra

use proptest::prelude::*;
use xfcollab::shared::operation::text_items;
use xfcollab::shared::{Change, Transaction};

/// A change of `words.len()` appends at history position `start`
fn typing(start: usize, words: &[String]) -> Change {
    let mut offset = 0;
    let transactions = words
        .iter()
        .map(|word| {
            let tx = Transaction::insertion(offset, text_items(word));
            offset += word.chars().count();
            tx
        })
        .collect();
    Change::from_transactions(start, transactions)
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,4}", 0..8)
}

proptest! {
    #[test]
    fn test_split_and_concat_restore(start in 0..50usize, words in words(), cut in 0..8usize) {
        let change = typing(start, &words);
        let cut = cut.min(change.length());

        let head = change.truncate(cut as isize).unwrap();
        let tail = change.most_recent(start + cut).unwrap();
        prop_assert_eq!(head.end(), tail.start());
        prop_assert_eq!(head.concat(&tail).unwrap(), change);
    }

    #[test]
    fn test_negative_truncate_matches_most_recent(start in 0..50usize, words in words(), keep in 0..8usize) {
        let change = typing(start, &words);
        let keep = keep.min(change.length());

        let tail = change.truncate(-(keep as isize)).unwrap();
        prop_assert_eq!(tail, change.most_recent(change.end() - keep).unwrap());
    }

    #[test]
    fn test_misaligned_concat_fails(start in 0..50usize, words in words(), gap in 1..5usize) {
        let change = typing(start, &words);
        let next = Change::empty(change.end() + gap);
        let err = change.concat(&next).unwrap_err();
        prop_assert!(err.is_misalignment());
    }

    #[test]
    fn test_change_json_round_trip(start in 0..50usize, words in words()) {
        let change = typing(start, &words);
        let json = serde_json::to_string(&change).unwrap();
        let parsed: Change = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&parsed, &change);
        prop_assert_eq!(parsed.apply_to(&[]).unwrap(), text_items(&words.concat()));
    }
}
