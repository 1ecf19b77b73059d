//! Property-based tests for record ordering.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::normalize::{parse_timestamp, sort_newest_first};
use super::record::UploadRecord;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

/// Distinct offsets in seconds from the base instant.
fn distinct_offsets() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::hash_set(0i64..100_000_000, 0..40)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Distinct timestamps come back strictly descending.
    #[test]
    fn prop_list_sorted_descending(offsets in distinct_offsets()) {
        let mut records: Vec<UploadRecord> = offsets
            .iter()
            .map(|secs| {
                UploadRecord::new(
                    format!("k-{secs}"),
                    "f.png",
                    "https://cdn/f.png",
                    base() + Duration::seconds(*secs),
                )
            })
            .collect();

        sort_newest_first(&mut records);

        prop_assert_eq!(records.len(), offsets.len());
        for pair in records.windows(2) {
            let newer = parse_timestamp(&pair[0].timestamp).expect("parseable");
            let older = parse_timestamp(&pair[1].timestamp).expect("parseable");
            prop_assert!(newer > older);
        }
    }

    /// Sorting never drops or duplicates records.
    #[test]
    fn prop_sort_is_permutation(offsets in distinct_offsets()) {
        let mut records: Vec<UploadRecord> = offsets
            .iter()
            .map(|secs| {
                UploadRecord::new(format!("k-{secs}"), "f", "u", base() + Duration::seconds(*secs))
            })
            .collect();
        let mut expected: Vec<String> = records.iter().map(|r| r.object_key.clone()).collect();

        sort_newest_first(&mut records);

        let mut actual: Vec<String> = records.iter().map(|r| r.object_key.clone()).collect();
        expected.sort();
        actual.sort();
        prop_assert_eq!(actual, expected);
    }
}
