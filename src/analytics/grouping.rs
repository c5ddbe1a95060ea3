use crate::analytics::primitives::mean_of_present;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean of one sales column within a group of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean<K> {
    /// Group key (month number, hour, day type, ...)
    pub key: K,
    /// Mean over the non-null values, `None` if every value in the group was null
    pub mean: Option<f64>,
    /// Number of rows in the group, nulls included
    pub rows: usize,
}

/// Groups `(key, value)` pairs and averages the present values per key.
///
/// Groups come back in ascending key order. A key only forms a group if at
/// least one row carries it.
pub fn group_means<K, I>(pairs: I) -> Vec<GroupMean<K>>
where
    K: Ord,
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    let mut groups: BTreeMap<K, Vec<Option<f64>>> = BTreeMap::new();
    for (key, value) in pairs {
        groups.entry(key).or_default().push(value);
    }

    groups
        .into_iter()
        .map(|(key, values)| GroupMean {
            key,
            rows: values.len(),
            mean: mean_of_present(values),
        })
        .collect()
}
