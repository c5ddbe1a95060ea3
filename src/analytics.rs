//! Aggregation primitives shared by the analysis stages.

pub mod grouping;
pub mod primitives;

pub use grouping::{group_means, GroupMean};
pub use primitives::{mean_of_present, sum_of_present};
