pub mod update_aggregation;
pub(crate) mod update_lifecycle;
