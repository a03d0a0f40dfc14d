pub mod dispatch;
pub mod predicate;

pub use dispatch::{select_indexers, split_meta_data};
pub use predicate::{IndexerKey, Predicate};
pub use vast_value::{
    has_continuous, has_historical, has_unified, QueryOptions, CONTINUOUS, HISTORICAL, UNIFIED,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_option_algebra() {
        assert!(has_unified(UNIFIED));
        assert_eq!(HISTORICAL | CONTINUOUS, UNIFIED);
        assert!(has_unified(HISTORICAL | CONTINUOUS) == (has_historical(UNIFIED) && has_continuous(UNIFIED)));
    }
}
