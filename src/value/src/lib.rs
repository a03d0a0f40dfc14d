pub mod bitmap;
pub mod event;
pub mod offset;
pub mod predicate;
pub mod query_options;
pub mod ty;
pub mod value;

pub use bitmap::Bitmap;
pub use event::{Event, INVALID_ID, MAX_EVENTS};
pub use offset::Offset;
pub use predicate::{CurriedPredicate, Op};
pub use query_options::{has_continuous, has_historical, has_unified, QueryOptions, CONTINUOUS, HISTORICAL, UNIFIED};
pub use ty::Type;
pub use value::{Tag, Value, TAG_ORDER};
