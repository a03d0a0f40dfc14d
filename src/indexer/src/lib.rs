pub mod address;
pub mod coded;
pub mod double;
pub mod persist;
pub mod scalar;
pub mod stats;
pub mod string;
pub mod subnet;

use std::path::Path;
use std::time::Instant;

use vast_core::errors::Error;
use vast_value::{CurriedPredicate, Tag, Value};

pub use stats::Stats;

/// One indexer per (partition, field-offset) pair, plus the two
/// distinguished per-partition indexers `time` and `name` (spec §4.2).
pub trait Indexer: Send + Sync {
    fn tag(&self) -> Tag;

    /// Number of events ingested so far (the bitmap length).
    fn len(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extracts and records one value per event in the batch. `None`
    /// means the event's type did not contain this indexer's offset;
    /// the indexer must still advance by one position with a 0-bit.
    fn ingest_values(&mut self, values: &[Option<Value>]);

    /// Returns the exact set of matching event ids, or
    /// `Error::UnsupportedOperator` if `predicate.op` isn't defined for
    /// this indexer's value kind.
    fn lookup(&self, predicate: &CurriedPredicate) -> Result<vast_value::Bitmap, Error>;

    fn flush(&self, path: &Path) -> Result<(), Error>;

    fn stats_tracker(&self) -> &stats::StatsTracker;
    fn stats_tracker_mut(&mut self) -> &mut stats::StatsTracker;

    fn stats(&self) -> Stats {
        self.stats_tracker().get()
    }

    /// Times and records one ingest batch, then delegates to
    /// [`Indexer::ingest_values`].
    fn ingest(&mut self, values: &[Option<Value>]) {
        let start = Instant::now();
        let count = values.len() as u64;
        self.ingest_values(values);
        self.stats_tracker_mut().record(count, start.elapsed());
    }
}

/// Loads a persisted indexer of the given tag from `path`, or returns an
/// empty one if the file does not exist yet (first reference to a field
/// that was created but never flushed).
pub fn load_or_create(path: &Path, tag: Tag) -> Result<Box<dyn Indexer>, Error> {
    macro_rules! load_or_new {
        ($ty:ty) => {{
            if path.exists() {
                Box::new(persist::read_json::<$ty>(path)?) as Box<dyn Indexer>
            } else {
                Box::new(<$ty>::new()) as Box<dyn Indexer>
            }
        }};
    }
    Ok(match tag {
        Tag::Bool => load_or_new!(scalar::BoolIndexer),
        Tag::Int64 => load_or_new!(scalar::Int64Indexer),
        Tag::UInt64 => load_or_new!(scalar::UInt64Indexer),
        Tag::Double => load_or_new!(double::DoubleIndexer),
        Tag::Duration => load_or_new!(scalar::DurationIndexer),
        Tag::Time => load_or_new!(scalar::TimeIndexer),
        Tag::String | Tag::Regex => load_or_new!(string::StringIndexer),
        Tag::Address => load_or_new!(address::AddressIndexer),
        Tag::Subnet => load_or_new!(subnet::SubnetIndexer),
        Tag::Port => load_or_new!(scalar::PortIndexer),
        Tag::Record | Tag::Vector | Tag::Set | Tag::Table => {
            // composite tags are never leaves, so no indexer is ever
            // created for them; guarded here purely for exhaustiveness.
            return vast_core::errors::UnsupportedOperatorSnafu {
                op: format!("indexing composite tag {tag:?}"),
            }
            .fail();
        }
    })
}

/// Builds a fresh, empty indexer for a newly-introduced leaf.
pub fn new_for_tag(tag: Tag) -> Box<dyn Indexer> {
    match tag {
        Tag::Bool => Box::new(scalar::BoolIndexer::new()),
        Tag::Int64 => Box::new(scalar::Int64Indexer::new()),
        Tag::UInt64 => Box::new(scalar::UInt64Indexer::new()),
        Tag::Double => Box::new(double::DoubleIndexer::new()),
        Tag::Duration => Box::new(scalar::DurationIndexer::new()),
        Tag::Time => Box::new(scalar::TimeIndexer::new()),
        Tag::String | Tag::Regex => Box::new(string::StringIndexer::new()),
        Tag::Address => Box::new(address::AddressIndexer::new()),
        Tag::Subnet => Box::new(subnet::SubnetIndexer::new()),
        Tag::Port => Box::new(scalar::PortIndexer::new()),
        Tag::Record | Tag::Vector | Tag::Set | Tag::Table => {
            // Falls back to a string indexer over the Debug rendering,
            // so a composite-typed leaf (there are none in valid
            // schemas, since leaves are basic-tag only) never panics.
            Box::new(string::StringIndexer::new())
        }
    }
}
