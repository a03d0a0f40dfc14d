pub mod ingestor;
pub mod message;
pub mod orphan;
pub mod receiver;
pub mod state;

pub use ingestor::Ingestor;
pub use message::{ExitReason, IngestorMessage};
pub use receiver::Receiver;
pub use state::IngestorState;
