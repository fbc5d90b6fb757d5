pub mod classify;
mod executor;
mod pending;
mod slot;
mod state;

pub use executor::{Payload, QueryExecutor};
pub use pending::PendingQuery;
pub use slot::{QuerySlot, SlotRegistry, Ticket, ABANDONED_MESSAGE, DEFAULT_SLOT_CAPACITY};
pub use state::QueryResult;
