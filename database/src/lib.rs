pub mod gate;
pub mod postgres;


pub use gate::{build_records, persist_snapshot, PersistOutcome};
pub use postgres::{connect_options, PgConnector, PgSnapshotStore};
