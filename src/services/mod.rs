// Service exports
pub mod cache;
pub mod directory;
pub mod dispatcher;
pub mod ledger;
pub mod postgres;
pub mod queries;
pub mod registry;

pub use cache::{CacheError, CacheKey, CacheManager, CachedDirectory};
pub use directory::{DirectoryError, HttpDirectory, InMemoryDirectory, ProfileDirectory};
pub use dispatcher::{DeliveryReport, NotificationDispatcher};
pub use ledger::{InMemoryLedger, InteractionLedger, LedgerError};
pub use postgres::PostgresLedger;
pub use queries::{MatchOrder, MatchQueryService};
pub use registry::{ChannelHandle, ConnectionRegistry, Frame, SendOutcome, Subscription};
