// Service exports
pub mod matching;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod repository;

pub use matching::{MatchRun, MatchingService, ServiceError};
pub use memory::InMemoryRepository;
pub use notifier::{LogNotifier, MatchNotifier, NotifyError, WebhookNotifier};
pub use postgres::PostgresRepository;
pub use repository::{MatchRepository, RepositoryError};
