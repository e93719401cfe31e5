//! Repository trait definitions for persistence.
//!
//! The storage surface is split into focused traits so that backends and
//! test doubles can be reasoned about per concern.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`account`]: User accounts and the health probe
//! - [`directory`]: Reference data (companies, departments, equipment, work
//!   centers, teams)
//! - [`maintenance`]: Requests, assignment history and work logs
//!
//! # Convenience Trait Bound
//!
//! Services take `&dyn FullRepository` so that one handle reaches every
//! table:
//!
//! ```ignore
//! async fn my_service(repo: &dyn FullRepository) -> RepositoryResult<()> {
//!     let team = repo.get_team(team_id).await?;
//!     let bookings = repo.list_booked_in_window(&window).await?;
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod directory;
pub mod error;
pub mod maintenance;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use account::AccountRepository;
pub use directory::DirectoryRepository;
pub use maintenance::MaintenanceRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all three
/// repository traits.
pub trait FullRepository: AccountRepository + DirectoryRepository + MaintenanceRepository {}

// Blanket implementation: any type implementing all three traits automatically implements FullRepository
impl<T> FullRepository for T where T: AccountRepository + DirectoryRepository + MaintenanceRepository {}
