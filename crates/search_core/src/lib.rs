//! Search request lifecycle: a controller that turns queries into published
//! [`ScreenState`] values, and the repositories it can search against.

pub mod controller;
pub mod error;
pub mod repository;
pub mod state;
pub mod subscription;

pub use controller::{ControllerOptions, ResponseOrdering, SearchController};
pub use error::{ControllerError, RepositoryError};
pub use repository::{
    build_repository, FakeRepository, GitHubRepository, RepositoryConfig, RepositoryKind,
    SearchRepository,
};
pub use state::{ScreenState, FAILURE_FALLBACK_MESSAGE, INCOMPLETE_RESPONSE_MESSAGE};
pub use subscription::StateSubscription;
