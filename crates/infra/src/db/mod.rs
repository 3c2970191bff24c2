pub mod comments_repo;
pub mod migrations;
pub mod pool;
pub mod reports_repo;
pub mod store;

pub use comments_repo::CommentsRepoError;
pub use migrations::run_migrations;
pub use pool::{connect_lazy, DbPool, DbPoolError};
pub use reports_repo::ReportsRepoError;
pub use store::PgCommentStore;
