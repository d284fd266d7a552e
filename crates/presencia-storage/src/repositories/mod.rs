pub mod session;
pub mod user;

pub use session::{SessionRepository, SqliteSessionRepository};
pub use user::{SqliteUserRepository, UserRepository};
