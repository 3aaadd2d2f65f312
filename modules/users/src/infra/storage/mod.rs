pub mod schema;
pub mod sqlite_repo;
pub mod update_query;

pub use sqlite_repo::SqliteUsersRepository;
