pub mod remote;
pub use remote::{decode_row, Filter, PgRemoteDataService, RemoteDataService, Table};
pub mod user_repo;
pub use user_repo::UserRepository;
