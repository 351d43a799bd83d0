pub mod user_repo;
pub use user_repo::UserRepository;
pub mod application_repo;
pub use application_repo::ApplicationRepository;
