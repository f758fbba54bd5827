//! Repository module - one data access type per collection.

mod ad_repository;
mod quiz_repository;
mod user_repository;
mod withdraw_repository;

pub use ad_repository::AdRepository;
pub use quiz_repository::QuizRepository;
pub use user_repository::UserRepository;
pub use withdraw_repository::{WithdrawListing, WithdrawRepository};
