//! Database models.

pub mod ad;
pub mod quiz;
pub mod user;
pub mod withdraw;

pub use ad::Ad;
pub use quiz::Quiz;
pub use user::{PointEntry, PointKind, UserAccount, HISTORY_LIMIT};
pub use withdraw::{WithdrawRequest, WithdrawStatus};
