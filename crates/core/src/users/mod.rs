//! Local user records keyed by the identity provider's stable `openId`.

mod functions;
mod traits;
mod types;

pub use functions::{apply_upsert, plan_upsert};
pub use traits::UserRepository;
pub use types::{Role, UpsertPlan, UpsertUser, User};
