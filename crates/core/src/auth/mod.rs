mod error;
mod functions;
mod traits;
mod types;

pub use error::AuthError;
pub use functions::{decode_state, derive_login_method, encode_state, is_non_empty};
pub use traits::{IdentityProvider, Result};
pub use types::{Identity, RawIdentity, SessionPayload, TokenResponse};
