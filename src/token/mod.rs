mod cache;
mod clock;
mod credential;
mod endpoint;
mod policy;

pub use cache::CredentialCache;
pub use clock::{Clock, SystemClock};
pub use credential::Credential;
pub use endpoint::{ClientCredentials, TokenResponse};
pub use policy::{DEFAULT_REFRESH_BUFFER, RefreshPolicy};
