//! `bims-auth` — authentication/authorization boundary.
//!
//! Token *signature* handling is delegated to `jsonwebtoken`; claim-window
//! checks and permission policy are deterministic and live here. This crate
//! is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod policy;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use policy::role_permissions;
pub use roles::Role;
