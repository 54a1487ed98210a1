pub mod claims;
pub mod extractors;
pub mod jwt;
pub mod permissions;

pub use extractors::AuthApp;
pub use permissions::{authorize, Permission};
