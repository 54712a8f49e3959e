pub mod auth;
pub mod cookies;
pub mod hosts;
pub mod session;
