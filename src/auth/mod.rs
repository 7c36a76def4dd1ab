pub mod middleware;
pub mod password;
pub mod permissions;
pub mod session;
