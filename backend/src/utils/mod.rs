pub mod cookies;
pub mod csv;
pub mod email;
pub mod jwt;
pub mod password;
pub mod time;
pub mod tokens;

pub use jwt::*;
pub use password::*;
pub use time::*;
