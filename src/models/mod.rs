pub mod incident;
pub mod user;

pub use incident::*;
pub use user::*;
