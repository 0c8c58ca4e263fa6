pub mod session;
pub mod user;

pub use session::{LoginRequest, LoginResponse, ValidateSessionResponse};
pub use user::{User, UserType};
