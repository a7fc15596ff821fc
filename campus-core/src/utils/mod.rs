pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, verify_password_dummy, Password, PasswordHashString};
pub use token::generate_opaque_token;
