pub mod extractor;
pub mod password;
pub mod reset_token;
pub mod session;
