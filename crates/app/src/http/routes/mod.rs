pub mod admin;
pub mod api_error;
pub mod comments;
pub mod health;
