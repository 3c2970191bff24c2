pub mod comments;
pub mod events;
pub mod reports;
pub mod settings;
