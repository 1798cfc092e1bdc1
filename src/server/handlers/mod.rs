pub mod about;
pub mod health;
pub mod sessions;
