//! API handlers module

pub mod admin;
pub mod articles;
pub mod chat;
pub mod health;
