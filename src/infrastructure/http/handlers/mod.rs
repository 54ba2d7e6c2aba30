//! HTTP Handlers

pub mod assets;
pub mod books;
pub mod health;
pub mod media;
pub mod tasks;
pub mod translations;
