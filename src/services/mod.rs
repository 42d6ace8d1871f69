pub mod artist;
pub mod associations;
pub mod client;
pub mod error;
pub mod player;
pub mod project;
pub mod scope;
pub mod validation;
