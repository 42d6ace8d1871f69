pub mod artist;
pub mod artist_project;
pub mod client;
pub mod client_artist;
pub mod player;
pub mod player_project;
pub mod project;
pub mod project_type;
pub mod status_type;
pub mod user;
