pub mod admin;
pub mod auth;
pub mod blogs;
pub mod contact;
pub mod events;
pub mod media;
pub mod members;
pub mod newsletter;
pub mod projects;
pub mod registrations;
pub mod root;
pub mod workshops;
