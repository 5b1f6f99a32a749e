pub mod classify;
pub mod roles;
pub mod show;
