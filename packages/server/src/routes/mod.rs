//! Endpoint modules, one per resource, merged into the main router

pub mod assign;
pub mod health;
pub mod members;
pub mod mindmap;
pub mod nodes;
pub mod projects;
pub mod tasks;
