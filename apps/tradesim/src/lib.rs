pub mod bootstrap;
pub mod broadcast;
pub mod tasks;
