pub mod alerts;
pub mod tick_replay;
