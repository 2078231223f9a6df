pub mod bar;
pub mod news;
pub mod position;
pub mod side;
pub mod snapshot;
pub mod tick;
pub mod transaction;
pub mod value_point;
