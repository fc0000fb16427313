pub mod controller;
pub mod guard;
pub mod series;
pub mod types;
