#![deny(dead_code)]
#![deny(unused_imports)]

pub mod context;
pub mod data;
pub mod estimate;
pub mod input;
pub mod model;
pub mod schema;
pub mod types;
