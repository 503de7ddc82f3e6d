pub mod engagement;
pub mod perception;
pub mod pipeline;
pub mod shared;
pub mod video;
