pub mod event;
pub mod level;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod step;
pub mod world;
