pub mod health;
pub mod jobs;
pub mod members;
pub mod ranks;
