pub mod job;
pub mod job_member;
pub mod member;
pub mod rank;
