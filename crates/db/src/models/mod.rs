pub mod ids;
pub mod job;
pub mod job_member;
pub mod member;
pub mod rank;
pub mod whole_number;
