pub mod job_payment;
pub mod payout;
