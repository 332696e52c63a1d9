use db::{
    DbErr, DbPool, TransactionTrait,
    models::{
        job::{Job, PayoutRecord},
        job_member::JobMember,
    },
};
use thiserror::Error;
use uuid::Uuid;

use super::payout::{PayoutCalculator, PayoutError, PayoutInput, ShareStanding};

#[derive(Debug, Error)]
pub enum JobPaymentError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Job not found")]
    JobNotFound,
    #[error("Job has no members, you must PATCH some to the job before requesting payment")]
    NoMembersAssigned,
    #[error("Job has no total_payment, you must PATCH one to the job before requesting payment")]
    MissingTotalPayment,
    #[error(transparent)]
    Payout(#[from] PayoutError),
}

pub type Result<T> = std::result::Result<T, JobPaymentError>;

/// Runs the payout calculation for a job and stores the outcome.
#[derive(Debug, Clone, Default)]
pub struct JobPaymentService {
    calculator: PayoutCalculator,
}

impl JobPaymentService {
    pub fn new(calculator: PayoutCalculator) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &PayoutCalculator {
        &self.calculator
    }

    /// Recomputes payouts from the current roster and live rank shares. The
    /// job row is locked for the duration and every figure is committed
    /// together.
    pub async fn calculate_payments(&self, pool: &DbPool, job_id: Uuid) -> Result<Job> {
        let tx = pool.begin().await?;

        let job = Job::find_model_for_update(&tx, job_id)
            .await?
            .ok_or(JobPaymentError::JobNotFound)?;
        let roster = JobMember::load_payout_roster(&tx, job.id).await?;
        if roster.is_empty() {
            return Err(JobPaymentError::NoMembersAssigned);
        }
        let total_payment = job
            .total_payment
            .ok_or(JobPaymentError::MissingTotalPayment)?;

        let inputs: Vec<PayoutInput> = roster
            .iter()
            .map(|entry| {
                // Orphaned assignments carry the nil id and a missing rank.
                PayoutInput::new(
                    entry.member_id.unwrap_or_default(),
                    ShareStanding::from_share(entry.share),
                )
            })
            .collect();
        let breakdown = self.calculator.calculate(total_payment, &inputs)?;

        let record = PayoutRecord {
            company_cut_amt: breakdown.company_cut_amt,
            remainder_after_payouts: breakdown.remainder_after_payouts,
            member_pays: roster
                .iter()
                .zip(&breakdown.member_pays)
                .map(|(entry, payout)| (entry.assignment_id, payout.member_pay))
                .collect(),
        };
        Job::apply_payouts(&tx, job.id, &record).await?;

        let updated = Job::find_by_id(&tx, job_id)
            .await?
            .ok_or(JobPaymentError::JobNotFound)?;
        tx.commit().await?;

        tracing::info!(
            job_id = %job_id,
            members = roster.len(),
            total_payment,
            total_paid = breakdown.total_paid,
            remainder_after_payouts = breakdown.remainder_after_payouts,
            "Calculated job payments"
        );
        Ok(updated)
    }
}
