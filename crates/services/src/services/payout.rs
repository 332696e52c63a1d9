//! Job payout arithmetic.
//!
//! A job's total payment is split into the company cut (a configured fraction,
//! kept unrounded) and a payable pool that is divided between the assigned
//! members in proportion to their rank share. Member pay is always rounded
//! down to a whole unit; whatever truncation leaves behind stays with the
//! company as `remainder_after_payouts`.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum PayoutError {
    #[error("Job has no members assigned")]
    NoMembersAssigned,
    #[error("Total payment cannot be negative: {0}")]
    NegativeTotalPayment(i64),
}

/// How a member's current rank participates in the split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShareStanding {
    Valid(f64),
    MissingRank,
    ZeroShare,
}

impl ShareStanding {
    /// Classifies a live rank share. `None` means the member (or its rank)
    /// could not be resolved.
    pub fn from_share(share: Option<f64>) -> Self {
        match share {
            None => ShareStanding::MissingRank,
            Some(share) if !share.is_finite() || share <= 0.0 => ShareStanding::ZeroShare,
            Some(share) => ShareStanding::Valid(share),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            ShareStanding::Valid(share) => *share,
            ShareStanding::MissingRank | ShareStanding::ZeroShare => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutInput {
    pub member_id: Uuid,
    pub standing: ShareStanding,
}

impl PayoutInput {
    pub fn new(member_id: Uuid, standing: ShareStanding) -> Self {
        Self {
            member_id,
            standing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemberPayout {
    pub member_id: Uuid,
    pub member_pay: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutBreakdown {
    pub total_payment: i64,
    pub company_cut_amt: f64,
    pub payable_pool: f64,
    pub total_shares: f64,
    /// `None` when the roster carries no shares at all.
    pub value_per_share: Option<f64>,
    pub total_paid: i64,
    pub remainder_after_payouts: f64,
    /// Same order as the inputs.
    pub member_pays: Vec<MemberPayout>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutCalculator {
    company_cut_fraction: f64,
}

impl Default for PayoutCalculator {
    fn default() -> Self {
        Self::new(config::DEFAULT_COMPANY_CUT)
    }
}

impl PayoutCalculator {
    pub fn new(company_cut_fraction: f64) -> Self {
        Self {
            company_cut_fraction,
        }
    }

    pub fn company_cut_fraction(&self) -> f64 {
        self.company_cut_fraction
    }

    pub fn calculate(
        &self,
        total_payment: i64,
        assignments: &[PayoutInput],
    ) -> Result<PayoutBreakdown, PayoutError> {
        if assignments.is_empty() {
            return Err(PayoutError::NoMembersAssigned);
        }
        if total_payment < 0 {
            return Err(PayoutError::NegativeTotalPayment(total_payment));
        }

        let total = total_payment as f64;
        let company_cut_amt = total * self.company_cut_fraction;
        let payable_pool = total - company_cut_amt;
        tracing::debug!(
            total_payment,
            company_cut_fraction = self.company_cut_fraction,
            company_cut_amt,
            payable_pool,
            "Computed company cut"
        );

        let total_shares: f64 = assignments.iter().map(|a| a.standing.weight()).sum();
        let value_per_share = if total_shares > 0.0 {
            Some(payable_pool / total_shares)
        } else {
            tracing::warn!(
                members = assignments.len(),
                payable_pool,
                "Assigned members hold no shares; every member is paid 0 and the pool is kept as remainder"
            );
            None
        };
        tracing::debug!(total_shares, ?value_per_share, "Computed value per share");

        let member_pays: Vec<MemberPayout> = assignments
            .iter()
            .map(|assignment| MemberPayout {
                member_id: assignment.member_id,
                member_pay: member_pay(assignment.standing, value_per_share),
            })
            .collect();
        let total_paid: i64 = member_pays.iter().map(|p| p.member_pay).sum();
        let remainder_after_payouts = total - company_cut_amt - total_paid as f64;
        tracing::debug!(total_paid, remainder_after_payouts, "Computed member payouts");

        Ok(PayoutBreakdown {
            total_payment,
            company_cut_amt,
            payable_pool,
            total_shares,
            value_per_share,
            total_paid,
            remainder_after_payouts,
            member_pays,
        })
    }
}

fn member_pay(standing: ShareStanding, value_per_share: Option<f64>) -> i64 {
    let (ShareStanding::Valid(share), Some(value_per_share)) = (standing, value_per_share) else {
        return 0;
    };
    // Whole units only; rounding down keeps the sum within the payable pool.
    let raw = share * value_per_share;
    if raw.is_finite() && raw > 0.0 {
        raw.floor() as i64
    } else {
        0
    }
}
