use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{ids, job_member::JobMember, whole_number};
use crate::{
    DEFAULT_RANK_ID,
    entities::{job, job_member, member, rank},
};

pub const MAX_JOB_NAME_LEN: usize = 100;
pub const MAX_JOB_DESCRIPTION_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Job not found")]
    JobNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Member {0} not found")]
    MemberNotFound(Uuid),
    #[error(
        "At least one member {name} ({id}) has DEFAULT rank, you must update them before adding to a job"
    )]
    MemberHasDefaultRank { name: String, id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_name: String,
    pub job_description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub total_payment: Option<i64>,
    pub company_cut_amt: Option<f64>,
    pub remainder_after_payouts: Option<f64>,
    pub members_on_job: Vec<JobMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJob {
    pub job_name: String,
    #[serde(default)]
    pub job_description: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "whole_number::deserialize_optional")]
    pub total_payment: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateJob {
    #[serde(default)]
    pub job_name: Option<String>,
    /// Missing leaves the description alone; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub job_description: Option<Option<String>>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    /// Missing leaves the amount alone; `null` clears it.
    #[serde(default, deserialize_with = "whole_number::deserialize_patch")]
    pub total_payment: Option<Option<i64>>,
    #[serde(default)]
    pub add_members: Vec<Uuid>,
    #[serde(default)]
    pub remove_members: Vec<Uuid>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    pub start_date: Option<NaiveDate>,
}

/// Payout figures ready to be written back, keyed by assignment row.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutRecord {
    pub company_cut_amt: f64,
    pub remainder_after_payouts: f64,
    pub member_pays: Vec<(i64, i64)>,
}

struct Addition {
    member_row: i64,
    rank_name: String,
}

impl Job {
    fn from_model(model: job::Model, members_on_job: Vec<JobMember>) -> Self {
        Self {
            id: model.uuid,
            job_name: model.job_name,
            job_description: model.job_description,
            start_date: model.start_date,
            end_date: model.end_date,
            total_payment: model.total_payment,
            company_cut_amt: model.company_cut_amt,
            remainder_after_payouts: model.remainder_after_payouts,
            members_on_job,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    /// Jobs ordered by start date, most recent first.
    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        filter: &JobFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = job::Entity::find();
        if let Some(start_date) = filter.start_date {
            query = query.filter(job::Column::StartDate.eq(start_date));
        }
        let records = query
            .order_by_desc(job::Column::StartDate)
            .order_by_desc(job::Column::CreatedAt)
            .all(db)
            .await?;

        let job_rows: Vec<i64> = records.iter().map(|record| record.id).collect();
        let mut rosters = JobMember::load_rosters(db, &job_rows).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let roster = rosters.remove(&record.id).unwrap_or_default();
                Self::from_model(record, roster)
            })
            .collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let Some(record) = job::Entity::find()
            .filter(job::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let roster = JobMember::load_roster(db, record.id).await?;
        Ok(Some(Self::from_model(record, roster)))
    }

    /// Loads the job row, holding a row lock on backends that support it.
    pub async fn find_model_for_update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<job::Model>, DbErr> {
        let mut query = job::Entity::find().filter(job::Column::Uuid.eq(id));
        if db.get_database_backend() == DatabaseBackend::Postgres {
            query = query.lock_exclusive();
        }
        query.one(db).await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateJob,
        job_id: Uuid,
    ) -> Result<Self, JobError> {
        validate_name(&data.job_name)?;
        validate_description(data.job_description.as_deref())?;
        validate_total_payment(data.total_payment)?;
        validate_dates(data.start_date, data.end_date)?;

        let now = Utc::now();
        let active = job::ActiveModel {
            uuid: Set(job_id),
            job_name: Set(data.job_name.clone()),
            job_description: Set(data.job_description.clone()),
            start_date: Set(data.start_date),
            end_date: Set(data.end_date),
            total_payment: Set(data.total_payment),
            company_cut_amt: Set(None),
            remainder_after_payouts: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, Vec::new()))
    }

    /// Applies a partial update and roster changes. Everything is validated
    /// before the first write; payouts are cleared when the total payment
    /// changes value or the roster gains or loses a member.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateJob,
    ) -> Result<Self, JobError> {
        let record = job::Entity::find()
            .filter(job::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(JobError::JobNotFound)?;

        if let Some(name) = &data.job_name {
            validate_name(name)?;
        }
        validate_description(data.job_description.as_ref().and_then(|d| d.as_deref()))?;
        if let Some(total_payment) = data.total_payment {
            validate_total_payment(total_payment)?;
        }
        validate_dates(
            data.start_date.unwrap_or(record.start_date),
            data.end_date.unwrap_or(record.end_date),
        )?;

        let adding: BTreeSet<Uuid> = data.add_members.iter().copied().collect();
        if let Some(both) = data.remove_members.iter().find(|id| adding.contains(id)) {
            return Err(JobError::Validation(format!(
                "Member {both} cannot be both added and removed in one update."
            )));
        }

        let current = JobMember::member_rows(db, record.id).await?;
        let additions = resolve_additions(db, &adding, &current).await?;
        let removals = resolve_removals(db, &data.remove_members, &current).await?;

        let total_changed =
            matches!(data.total_payment, Some(total) if total != record.total_payment);
        let roster_changed = !additions.is_empty() || !removals.is_empty();
        let job_row = record.id;

        let mut active: job::ActiveModel = record.into();
        if let Some(name) = data.job_name.clone() {
            active.job_name = Set(name);
        }
        if let Some(description) = data.job_description.clone() {
            active.job_description = Set(description);
        }
        if let Some(start_date) = data.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = data.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(total_payment) = data.total_payment {
            active.total_payment = Set(total_payment);
        }
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        for addition in &additions {
            JobMember::assign(db, job_row, addition.member_row, &addition.rank_name).await?;
        }
        for member_row in &removals {
            JobMember::unassign(db, job_row, *member_row).await?;
        }

        if total_changed || roster_changed {
            tracing::info!(
                job_id = %id,
                total_changed,
                added = additions.len(),
                removed = removals.len(),
                "Payout inputs changed; clearing payouts"
            );
            reset_payouts(db, job_row).await?;
        }

        Self::find_by_id(db, id).await?.ok_or(JobError::JobNotFound)
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let Some(job_row) = ids::job_id_by_uuid(db, id).await? else {
            return Ok(0);
        };
        job_member::Entity::delete_many()
            .filter(job_member::Column::JobId.eq(job_row))
            .exec(db)
            .await?;
        let result = job::Entity::delete_by_id(job_row).exec(db).await?;
        Ok(result.rows_affected)
    }

    /// Writes job and assignment payout figures computed for `job_row`.
    pub async fn apply_payouts<C: ConnectionTrait>(
        db: &C,
        job_row: i64,
        record: &PayoutRecord,
    ) -> Result<(), DbErr> {
        job::Entity::update_many()
            .set(job::ActiveModel {
                company_cut_amt: Set(Some(record.company_cut_amt)),
                remainder_after_payouts: Set(Some(record.remainder_after_payouts)),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(job::Column::Id.eq(job_row))
            .exec(db)
            .await?;
        for (assignment_id, member_pay) in &record.member_pays {
            JobMember::set_pay(db, *assignment_id, *member_pay).await?;
        }
        Ok(())
    }
}

/// Clears a job's derived payout fields and every assignment's pay.
pub async fn reset_payouts<C: ConnectionTrait>(db: &C, job_row: i64) -> Result<(), DbErr> {
    job::Entity::update_many()
        .set(job::ActiveModel {
            company_cut_amt: Set(None),
            remainder_after_payouts: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(job::Column::Id.eq(job_row))
        .exec(db)
        .await?;
    JobMember::clear_pay(db, job_row).await
}

async fn resolve_additions<C: ConnectionTrait>(
    db: &C,
    adding: &BTreeSet<Uuid>,
    current: &BTreeSet<i64>,
) -> Result<Vec<Addition>, JobError> {
    let mut additions = Vec::new();
    for member_id in adding {
        let member = member::Entity::find()
            .filter(member::Column::Uuid.eq(*member_id))
            .one(db)
            .await?
            .ok_or(JobError::MemberNotFound(*member_id))?;
        if current.contains(&member.id) {
            continue;
        }
        let rank = rank::Entity::find_by_id(member.rank_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                JobError::Validation(format!("Member {member_id} has no valid rank."))
            })?;
        if rank.uuid == DEFAULT_RANK_ID {
            return Err(JobError::MemberHasDefaultRank {
                name: member.name,
                id: member.uuid,
            });
        }
        additions.push(Addition {
            member_row: member.id,
            rank_name: rank.name,
        });
    }
    Ok(additions)
}

async fn resolve_removals<C: ConnectionTrait>(
    db: &C,
    removing: &[Uuid],
    current: &BTreeSet<i64>,
) -> Result<BTreeSet<i64>, DbErr> {
    let mut removals = BTreeSet::new();
    for member_id in removing {
        match ids::member_id_by_uuid(db, *member_id).await? {
            Some(member_row) if current.contains(&member_row) => {
                removals.insert(member_row);
            }
            _ => {}
        }
    }
    Ok(removals)
}

fn validate_name(name: &str) -> Result<(), JobError> {
    if name.trim().is_empty() {
        return Err(JobError::Validation("Job name must not be empty.".to_string()));
    }
    if name.chars().count() > MAX_JOB_NAME_LEN {
        return Err(JobError::Validation(format!(
            "Job name must not exceed {MAX_JOB_NAME_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), JobError> {
    match description {
        Some(description) if description.chars().count() > MAX_JOB_DESCRIPTION_LEN => {
            Err(JobError::Validation(format!(
                "Job description must not exceed {MAX_JOB_DESCRIPTION_LEN} characters."
            )))
        }
        _ => Ok(()),
    }
}

fn validate_total_payment(total_payment: Option<i64>) -> Result<(), JobError> {
    match total_payment {
        Some(total) if total < 0 => Err(JobError::Validation(
            "Total payment must be greater than or equal to 0.".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_dates(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Result<(), JobError> {
    match end_date {
        Some(end_date) if end_date < start_date => Err(JobError::Validation(
            "End date must not be before start date.".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    use super::*;
    use crate::models::{
        member::{CreateMember, Member, UpdateMember},
        rank::{CreateRank, Rank},
    };

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_member(db: &DatabaseConnection, name: &str, rank: Uuid) -> Member {
        Member::create(
            db,
            &CreateMember {
                name: name.to_string(),
                rank_id: rank,
                status: true,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    async fn seed_rank(db: &DatabaseConnection, name: &str, position: i32, share: f64) -> Rank {
        Rank::create(
            db,
            &CreateRank {
                name: name.to_string(),
                position,
                share,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    async fn seed_job(db: &DatabaseConnection, total_payment: Option<i64>) -> Job {
        let data = CreateJob {
            job_name: "Escort the caravan".to_string(),
            job_description: None,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: None,
            total_payment,
        };
        Job::create(db, &data, Uuid::new_v4()).await.unwrap()
    }

    async fn mark_paid(db: &DatabaseConnection, job_id: Uuid) {
        let model = Job::find_model_for_update(db, job_id).await.unwrap().unwrap();
        let roster = JobMember::load_payout_roster(db, model.id).await.unwrap();
        let record = PayoutRecord {
            company_cut_amt: 10.0,
            remainder_after_payouts: 2.0,
            member_pays: roster.iter().map(|entry| (entry.assignment_id, 44)).collect(),
        };
        Job::apply_payouts(db, model.id, &record).await.unwrap();
    }

    fn is_paid(job: &Job) -> bool {
        job.company_cut_amt.is_some()
            && job.remainder_after_payouts.is_some()
            && job.members_on_job.iter().all(|m| m.member_pay.is_some())
    }

    fn is_cleared(job: &Job) -> bool {
        job.company_cut_amt.is_none()
            && job.remainder_after_payouts.is_none()
            && job.members_on_job.iter().all(|m| m.member_pay.is_none())
    }

    #[test]
    fn create_rejects_member_lists_and_fractional_totals() {
        let with_members = json!({
            "job_name": "Raid",
            "start_date": "2025-03-01",
            "members": []
        });
        assert!(serde_json::from_value::<CreateJob>(with_members).is_err());

        let fractional = json!({
            "job_name": "Raid",
            "start_date": "2025-03-01",
            "total_payment": 100.5
        });
        assert!(serde_json::from_value::<CreateJob>(fractional).is_err());

        let integral_float = json!({
            "job_name": "Raid",
            "start_date": "2025-03-01",
            "total_payment": 100.0
        });
        let parsed: CreateJob = serde_json::from_value(integral_float).unwrap();
        assert_eq!(parsed.total_payment, Some(100));
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let db = setup_db().await;
        let start_date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let cases = [
            CreateJob {
                job_name: "  ".to_string(),
                job_description: None,
                start_date,
                end_date: None,
                total_payment: None,
            },
            CreateJob {
                job_name: "x".repeat(MAX_JOB_NAME_LEN + 1),
                job_description: None,
                start_date,
                end_date: None,
                total_payment: None,
            },
            CreateJob {
                job_name: "Raid".to_string(),
                job_description: None,
                start_date,
                end_date: None,
                total_payment: Some(-1),
            },
            CreateJob {
                job_name: "Raid".to_string(),
                job_description: None,
                start_date,
                end_date: start_date.pred_opt(),
                total_payment: None,
            },
        ];
        for data in cases {
            let err = Job::create(&db, &data, Uuid::new_v4()).await.unwrap_err();
            assert!(matches!(err, JobError::Validation(_)), "{data:?}");
        }
    }

    #[tokio::test]
    async fn list_is_newest_start_date_first() {
        let db = setup_db().await;
        for (name, day) in [("first", 1), ("third", 20), ("second", 10)] {
            let data = CreateJob {
                job_name: name.to_string(),
                job_description: None,
                start_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
                end_date: None,
                total_payment: None,
            };
            Job::create(&db, &data, Uuid::new_v4()).await.unwrap();
        }

        let names: Vec<String> = Job::find_all(&db, &JobFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|job| job.job_name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);

        let filtered = Job::find_all(
            &db,
            &JobFilter {
                start_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            },
        )
        .await
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].job_name, "second");
    }

    #[tokio::test]
    async fn roster_snapshots_rank_name_and_orders_by_live_position() {
        let db = setup_db().await;
        let captain = seed_rank(&db, "Captain", 1, 1.0).await;
        let private = seed_rank(&db, "Private", 2, 0.5).await;
        let zed = seed_member(&db, "Zed", private.id).await;
        let amy = seed_member(&db, "Amy", captain.id).await;
        let bob = seed_member(&db, "Bob", captain.id).await;
        let job = seed_job(&db, Some(100)).await;

        let job = Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![zed.id, bob.id, amy.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let names: Vec<&str> = job
            .members_on_job
            .iter()
            .map(|m| m.member_name.as_str())
            .collect();
        assert_eq!(names, vec!["Amy", "Bob", "Zed"]);
        assert_eq!(job.members_on_job[2].member_rank_name, "Private");

        Member::update(
            &db,
            zed.id,
            &UpdateMember {
                rank_id: Some(captain.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let job = Job::find_by_id(&db, job.id).await.unwrap().unwrap();
        let zed_entry = job
            .members_on_job
            .iter()
            .find(|m| m.member_id == zed.id)
            .unwrap();
        assert_eq!(zed_entry.member_rank_name, "Private");
        assert_eq!(zed_entry.member_rank_position, Some(1));
    }

    #[tokio::test]
    async fn update_rejects_unknown_and_default_rank_members_without_writing() {
        let db = setup_db().await;
        let captain = seed_rank(&db, "Captain", 1, 1.0).await;
        let ready = seed_member(&db, "Ready", captain.id).await;
        let pending = seed_member(&db, "Pending", DEFAULT_RANK_ID).await;
        let job = seed_job(&db, Some(100)).await;

        let err = Job::update(
            &db,
            job.id,
            &UpdateJob {
                job_name: Some("Renamed".to_string()),
                add_members: vec![ready.id, pending.id],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, JobError::MemberHasDefaultRank { id, .. } if id == pending.id));

        let missing = Uuid::new_v4();
        let err = Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![missing],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, JobError::MemberNotFound(id) if id == missing));

        let unchanged = Job::find_by_id(&db, job.id).await.unwrap().unwrap();
        assert_eq!(unchanged.job_name, "Escort the caravan");
        assert!(unchanged.members_on_job.is_empty());
    }

    #[tokio::test]
    async fn changing_total_payment_clears_payouts() {
        let db = setup_db().await;
        let captain = seed_rank(&db, "Captain", 1, 1.0).await;
        let member = seed_member(&db, "Amy", captain.id).await;
        let job = seed_job(&db, Some(100)).await;
        Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![member.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mark_paid(&db, job.id).await;

        let same = Job::update(
            &db,
            job.id,
            &UpdateJob {
                total_payment: Some(Some(100)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(is_paid(&same));

        let renamed = Job::update(
            &db,
            job.id,
            &UpdateJob {
                job_name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(is_paid(&renamed));

        let changed = Job::update(
            &db,
            job.id,
            &UpdateJob {
                total_payment: Some(Some(150)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(changed.total_payment, Some(150));
        assert!(is_cleared(&changed));
    }

    #[tokio::test]
    async fn roster_changes_clear_payouts_and_noops_do_not() {
        let db = setup_db().await;
        let captain = seed_rank(&db, "Captain", 1, 1.0).await;
        let amy = seed_member(&db, "Amy", captain.id).await;
        let bob = seed_member(&db, "Bob", captain.id).await;
        let outsider = seed_member(&db, "Outsider", captain.id).await;
        let job = seed_job(&db, Some(100)).await;
        Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![amy.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mark_paid(&db, job.id).await;

        let noop = Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![amy.id],
                remove_members: vec![outsider.id, Uuid::new_v4()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(noop.members_on_job.len(), 1);
        assert!(is_paid(&noop));

        let added = Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![bob.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(added.members_on_job.len(), 2);
        assert!(is_cleared(&added));

        mark_paid(&db, job.id).await;
        let removed = Job::update(
            &db,
            job.id,
            &UpdateJob {
                remove_members: vec![bob.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(removed.members_on_job.len(), 1);
        assert!(is_cleared(&removed));
    }

    #[tokio::test]
    async fn deleting_a_member_clears_its_jobs() {
        let db = setup_db().await;
        let captain = seed_rank(&db, "Captain", 1, 1.0).await;
        let amy = seed_member(&db, "Amy", captain.id).await;
        let bob = seed_member(&db, "Bob", captain.id).await;
        let job = seed_job(&db, Some(100)).await;
        Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![amy.id, bob.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mark_paid(&db, job.id).await;

        let deletion = Member::delete(&db, bob.id).await.unwrap();
        assert_eq!(deletion.jobs_reset, 1);

        let job = Job::find_by_id(&db, job.id).await.unwrap().unwrap();
        assert_eq!(job.members_on_job.len(), 1);
        assert!(is_cleared(&job));
    }

    #[tokio::test]
    async fn add_and_remove_of_the_same_member_is_rejected() {
        let db = setup_db().await;
        let captain = seed_rank(&db, "Captain", 1, 1.0).await;
        let amy = seed_member(&db, "Amy", captain.id).await;
        let job = seed_job(&db, None).await;

        let err = Job::update(
            &db,
            job.id,
            &UpdateJob {
                add_members: vec![amy.id],
                remove_members: vec![amy.id],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, JobError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_job() {
        let db = setup_db().await;
        let job = seed_job(&db, None).await;
        assert_eq!(Job::delete(&db, job.id).await.unwrap(), 1);
        assert!(Job::find_by_id(&db, job.id).await.unwrap().is_none());
        assert_eq!(Job::delete(&db, job.id).await.unwrap(), 0);
    }

    #[test]
    fn update_tells_null_apart_from_missing() {
        let cleared: UpdateJob =
            serde_json::from_value(json!({"job_description": null, "end_date": null})).unwrap();
        assert_eq!(cleared.job_description, Some(None));
        assert_eq!(cleared.end_date, Some(None));

        let untouched: UpdateJob = serde_json::from_value(json!({"job_name": "Raid"})).unwrap();
        assert_eq!(untouched.job_description, None);
        assert_eq!(untouched.end_date, None);
    }

    #[tokio::test]
    async fn update_clears_description_and_end_date() {
        let db = setup_db().await;
        let start_date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let job = Job::create(
            &db,
            &CreateJob {
                job_name: "Escort the caravan".to_string(),
                job_description: Some("Two days out".to_string()),
                start_date,
                end_date: start_date.succ_opt(),
                total_payment: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let updated = Job::update(
            &db,
            job.id,
            &UpdateJob {
                job_description: Some(None),
                end_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.job_description, None);
        assert_eq!(updated.end_date, None);
        assert_eq!(updated.job_name, "Escort the caravan");
    }
}
