use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::{job_member, member, rank},
    models::{ids, job, rank::Rank},
};

pub const MAX_MEMBER_NAME_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum MemberError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Member not found")]
    MemberNotFound,
    #[error("Rank {0} does not exist")]
    RankNotFound(Uuid),
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub status: bool,
    pub rank: Rank,
}

fn default_status() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMember {
    pub name: String,
    pub rank_id: Uuid,
    #[serde(default = "default_status")]
    pub status: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMember {
    pub name: Option<String>,
    pub rank_id: Option<Uuid>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFilter {
    pub rank: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberDeletion {
    pub member_id: Uuid,
    pub jobs_reset: usize,
}

impl Member {
    fn from_models(model: member::Model, rank: rank::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            status: model.status,
            rank: Rank::from_model(rank),
        }
    }

    async fn with_ranks<C: ConnectionTrait>(
        db: &C,
        records: Vec<member::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let rank_ids: BTreeSet<i64> = records.iter().map(|m| m.rank_id).collect();
        let ranks: HashMap<i64, rank::Model> = rank::Entity::find()
            .filter(rank::Column::Id.is_in(rank_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|rank| (rank.id, rank))
            .collect();

        let mut members = Vec::with_capacity(records.len());
        for record in records {
            match ranks.get(&record.rank_id) {
                Some(rank) => members.push(Self::from_models(record, rank.clone())),
                None => tracing::warn!(
                    member_id = %record.uuid,
                    rank_row = record.rank_id,
                    "Member references a missing rank; skipping"
                ),
            }
        }
        Ok(members)
    }

    /// Members ordered by rank position, then name.
    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        filter: &MemberFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = member::Entity::find();
        if let Some(rank_uuid) = filter.rank {
            let Some(rank_row) = ids::rank_id_by_uuid(db, rank_uuid).await? else {
                return Ok(Vec::new());
            };
            query = query.filter(member::Column::RankId.eq(rank_row));
        }

        let mut members = Self::with_ranks(db, query.all(db).await?).await?;
        members.sort_by(|a, b| {
            a.rank
                .position
                .cmp(&b.rank.position)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(members)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let Some(record) = member::Entity::find()
            .filter(member::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        Ok(Self::with_ranks(db, vec![record]).await?.into_iter().next())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateMember,
        member_id: Uuid,
    ) -> Result<Self, MemberError> {
        validate_name(&data.name)?;
        ensure_name_free(db, &data.name, None).await?;
        let rank_row = ids::rank_id_by_uuid(db, data.rank_id)
            .await?
            .ok_or(MemberError::RankNotFound(data.rank_id))?;

        let active = member::ActiveModel {
            uuid: Set(member_id),
            name: Set(data.name.clone()),
            rank_id: Set(rank_row),
            status: Set(data.status),
            ..Default::default()
        };
        active.insert(db).await?;

        Self::find_by_id(db, member_id)
            .await?
            .ok_or(MemberError::MemberNotFound)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateMember,
    ) -> Result<Self, MemberError> {
        let record = member::Entity::find()
            .filter(member::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(MemberError::MemberNotFound)?;

        if let Some(name) = &data.name {
            validate_name(name)?;
            ensure_name_free(db, name, Some(record.id)).await?;
        }
        let rank_row = match data.rank_id {
            Some(rank_uuid) => Some(
                ids::rank_id_by_uuid(db, rank_uuid)
                    .await?
                    .ok_or(MemberError::RankNotFound(rank_uuid))?,
            ),
            None => None,
        };

        let mut active: member::ActiveModel = record.into();
        if let Some(name) = data.name.clone() {
            active.name = Set(name);
        }
        if let Some(rank_row) = rank_row {
            active.rank_id = Set(rank_row);
        }
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        active.update(db).await?;

        Self::find_by_id(db, id)
            .await?
            .ok_or(MemberError::MemberNotFound)
    }

    /// Removes the member and its job assignments. Every job that loses the
    /// member has its payout figures cleared.
    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<MemberDeletion, MemberError> {
        let record = member::Entity::find()
            .filter(member::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(MemberError::MemberNotFound)?;

        let job_rows: BTreeSet<i64> = job_member::Entity::find()
            .filter(job_member::Column::MemberId.eq(record.id))
            .all(db)
            .await?
            .into_iter()
            .map(|assignment| assignment.job_id)
            .collect();

        job_member::Entity::delete_many()
            .filter(job_member::Column::MemberId.eq(record.id))
            .exec(db)
            .await?;
        member::Entity::delete_by_id(record.id).exec(db).await?;

        for job_row in &job_rows {
            job::reset_payouts(db, *job_row).await?;
        }
        if !job_rows.is_empty() {
            tracing::info!(
                member_id = %id,
                jobs = job_rows.len(),
                "Cleared payouts on jobs that lost a deleted member"
            );
        }

        Ok(MemberDeletion {
            member_id: id,
            jobs_reset: job_rows.len(),
        })
    }
}

fn validate_name(name: &str) -> Result<(), MemberError> {
    if name.trim().is_empty() {
        return Err(MemberError::Validation("Name must not be empty.".to_string()));
    }
    if name.chars().count() > MAX_MEMBER_NAME_LEN {
        return Err(MemberError::Validation(format!(
            "Name must not exceed {MAX_MEMBER_NAME_LEN} characters."
        )));
    }
    Ok(())
}

async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except_row: Option<i64>,
) -> Result<(), MemberError> {
    let mut query = member::Entity::find().filter(member::Column::Name.eq(name));
    if let Some(row_id) = except_row {
        query = query.filter(member::Column::Id.ne(row_id));
    }
    if query.count(db).await? > 0 {
        return Err(MemberError::Validation(format!(
            "There is already a member with name {name}."
        )));
    }
    Ok(())
}
