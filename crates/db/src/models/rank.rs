use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    DEFAULT_RANK_ID,
    entities::{member, rank},
    models::ids,
};

pub const MAX_RANK_NAME_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum RankError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Rank not found")]
    RankNotFound,
    #[error("No ranks found for {field}: {value}")]
    NoMatches { field: &'static str, value: String },
    #[error("{0}")]
    Validation(String),
    #[error("The default rank cannot be {0}")]
    DefaultRankProtected(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub id: Uuid,
    pub name: String,
    pub position: i32,
    pub share: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRank {
    pub name: String,
    pub position: i32,
    pub share: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRank {
    pub name: Option<String>,
    pub position: Option<i32>,
    pub share: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankFilter {
    pub name: Option<String>,
    pub position: Option<i32>,
}

/// Result of deleting a rank: its members were moved to the default rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankDeletion {
    pub rank_id: Uuid,
    pub reassigned_members: u64,
}

impl Rank {
    pub(crate) fn from_model(model: rank::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            position: model.position,
            share: model.share,
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_RANK_ID
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = rank::Entity::find()
            .order_by_asc(rank::Column::Position)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Unfiltered queries may come back empty; a filter that matches nothing
    /// is reported as `NoMatches`.
    pub async fn find_filtered<C: ConnectionTrait>(
        db: &C,
        filter: &RankFilter,
    ) -> Result<Vec<Self>, RankError> {
        let mut query = rank::Entity::find();
        if let Some(name) = &filter.name {
            query = query.filter(rank::Column::Name.eq(name.clone()));
        }
        if let Some(position) = filter.position {
            query = query.filter(rank::Column::Position.eq(position));
        }
        let records = query.order_by_asc(rank::Column::Position).all(db).await?;

        if records.is_empty() {
            if let Some(name) = &filter.name {
                return Err(RankError::NoMatches {
                    field: "name",
                    value: name.clone(),
                });
            }
            if let Some(position) = filter.position {
                return Err(RankError::NoMatches {
                    field: "position",
                    value: position.to_string(),
                });
            }
        }

        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = rank::Entity::find()
            .filter(rank::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateRank,
        rank_id: Uuid,
    ) -> Result<Self, RankError> {
        validate_name(&data.name)?;
        validate_position(data.position)?;
        validate_share(data.share)?;
        ensure_name_free(db, &data.name, None).await?;
        ensure_position_free(db, data.position, None).await?;

        let active = rank::ActiveModel {
            uuid: Set(rank_id),
            name: Set(data.name.clone()),
            position: Set(data.position),
            share: Set(data.share),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateRank,
    ) -> Result<Self, RankError> {
        if id == DEFAULT_RANK_ID {
            return Err(RankError::DefaultRankProtected("modified"));
        }
        let record = rank::Entity::find()
            .filter(rank::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(RankError::RankNotFound)?;

        if let Some(name) = &data.name {
            validate_name(name)?;
            ensure_name_free(db, name, Some(record.id)).await?;
        }
        if let Some(position) = data.position {
            validate_position(position)?;
            ensure_position_free(db, position, Some(record.id)).await?;
        }
        if let Some(share) = data.share {
            validate_share(share)?;
        }

        let mut active: rank::ActiveModel = record.into();
        if let Some(name) = data.name.clone() {
            active.name = Set(name);
        }
        if let Some(position) = data.position {
            active.position = Set(position);
        }
        if let Some(share) = data.share {
            active.share = Set(share);
        }

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    /// Moves every member of the rank onto the default rank, then removes the
    /// rank. Run inside a transaction so both steps land together.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<RankDeletion, RankError> {
        if id == DEFAULT_RANK_ID {
            return Err(RankError::DefaultRankProtected("deleted"));
        }
        let record = rank::Entity::find()
            .filter(rank::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(RankError::RankNotFound)?;
        let default_rank_row = ids::rank_id_by_uuid(db, DEFAULT_RANK_ID)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Default rank is missing".to_string()))?;

        let reassigned = member::Entity::update_many()
            .set(member::ActiveModel {
                rank_id: Set(default_rank_row),
                ..Default::default()
            })
            .filter(member::Column::RankId.eq(record.id))
            .exec(db)
            .await?
            .rows_affected;
        if reassigned > 0 {
            tracing::info!(
                rank_id = %id,
                reassigned,
                "Moved members to the default rank before deleting their rank"
            );
        }

        rank::Entity::delete_by_id(record.id).exec(db).await?;
        Ok(RankDeletion {
            rank_id: id,
            reassigned_members: reassigned,
        })
    }
}

fn validate_name(name: &str) -> Result<(), RankError> {
    if name.trim().is_empty() {
        return Err(RankError::Validation("Name must not be empty.".to_string()));
    }
    if name.chars().count() > MAX_RANK_NAME_LEN {
        return Err(RankError::Validation(format!(
            "Name must not exceed {MAX_RANK_NAME_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_position(position: i32) -> Result<(), RankError> {
    if position <= 0 {
        return Err(RankError::Validation(
            "Position must be a positive integer.".to_string(),
        ));
    }
    Ok(())
}

fn validate_share(share: f64) -> Result<(), RankError> {
    if !share.is_finite() || share < 0.0 {
        return Err(RankError::Validation(
            "Share must be a non-negative number.".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except_row: Option<i64>,
) -> Result<(), RankError> {
    let mut query = rank::Entity::find().filter(rank::Column::Name.eq(name));
    if let Some(row_id) = except_row {
        query = query.filter(rank::Column::Id.ne(row_id));
    }
    if query.count(db).await? > 0 {
        return Err(RankError::Validation(format!(
            "There is already a rank with name {name}."
        )));
    }
    Ok(())
}

async fn ensure_position_free<C: ConnectionTrait>(
    db: &C,
    position: i32,
    except_row: Option<i64>,
) -> Result<(), RankError> {
    let mut query = rank::Entity::find().filter(rank::Column::Position.eq(position));
    if let Some(row_id) = except_row {
        query = query.filter(rank::Column::Id.ne(row_id));
    }
    if query.count(db).await? > 0 {
        return Err(RankError::Validation(format!(
            "There is already a rank at position {position}."
        )));
    }
    Ok(())
}
