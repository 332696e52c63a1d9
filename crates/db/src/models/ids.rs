use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{job, member, rank};

pub async fn rank_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    rank::Entity::find()
        .select_only()
        .column(rank::Column::Id)
        .filter(rank::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn member_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    member::Entity::find()
        .select_only()
        .column(member::Column::Id)
        .filter(member::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn job_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    job::Entity::find()
        .select_only()
        .column(job::Column::Id)
        .filter(job::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}
