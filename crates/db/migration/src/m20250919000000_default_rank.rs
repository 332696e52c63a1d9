use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::sea_query::ExprTrait;
use uuid::Uuid;

use crate::m20250101000000_baseline::Ranks;

/// Rank that members sit on until they are classified. It holds no share and
/// is never eligible for job payment.
pub const DEFAULT_RANK_ID: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);
const DEFAULT_RANK_NAME: &str = "default";
const DEFAULT_RANK_POSITION: i32 = 99;
const DEFAULT_RANK_SHARE: f64 = 0.0;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(Ranks::Table)
            .columns([Ranks::Uuid, Ranks::Name, Ranks::Position, Ranks::Share]);
        insert
            .values([
                DEFAULT_RANK_ID.into(),
                DEFAULT_RANK_NAME.into(),
                DEFAULT_RANK_POSITION.into(),
                DEFAULT_RANK_SHARE.into(),
            ])
            .map_err(|err| DbErr::Migration(err.to_string()))?;
        insert.on_conflict(OnConflict::column(Ranks::Uuid).do_nothing().to_owned());

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Ranks::Table)
            .and_where(Expr::col(Ranks::Uuid).eq(DEFAULT_RANK_ID))
            .to_owned();
        manager.exec_stmt(delete).await
    }
}
