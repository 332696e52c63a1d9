use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Ranks::Table)
                    .col(pk_id_col(manager, Ranks::Id))
                    .col(uuid_col(Ranks::Uuid))
                    .col(ColumnDef::new(Ranks::Name).string_len(20).not_null())
                    .col(ColumnDef::new(Ranks::Position).integer().not_null())
                    .col(ColumnDef::new(Ranks::Share).double().not_null())
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_ranks_uuid", Ranks::Uuid),
            ("idx_ranks_name", Ranks::Name),
            ("idx_ranks_position", Ranks::Position),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Ranks::Table)
                        .col(column)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Members::Table)
                    .col(pk_id_col(manager, Members::Id))
                    .col(uuid_col(Members::Uuid))
                    .col(ColumnDef::new(Members::Name).string_len(256).not_null())
                    .col(fk_id_col(manager, Members::RankId))
                    .col(
                        ColumnDef::new(Members::Status)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_rank_id")
                            .from(Members::Table, Members::RankId)
                            .to(Ranks::Table, Ranks::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_members_uuid", Members::Uuid),
            ("idx_members_name", Members::Name),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Members::Table)
                        .col(column)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_members_rank_id")
                    .table(Members::Table)
                    .col(Members::RankId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Jobs::Table)
                    .col(pk_id_col(manager, Jobs::Id))
                    .col(uuid_col(Jobs::Uuid))
                    .col(ColumnDef::new(Jobs::JobName).string_len(100).not_null())
                    .col(ColumnDef::new(Jobs::JobDescription).string_len(256))
                    .col(ColumnDef::new(Jobs::StartDate).date().not_null())
                    .col(ColumnDef::new(Jobs::EndDate).date())
                    .col(ColumnDef::new(Jobs::TotalPayment).big_integer())
                    .col(ColumnDef::new(Jobs::CompanyCutAmt).double())
                    .col(ColumnDef::new(Jobs::RemainderAfterPayouts).double())
                    .col(timestamp_col(Jobs::CreatedAt))
                    .col(timestamp_col(Jobs::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_jobs_uuid")
                    .table(Jobs::Table)
                    .col(Jobs::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_jobs_start_date")
                    .table(Jobs::Table)
                    .col(Jobs::StartDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(JobMembers::Table)
                    .col(pk_id_col(manager, JobMembers::Id))
                    .col(fk_id_col(manager, JobMembers::JobId))
                    .col(fk_id_col(manager, JobMembers::MemberId))
                    .col(
                        ColumnDef::new(JobMembers::MemberRankName)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(JobMembers::MemberPay).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_members_job_id")
                            .from(JobMembers::Table, JobMembers::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_members_member_id")
                            .from(JobMembers::Table, JobMembers::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_job_members_job_member_unique")
                    .table(JobMembers::Table)
                    .col(JobMembers::JobId)
                    .col(JobMembers::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_job_members_member_id")
                    .table(JobMembers::Table)
                    .col(JobMembers::MemberId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ranks::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden, Clone, Copy)]
pub(crate) enum Ranks {
    Table,
    Id,
    Uuid,
    Name,
    Position,
    Share,
}

#[derive(Iden, Clone, Copy)]
enum Members {
    Table,
    Id,
    Uuid,
    Name,
    RankId,
    Status,
}

#[derive(Iden, Clone, Copy)]
enum Jobs {
    Table,
    Id,
    Uuid,
    JobName,
    JobDescription,
    StartDate,
    EndDate,
    TotalPayment,
    CompanyCutAmt,
    RemainderAfterPayouts,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
enum JobMembers {
    Table,
    Id,
    JobId,
    MemberId,
    MemberRankName,
    MemberPay,
}
