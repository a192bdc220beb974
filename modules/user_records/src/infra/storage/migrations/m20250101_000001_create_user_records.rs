use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRecords::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserRecords::FirstName).string().null())
                    .col(ColumnDef::new(UserRecords::LastName).string().null())
                    .col(ColumnDef::new(UserRecords::JobTitle).string().null())
                    .col(ColumnDef::new(UserRecords::PhoneNumber).string().null())
                    .col(ColumnDef::new(UserRecords::Birthday).string().null())
                    .col(ColumnDef::new(UserRecords::Address).string().null())
                    .col(ColumnDef::new(UserRecords::NoteName).string().null())
                    .col(ColumnDef::new(UserRecords::NoteBody).text().null())
                    .col(ColumnDef::new(UserRecords::Contact).string().null())
                    .col(ColumnDef::new(UserRecords::Url).text().null())
                    .col(ColumnDef::new(UserRecords::ScreenshotRef).string().null())
                    .col(ColumnDef::new(UserRecords::Command).text().null())
                    .col(ColumnDef::new(UserRecords::PushSubscription).text().null())
                    .col(
                        ColumnDef::new(UserRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserRecords::ProfileUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserRecords::NoteUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserRecords::ScreenUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserRecords::CommandUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Orphan reclaim scans referenced assets.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_records_screenshot_ref")
                    .table(UserRecords::Table)
                    .col(UserRecords::ScreenshotRef)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserRecords {
    Table,
    UserId,
    FirstName,
    LastName,
    JobTitle,
    PhoneNumber,
    Birthday,
    Address,
    NoteName,
    NoteBody,
    Contact,
    Url,
    ScreenshotRef,
    Command,
    PushSubscription,
    CreatedAt,
    UpdatedAt,
    ProfileUpdatedAt,
    NoteUpdatedAt,
    ScreenUpdatedAt,
    CommandUpdatedAt,
}
