//! create diagnosis_keys table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DiagnosisKeys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiagnosisKeys::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DiagnosisKeys::TemporaryExposureKey)
                            .var_binary(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiagnosisKeys::RollingStartNumber)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiagnosisKeys::TransmissionRiskLevel)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiagnosisKeys::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // unique index on the key bytes, the conflict target for
        // insert-or-ignore
        manager
            .create_index(
                Index::create()
                    .name("idx_diagnosis_keys_key")
                    .table(DiagnosisKeys::Table)
                    .col(DiagnosisKeys::TemporaryExposureKey)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DiagnosisKeys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DiagnosisKeys {
    Table,
    Id,
    TemporaryExposureKey,
    RollingStartNumber,
    TransmissionRiskLevel,
    UploadedAt,
}
