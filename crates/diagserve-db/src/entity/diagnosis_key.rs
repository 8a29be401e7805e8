//! diagnosis key entity for database storage.

use chrono::{DateTime, Utc};
use diagserve_types::{DiagnosisKey, TemporaryExposureKey};
use sea_orm::entity::prelude::*;

/// diagnosis key database model.
///
/// `id` is the monotonic insertion-order column; the canonical listing
/// order is `ORDER BY id ASC`. the key bytes carry a unique index, which
/// is the conflict target for insert-or-ignore.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "diagnosis_keys")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// temporary exposure key bytes, unique across the table
    #[sea_orm(column_type = "VarBinary(StringLen::N(16))", unique)]
    pub temporary_exposure_key: Vec<u8>,

    /// unsigned 32-bit value stored in a 64-bit column
    pub rolling_start_number: i64,

    pub transmission_risk_level: i16,

    /// server ingest time, shared by all keys of one upload batch
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for DiagnosisKey {
    type Error = crate::Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let bytes: [u8; TemporaryExposureKey::LEN] = model
            .temporary_exposure_key
            .as_slice()
            .try_into()
            .map_err(|_| {
                crate::Error::InvalidData(format!(
                    "temporary exposure key has {} bytes, want {}",
                    model.temporary_exposure_key.len(),
                    TemporaryExposureKey::LEN,
                ))
            })?;

        Ok(DiagnosisKey {
            temporary_exposure_key: TemporaryExposureKey::from_bytes(bytes),
            rolling_start_number: model.rolling_start_number as u32,
            transmission_risk_level: model.transmission_risk_level as u8,
            uploaded_at: Some(model.uploaded_at),
        })
    }
}
