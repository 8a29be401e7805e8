//! sea-orm entities for diagserve.

pub mod diagnosis_key;
