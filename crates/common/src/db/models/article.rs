//! Article entity with an optional embedding BLOB

use crate::corpus::Record;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Article number, e.g. "Art. 350"
    pub numero: String,

    #[sea_orm(column_type = "Text")]
    pub texte: String,

    #[sea_orm(nullable)]
    pub categorie: Option<String>,

    #[sea_orm(nullable)]
    pub section: Option<String>,

    /// Little-endian f32 values, written once by the embedding worker
    #[sea_orm(column_type = "Blob", nullable)]
    pub embedding: Option<Vec<u8>>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse embedding from the stored BLOB
    pub fn parse_embedding(&self) -> Option<Vec<f32>> {
        self.embedding.as_deref().and_then(decode_embedding)
    }

    /// Convert into a domain record, keeping the vector if it parses
    pub fn into_record(self) -> Record {
        let vector = self.parse_embedding();
        Record {
            id: self.id,
            label: self.numero,
            body: self.texte,
            category: self.categorie.unwrap_or_default(),
            section: self.section.unwrap_or_default(),
            vector,
        }
    }
}

/// Serialize a vector for storage
pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Deserialize a stored vector; `None` when the byte length is not a multiple of 4
pub fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}
