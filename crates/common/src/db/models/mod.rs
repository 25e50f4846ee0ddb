//! SeaORM entity models
//!
//! Database entities for LexDZ

mod article;

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
    decode_embedding,
    encode_embedding,
};
