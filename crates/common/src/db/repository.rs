//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling.

use crate::corpus::{Record, RecordStore};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Index};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Schema, Set,
};
use serde::{Deserialize, Serialize};

/// Article to insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub numero: String,
    pub texte: String,
    #[serde(default)]
    pub categorie: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// Create the articles table and its label index when missing
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.conn().get_database_backend();
        let schema = Schema::new(backend);

        let mut table = schema.create_table_from_entity(ArticleEntity);
        table.if_not_exists();
        self.conn().execute(backend.build(&table)).await?;

        let index = Index::create()
            .if_not_exists()
            .name("idx_numero")
            .table(ArticleEntity)
            .col(ArticleColumn::Numero)
            .to_owned();
        self.conn().execute(backend.build(&index)).await?;

        Ok(())
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Total number of articles
    pub async fn count_articles(&self) -> Result<u64> {
        ArticleEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a single article, returning its id
    pub async fn insert_article(&self, article: NewArticle) -> Result<i64> {
        let model = ArticleActiveModel {
            numero: Set(article.numero),
            texte: Set(article.texte),
            categorie: Set(article.categorie),
            section: Set(article.section),
            embedding: Set(None),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let result = ArticleEntity::insert(model).exec(self.conn()).await?;
        Ok(result.last_insert_id)
    }

    /// Articles still waiting for an embedding
    pub async fn records_without_vector(&self) -> Result<Vec<Record>> {
        let articles = ArticleEntity::find()
            .filter(ArticleColumn::Embedding.is_null())
            .order_by_asc(ArticleColumn::Id)
            .all(self.conn())
            .await?;

        Ok(articles.into_iter().map(Article::into_record).collect())
    }

    /// Store an embedding for an article that has none yet
    ///
    /// Returns `false` when the article is missing or already vectorized;
    /// existing vectors are never overwritten.
    pub async fn attach_vector(&self, id: i64, vector: &[f32]) -> Result<bool> {
        let result = ArticleEntity::update_many()
            .col_expr(ArticleColumn::Embedding, Expr::value(encode_embedding(vector)))
            .filter(ArticleColumn::Id.eq(id))
            .filter(ArticleColumn::Embedding.is_null())
            .exec(self.conn())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl RecordStore for Repository {
    async fn list_all_records(&self) -> Result<Vec<Record>> {
        let rows: Vec<(i64, String, String, Option<String>, Option<String>)> = ArticleEntity::find()
            .select_only()
            .columns([
                ArticleColumn::Id,
                ArticleColumn::Numero,
                ArticleColumn::Texte,
                ArticleColumn::Categorie,
                ArticleColumn::Section,
            ])
            .order_by_asc(ArticleColumn::Id)
            .into_tuple()
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, numero, texte, categorie, section)| Record {
                id,
                label: numero,
                body: texte,
                category: categorie.unwrap_or_default(),
                section: section.unwrap_or_default(),
                vector: None,
            })
            .collect())
    }

    async fn list_vectorized_records(&self) -> Result<Vec<Record>> {
        let articles = ArticleEntity::find()
            .filter(ArticleColumn::Embedding.is_not_null())
            .order_by_asc(ArticleColumn::Id)
            .all(self.conn())
            .await?;

        Ok(articles
            .into_iter()
            .filter_map(|article| {
                let id = article.id;
                let record = article.into_record();
                if record.vector.is_none() {
                    tracing::warn!(article_id = id, "Skipping malformed embedding blob");
                    return None;
                }
                Some(record)
            })
            .collect())
    }

    async fn find_by_label_substring(&self, needle: &str) -> Result<Vec<Record>> {
        let articles = ArticleEntity::find()
            .filter(ArticleColumn::Numero.contains(needle))
            .order_by_asc(ArticleColumn::Id)
            .all(self.conn())
            .await?;

        Ok(articles.into_iter().map(Article::into_record).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Record>> {
        let article = ArticleEntity::find_by_id(id).one(self.conn()).await?;
        Ok(article.map(Article::into_record))
    }
}
