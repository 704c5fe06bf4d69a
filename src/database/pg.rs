//! Postgres-backed `Store`.
//!
//! Tables are owned by the deployment's migrations; the queries below expect:
//!
//! ```sql
//! users (id BIGSERIAL PRIMARY KEY, name TEXT, email TEXT, random_slugs TEXT[] NOT NULL,
//!        created_at TIMESTAMPTZ NOT NULL, updated_at TIMESTAMPTZ NOT NULL)
//! organisms (id BIGSERIAL PRIMARY KEY, taxonomy_id BIGINT NOT NULL, common_name TEXT NOT NULL,
//!            scientific_name TEXT NOT NULL, slug TEXT NOT NULL UNIQUE)
//! genes (id BIGSERIAL PRIMARY KEY, entrezid BIGINT NOT NULL UNIQUE, systematic_name TEXT NOT NULL,
//!        standard_name TEXT, description TEXT NOT NULL, organism_id BIGINT NOT NULL REFERENCES organisms,
//!        aliases TEXT, obsolete BOOLEAN NOT NULL, weight DOUBLE PRECISION NOT NULL)
//! diseases (acronym TEXT PRIMARY KEY, name TEXT NOT NULL)
//! classifiers (id BIGSERIAL PRIMARY KEY, user_id BIGINT NOT NULL REFERENCES users, task_id BIGINT,
//!              results JSONB, created_at TIMESTAMPTZ NOT NULL, updated_at TIMESTAMPTZ NOT NULL)
//! classifier_genes (classifier_id BIGINT REFERENCES classifiers, gene_id BIGINT REFERENCES genes)
//! classifier_diseases (classifier_id BIGINT REFERENCES classifiers, disease_acronym TEXT REFERENCES diseases)
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::database::models::{
    Classifier, ClassifierChanges, Disease, Gene, NewClassifier, NewGene, NewOrganism, Organism,
    User, UserChanges,
};
use crate::database::store::{unique_sorted, Page, Store, StoreError, StoreResult};

const USER_COLUMNS: &str = "id, name, email, random_slugs, created_at, updated_at";

const GENE_COLUMNS: &str = "id, entrezid, systematic_name, standard_name, description, \
                            organism_id, aliases, obsolete, weight";

const CLASSIFIER_SELECT: &str = r#"
    SELECT
        c.id, c.user_id, c.task_id, c.results, c.created_at, c.updated_at,
        ARRAY(SELECT cg.gene_id FROM classifier_genes cg
              WHERE cg.classifier_id = c.id ORDER BY cg.gene_id) AS genes,
        ARRAY(SELECT cd.disease_acronym FROM classifier_diseases cd
              WHERE cd.classifier_id = c.id ORDER BY cd.disease_acronym) AS diseases
    FROM classifiers c
"#;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_classifier<'e, E>(executor: E, id: i64) -> StoreResult<Option<Classifier>>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE c.id = $1", CLASSIFIER_SELECT);
        let row = sqlx::query_as::<_, Classifier>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    async fn replace_genes(
        tx: &mut Transaction<'_, Postgres>,
        classifier_id: i64,
        genes: &[i64],
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM classifier_genes WHERE classifier_id = $1")
            .bind(classifier_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            "INSERT INTO classifier_genes (classifier_id, gene_id) \
             SELECT $1, g FROM UNNEST($2::BIGINT[]) AS g",
        )
        .bind(classifier_id)
        .bind(unique_sorted(genes))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn replace_diseases(
        tx: &mut Transaction<'_, Postgres>,
        classifier_id: i64,
        diseases: &[String],
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM classifier_diseases WHERE classifier_id = $1")
            .bind(classifier_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query(
            "INSERT INTO classifier_diseases (classifier_id, disease_acronym) \
             SELECT $1, d FROM UNNEST($2::TEXT[]) AS d",
        )
        .bind(classifier_id)
        .bind(unique_sorted(diseases))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn count(&self, table: &str) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let total: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(total)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(
        &self,
        slugs: Vec<String>,
        name: Option<String>,
        email: Option<String>,
    ) -> StoreResult<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (name, email, random_slugs, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .bind(email)
            .bind(slugs)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        debug!("Created user {}", user.id);
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_users(&self, ids: &[i64]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1) ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(unique_sorted(ids))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_user_by_slug(&self, slug: &str) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE $1 = ANY(random_slugs) LIMIT 1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             updated_at = $4 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn set_user_slugs(&self, id: i64, slugs: Vec<String>) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET random_slugs = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(slugs)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn create_classifier(&self, new: NewClassifier) -> StoreResult<Classifier> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO classifiers (user_id, task_id, results, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING id",
        )
        .bind(new.user_id)
        .bind(new.task_id)
        .bind(new.results)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_genes(&mut tx, id, &new.genes).await?;
        Self::replace_diseases(&mut tx, id, &new.diseases).await?;

        let classifier = Self::fetch_classifier(&mut *tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("classifier {}", id)))?;
        tx.commit().await?;

        debug!("Created classifier {} for user {}", classifier.id, classifier.user_id);
        Ok(classifier)
    }

    async fn get_classifier(&self, id: i64) -> StoreResult<Option<Classifier>> {
        Self::fetch_classifier(&self.pool, id).await
    }

    async fn list_classifiers(&self, limit: i64, offset: i64) -> StoreResult<Page<Classifier>> {
        let total = self.count("classifiers").await?;
        let sql = format!("{} ORDER BY c.id LIMIT $1 OFFSET $2", CLASSIFIER_SELECT);
        let rows = sqlx::query_as::<_, Classifier>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(Page { rows, total })
    }

    async fn update_classifier(&self, id: i64, changes: ClassifierChanges) -> StoreResult<Classifier> {
        let mut tx = self.pool.begin().await?;

        let mut current = Self::fetch_classifier(&mut *tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("classifier {}", id)))?;

        if let Some(genes) = &changes.genes {
            Self::replace_genes(&mut tx, id, genes).await?;
        }
        if let Some(diseases) = &changes.diseases {
            Self::replace_diseases(&mut tx, id, diseases).await?;
        }
        changes.apply(&mut current);

        sqlx::query(
            "UPDATE classifiers SET task_id = $2, results = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(current.task_id)
        .bind(&current.results)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let classifier = Self::fetch_classifier(&mut *tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("classifier {}", id)))?;
        tx.commit().await?;
        Ok(classifier)
    }

    async fn get_gene(&self, id: i64) -> StoreResult<Option<Gene>> {
        let sql = format!("SELECT {} FROM genes WHERE id = $1", GENE_COLUMNS);
        let gene = sqlx::query_as::<_, Gene>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(gene)
    }

    async fn get_genes(&self, ids: &[i64]) -> StoreResult<Vec<Gene>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {} FROM genes WHERE id = ANY($1) ORDER BY id", GENE_COLUMNS);
        let genes = sqlx::query_as::<_, Gene>(&sql)
            .bind(unique_sorted(ids))
            .fetch_all(&self.pool)
            .await?;
        Ok(genes)
    }

    async fn list_genes(&self, limit: i64, offset: i64) -> StoreResult<Page<Gene>> {
        let total = self.count("genes").await?;
        let sql = format!("SELECT {} FROM genes ORDER BY id LIMIT $1 OFFSET $2", GENE_COLUMNS);
        let rows = sqlx::query_as::<_, Gene>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(Page { rows, total })
    }

    async fn insert_gene(&self, gene: NewGene) -> StoreResult<Gene> {
        let entrezid = gene.entrezid;
        let sql = format!(
            "INSERT INTO genes (entrezid, systematic_name, standard_name, description, \
             organism_id, aliases, obsolete, weight) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            GENE_COLUMNS
        );
        sqlx::query_as::<_, Gene>(&sql)
            .bind(entrezid)
            .bind(gene.systematic_name)
            .bind(gene.standard_name)
            .bind(gene.description)
            .bind(gene.organism_id)
            .bind(gene.aliases)
            .bind(gene.obsolete)
            .bind(gene.weight)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!("gene with entrezid {} already exists", entrezid))
                }
                other => other.into(),
            })
    }

    async fn get_disease(&self, acronym: &str) -> StoreResult<Option<Disease>> {
        let disease = sqlx::query_as::<_, Disease>(
            "SELECT acronym, name FROM diseases WHERE acronym = $1",
        )
        .bind(acronym)
        .fetch_optional(&self.pool)
        .await?;
        Ok(disease)
    }

    async fn get_diseases(&self, acronyms: &[String]) -> StoreResult<Vec<Disease>> {
        if acronyms.is_empty() {
            return Ok(vec![]);
        }
        let diseases = sqlx::query_as::<_, Disease>(
            "SELECT acronym, name FROM diseases WHERE acronym = ANY($1) ORDER BY acronym",
        )
        .bind(unique_sorted(acronyms))
        .fetch_all(&self.pool)
        .await?;
        Ok(diseases)
    }

    async fn list_diseases(&self, limit: i64, offset: i64) -> StoreResult<Page<Disease>> {
        let total = self.count("diseases").await?;
        let rows = sqlx::query_as::<_, Disease>(
            "SELECT acronym, name FROM diseases ORDER BY acronym LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(Page { rows, total })
    }

    async fn upsert_disease(&self, disease: Disease) -> StoreResult<Disease> {
        let disease = sqlx::query_as::<_, Disease>(
            "INSERT INTO diseases (acronym, name) VALUES ($1, $2) \
             ON CONFLICT (acronym) DO UPDATE SET name = EXCLUDED.name \
             RETURNING acronym, name",
        )
        .bind(disease.acronym)
        .bind(disease.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(disease)
    }

    async fn get_organism(&self, id: i64) -> StoreResult<Option<Organism>> {
        let organism = sqlx::query_as::<_, Organism>(
            "SELECT id, taxonomy_id, common_name, scientific_name, slug FROM organisms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(organism)
    }

    async fn get_organisms(&self, ids: &[i64]) -> StoreResult<Vec<Organism>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let organisms = sqlx::query_as::<_, Organism>(
            "SELECT id, taxonomy_id, common_name, scientific_name, slug FROM organisms \
             WHERE id = ANY($1) ORDER BY id",
        )
        .bind(unique_sorted(ids))
        .fetch_all(&self.pool)
        .await?;
        Ok(organisms)
    }

    async fn insert_organism(&self, organism: NewOrganism) -> StoreResult<Organism> {
        let slug = organism.slug.clone();
        sqlx::query_as::<_, Organism>(
            "INSERT INTO organisms (taxonomy_id, common_name, scientific_name, slug) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, taxonomy_id, common_name, scientific_name, slug",
        )
        .bind(organism.taxonomy_id)
        .bind(organism.common_name)
        .bind(organism.scientific_name)
        .bind(organism.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("organism with slug '{}' already exists", slug))
            }
            other => other.into(),
        })
    }
}
