//! In-process `Store` guarded by a single RwLock. Used by the test suite and
//! by `COGNOMA_STORE=memory` for local runs without Postgres.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::database::models::{
    Classifier, ClassifierChanges, Disease, Gene, NewClassifier, NewGene, NewOrganism, Organism,
    User, UserChanges,
};
use crate::database::store::{unique_sorted, Page, Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    classifiers: BTreeMap<i64, Classifier>,
    genes: BTreeMap<i64, Gene>,
    diseases: BTreeMap<String, Disease>,
    organisms: BTreeMap<i64, Organism>,
    next_user_id: i64,
    next_classifier_id: i64,
    next_gene_id: i64,
    next_organism_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn page_of<K, T: Clone>(table: &BTreeMap<K, T>, limit: i64, offset: i64) -> Page<T> {
    let rows = table
        .values()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect();
    Page {
        rows,
        total: table.len() as i64,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(
        &self,
        slugs: Vec<String>,
        name: Option<String>,
        email: Option<String>,
    ) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let user = User {
            id: next_id(&mut tables.next_user_id),
            name,
            email,
            random_slugs: slugs,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_users(&self, ids: &[i64]) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(unique_sorted(ids)
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn find_user_by_slug(&self, slug: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.has_slug(slug)).cloned())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        if let Some(name) = changes.name {
            user.name = Some(name);
        }
        if let Some(email) = changes.email {
            user.email = Some(email);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_user_slugs(&self, id: i64, slugs: Vec<String>) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        user.random_slugs = slugs;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn create_classifier(&self, new: NewClassifier) -> StoreResult<Classifier> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&new.user_id) {
            return Err(StoreError::NotFound(format!("user {}", new.user_id)));
        }
        let now = Utc::now();
        let classifier = Classifier {
            id: next_id(&mut tables.next_classifier_id),
            user_id: new.user_id,
            genes: unique_sorted(&new.genes),
            diseases: unique_sorted(&new.diseases),
            task_id: new.task_id,
            results: new.results,
            created_at: now,
            updated_at: now,
        };
        tables.classifiers.insert(classifier.id, classifier.clone());
        Ok(classifier)
    }

    async fn get_classifier(&self, id: i64) -> StoreResult<Option<Classifier>> {
        Ok(self.tables.read().await.classifiers.get(&id).cloned())
    }

    async fn list_classifiers(&self, limit: i64, offset: i64) -> StoreResult<Page<Classifier>> {
        Ok(page_of(&self.tables.read().await.classifiers, limit, offset))
    }

    async fn update_classifier(&self, id: i64, changes: ClassifierChanges) -> StoreResult<Classifier> {
        let mut tables = self.tables.write().await;
        let classifier = tables
            .classifiers
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("classifier {}", id)))?;
        changes.apply(classifier);
        classifier.genes = unique_sorted(&classifier.genes);
        classifier.diseases = unique_sorted(&classifier.diseases);
        classifier.updated_at = Utc::now();
        Ok(classifier.clone())
    }

    async fn get_gene(&self, id: i64) -> StoreResult<Option<Gene>> {
        Ok(self.tables.read().await.genes.get(&id).cloned())
    }

    async fn get_genes(&self, ids: &[i64]) -> StoreResult<Vec<Gene>> {
        let tables = self.tables.read().await;
        Ok(unique_sorted(ids)
            .iter()
            .filter_map(|id| tables.genes.get(id).cloned())
            .collect())
    }

    async fn list_genes(&self, limit: i64, offset: i64) -> StoreResult<Page<Gene>> {
        Ok(page_of(&self.tables.read().await.genes, limit, offset))
    }

    async fn insert_gene(&self, gene: NewGene) -> StoreResult<Gene> {
        let mut tables = self.tables.write().await;
        if tables.genes.values().any(|g| g.entrezid == gene.entrezid) {
            return Err(StoreError::Conflict(format!(
                "gene with entrezid {} already exists",
                gene.entrezid
            )));
        }
        if !tables.organisms.contains_key(&gene.organism_id) {
            return Err(StoreError::NotFound(format!("organism {}", gene.organism_id)));
        }
        let gene = Gene {
            id: next_id(&mut tables.next_gene_id),
            entrezid: gene.entrezid,
            systematic_name: gene.systematic_name,
            standard_name: gene.standard_name,
            description: gene.description,
            organism_id: gene.organism_id,
            aliases: gene.aliases,
            obsolete: gene.obsolete,
            weight: gene.weight,
        };
        tables.genes.insert(gene.id, gene.clone());
        Ok(gene)
    }

    async fn get_disease(&self, acronym: &str) -> StoreResult<Option<Disease>> {
        Ok(self.tables.read().await.diseases.get(acronym).cloned())
    }

    async fn get_diseases(&self, acronyms: &[String]) -> StoreResult<Vec<Disease>> {
        let tables = self.tables.read().await;
        Ok(unique_sorted(acronyms)
            .iter()
            .filter_map(|a| tables.diseases.get(a).cloned())
            .collect())
    }

    async fn list_diseases(&self, limit: i64, offset: i64) -> StoreResult<Page<Disease>> {
        Ok(page_of(&self.tables.read().await.diseases, limit, offset))
    }

    async fn upsert_disease(&self, disease: Disease) -> StoreResult<Disease> {
        let mut tables = self.tables.write().await;
        tables.diseases.insert(disease.acronym.clone(), disease.clone());
        Ok(disease)
    }

    async fn get_organism(&self, id: i64) -> StoreResult<Option<Organism>> {
        Ok(self.tables.read().await.organisms.get(&id).cloned())
    }

    async fn get_organisms(&self, ids: &[i64]) -> StoreResult<Vec<Organism>> {
        let tables = self.tables.read().await;
        Ok(unique_sorted(ids)
            .iter()
            .filter_map(|id| tables.organisms.get(id).cloned())
            .collect())
    }

    async fn insert_organism(&self, organism: NewOrganism) -> StoreResult<Organism> {
        let mut tables = self.tables.write().await;
        if tables.organisms.values().any(|o| o.slug == organism.slug) {
            return Err(StoreError::Conflict(format!(
                "organism with slug '{}' already exists",
                organism.slug
            )));
        }
        let organism = Organism {
            id: next_id(&mut tables.next_organism_id),
            taxonomy_id: organism.taxonomy_id,
            common_name: organism.common_name,
            scientific_name: organism.scientific_name,
            slug: organism.slug,
        };
        tables.organisms.insert(organism.id, organism.clone());
        Ok(organism)
    }
}
