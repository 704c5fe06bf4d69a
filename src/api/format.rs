use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::api::expand::{relate, relate_all, Expand, Related};
use crate::database::models::{Classifier, Disease, Gene, Organism, User};
use crate::database::store::{Store, StoreResult};

/// Public user representation. Slugs are only present for the user themselves.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_slugs: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneView {
    pub id: i64,
    pub entrezid: i64,
    pub systematic_name: String,
    pub standard_name: Option<String>,
    pub description: String,
    pub organism: Related<i64, Organism>,
    pub aliases: Option<String>,
    pub obsolete: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifierView {
    pub id: i64,
    pub genes: Vec<Related<i64, GeneView>>,
    pub diseases: Vec<Related<String, Disease>>,
    pub user: Related<i64, UserView>,
    pub task_id: Option<i64>,
    pub results: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Turns stored rows into response objects, loading whatever the
/// expansion asks for in one batch per relation.
pub struct Serializer<'a> {
    store: &'a dyn Store,
    viewer: Option<i64>,
}

impl<'a> Serializer<'a> {
    pub fn new(store: &'a dyn Store, viewer: Option<i64>) -> Self {
        Self { store, viewer }
    }

    pub fn user(&self, user: User) -> UserView {
        let random_slugs = (self.viewer == Some(user.id)).then_some(user.random_slugs);
        UserView {
            id: user.id,
            name: user.name,
            email: user.email,
            random_slugs,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub async fn gene(&self, gene: Gene, expand: &Expand) -> StoreResult<GeneView> {
        let mut views = self.genes(vec![gene], expand).await?;
        Ok(views.remove(0))
    }

    pub async fn genes(&self, genes: Vec<Gene>, expand: &Expand) -> StoreResult<Vec<GeneView>> {
        let organisms = if expand.contains("organism") {
            let ids: Vec<i64> = genes.iter().map(|g| g.organism_id).collect();
            let organisms = self.store.get_organisms(&ids).await?;
            Some(keyed(organisms, |o| o.id))
        } else {
            None
        };

        Ok(genes
            .into_iter()
            .map(|gene| GeneView {
                organism: relate(&gene.organism_id, organisms.as_ref()),
                id: gene.id,
                entrezid: gene.entrezid,
                systematic_name: gene.systematic_name,
                standard_name: gene.standard_name,
                description: gene.description,
                aliases: gene.aliases,
                obsolete: gene.obsolete,
                weight: gene.weight,
            })
            .collect())
    }

    pub async fn classifier(&self, classifier: Classifier, expand: &Expand) -> StoreResult<ClassifierView> {
        let mut views = self.classifiers(vec![classifier], expand).await?;
        Ok(views.remove(0))
    }

    pub async fn classifiers(
        &self,
        classifiers: Vec<Classifier>,
        expand: &Expand,
    ) -> StoreResult<Vec<ClassifierView>> {
        let users = async {
            if !expand.contains("user") {
                return Ok(None);
            }
            let ids: Vec<i64> = classifiers.iter().map(|c| c.user_id).collect();
            let users = self.store.get_users(&ids).await?;
            let views: Vec<UserView> = users.into_iter().map(|u| self.user(u)).collect();
            StoreResult::Ok(Some(keyed(views, |u| u.id)))
        };
        let genes = async {
            if !expand.contains("genes") {
                return Ok(None);
            }
            let ids: Vec<i64> = classifiers.iter().flat_map(|c| c.genes.iter().copied()).collect();
            let genes = self.store.get_genes(&ids).await?;
            let views = self.genes(genes, expand.nested("genes")).await?;
            StoreResult::Ok(Some(keyed(views, |g| g.id)))
        };
        let diseases = async {
            if !expand.contains("diseases") {
                return Ok(None);
            }
            let acronyms: Vec<String> = classifiers
                .iter()
                .flat_map(|c| c.diseases.iter().cloned())
                .collect();
            let diseases = self.store.get_diseases(&acronyms).await?;
            StoreResult::Ok(Some(keyed(diseases, |d: &Disease| d.acronym.clone())))
        };

        let (users, genes, diseases) = futures::try_join!(users, genes, diseases)?;

        Ok(classifiers
            .into_iter()
            .map(|c| ClassifierView {
                id: c.id,
                genes: relate_all(&c.genes, genes.as_ref()),
                diseases: relate_all(&c.diseases, diseases.as_ref()),
                user: relate(&c.user_id, users.as_ref()),
                task_id: c.task_id,
                results: c.results,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
            .collect())
    }
}

fn keyed<K, T>(items: Vec<T>, key: impl Fn(&T) -> K) -> HashMap<K, T>
where
    K: Eq + std::hash::Hash,
{
    items.into_iter().map(|item| (key(&item), item)).collect()
}
