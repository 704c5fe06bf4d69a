use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::{Disease, NewGene, NewOrganism};
use crate::database::store::Store;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum FixtureCommands {
    #[command(about = "Load a JSON or YAML fixture into the configured store")]
    Load {
        #[arg(help = "Fixture file (.json, .yaml or .yml)")]
        file: PathBuf,
    },

    #[command(about = "Parse a fixture file and report what it contains without loading it")]
    Check {
        #[arg(help = "Fixture file (.json, .yaml or .yml)")]
        file: PathBuf,
    },
}

/// Reference data file: organisms first, then genes that point at them, then diseases
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub organisms: Vec<NewOrganism>,
    #[serde(default)]
    pub genes: Vec<FixtureGene>,
    #[serde(default)]
    pub diseases: Vec<Disease>,
}

/// Gene entry whose organism is named by slug (from the same file) or by stored id
#[derive(Debug, Deserialize)]
pub struct FixtureGene {
    pub entrezid: i64,
    pub systematic_name: String,
    #[serde(default)]
    pub standard_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub organism: OrganismRef,
    #[serde(default)]
    pub aliases: Option<String>,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrganismRef {
    Id(i64),
    Slug(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub organisms: usize,
    pub genes: usize,
    pub diseases: usize,
}

pub async fn handle(cmd: FixtureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FixtureCommands::Load { file } => {
            let fixture = read_fixture(&file)?;
            let state = AppState::from_config(config().clone())
                .await
                .context("failed to connect to the store")?;

            let summary = load(state.store.as_ref(), fixture).await?;
            output_success(
                &output_format,
                &format!(
                    "Loaded {} organisms, {} genes and {} diseases from {}",
                    summary.organisms,
                    summary.genes,
                    summary.diseases,
                    file.display()
                ),
                Some(json!({ "loaded": summary })),
            )
        }
        FixtureCommands::Check { file } => {
            let fixture = read_fixture(&file)?;
            let summary = LoadSummary {
                organisms: fixture.organisms.len(),
                genes: fixture.genes.len(),
                diseases: fixture.diseases.len(),
            };
            output_success(
                &output_format,
                &format!(
                    "{} contains {} organisms, {} genes and {} diseases",
                    file.display(),
                    summary.organisms,
                    summary.genes,
                    summary.diseases
                ),
                Some(json!({ "contents": summary })),
            )
        }
    }
}

/// Parse by extension; anything that is not `.json` is read as YAML
pub fn read_fixture(path: &Path) -> anyhow::Result<Fixture> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("invalid YAML in {}", path.display()))
    }
}

pub async fn load(store: &dyn Store, fixture: Fixture) -> anyhow::Result<LoadSummary> {
    let mut summary = LoadSummary::default();
    let mut organism_ids: HashMap<String, i64> = HashMap::new();

    for organism in fixture.organisms {
        let slug = organism.slug.clone();
        let stored = store
            .insert_organism(organism)
            .await
            .with_context(|| format!("failed to insert organism '{}'", slug))?;
        organism_ids.insert(stored.slug, stored.id);
        summary.organisms += 1;
    }

    for gene in fixture.genes {
        let organism_id = match &gene.organism {
            OrganismRef::Id(id) => *id,
            OrganismRef::Slug(slug) => *organism_ids.get(slug).ok_or_else(|| {
                anyhow!(
                    "gene {} references organism '{}' which is not defined in this fixture",
                    gene.entrezid,
                    slug
                )
            })?,
        };

        let entrezid = gene.entrezid;
        store
            .insert_gene(NewGene {
                entrezid,
                systematic_name: gene.systematic_name,
                standard_name: gene.standard_name,
                description: gene.description,
                organism_id,
                aliases: gene.aliases,
                obsolete: gene.obsolete,
                weight: gene.weight.unwrap_or(1.0),
            })
            .await
            .with_context(|| format!("failed to insert gene {}", entrezid))?;
        summary.genes += 1;
    }

    for disease in fixture.diseases {
        let acronym = disease.acronym.clone();
        store
            .upsert_disease(disease)
            .await
            .with_context(|| format!("failed to store disease '{}'", acronym))?;
        summary.diseases += 1;
    }

    tracing::info!(
        "Fixture loaded: {} organisms, {} genes, {} diseases",
        summary.organisms,
        summary.genes,
        summary.diseases
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use std::io::Write;

    const YAML: &str = r#"
organisms:
  - taxonomy_id: 9606
    common_name: human
    scientific_name: Homo sapiens
    slug: homo-sapiens
genes:
  - entrezid: 7157
    systematic_name: TP53
    description: tumor protein p53
    organism: homo-sapiens
  - entrezid: 7422
    systematic_name: VEGFA
    organism: homo-sapiens
    weight: 0.5
diseases:
  - acronym: GBM
    name: glioblastoma multiforme
"#;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_yaml_fixture() {
        let file = write_temp(".yaml", YAML);
        let fixture = read_fixture(file.path()).unwrap();
        let store = MemoryStore::new();

        let summary = load(&store, fixture).await.unwrap();
        assert_eq!(
            summary,
            LoadSummary { organisms: 1, genes: 2, diseases: 1 }
        );

        let genes = store.list_genes(10, 0).await.unwrap();
        assert_eq!(genes.total, 2);
        assert_eq!(genes.rows[1].weight, 0.5);
        assert!(store.get_disease("GBM").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn loads_json_fixture() {
        let file = write_temp(
            ".json",
            r#"{"diseases": [{"acronym": "BLCA", "name": "bladder urothelial carcinoma"}]}"#,
        );
        let fixture = read_fixture(file.path()).unwrap();
        let store = MemoryStore::new();

        let summary = load(&store, fixture).await.unwrap();
        assert_eq!(summary.diseases, 1);
        assert_eq!(summary.genes, 0);
    }

    #[tokio::test]
    async fn unknown_organism_slug_fails() {
        let fixture: Fixture = serde_yaml::from_str(
            "genes:\n  - entrezid: 1\n    systematic_name: A1BG\n    organism: mus-musculus\n",
        )
        .unwrap();
        let store = MemoryStore::new();

        let err = load(&store, fixture).await.unwrap_err();
        assert!(err.to_string().contains("mus-musculus"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let file = write_temp(".json", "{ nope");
        let err = read_fixture(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }
}
