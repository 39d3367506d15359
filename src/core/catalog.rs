//! The icon catalog and its loaders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::CatalogSource;
use crate::core::iconify::{IconifyClient, IconifyJson};
use crate::core::record::{IconContent, IconRecord};
use crate::error::{AppError, Result};

/// Icon entry in a manifest file
#[derive(Debug, Deserialize)]
struct ManifestIcon {
    id: String,
    name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    svg: Option<String>,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    icons: Vec<ManifestIcon>,
}

impl ManifestIcon {
    fn into_record(self, base_dir: &Path) -> Result<IconRecord> {
        let content = match (self.svg, self.file, self.url) {
            (Some(svg), None, None) => IconContent::Inline(svg),
            (None, Some(file), None) => IconContent::File(base_dir.join(file)),
            (None, None, Some(url)) => IconContent::Url(url),
            _ => {
                return Err(AppError::CatalogUnavailable(format!(
                    "icon {} must set exactly one of svg, file or url",
                    self.id
                )))
            }
        };

        let mut record = IconRecord::new(self.id, self.name, self.tags, content);
        if let Some(collection) = self.collection {
            record = record.with_collection(collection);
        }
        if let Some(category) = self.category {
            record = record.with_category(category);
        }
        Ok(record)
    }
}

/// Record count per collection prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub prefix: Option<String>,
    pub total: usize,
}

/// Immutable, insertion-ordered set of icon records
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<IconRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn from_records(records: Vec<IconRecord>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), position).is_some() {
                return Err(AppError::CatalogUnavailable(format!(
                    "duplicate icon id: {}",
                    record.id
                )));
            }
        }
        Ok(Self { records, index })
    }

    /// Load every source in order, bounded by `timeout`
    pub async fn load(
        sources: &[CatalogSource],
        client: &IconifyClient,
        timeout: Duration,
    ) -> Result<Self> {
        if sources.is_empty() {
            return Err(AppError::CatalogUnavailable(
                "no catalog sources configured".into(),
            ));
        }

        let records = tokio::time::timeout(timeout, load_sources(sources, client))
            .await
            .map_err(|_| {
                AppError::CatalogUnavailable(format!("loading timed out after {timeout:?}"))
            })??;

        let catalog = Self::from_records(records)?;
        if catalog.is_empty() {
            return Err(AppError::CatalogUnavailable(
                "catalog sources contain no icons".into(),
            ));
        }
        tracing::info!(icons = catalog.len(), sources = sources.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Result<&IconRecord> {
        self.index
            .get(id)
            .map(|&position| &self.records[position])
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IconRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Collections in the order they first appear
    pub fn collections(&self) -> Vec<CollectionSummary> {
        let mut summaries: Vec<CollectionSummary> = Vec::new();
        for record in &self.records {
            match summaries
                .iter_mut()
                .find(|s| s.prefix == record.collection)
            {
                Some(summary) => summary.total += 1,
                None => summaries.push(CollectionSummary {
                    prefix: record.collection.clone(),
                    total: 1,
                }),
            }
        }
        summaries
    }
}

async fn load_sources(sources: &[CatalogSource], client: &IconifyClient) -> Result<Vec<IconRecord>> {
    let mut records = Vec::new();
    for source in sources {
        let loaded = load_source(source, client).await.map_err(|e| match e {
            AppError::CatalogUnavailable(msg) => AppError::CatalogUnavailable(msg),
            other => AppError::CatalogUnavailable(format!("{}: {other}", describe(source))),
        })?;
        tracing::debug!(source = %describe(source), icons = loaded.len(), "loaded catalog source");
        records.extend(loaded);
    }
    Ok(records)
}

async fn load_source(source: &CatalogSource, client: &IconifyClient) -> Result<Vec<IconRecord>> {
    match source {
        CatalogSource::Manifest { path } => load_manifest(path).await,
        CatalogSource::IconifyJson { path } => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| AppError::io_at(path, e))?;
            let json: IconifyJson = serde_json::from_str(&content)?;
            Ok(json.into_records())
        }
        CatalogSource::Iconify { prefix } => {
            let listing = client.collection(prefix).await?;
            Ok(listing.into_records())
        }
    }
}

async fn load_manifest(path: &Path) -> Result<Vec<IconRecord>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::io_at(path, e))?;
    let manifest: Manifest = if is_toml(path) {
        toml::from_str(&content).map_err(|e| {
            AppError::CatalogUnavailable(format!("{}: {e}", path.display()))
        })?
    } else {
        serde_json::from_str(&content)?
    };

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    manifest
        .icons
        .into_iter()
        .map(|icon| icon.into_record(base_dir))
        .collect()
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

fn describe(source: &CatalogSource) -> String {
    match source {
        CatalogSource::Manifest { path } => format!("manifest {}", path.display()),
        CatalogSource::IconifyJson { path } => format!("iconify-json {}", path.display()),
        CatalogSource::Iconify { prefix } => format!("iconify collection {prefix}"),
    }
}

/// Decide whether a local file is a manifest or an IconifyJSON collection
pub fn detect_source(path: &Path) -> Result<CatalogSource> {
    let path = path.to_path_buf();
    if is_toml(&path) {
        return Ok(CatalogSource::Manifest { path });
    }

    let content = fs::read_to_string(&path).map_err(|e| AppError::io_at(&path, e))?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        AppError::CatalogUnavailable(format!("{}: {e}", path.display()))
    })?;

    if value.get("prefix").is_some() && value.get("icons").is_some_and(serde_json::Value::is_object) {
        Ok(CatalogSource::IconifyJson { path })
    } else {
        Ok(CatalogSource::Manifest { path })
    }
}

/// Shared access to the current catalog snapshot
pub struct CatalogHandle {
    current: RwLock<Arc<Catalog>>,
    sources: Vec<CatalogSource>,
    client: IconifyClient,
    timeout: Duration,
}

impl CatalogHandle {
    pub fn new(
        catalog: Catalog,
        sources: Vec<CatalogSource>,
        client: IconifyClient,
        timeout: Duration,
    ) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            sources,
            client,
            timeout,
        }
    }

    /// The catalog requests should read from
    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    /// Reload from the configured sources; the old snapshot stays in place on failure
    pub async fn reload(&self) -> Result<Arc<Catalog>> {
        let fresh = Arc::new(Catalog::load(&self.sources, &self.client, self.timeout).await?);
        *self.current.write().await = fresh.clone();
        Ok(fresh)
    }
}
