//! The operations exposed to the CLI and the MCP server.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CatalogSource, Config};
use crate::core::catalog::{Catalog, CatalogHandle, CollectionSummary};
use crate::core::exporter::{ContentResolver, ExportRequest, IconExporter};
use crate::core::iconify::{IconifyClient, RenderOptions};
use crate::core::matcher::{Matcher, Query, SearchOutcome};
use crate::core::record::IconContent;
use crate::error::{AppError, Result};

/// Catalog, matcher and exporter wired together
pub struct IconService {
    catalog: CatalogHandle,
    matcher: Matcher,
    exporter: IconExporter,
    client: IconifyClient,
    default_export_dir: PathBuf,
}

impl IconService {
    /// Load the catalog from `sources` and build the service around it
    pub async fn start(config: &Config, sources: Vec<CatalogSource>) -> Result<Self> {
        let client = IconifyClient::from_config(config)?;
        let catalog = Catalog::load(&sources, &client, config.request_timeout()).await?;
        Ok(Self::with_catalog(config, catalog, sources, client))
    }

    pub fn with_catalog(
        config: &Config,
        catalog: Catalog,
        sources: Vec<CatalogSource>,
        client: IconifyClient,
    ) -> Self {
        let exporter = IconExporter::new(
            ContentResolver::new(client.clone()),
            config.overwrite_existing,
        );
        Self {
            catalog: CatalogHandle::new(catalog, sources, client.clone(), config.request_timeout()),
            matcher: Matcher::from_config(config),
            exporter,
            client,
            default_export_dir: config.default_export_dir.clone(),
        }
    }

    pub async fn search(&self, query: &Query) -> Result<SearchOutcome> {
        let catalog = self.catalog.snapshot().await;
        self.matcher.search(&catalog, query)
    }

    /// Export an icon; `directory` falls back to the configured export dir
    pub async fn save(
        &self,
        id: &str,
        directory: Option<PathBuf>,
        filename: Option<String>,
        overwrite: bool,
        options: RenderOptions,
    ) -> Result<PathBuf> {
        let directory = directory.unwrap_or_else(|| self.default_export_dir.clone());
        let request = ExportRequest {
            filename,
            overwrite,
            options,
            ..ExportRequest::new(id, directory)
        };
        let catalog = self.catalog.snapshot().await;
        self.exporter.export(&catalog, &request).await
    }

    pub async fn svg(&self, id: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let catalog = self.catalog.snapshot().await;
        self.exporter.svg(&catalog, id, options).await
    }

    /// IconifyJSON data for an icon backed by the Iconify API
    pub async fn icon_data(&self, id: &str) -> Result<serde_json::Value> {
        let catalog = self.catalog.snapshot().await;
        let record = catalog.get(id)?;
        let IconContent::Iconify { prefix, name } = &record.content else {
            return Err(AppError::ContentUnavailable {
                id: id.to_string(),
                reason: format!("{} icons carry no Iconify data", record.content.kind()),
            });
        };

        self.client
            .icon_data(prefix, name)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound(id.to_string()),
                other => AppError::ContentUnavailable {
                    id: id.to_string(),
                    reason: other.to_string(),
                },
            })
    }

    pub async fn collections(&self) -> Vec<CollectionSummary> {
        self.catalog.snapshot().await.collections()
    }

    /// Ids of the loaded icons in collection `prefix`, in catalog order
    pub async fn collection_icons(&self, prefix: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = self
            .catalog
            .snapshot()
            .await
            .iter()
            .filter(|record| record.collection.as_deref() == Some(prefix))
            .map(|record| record.id.clone())
            .collect();

        if ids.is_empty() {
            return Err(AppError::NotFound(format!("collection {prefix}")));
        }
        Ok(ids)
    }

    /// Set info and character map for a collection, straight from the Iconify API
    pub async fn collection_details(
        &self,
        prefix: &str,
        info: bool,
        chars: bool,
    ) -> Result<serde_json::Value> {
        self.client
            .collection_details(prefix, info, chars)
            .await
            .map_err(|e| AppError::ContentUnavailable {
                id: prefix.to_string(),
                reason: e.to_string(),
            })
    }

    pub async fn icon_count(&self) -> usize {
        self.catalog.snapshot().await.len()
    }

    /// Reload the catalog and return the new icon count
    pub async fn reload(&self) -> Result<usize> {
        let catalog: Arc<Catalog> = self.catalog.reload().await?;
        Ok(catalog.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn service(dir: &std::path::Path) -> IconService {
        let manifest = dir.join("icons.json");
        fs::write(
            &manifest,
            r#"{"icons": [
                {"id": "pay-01", "name": "Payment Card", "tags": ["pay", "payment", "card"], "svg": "<svg id=\"pay\"/>"},
                {"id": "home-01", "name": "Home", "tags": ["home", "house"], "svg": "<svg id=\"home\"/>", "collection": "demo"},
                {"id": "cart-01", "name": "Shopping Cart", "tags": ["cart", "shopping"], "svg": "<svg id=\"cart\"/>"},
                {"id": "user-01", "name": "User", "tags": ["user", "account"], "svg": "<svg id=\"user\"/>"},
                {"id": "cog-01", "name": "Settings", "tags": ["settings", "cog"], "svg": "<svg id=\"cog\"/>"},
                {"id": "mail-01", "name": "Mail", "tags": ["mail", "email"], "svg": "<svg id=\"mail\"/>"},
                {"id": "trash-01", "name": "Trash", "tags": ["trash", "delete"], "svg": "<svg id=\"trash\"/>"},
                {"id": "star-01", "name": "Star", "tags": ["star", "favorite"], "svg": "<svg id=\"star\"/>"},
                {"id": "bell-01", "name": "Bell", "tags": ["bell", "alert"], "svg": "<svg id=\"bell\"/>"},
                {"id": "lock-01", "name": "Lock", "tags": ["lock", "secure"], "svg": "<svg id=\"lock\"/>"}
            ]}"#,
        )
        .unwrap();

        let config = Config {
            default_export_dir: dir.join("default-out"),
            ..Default::default()
        };
        IconService::start(&config, vec![CatalogSource::Manifest { path: manifest }])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_then_save() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path()).await;

        let outcome = service.search(&Query::new("付款")).await.unwrap();
        assert_eq!(outcome.results[0].record.id, "pay-01");
        assert!(outcome.results[0].score > 0.0);

        let out = dir.path().join("icons");
        let path = service
            .save("pay-01", Some(out.clone()), None, false, RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(path, out.join("payment-card.svg"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg id=\"pay\"/>");
    }

    #[tokio::test]
    async fn test_save_uses_default_directory() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path()).await;

        let path = service
            .save("home-01", None, None, false, RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("default-out").join("home.svg"));
    }

    #[tokio::test]
    async fn test_collections_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path()).await;

        assert_eq!(service.icon_count().await, 10);
        let collections = service.collections().await;
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].prefix, None);
        assert_eq!(collections[0].total, 9);

        assert_eq!(service.reload().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_collection_icons() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path()).await;

        assert_eq!(service.collection_icons("demo").await.unwrap(), vec!["home-01"]);
        assert!(matches!(
            service.collection_icons("mdi").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_icon_data_needs_iconify_content() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path()).await;

        assert!(matches!(
            service.icon_data("pay-01").await,
            Err(AppError::ContentUnavailable { ref id, .. }) if id == "pay-01"
        ));
        assert!(matches!(
            service.icon_data("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
