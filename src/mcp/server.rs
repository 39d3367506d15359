//! MCP server implementation using rmcp.

use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{CollectionSummary, IconService, Query, RenderOptions, SearchOutcome};
use crate::error::AppError;

/// MCP server for icon search and export.
#[derive(Clone)]
pub struct IconMcp {
    service: Arc<IconService>,
}

/// Search result for MCP response.
#[derive(Debug, Serialize)]
struct McpSearchResult {
    id: String,
    name: String,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    score: f64,
}

/// Search response for MCP.
#[derive(Debug, Serialize)]
struct McpSearchResponse {
    results: Vec<McpSearchResult>,
    total: usize,
    start: usize,
    limit: usize,
    query: String,
    hint: Option<String>,
}

impl McpSearchResponse {
    fn new(query: String, outcome: SearchOutcome) -> Self {
        let shown = outcome.start + outcome.results.len();
        let hint = if outcome.results.is_empty() {
            Some("No icons matched. Try broader or English keywords.".into())
        } else if shown < outcome.total {
            Some(format!(
                "{} more matches; pass start={shown} to see the next page",
                outcome.total - shown
            ))
        } else {
            None
        };

        Self {
            results: outcome
                .results
                .into_iter()
                .map(|c| McpSearchResult {
                    id: c.record.id,
                    name: c.record.name,
                    tags: c.record.tags,
                    collection: c.record.collection,
                    category: c.record.category,
                    score: c.score,
                })
                .collect(),
            total: outcome.total,
            start: outcome.start,
            limit: outcome.limit,
            query,
            hint,
        }
    }
}

#[derive(Debug, Serialize)]
struct McpSaveResponse {
    id: String,
    path: String,
}

#[derive(Debug, Serialize)]
struct McpCollectionsResponse {
    collections: Vec<CollectionSummary>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct McpCollectionIconsResponse {
    prefix: String,
    icons: Vec<String>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chars: Option<serde_json::Value>,
}

/// Search request parameters.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    #[schemars(description = "Search keywords describing the icon (e.g. 'payment card', 'home')")]
    pub query: String,
    #[schemars(description = "Maximum number of results to return (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Number of ranked results to skip, for paging")]
    pub start: Option<u32>,
    #[schemars(description = "Only return icons in this category")]
    pub category: Option<String>,
    #[schemars(description = "Only return icons from these icon set prefixes (e.g. ['mdi', 'lucide'])")]
    pub prefixes: Option<Vec<String>>,
}

/// SVG rendering parameters shared by save and get requests.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct RenderParams {
    #[schemars(description = "Icon color, e.g. '#ff0000' (Iconify icons only)")]
    pub color: Option<String>,
    #[schemars(description = "Width, e.g. '24', '24px' or 'auto' (Iconify icons only)")]
    pub width: Option<String>,
    #[schemars(description = "Height, e.g. '24', '24px' or 'auto' (Iconify icons only)")]
    pub height: Option<String>,
    #[schemars(description = "Rotation, e.g. '90deg' or '1' (Iconify icons only)")]
    pub rotate: Option<String>,
    #[schemars(description = "'horizontal', 'vertical' or 'horizontal,vertical' (Iconify icons only)")]
    pub flip: Option<String>,
    #[schemars(description = "Add an empty bounding box rectangle (Iconify icons only)")]
    #[serde(rename = "box")]
    pub with_box: Option<bool>,
}

impl From<RenderParams> for RenderOptions {
    fn from(params: RenderParams) -> Self {
        Self {
            color: params.color,
            width: params.width,
            height: params.height,
            rotate: params.rotate,
            flip: params.flip,
            with_box: params.with_box.unwrap_or(false),
        }
    }
}

/// Save request parameters.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveRequest {
    #[schemars(description = "Icon id from search_icons results (e.g. 'mdi:home')")]
    pub id: String,
    #[schemars(description = "Directory to write the SVG into (created if missing)")]
    pub directory: Option<String>,
    #[schemars(description = "File name; derived from the icon name when omitted")]
    pub filename: Option<String>,
    #[schemars(description = "Replace an existing file with the same name (default: false)")]
    pub overwrite: Option<bool>,
    #[serde(flatten)]
    pub render: RenderParams,
}

/// Collection listing request parameters.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CollectionIconsRequest {
    #[schemars(description = "Icon set prefix, e.g. 'mdi', 'lucide' or 'tabler'")]
    pub prefix: String,
    #[schemars(description = "Include icon set info (author, license, samples) from the Iconify API")]
    pub include_info: Option<bool>,
    #[schemars(description = "Include the character map of font-imported sets from the Iconify API")]
    pub include_chars: Option<bool>,
}

/// Icon data request parameters.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IconDataRequest {
    #[schemars(description = "Iconify icon id from search_icons results (e.g. 'mdi:home')")]
    pub id: String,
}

/// Get SVG request parameters.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetSvgRequest {
    #[schemars(description = "Icon id from search_icons results")]
    pub id: String,
    #[serde(flatten)]
    pub render: RenderParams,
}

fn error_response(e: &AppError) -> String {
    tracing::warn!(kind = e.kind(), error = %e, "tool call failed");
    e.to_json().to_string()
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| error_response(&AppError::Json(e)))
}

#[tool(tool_box)]
impl IconMcp {
    /// Search the icon catalog.
    #[tool(
        description = "Search for icons by keywords. Returns ranked candidates with their id, name, tags and score. Use the id with save_icon or get_svg."
    )]
    async fn search_icons(&self, #[tool(aggr)] req: SearchRequest) -> String {
        let query = Query {
            text: req.query.clone(),
            limit: req.limit.map(|l| l as usize),
            start: req.start.unwrap_or(0) as usize,
            category: req.category,
            prefixes: req.prefixes.unwrap_or_default(),
        };

        match self.service.search(&query).await {
            Ok(outcome) => to_pretty_json(&McpSearchResponse::new(req.query, outcome)),
            Err(e) => error_response(&e),
        }
    }

    /// Save an icon's SVG into a directory.
    #[tool(
        description = "Save an icon as an SVG file in a local directory. Fails with AlreadyExists instead of overwriting unless overwrite is true."
    )]
    async fn save_icon(&self, #[tool(aggr)] req: SaveRequest) -> String {
        let result = self
            .service
            .save(
                &req.id,
                req.directory.map(PathBuf::from),
                req.filename,
                req.overwrite.unwrap_or(false),
                req.render.into(),
            )
            .await;

        match result {
            Ok(path) => to_pretty_json(&McpSaveResponse {
                id: req.id,
                path: path.to_string_lossy().to_string(),
            }),
            Err(e) => error_response(&e),
        }
    }

    /// Get the SVG markup of an icon.
    #[tool(description = "Get the SVG markup of a single icon without saving it")]
    async fn get_svg(&self, #[tool(aggr)] req: GetSvgRequest) -> String {
        match self.service.svg(&req.id, &req.render.into()).await {
            Ok(svg) => String::from_utf8_lossy(&svg).into_owned(),
            Err(e) => error_response(&e),
        }
    }

    /// List the icon collections in the catalog.
    #[tool(description = "List the icon sets loaded in the catalog with their icon counts")]
    async fn list_collections(&self) -> String {
        let collections = self.service.collections().await;
        let total = collections.len();
        to_pretty_json(&McpCollectionsResponse { collections, total })
    }

    /// List the icon ids of one collection.
    #[tool(
        description = "List the icon ids of one loaded icon set. Optionally include set info and the character map from the Iconify API."
    )]
    async fn list_icons_in_collection(&self, #[tool(aggr)] req: CollectionIconsRequest) -> String {
        let icons = match self.service.collection_icons(&req.prefix).await {
            Ok(icons) => icons,
            Err(e) => return error_response(&e),
        };

        let include_info = req.include_info.unwrap_or(false);
        let include_chars = req.include_chars.unwrap_or(false);
        let (info, chars) = if include_info || include_chars {
            match self
                .service
                .collection_details(&req.prefix, include_info, include_chars)
                .await
            {
                Ok(mut details) => (
                    details.get_mut("info").map(serde_json::Value::take),
                    details.get_mut("chars").map(serde_json::Value::take),
                ),
                Err(e) => return error_response(&e),
            }
        } else {
            (None, None)
        };

        to_pretty_json(&McpCollectionIconsResponse {
            total: icons.len(),
            prefix: req.prefix,
            icons,
            info,
            chars,
        })
    }

    /// Get the IconifyJSON data of an icon.
    #[tool(
        description = "Get the IconifyJSON data (body, dimensions) of an Iconify icon, e.g. for embedding in code"
    )]
    async fn get_icon_data(&self, #[tool(aggr)] req: IconDataRequest) -> String {
        match self.service.icon_data(&req.id).await {
            Ok(data) => to_pretty_json(&data),
            Err(e) => error_response(&e),
        }
    }

    /// Reload the catalog from its sources.
    #[tool(description = "Reload the icon catalog from its configured sources")]
    async fn reload_catalog(&self) -> String {
        match self.service.reload().await {
            Ok(icons) => serde_json::json!({ "icons": icons }).to_string(),
            Err(e) => error_response(&e),
        }
    }
}

#[tool(tool_box)]
impl ServerHandler for IconMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Find and save SVG icons. Use 'search_icons' with keywords to get candidates, \
                 then 'save_icon' with a candidate id and a directory to write the SVG file. \
                 'get_svg' returns markup without saving and 'get_icon_data' returns IconifyJSON. \
                 'list_collections' and 'list_icons_in_collection' browse the loaded icon sets; \
                 'reload_catalog' refreshes the catalog."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

impl IconMcp {
    /// Create a new MCP server instance.
    pub fn new(service: IconService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Run the MCP server over stdio.
pub async fn run_mcp_server(service: IconService) -> crate::error::Result<()> {
    let icons = service.icon_count().await;
    let server = IconMcp::new(service);

    // stdout carries the protocol; logs go to stderr
    tracing::info!(icons, "icon MCP server listening on stdio");

    let service = server
        .serve(rmcp::transport::io::stdio())
        .await
        .map_err(|e| AppError::Other(format!("MCP server error: {e}")))?;

    service
        .waiting()
        .await
        .map_err(|e| AppError::Other(format!("MCP server error: {e}")))?;

    Ok(())
}
