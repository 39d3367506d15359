//! Resolving icon markup and writing it to disk.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::catalog::Catalog;
use crate::core::iconify::{IconifyClient, RenderOptions};
use crate::core::record::{IconContent, IconRecord};
use crate::core::svg;
use crate::error::{AppError, Result};

/// Leaves room for the `.svg` suffix and an `icon-` prefix under the common
/// 255-byte file name limit
const MAX_STEM_BYTES: usize = 200;
const FALLBACK_STEM: &str = "icon";
const RESERVED_STEMS: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

fn is_edge(c: char) -> bool {
    c == '.' || c == '-'
}

/// Turn arbitrary text into a safe `.svg` file name.
///
/// Only the last path component is kept, so traversal such as `../x` cannot
/// escape the target directory. Letters and digits of any script survive;
/// everything else except `.`, `_` and `-` becomes `-`. The stem is capped by
/// UTF-8 length. Returns `None` when nothing usable remains.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    let lower = last.to_lowercase();
    let stem = lower.strip_suffix(".svg").unwrap_or(&lower);

    let mut cleaned = String::with_capacity(stem.len());
    for c in stem.chars() {
        let mapped = if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if mapped == '-' && cleaned.ends_with('-') {
            continue;
        }
        cleaned.push(mapped);
    }

    let trimmed = cleaned.trim_matches(is_edge);
    let mut end = trimmed.len().min(MAX_STEM_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    let trimmed = trimmed[..end].trim_matches(is_edge);
    if trimmed.is_empty() {
        return None;
    }

    if RESERVED_STEMS.contains(&trimmed) {
        Some(format!("{FALLBACK_STEM}-{trimmed}.svg"))
    } else {
        Some(format!("{trimmed}.svg"))
    }
}

/// File name used when the caller does not supply one
pub fn derived_filename(record: &IconRecord) -> String {
    sanitize_filename(&record.name)
        .or_else(|| sanitize_filename(&record.id))
        .unwrap_or_else(|| format!("{FALLBACK_STEM}.svg"))
}

/// Filesystem operations the exporter needs
pub trait ExportFs: Send + Sync {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Write `bytes` to `path` atomically. Without `overwrite`, an existing
    /// file fails with `ErrorKind::AlreadyExists` and is left untouched.
    fn write_new(&self, path: &Path, bytes: &[u8], overwrite: bool) -> io::Result<()>;
}

/// The real filesystem: temp file in the target directory, then rename
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl ExportFs for LocalFs {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn write_new(&self, path: &Path, bytes: &[u8], overwrite: bool) -> io::Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::Builder::new()
            .prefix(".icon-mcp-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }

        if overwrite {
            tmp.persist(path).map_err(|e| e.error)?;
        } else {
            tmp.persist_noclobber(path).map_err(|e| e.error)?;
        }
        Ok(())
    }
}

/// Fetches and normalizes icon markup
#[derive(Debug, Clone)]
pub struct ContentResolver {
    client: IconifyClient,
}

impl ContentResolver {
    pub fn new(client: IconifyClient) -> Self {
        Self { client }
    }

    /// Resolve a record's markup into validated SVG bytes
    pub async fn resolve(&self, record: &IconRecord, options: &RenderOptions) -> Result<Vec<u8>> {
        let unavailable = |reason: String| AppError::ContentUnavailable {
            id: record.id.clone(),
            reason,
        };

        if !options.is_empty() && !matches!(record.content, IconContent::Iconify { .. }) {
            tracing::debug!(
                id = %record.id,
                content = record.content.kind(),
                "render options only apply to Iconify content; ignoring"
            );
        }

        let raw = match &record.content {
            IconContent::Inline(markup) => markup.clone().into_bytes(),
            IconContent::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| unavailable(format!("{}: {e}", path.display())))?,
            IconContent::Url(url) => self
                .client
                .fetch_bytes(url)
                .await
                .map_err(|e| unavailable(e.to_string()))?,
            IconContent::Iconify { prefix, name } => self
                .client
                .svg(prefix, name, options)
                .await
                .map_err(|e| unavailable(e.to_string()))?,
        };

        svg::normalize(&raw).ok_or_else(|| unavailable("content is not SVG markup".into()))
    }
}

/// A request to save one icon
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub id: String,
    pub directory: PathBuf,
    pub filename: Option<String>,
    pub overwrite: bool,
    pub options: RenderOptions,
}

impl ExportRequest {
    pub fn new(id: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            directory: directory.into(),
            ..Default::default()
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Writes catalog icons into directories
pub struct IconExporter<F: ExportFs = LocalFs> {
    resolver: ContentResolver,
    fs: F,
    overwrite_existing: bool,
}

impl IconExporter<LocalFs> {
    pub fn new(resolver: ContentResolver, overwrite_existing: bool) -> Self {
        Self::with_fs(resolver, LocalFs, overwrite_existing)
    }
}

impl<F: ExportFs> IconExporter<F> {
    pub fn with_fs(resolver: ContentResolver, fs: F, overwrite_existing: bool) -> Self {
        Self {
            resolver,
            fs,
            overwrite_existing,
        }
    }

    /// Resolved SVG markup for an icon, without writing anything
    pub async fn svg(&self, catalog: &Catalog, id: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let record = catalog.get(id)?;
        self.resolver.resolve(record, options).await
    }

    /// Save an icon and return the written path
    pub async fn export(&self, catalog: &Catalog, request: &ExportRequest) -> Result<PathBuf> {
        let record = catalog.get(&request.id)?;

        let filename = match &request.filename {
            Some(raw) => sanitize_filename(raw).ok_or_else(|| {
                AppError::InvalidQuery(format!("unusable file name: {raw:?}"))
            })?,
            None => derived_filename(record),
        };

        let markup = self.resolver.resolve(record, &request.options).await?;

        self.fs
            .create_dir_all(&request.directory)
            .map_err(|e| AppError::io_at(&request.directory, e))?;

        let path = request.directory.join(&filename);
        let overwrite = request.overwrite || self.overwrite_existing;
        self.fs
            .write_new(&path, &markup, overwrite)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    AppError::AlreadyExists(path.clone())
                } else {
                    AppError::io_at(&path, e)
                }
            })?;

        tracing::info!(id = %record.id, path = %path.display(), "icon exported");
        Ok(path)
    }
}
