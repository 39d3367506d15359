//! Iconify API client and collection formats.
//!
//! Requests go to the primary host first and fall back to the backup hosts in
//! configured order. Only the last failure is reported.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::core::record::{IconContent, IconRecord};
use crate::core::svg;
use crate::error::{AppError, Result};

const DEFAULT_ICON_SIZE: f64 = 16.0;

/// Listing returned by `/collection?prefix=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionListing {
    pub prefix: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uncategorized: Vec<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub hidden: Vec<String>,
    /// Alias name to parent icon name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl CollectionListing {
    /// Turn the listing into records whose content is fetched from the API on demand
    pub fn into_records(self) -> Vec<IconRecord> {
        let prefix = self.prefix;
        let mut names: Vec<(String, Option<String>)> = Vec::new();
        for (category, icons) in self.categories {
            for name in icons {
                if !names.iter().any(|(n, _)| *n == name) {
                    names.push((name, Some(category.clone())));
                }
            }
        }
        for name in self.uncategorized {
            if !names.iter().any(|(n, _)| *n == name) {
                names.push((name, None));
            }
        }

        names
            .into_iter()
            .filter(|(name, _)| !self.hidden.contains(name))
            .map(|(name, category)| {
                let alias_tags = self
                    .aliases
                    .iter()
                    .filter(|(_, parent)| **parent == name)
                    .map(|(alias, _)| alias.clone());
                let mut record = IconRecord::new(
                    format!("{prefix}:{name}"),
                    name.clone(),
                    Vec::new(),
                    IconContent::Iconify {
                        prefix: prefix.clone(),
                        name: name.clone(),
                    },
                )
                .with_collection(prefix.clone());
                record.add_tags(alias_tags);
                match category {
                    Some(category) => record.with_category(category),
                    None => record,
                }
            })
            .collect()
    }
}

/// One icon in an IconifyJSON file
#[derive(Debug, Clone, Deserialize)]
pub struct IconifyIcon {
    pub body: String,
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IconifyAlias {
    pub parent: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IconifyInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// IconifyJSON collection file
#[derive(Debug, Clone, Deserialize)]
pub struct IconifyJson {
    pub prefix: String,
    pub icons: BTreeMap<String, IconifyIcon>,
    #[serde(default)]
    pub aliases: BTreeMap<String, IconifyAlias>,
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub info: Option<IconifyInfo>,
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl IconifyJson {
    /// Records with inline markup built from each icon body
    pub fn into_records(self) -> Vec<IconRecord> {
        let Self {
            prefix,
            icons,
            aliases,
            categories,
            info,
            left,
            top,
            width,
            height,
        } = self;
        let collection_name = info.and_then(|i| i.name);

        icons
            .into_iter()
            .filter(|(_, icon)| !icon.hidden)
            .map(|(name, icon)| {
                let w = icon.width.or(width).unwrap_or(DEFAULT_ICON_SIZE);
                let h = icon.height.or(height).unwrap_or(DEFAULT_ICON_SIZE);
                let markup = svg::from_iconify_body(
                    &icon.body,
                    icon.left.or(left).unwrap_or(0.0),
                    icon.top.or(top).unwrap_or(0.0),
                    w,
                    h,
                );

                let mut record = IconRecord::new(
                    format!("{prefix}:{name}"),
                    name.clone(),
                    Vec::new(),
                    IconContent::Inline(markup),
                )
                .with_collection(prefix.clone());
                record.add_tags(
                    aliases
                        .iter()
                        .filter(|(_, alias)| alias.parent == name)
                        .map(|(alias, _)| alias.clone()),
                );
                if let Some(collection_name) = &collection_name {
                    record.add_tags([collection_name.clone()]);
                }
                match categories.iter().find(|(_, names)| names.contains(&name)) {
                    Some((category, _)) => record.with_category(category.clone()),
                    None => record,
                }
            })
            .collect()
    }
}

/// Rendering parameters for the Iconify SVG endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub rotate: Option<String>,
    pub flip: Option<String>,
    pub with_box: bool,
}

impl RenderOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let fields = [
            ("color", &self.color),
            ("width", &self.width),
            ("height", &self.height),
            ("rotate", &self.rotate),
            ("flip", &self.flip),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                params.push((key, value.clone()));
            }
        }
        if self.with_box {
            params.push(("box", "1".to_string()));
        }
        params
    }
}

/// HTTP client for the Iconify API
#[derive(Debug, Clone)]
pub struct IconifyClient {
    http: reqwest::Client,
    hosts: Vec<Url>,
}

impl IconifyClient {
    pub fn new(hosts: &[String], user_agent: &str, timeout: Duration) -> Result<Self> {
        let hosts = hosts
            .iter()
            .map(|h| {
                Url::parse(h).map_err(|e| AppError::Config(format!("Invalid Iconify host {h}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, hosts })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.iconify_hosts,
            &config.user_agent,
            config.request_timeout(),
        )
    }

    /// GET `path` from each host in turn until one answers successfully
    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
        accept: &str,
    ) -> Result<reqwest::Response> {
        let mut last_error = AppError::Other("No Iconify hosts configured".into());

        for host in &self.hosts {
            let url = host
                .join(path)
                .map_err(|e| AppError::Other(format!("Invalid Iconify path {path}: {e}")))?;

            let response = self
                .http
                .get(url.clone())
                .query(params)
                .header(reqwest::header::ACCEPT, accept)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);

            match response {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Iconify request failed, trying next host");
                    last_error = AppError::Http(e);
                }
            }
        }

        Err(last_error)
    }

    /// List the icons of one collection
    pub async fn collection(&self, prefix: &str) -> Result<CollectionListing> {
        let params = [("prefix", prefix.to_string())];
        let response = self.get("/collection", &params, "application/json").await?;
        let listing: CollectionListing = response.json().await?;
        tracing::debug!(prefix, "fetched collection listing");
        Ok(listing)
    }

    /// Raw `/collection` response, optionally with set info and character map
    pub async fn collection_details(
        &self,
        prefix: &str,
        info: bool,
        chars: bool,
    ) -> Result<serde_json::Value> {
        let mut params = vec![("prefix", prefix.to_string())];
        if info {
            params.push(("info", "1".to_string()));
        }
        if chars {
            params.push(("chars", "1".to_string()));
        }
        let response = self.get("/collection", &params, "application/json").await?;
        Ok(response.json().await?)
    }

    /// IconifyJSON data for a single icon (`/{prefix}.json?icons=name`)
    pub async fn icon_data(&self, prefix: &str, name: &str) -> Result<serde_json::Value> {
        let path = format!("/{prefix}.json");
        let params = [("icons", name.to_string())];
        let response = self.get(&path, &params, "application/json").await?;
        let data: serde_json::Value = response.json().await?;

        let missing = data
            .get("not_found")
            .and_then(serde_json::Value::as_array)
            .is_some_and(|names| names.iter().any(|n| n == name));
        if missing {
            return Err(AppError::NotFound(format!("{prefix}:{name}")));
        }
        Ok(data)
    }

    /// Fetch rendered SVG markup for `prefix:name`
    pub async fn svg(&self, prefix: &str, name: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let path = format!("/{prefix}/{name}.svg");
        let response = self
            .get(&path, &options.query_params(), "image/svg+xml")
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch markup from an absolute URL
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_into_records() {
        let listing: CollectionListing = serde_json::from_str(
            r#"{
                "prefix": "mdi",
                "total": 4,
                "categories": {
                    "Home Automation": ["home", "lightbulb"]
                },
                "uncategorized": ["credit-card", "home", "secret"],
                "hidden": ["secret"],
                "aliases": {"house": "home"}
            }"#,
        )
        .unwrap();

        let records = listing.into_records();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["mdi:home", "mdi:lightbulb", "mdi:credit-card"]);

        let home = &records[0];
        assert_eq!(home.category.as_deref(), Some("Home Automation"));
        assert!(home.tags.contains(&"house".to_string()));
        assert_eq!(
            home.content,
            IconContent::Iconify {
                prefix: "mdi".into(),
                name: "home".into()
            }
        );
        assert_eq!(records[2].tags, vec!["credit", "card", "mdi"]);
    }

    #[test]
    fn test_iconify_json_into_records() {
        let json: IconifyJson = serde_json::from_str(
            r#"{
                "prefix": "test",
                "width": 24,
                "height": 24,
                "info": {"name": "Test Icons"},
                "icons": {
                    "bell": {"body": "<path d=\"M1 1\"/>"},
                    "wide": {"body": "<path/>", "width": 32},
                    "gone": {"body": "<path/>", "hidden": true}
                },
                "aliases": {"notification": {"parent": "bell"}},
                "categories": {"Alerts": ["bell"]}
            }"#,
        )
        .unwrap();

        let records = json.into_records();
        assert_eq!(records.len(), 2);

        let bell = &records[0];
        assert_eq!(bell.id, "test:bell");
        assert_eq!(bell.category.as_deref(), Some("Alerts"));
        assert!(bell.tags.contains(&"notification".to_string()));
        assert!(bell.tags.contains(&"icons".to_string()));
        match &bell.content {
            IconContent::Inline(markup) => assert!(markup.contains("viewBox=\"0 0 24 24\"")),
            other => panic!("unexpected content {other:?}"),
        }

        match &records[1].content {
            IconContent::Inline(markup) => assert!(markup.contains("viewBox=\"0 0 32 24\"")),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn test_render_options_params() {
        let options = RenderOptions {
            color: Some("#ff0000".into()),
            rotate: Some("90deg".into()),
            with_box: true,
            ..Default::default()
        };
        assert_eq!(
            options.query_params(),
            vec![
                ("color", "#ff0000".to_string()),
                ("rotate", "90deg".to_string()),
                ("box", "1".to_string()),
            ]
        );
        assert!(RenderOptions::default().is_empty());
    }

    /// Answer one request with a JSON body and report the request line
    fn serve_json(body: &'static str) -> (String, std::thread::JoinHandle<String>) {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap();
            let request_line = String::from_utf8_lossy(&buf[..n])
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            request_line
        });
        (base, handle)
    }

    #[tokio::test]
    async fn test_icon_data() {
        let (base, server) = serve_json(
            r#"{"prefix": "mdi", "icons": {"home": {"body": "<path/>"}}, "width": 24, "height": 24}"#,
        );
        let client = IconifyClient::new(&[base], "test", Duration::from_secs(5)).unwrap();

        let data = client.icon_data("mdi", "home").await.unwrap();
        assert_eq!(data["icons"]["home"]["body"], "<path/>");
        assert_eq!(server.join().unwrap(), "GET /mdi.json?icons=home HTTP/1.1");
    }

    #[tokio::test]
    async fn test_icon_data_not_found() {
        let (base, server) = serve_json(r#"{"prefix": "mdi", "icons": {}, "not_found": ["nope"]}"#);
        let client = IconifyClient::new(&[base], "test", Duration::from_secs(5)).unwrap();

        let err = client.icon_data("mdi", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(id) if id == "mdi:nope"));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn test_collection_details_params() {
        let (base, server) = serve_json(r#"{"prefix": "mdi", "info": {"name": "Material Design Icons"}}"#);
        let client = IconifyClient::new(&[base], "test", Duration::from_secs(5)).unwrap();

        let details = client.collection_details("mdi", true, true).await.unwrap();
        assert_eq!(details["info"]["name"], "Material Design Icons");
        assert_eq!(
            server.join().unwrap(),
            "GET /collection?prefix=mdi&info=1&chars=1 HTTP/1.1"
        );
    }

    #[test]
    fn test_rejects_invalid_host() {
        let err = IconifyClient::new(&["not a url".into()], "test", Duration::from_secs(1));
        assert!(matches!(err, Err(AppError::Config(_))));
    }
}
