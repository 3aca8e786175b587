//! Provider implementation for the collection point backend (`/items`, `/points`).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use coleta_core::{
    model::{Category, CategoryId, CollectionPoint, Coordinate, PointDetail, PointId, PointQuery},
    ports::{CatalogPort, PortError},
};

/// Where the backend listens during local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";

/// Item as returned by /items
#[derive(Debug, Deserialize)]
struct ItemEntry {
    id: u32,
    #[serde(alias = "name")]
    title: String,
    image_url: String,
}

/// Point as returned by /points?city=&uf=&items=
#[derive(Debug, Deserialize)]
struct PointEntry {
    id: u32,
    name: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    image_url: Option<String>,
    latitude: f64,
    longitude: f64,
}

/// Point record from /points/{id}
#[derive(Debug, Deserialize)]
struct DetailRecord {
    #[serde(default)]
    id: Option<u32>,
    name: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    image_url: Option<String>,
    email: String,
    whatsapp: String,
    city: String,
    uf: String,
    #[serde(default)]
    items: Vec<String>,
}

/// Accepted item title inside the nested detail shape.
#[derive(Debug, Deserialize)]
struct ItemTitle {
    title: String,
}

/// The backend answers either `{ point, items: [{ title }] }` or a flat record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetailResponse {
    Nested {
        point: DetailRecord,
        items: Vec<ItemTitle>,
    },
    Flat(DetailRecord),
}

/// Category and point lookups against the backend.
pub struct BackendCatalogPort {
    client: Client,
    base_url: String,
}

impl BackendCatalogPort {
    /// Create a new catalog port bound to the given HTTP client and API root.
    #[must_use]
    pub fn new<U: Into<String>>(client: Client, base_url: U) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn categories_request(&self) -> RequestBuilder {
        self.client.get(format!("{}/items", self.base_url))
    }

    fn points_request(&self, query: &PointQuery) -> RequestBuilder {
        let mut req = self.client.get(format!("{}/points", self.base_url)).query(&[
            ("city", query.city.as_str()),
            ("uf", query.state.as_str()),
        ]);

        // An empty filter must read as "every category", so the parameter is
        // left out instead of sent empty.
        if let Some(items) = query.items.query_value() {
            req = req.query(&[("items", items)]);
        }
        req
    }

    fn point_request(&self, id: PointId) -> RequestBuilder {
        self.client.get(format!("{}/points/{id}", self.base_url))
    }
}

#[async_trait]
impl CatalogPort for BackendCatalogPort {
    async fn categories(&self) -> Result<Vec<Category>, PortError> {
        let entries = fetch_json::<Vec<ItemEntry>>(self.categories_request()).await?;
        Ok(entries
            .into_iter()
            .map(|entry| Category {
                id: CategoryId(entry.id),
                label: entry.title,
                icon_uri: entry.image_url,
            })
            .collect())
    }

    async fn points(&self, query: &PointQuery) -> Result<Vec<CollectionPoint>, PortError> {
        let entries = fetch_json::<Vec<PointEntry>>(self.points_request(query)).await?;
        Ok(to_points(entries, &self.base_url))
    }

    async fn point(&self, id: PointId) -> Result<PointDetail, PortError> {
        let resp = self
            .point_request(id)
            .send()
            .await
            .map_err(PortError::from)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound);
        }
        let detail = resp
            .error_for_status()
            .map_err(PortError::from)?
            .json::<DetailResponse>()
            .await
            .map_err(PortError::from)?;
        Ok(to_detail(detail, id, &self.base_url))
    }
}

/// Build the shared port for the backend provider.
#[must_use]
pub fn port<U: Into<String>>(client: Client, base_url: U) -> Arc<dyn CatalogPort> {
    Arc::new(BackendCatalogPort::new(client, base_url))
}

/// Points without a usable position are skipped so the rest stay visible.
fn to_points(entries: Vec<PointEntry>, base_url: &str) -> Vec<CollectionPoint> {
    entries
        .into_iter()
        .filter_map(|entry| to_point(entry, base_url))
        .collect()
}

fn to_point(entry: PointEntry, base_url: &str) -> Option<CollectionPoint> {
    let Some(coordinate) = Coordinate::new(entry.latitude, entry.longitude) else {
        tracing::warn!(
            id = entry.id,
            latitude = entry.latitude,
            longitude = entry.longitude,
            "skipping point with invalid position"
        );
        return None;
    };
    Some(CollectionPoint {
        id: PointId(entry.id),
        name: entry.name,
        image_uri: image_uri(entry.image_url, &entry.image, base_url),
        coordinate,
    })
}

fn to_detail(response: DetailResponse, requested: PointId, base_url: &str) -> PointDetail {
    let (record, items) = match response {
        DetailResponse::Nested { point, items } => {
            let titles = items.into_iter().map(|item| item.title).collect();
            (point, titles)
        }
        DetailResponse::Flat(mut record) => {
            let titles = std::mem::take(&mut record.items);
            (record, titles)
        }
    };

    PointDetail {
        id: record.id.map_or(requested, PointId),
        name: record.name,
        image_uri: image_uri(record.image_url, &record.image, base_url),
        email: record.email,
        whatsapp: record.whatsapp,
        city: record.city,
        state: record.uf,
        items,
    }
}

/// Prefer the absolute URL; fall back to the uploads folder for bare file names.
fn image_uri(image_url: Option<String>, image: &str, base_url: &str) -> String {
    match image_url {
        Some(url) if !url.is_empty() => url,
        _ if image.starts_with("http://") || image.starts_with("https://") => image.to_owned(),
        _ if image.is_empty() => String::new(),
        _ => format!("{base_url}/uploads/{image}"),
    }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    tracing::trace!(?req, "backend request");
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}
