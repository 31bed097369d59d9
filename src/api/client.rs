use std::path::PathBuf;
use std::time::Duration;

use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use super::models::{
    ImageRecord, ImagesResponse, NormalizeReport, SetRecord, SetSummary, SetsResponse,
    UploadReport, UsersResponse,
};

/// HTTP client for the rating backend
///
/// Cheap to clone; clones share the underlying connection pool, so one
/// instance is created at startup and handed to every background task.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL (e.g. `http://127.0.0.1:5000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a possibly-relative URL (the backend returns `/uploads/...`)
    /// against the configured base URL
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    // ========== Images ==========

    /// List images, optionally filtered by set and overlaid with one user's
    /// own ratings
    pub async fn images(&self, set: Option<&str>, user: Option<&str>) -> ApiResult<Vec<ImageRecord>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(slug) = set {
            query.push(("set", slug.to_string()));
        }
        if let Some(name) = user {
            query.push(("include_user_rating", "1".to_string()));
            query.push(("user", name.to_string()));
        }

        let resp: ImagesResponse = self.get_json("api/images", &query).await?;
        Ok(resp.images)
    }

    /// Fetch a single image's current aggregates
    pub async fn image(&self, image_id: i64) -> ApiResult<ImageRecord> {
        let query = [("id", image_id.to_string())];
        let resp: ImagesResponse = self.get_json("api/images", &query).await?;
        resp.images
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidResponse(format!("image {} not found", image_id)))
    }

    /// Top-N images by average rating (only images with at least one vote)
    pub async fn top(&self, limit: usize, set: Option<&str>) -> ApiResult<Vec<ImageRecord>> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(slug) = set {
            query.push(("set", slug.to_string()));
        }

        let resp: ImagesResponse = self.get_json("api/top", &query).await?;
        Ok(resp.images)
    }

    /// Download the raw bytes of a photo for display
    pub async fn fetch_photo(&self, url: &str) -> ApiResult<Vec<u8>> {
        let response = self.http.get(self.absolute_url(url)).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ========== Ratings ==========

    /// Submit a 1-5 star rating for one image on behalf of `user`
    pub async fn rate(&self, image_id: i64, user: &str, rating: u8) -> ApiResult<()> {
        #[derive(Serialize)]
        struct RateRequest<'a> {
            image_id: i64,
            user: &'a str,
            rating: u8,
        }

        self.post_unit("api/rate", &RateRequest { image_id, user, rating }).await
    }

    /// Submit a binary vote; the backend stores Yes as 5 and No as 1
    pub async fn rate_yesno(&self, image_id: i64, user: &str, yes: bool) -> ApiResult<()> {
        #[derive(Serialize)]
        struct YesNoRequest<'a> {
            image_id: i64,
            user: &'a str,
            yesno: &'a str,
        }

        let request = YesNoRequest {
            image_id,
            user,
            yesno: if yes { "Yes" } else { "No" },
        };
        self.post_unit("api/rate_yesno", &request).await
    }

    /// Distinct rater names known to the backend
    pub async fn all_users(&self) -> ApiResult<Vec<String>> {
        let resp: UsersResponse = self.get_json("api/all_users", &[] as &[(&str, String)]).await?;
        Ok(resp.users)
    }

    // ========== Sets ==========

    pub async fn sets(&self) -> ApiResult<Vec<SetRecord>> {
        let resp: SetsResponse = self.get_json("api/sets", &[] as &[(&str, String)]).await?;
        Ok(resp.sets)
    }

    pub async fn create_set(&self, name: &str) -> ApiResult<SetSummary> {
        #[derive(Serialize)]
        struct CreateSetRequest<'a> {
            name: &'a str,
        }

        self.post_json("api/sets", &CreateSetRequest { name }).await
    }

    pub async fn rename_set(&self, set_id: i64, name: &str) -> ApiResult<SetSummary> {
        #[derive(Serialize)]
        struct RenameSetRequest<'a> {
            name: &'a str,
        }

        self.post_json(&format!("api/sets/{}/rename", set_id), &RenameSetRequest { name })
            .await
    }

    /// Delete a set together with its images and their votes
    pub async fn delete_set(&self, set_id: i64) -> ApiResult<()> {
        self.post_unit(&format!("api/sets/{}/delete", set_id), &serde_json::json!({}))
            .await
    }

    // ========== Admin ==========

    /// Toggle an image's visibility in the gallery
    pub async fn hide_photo(&self, image_id: i64, hide: bool) -> ApiResult<()> {
        #[derive(Serialize)]
        struct HideRequest {
            image_id: i64,
            hide: u8,
        }

        let request = HideRequest {
            image_id,
            hide: if hide { 1 } else { 0 },
        };
        self.post_unit("api/hide_photo", &request).await
    }

    /// Delete one photo and all of its votes
    pub async fn delete_photo(&self, image_id: i64) -> ApiResult<()> {
        #[derive(Serialize)]
        struct DeleteRequest {
            image_id: i64,
        }

        self.post_unit("api/delete_photo", &DeleteRequest { image_id }).await
    }

    /// Delete every vote while keeping the images
    pub async fn remove_votes(&self) -> ApiResult<()> {
        self.post_unit("api/remove_votes", &serde_json::json!({})).await
    }

    /// Delete all images and votes
    pub async fn delete_all_data(&self) -> ApiResult<()> {
        self.post_unit("api/delete_all_data", &serde_json::json!({})).await
    }

    /// Export all votes keyed by filename
    pub async fn download_votes(&self) -> ApiResult<serde_json::Value> {
        self.get_json("api/download_votes", &[] as &[(&str, String)]).await
    }

    /// Move unassigned uploads into the default set
    pub async fn normalize_default(&self) -> ApiResult<NormalizeReport> {
        self.post_json("api/migrate/normalize_default", &serde_json::json!({}))
            .await
    }

    /// Upload photo files into the given set via multipart form
    pub async fn upload(&self, paths: Vec<PathBuf>, set: Option<String>) -> ApiResult<UploadReport> {
        let mut form = multipart::Form::new();
        if let Some(slug) = set {
            form = form.text("set", slug);
        }
        for path in paths {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "photo".to_string());
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("cannot read {}: {}", path.display(), e)))?;
            form = form.part("photos", multipart::Part::bytes(bytes).file_name(filename));
        }

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        response.json().await.map_err(Into::into)
    }

    // ========== Plumbing ==========

    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        response.json().await.map_err(Into::into)
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        response.json().await.map_err(Into::into)
    }

    /// POST where the caller only cares about success (the backend answers
    /// `{"ok": true}` or `{"status": "ok"}`, neither worth modeling)
    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let message = if message.is_empty() {
            format!("request failed: {}", status)
        } else {
            message
        };
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:5000/");
        assert_eq!(
            client.absolute_url("/uploads/default/a.jpg"),
            "http://localhost:5000/uploads/default/a.jpg"
        );
    }

    #[test]
    fn test_absolute_url_passthrough() {
        let client = ApiClient::new("http://localhost:5000");
        assert_eq!(
            client.absolute_url("https://cdn.example.com/x.jpg"),
            "https://cdn.example.com/x.jpg"
        );
    }
}
