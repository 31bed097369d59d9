/// Wire models for the rating backend
///
/// These mirror the backend's JSON responses. Aggregate fields are optional
/// or defaulted because older rows (or images with no votes yet) omit them:
/// `avg_rating` is null for unrated images and `user_rating` is only present
/// when the request asked for one user's overlay.

use serde::Deserialize;

/// One image as returned by `/api/images` and `/api/top`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRecord {
    /// Unique backend ID
    pub id: i64,
    /// URL of the photo file, usually relative (`/uploads/<set>/<name>`)
    pub url: String,
    /// Stored filename, prefixed with the set slug
    pub filename: String,
    /// ISO-8601 upload timestamp (lexicographic order == chronological order)
    pub created_at: String,
    /// Mean star rating across all raters; absent until the first vote
    #[serde(default)]
    pub avg_rating: Option<f64>,
    /// Number of votes recorded for this image
    #[serde(default)]
    pub rating_count: i64,
    /// The requesting user's own rating, 1-5; absent or null means unrated
    #[serde(default)]
    pub user_rating: Option<u8>,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub set_slug: Option<String>,
    /// Hidden flag from the admin console; defaulted because not every
    /// endpoint includes it
    #[serde(default)]
    pub hidden: bool,
}

impl ImageRecord {
    /// The user's rating with "unrated" collapsed to 0
    pub fn user_rating_or_zero(&self) -> u8 {
        self.user_rating.unwrap_or(0)
    }
}

/// One named grouping of images
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl SetRecord {
    /// The default set is always present and must never be deleted
    pub fn is_default(&self) -> bool {
        self.slug == "default"
    }
}

impl std::fmt::Display for SetRecord {
    /// Label used by the set pickers, e.g. `Summer Trip (12)`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.image_count)
    }
}

/// Response of set creation and rename
#[derive(Debug, Clone, Deserialize)]
pub struct SetSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Result of the normalize-default migration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizeReport {
    #[serde(default)]
    pub moved: Vec<String>,
    #[serde(default)]
    pub updated_ids: Vec<i64>,
    #[serde(default)]
    pub missing: Vec<String>,
}

/// Response of a multi-file upload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReport {
    #[serde(default)]
    pub saved: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImagesResponse {
    pub images: Vec<ImageRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetsResponse {
    pub sets: Vec<SetRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    pub users: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_record_minimal() {
        // Shape of an image with no votes: avg_rating is null, user overlay absent
        let json = r#"{
            "id": 7,
            "url": "/uploads/default/DSC_0001.jpg",
            "filename": "default/DSC_0001.jpg",
            "created_at": "2024-05-01T10:00:00",
            "avg_rating": null,
            "rating_count": 0,
            "set_name": "Default",
            "set_slug": "default"
        }"#;

        let img: ImageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(img.id, 7);
        assert_eq!(img.avg_rating, None);
        assert_eq!(img.user_rating, None);
        assert_eq!(img.user_rating_or_zero(), 0);
        assert!(!img.hidden);
    }

    #[test]
    fn test_image_record_with_user_rating() {
        let json = r#"{
            "id": 3,
            "url": "/uploads/trip/beach.jpg",
            "filename": "trip/beach.jpg",
            "created_at": "2024-06-01T08:30:00",
            "avg_rating": 4.25,
            "rating_count": 4,
            "user_rating": 5
        }"#;

        let img: ImageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(img.avg_rating, Some(4.25));
        assert_eq!(img.user_rating_or_zero(), 5);
        assert_eq!(img.set_name, None);
    }

    #[test]
    fn test_set_record_default_detection() {
        let json = r#"{"sets": [
            {"id": 1, "name": "Default", "slug": "default", "image_count": 12},
            {"id": 2, "name": "Summer Trip", "slug": "summer-trip", "image_count": 3}
        ]}"#;

        let resp: SetsResponse = serde_json::from_str(json).unwrap();
        assert!(resp.sets[0].is_default());
        assert!(!resp.sets[1].is_default());
        assert_eq!(resp.sets[1].image_count, 3);
    }

    #[test]
    fn test_normalize_report_tolerates_missing_fields() {
        let report: NormalizeReport = serde_json::from_str("{}").unwrap();
        assert!(report.moved.is_empty());
        assert!(report.missing.is_empty());
    }
}
