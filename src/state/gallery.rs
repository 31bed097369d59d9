use std::fmt;

use crate::api::models::ImageRecord;

/// Client-side sort order for the gallery grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Newest uploads first (descending `created_at`; the backend emits
    /// ISO-8601 timestamps, so lexicographic order is chronological order)
    #[default]
    Newest,
    /// Highest average rating first; images with no votes sort last
    AvgDesc,
    /// Most-voted first
    CountDesc,
}

impl SortBy {
    pub const ALL: [SortBy; 3] = [SortBy::Newest, SortBy::AvgDesc, SortBy::CountDesc];
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Newest => write!(f, "Newest"),
            SortBy::AvgDesc => write!(f, "Average rating"),
            SortBy::CountDesc => write!(f, "Vote count"),
        }
    }
}

/// Sort the fetched records in place according to the selected order
pub fn sort_images(images: &mut [ImageRecord], sort_by: SortBy) {
    match sort_by {
        SortBy::AvgDesc => {
            images.sort_by(|a, b| {
                let a = a.avg_rating.unwrap_or(0.0);
                let b = b.avg_rating.unwrap_or(0.0);
                b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        SortBy::CountDesc => {
            images.sort_by(|a, b| b.rating_count.cmp(&a.rating_count));
        }
        SortBy::Newest => {
            images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
    }
}

/// Keep only the first `top` items of the already-sorted sequence;
/// 0 means no truncation
pub fn apply_top_filter(images: &mut Vec<ImageRecord>, top: usize) {
    if top > 0 && images.len() > top {
        images.truncate(top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, avg: Option<f64>, count: i64, created_at: &str) -> ImageRecord {
        ImageRecord {
            id,
            url: format!("/uploads/default/{}.jpg", id),
            filename: format!("default/{}.jpg", id),
            created_at: created_at.to_string(),
            avg_rating: avg,
            rating_count: count,
            user_rating: None,
            set_name: None,
            set_slug: None,
            hidden: false,
        }
    }

    #[test]
    fn test_sort_by_average_puts_unrated_last() {
        let mut images = vec![
            record(1, None, 0, "2024-01-01T00:00:00"),
            record(2, Some(3.0), 2, "2024-01-02T00:00:00"),
            record(3, Some(4.5), 4, "2024-01-03T00:00:00"),
        ];

        sort_images(&mut images, SortBy::AvgDesc);

        let ids: Vec<i64> = images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_count() {
        let mut images = vec![
            record(1, Some(5.0), 1, "2024-01-01T00:00:00"),
            record(2, Some(2.0), 9, "2024-01-02T00:00:00"),
            record(3, Some(4.0), 3, "2024-01-03T00:00:00"),
        ];

        sort_images(&mut images, SortBy::CountDesc);

        let ids: Vec<i64> = images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_newest_is_lexicographic_descending() {
        let mut images = vec![
            record(1, None, 0, "2024-01-05T08:00:00"),
            record(2, None, 0, "2024-03-01T12:00:00"),
            record(3, None, 0, "2023-12-31T23:59:59"),
        ];

        sort_images(&mut images, SortBy::Newest);

        let ids: Vec<i64> = images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_top_filter_truncates_after_sort() {
        let mut images = vec![
            record(1, Some(4.5), 2, "2024-01-01T00:00:00"),
            record(2, Some(4.0), 2, "2024-01-02T00:00:00"),
            record(3, Some(3.5), 2, "2024-01-03T00:00:00"),
            record(4, Some(3.0), 2, "2024-01-04T00:00:00"),
        ];

        sort_images(&mut images, SortBy::AvgDesc);
        apply_top_filter(&mut images, 3);

        let ids: Vec<i64> = images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_top_filter_with_fewer_items_keeps_all() {
        let mut images = vec![
            record(1, None, 0, "2024-01-01T00:00:00"),
            record(2, None, 0, "2024-01-02T00:00:00"),
        ];

        apply_top_filter(&mut images, 5);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_top_filter_zero_means_all() {
        let mut images = vec![
            record(1, None, 0, "2024-01-01T00:00:00"),
            record(2, None, 0, "2024-01-02T00:00:00"),
        ];

        apply_top_filter(&mut images, 0);
        assert_eq!(images.len(), 2);
    }
}
