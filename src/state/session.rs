/// Fullscreen review session
///
/// A session is a snapshot of the gallery as it was rendered at open time:
/// an ordered, immutable sequence of items plus a cyclic cursor. Only the
/// current item's cached `user_rating` may change, after the backend has
/// accepted a vote. The session is torn down on exit and the gallery is
/// reloaded to reconcile with authoritative state.

use crate::api::models::ImageRecord;

/// One reviewable item, derived from a rendered gallery card
#[derive(Debug, Clone, PartialEq)]
pub struct SessionItem {
    pub id: i64,
    pub url: String,
    pub filename: String,
    /// The rater's own score, 0 = unrated
    pub user_rating: u8,
}

impl From<&ImageRecord> for SessionItem {
    fn from(record: &ImageRecord) -> Self {
        SessionItem {
            id: record.id,
            url: record.url.clone(),
            filename: record.filename.clone(),
            user_rating: record.user_rating_or_zero(),
        }
    }
}

/// The one-image-at-a-time review session.
///
/// Owned exclusively by the application state; created on open, dropped on
/// close. Membership and order never change while the session lives.
#[derive(Debug, Clone)]
pub struct FullscreenSession {
    items: Vec<SessionItem>,
    cursor: usize,
}

impl FullscreenSession {
    /// Snapshot the rendered gallery and open at `start`.
    /// Returns `None` for an empty gallery; a session always has at least
    /// one item, so cursor arithmetic never divides by zero.
    pub fn open(records: &[ImageRecord], start: i64) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let items: Vec<SessionItem> = records.iter().map(SessionItem::from).collect();
        let cursor = wrap(start, items.len());
        Some(FullscreenSession { items, cursor })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &SessionItem {
        &self.items[self.cursor]
    }

    /// Move the cursor to `index`, wrapping cyclically in both directions
    pub fn jump(&mut self, index: i64) {
        self.cursor = wrap(index, self.items.len());
    }

    /// Advance to the next item, wrapping past the end to the first
    pub fn advance(&mut self) {
        self.jump(self.cursor as i64 + 1);
    }

    /// Retreat to the previous item, wrapping before the start to the last
    pub fn retreat(&mut self) {
        self.jump(self.cursor as i64 - 1);
    }

    /// Record a successful vote for the current item.
    /// Only the current item is touched; all other cached ratings stay as
    /// they were snapshotted.
    pub fn set_current_rating(&mut self, rating: u8) {
        self.items[self.cursor].user_rating = rating;
    }

    /// Apply a vote the backend has accepted. Normally this is the current
    /// item; when a rapid navigation raced the response, the item it was
    /// submitted for is updated instead. Last response to land wins.
    pub fn record_vote(&mut self, image_id: i64, rating: u8) {
        if self.current().id == image_id {
            self.set_current_rating(rating);
        } else if let Some(item) = self.items.iter_mut().find(|i| i.id == image_id) {
            item.user_rating = rating;
        }
    }

    /// Positional progress caption, e.g. `3/4 (75.0%)`
    pub fn progress_text(&self) -> String {
        let position = self.cursor + 1;
        let total = self.items.len();
        let percent = position as f64 / total as f64 * 100.0;
        format!("{}/{} ({:.1}%)", position, total, percent)
    }

    /// Rating caption for the current item
    pub fn rating_text(&self) -> String {
        match self.current().user_rating {
            0 => "No rating yet".to_string(),
            r => format!("Your rating: {} ★", r),
        }
    }
}

/// Normalize an arbitrary index into `[0, n)` with wraparound in both
/// directions. `n` must be non-zero; sessions guarantee that.
fn wrap(index: i64, n: usize) -> usize {
    let n = n as i64;
    (((index % n) + n) % n) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<ImageRecord> {
        (0..n)
            .map(|i| ImageRecord {
                id: i as i64 + 1,
                url: format!("/uploads/default/{}.jpg", i + 1),
                filename: format!("default/{}.jpg", i + 1),
                created_at: "2024-01-01T00:00:00".to_string(),
                avg_rating: None,
                rating_count: 0,
                user_rating: if i == 0 { Some(4) } else { None },
                set_name: None,
                set_slug: None,
                hidden: false,
            })
            .collect()
    }

    #[test]
    fn test_wrap_normalizes_both_directions() {
        assert_eq!(wrap(-1, 5), 4);
        assert_eq!(wrap(5, 5), 0);
        assert_eq!(wrap(0, 5), 0);
        assert_eq!(wrap(-7, 5), 3);
        assert_eq!(wrap(12, 5), 2);
        assert_eq!(wrap(3, 1), 0);
    }

    #[test]
    fn test_open_empty_gallery_refuses() {
        assert!(FullscreenSession::open(&[], 0).is_none());
    }

    #[test]
    fn test_open_at_card_index() {
        // 4-card grid, entered from the 3rd card
        let session = FullscreenSession::open(&records(4), 2).unwrap();
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.progress_text(), "3/4 (75.0%)");
    }

    #[test]
    fn test_snapshot_carries_grid_ratings() {
        let session = FullscreenSession::open(&records(3), 0).unwrap();
        assert_eq!(session.current().user_rating, 4);
    }

    #[test]
    fn test_advance_wraps_to_first() {
        let mut session = FullscreenSession::open(&records(3), 2).unwrap();
        session.advance();
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_retreat_wraps_to_last() {
        let mut session = FullscreenSession::open(&records(3), 0).unwrap();
        session.retreat();
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.current().id, 3);
    }

    #[test]
    fn test_rating_touches_only_current_item() {
        let mut session = FullscreenSession::open(&records(3), 1).unwrap();
        session.set_current_rating(3);

        assert_eq!(session.current().user_rating, 3);
        session.retreat();
        assert_eq!(session.current().user_rating, 4); // snapshotted grid value
        session.advance();
        session.advance();
        assert_eq!(session.current().user_rating, 0);
    }

    #[test]
    fn test_record_vote_after_navigation_race() {
        // Vote submitted for item 2, response lands after moving to item 3
        let mut session = FullscreenSession::open(&records(3), 1).unwrap();
        let submitted_for = session.current().id;
        session.advance();
        session.record_vote(submitted_for, 5);

        assert_eq!(session.current().user_rating, 0);
        session.retreat();
        assert_eq!(session.current().user_rating, 5);
    }

    #[test]
    fn test_rating_text() {
        let mut session = FullscreenSession::open(&records(2), 1).unwrap();
        assert_eq!(session.rating_text(), "No rating yet");
        session.set_current_rating(3);
        assert_eq!(session.rating_text(), "Your rating: 3 ★");
    }

    #[test]
    fn test_progress_percent_single_item() {
        let session = FullscreenSession::open(&records(1), 0).unwrap();
        assert_eq!(session.progress_text(), "1/1 (100.0%)");
    }

    #[test]
    fn test_display_is_idempotent() {
        // Rendering inputs derived twice from the same state are identical
        let session = FullscreenSession::open(&records(4), 2).unwrap();
        let first = (session.current().clone(), session.progress_text(), session.rating_text());
        let second = (session.current().clone(), session.progress_text(), session.rating_text());
        assert_eq!(first, second);
    }
}
