use iced::widget::{button, column, container, image, pick_list, row, scrollable, text, text_input};
use iced::{Alignment, Element, Length};

use crate::api::models::ImageRecord;
use crate::state::gallery::SortBy;
use crate::{Message, RaterApp};

/// How many cards per grid row
const GRID_COLUMNS: usize = 4;
const CARD_WIDTH: f32 = 230.0;
const CARD_PHOTO_HEIGHT: f32 = 160.0;

/// The gallery screen: identity header, filter controls and the card grid
pub fn view(app: &RaterApp) -> Element<'_, Message> {
    let header = row![
        text_input("Your name", &app.name_input)
            .on_input(Message::NameInput)
            .on_submit(Message::SaveName)
            .width(Length::Fixed(180.0)),
        button("Save").on_press(Message::SaveName),
        pick_list(
            app.users.clone(),
            known_user(app),
            Message::UserPicked,
        )
        .placeholder("Pick a rater"),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let controls = row![
        pick_list(SortBy::ALL, Some(app.sort_by), Message::SortPicked),
        text_input("Top N (0 = all)", &app.top_filter_input)
            .on_input(Message::TopFilterInput)
            .width(Length::Fixed(110.0)),
        pick_list(
            app.sets.clone(),
            app.gallery_set.as_ref(),
            Message::GallerySetPicked,
        )
        .placeholder("All sets"),
        button("Apply").on_press(Message::ApplyFilters),
        button("Fullscreen").on_press_maybe(
            (!app.images.is_empty()).then_some(Message::OpenFullscreen(0)),
        ),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mut grid = column![].spacing(14);
    for (row_index, chunk) in app.images.chunks(GRID_COLUMNS).enumerate() {
        let mut cards = row![].spacing(14);
        for (col_index, record) in chunk.iter().enumerate() {
            cards = cards.push(card(app, record, row_index * GRID_COLUMNS + col_index));
        }
        grid = grid.push(cards);
    }

    let content = column![
        header,
        controls,
        text(&app.status).size(14),
        scrollable(grid).height(Length::Fill),
    ]
    .spacing(12)
    .padding(16);

    container(content).width(Length::Fill).height(Length::Fill).into()
}

/// One gallery card: the photo (double-click to review fullscreen), the meta
/// line and the 5-star control
fn card<'a>(app: &'a RaterApp, record: &'a ImageRecord, index: usize) -> Element<'a, Message> {
    let photo: Element<'a, Message> = match app.photos.get(&record.id) {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(CARD_PHOTO_HEIGHT))
            .into(),
        None => container(text("Loading…").size(14))
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(CARD_PHOTO_HEIGHT))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
    };

    column![
        button(photo).on_press(Message::CardPhotoClicked(index)).padding(0),
        text(&record.filename).size(12),
        text(meta_line(record)).size(12),
        star_row(record.id, record.user_rating_or_zero()),
    ]
    .spacing(4)
    .width(Length::Fixed(CARD_WIDTH))
    .into()
}

/// The per-card aggregate line, refreshed after each vote
pub fn meta_line(record: &ImageRecord) -> String {
    match record.avg_rating {
        Some(avg) => format!("{:.2} avg • {} votes", avg, record.rating_count),
        None => "No votes yet".to_string(),
    }
}

/// Five clickable stars reflecting the rater's own score
fn star_row<'a>(image_id: i64, current: u8) -> Element<'a, Message> {
    let mut stars = row![].spacing(2);
    for value in 1..=5u8 {
        let glyph = if value <= current { "★" } else { "☆" };
        stars = stars.push(
            button(text(glyph).size(18))
                .on_press(Message::CardStarClicked { image_id, rating: value })
                .padding(2),
        );
    }
    stars.into()
}

/// The saved rater name, but only when it is one of the known raters
/// (otherwise the pick list shows its placeholder)
fn known_user(app: &RaterApp) -> Option<String> {
    let name = app.prefs_name();
    app.users.contains(&name).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(avg: Option<f64>, count: i64) -> ImageRecord {
        ImageRecord {
            id: 1,
            url: "/uploads/default/a.jpg".to_string(),
            filename: "default/a.jpg".to_string(),
            created_at: "2024-01-01T00:00:00".to_string(),
            avg_rating: avg,
            rating_count: count,
            user_rating: None,
            set_name: None,
            set_slug: None,
            hidden: false,
        }
    }

    #[test]
    fn test_meta_line_with_votes() {
        assert_eq!(meta_line(&record(Some(4.25), 4)), "4.25 avg • 4 votes");
    }

    #[test]
    fn test_meta_line_unrated() {
        assert_eq!(meta_line(&record(None, 0)), "No votes yet");
    }
}
