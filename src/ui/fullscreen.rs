use iced::widget::{button, column, container, horizontal_space, image, row, text};
use iced::{Alignment, Element, Length};

use crate::state::prefs::RatingMode;
use crate::state::session::FullscreenSession;
use crate::{Message, RaterApp};

/// The fullscreen review surface.
///
/// Pure function of (session, rating mode, fetched photo bytes): rendering
/// the same state twice yields the same output. The rating widget follows
/// the persisted mode, re-read on every render, so a mode switch in the
/// admin screen applies on the next navigation without reopening.
pub fn view<'a>(app: &'a RaterApp, session: &'a FullscreenSession) -> Element<'a, Message> {
    let item = session.current();

    let top_bar = row![
        text(format!("User: {}", app.prefs_name())).size(14),
        horizontal_space(),
        text(session.progress_text()).size(14),
        horizontal_space(),
        button("Exit (Esc)").on_press(Message::ExitFullscreen),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let photo: Element<'a, Message> = match app.photos.get(&item.id) {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => container(text("Loading…").size(20))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
    };

    let rating_widget: Element<'a, Message> = match app.rating_mode() {
        RatingMode::Star => star_row(item.user_rating),
        RatingMode::YesNo => row![
            button(text("Yes (↑)").size(18)).on_press(Message::FsVote(true)),
            button(text("No (↓)").size(18)).on_press(Message::FsVote(false)),
        ]
        .spacing(20)
        .into(),
    };

    let caption = match &app.fs_notice {
        Some(notice) => notice.clone(),
        None => session.rating_text(),
    };

    let footer = column![
        text(&item.filename).size(14),
        rating_widget,
        text(caption).size(16),
        row![
            button("◀ Prev").on_press(Message::FsPrev),
            button("Next ▶").on_press(Message::FsNext),
        ]
        .spacing(20),
    ]
    .spacing(8)
    .align_x(Alignment::Center);

    container(
        column![top_bar, photo, footer]
            .spacing(10)
            .align_x(Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .padding(16)
    .into()
}

/// Large star buttons; digits 1-5 drive the same messages
fn star_row<'a>(current: u8) -> Element<'a, Message> {
    let mut stars = row![].spacing(6);
    for value in 1..=5u8 {
        let glyph = if value <= current { "★" } else { "☆" };
        stars = stars.push(
            button(text(glyph).size(30))
                .on_press(Message::FsStarClicked(value))
                .padding(4),
        );
    }
    stars.into()
}
