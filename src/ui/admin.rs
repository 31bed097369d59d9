use iced::widget::{button, column, container, image, pick_list, row, scrollable, text, text_input};
use iced::{Alignment, Element, Length};

use crate::api::models::ImageRecord;
use crate::state::prefs::RatingMode;
use crate::{Message, RaterApp};

const THUMB_WIDTH: f32 = 72.0;
const THUMB_HEIGHT: f32 = 48.0;

/// The admin console: set management, uploads, the stats table and the bulk
/// destructive operations. All of it is thin request/response plumbing; the
/// update loop gates the destructive ones behind a confirmation dialog.
pub fn view(app: &RaterApp) -> Element<'_, Message> {
    let mode_section = row![
        text("Rating mode:").size(14),
        pick_list(
            RatingMode::ALL,
            Some(app.rating_mode()),
            Message::RatingModePicked,
        ),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let delete_allowed = app
        .admin_set
        .as_ref()
        .is_some_and(|set| !set.is_default());

    let sets_section = column![
        text("Sets").size(20),
        row![
            pick_list(
                app.sets.clone(),
                app.admin_set.as_ref(),
                Message::AdminSetPicked,
            )
            .placeholder("Select a set"),
            text_input("New set name", &app.new_set_name)
                .on_input(Message::NewSetNameInput)
                .width(Length::Fixed(180.0)),
            button("Create").on_press(Message::CreateSet),
            button("Rename").on_press_maybe(
                app.admin_set.is_some().then_some(Message::RenameSet),
            ),
            button("Delete").on_press_maybe(delete_allowed.then_some(Message::DeleteSet)),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
    ]
    .spacing(8);

    let upload_section = column![
        text("Upload").size(20),
        row![
            button("Upload photos…").on_press(Message::PickUpload),
            text(upload_target(app)).size(14),
            text(&app.upload_status).size(14),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
    ]
    .spacing(8);

    let stats_controls = row![
        pick_list(
            app.sets.clone(),
            app.stats_set.as_ref(),
            Message::StatsSetPicked,
        )
        .placeholder("All sets"),
        button("Refresh").on_press(Message::RefreshStats),
        text_input("Top N", &app.top_n_input)
            .on_input(Message::TopNInput)
            .width(Length::Fixed(80.0)),
        button("Load top").on_press(Message::LoadTop),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mut table = column![stats_header()].spacing(4);
    for record in &app.stats {
        table = table.push(stats_row(app, record));
    }

    let danger_section = column![
        text("Danger zone").size(20),
        row![
            button("Remove all votes").on_press(Message::RemoveVotes),
            button("Delete ALL data").on_press(Message::DeleteAllData),
            button("Normalize default set").on_press(Message::NormalizeDefault),
            button("Download votes").on_press(Message::DownloadVotes),
        ]
        .spacing(10),
    ]
    .spacing(8);

    let content = column![
        mode_section,
        sets_section,
        upload_section,
        text("Stats").size(20),
        stats_controls,
        table,
        danger_section,
        text(&app.admin_status).size(14),
    ]
    .spacing(16)
    .padding(16);

    scrollable(container(content).width(Length::Fill)).into()
}

fn upload_target(app: &RaterApp) -> String {
    match &app.admin_set {
        Some(set) => format!("into {}", set.name),
        None => "into Default".to_string(),
    }
}

fn stats_header<'a>() -> Element<'a, Message> {
    row![
        text("Photo").size(14).width(Length::Fixed(THUMB_WIDTH)),
        text("Filename").size(14).width(Length::FillPortion(3)),
        text("Set").size(14).width(Length::FillPortion(2)),
        text("Uploaded").size(14).width(Length::FillPortion(2)),
        text("Avg").size(14).width(Length::FillPortion(1)),
        text("Votes").size(14).width(Length::FillPortion(1)),
        text("").size(14).width(Length::FillPortion(2)),
    ]
    .spacing(8)
    .into()
}

fn stats_row<'a>(app: &'a RaterApp, record: &'a ImageRecord) -> Element<'a, Message> {
    let thumb: Element<'a, Message> = match app.photos.get(&record.id) {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(THUMB_WIDTH))
            .height(Length::Fixed(THUMB_HEIGHT))
            .into(),
        None => container(text("…"))
            .width(Length::Fixed(THUMB_WIDTH))
            .height(Length::Fixed(THUMB_HEIGHT))
            .into(),
    };

    let avg = record
        .avg_rating
        .map(|a| format!("{:.2}", a))
        .unwrap_or_else(|| "-".to_string());

    let hide_label = if record.hidden { "Unhide" } else { "Hide" };

    row![
        thumb,
        text(&record.filename).size(13).width(Length::FillPortion(3)),
        text(record.set_name.as_deref().unwrap_or(""))
            .size(13)
            .width(Length::FillPortion(2)),
        text(upload_date(&record.created_at))
            .size(13)
            .width(Length::FillPortion(2)),
        text(avg).size(13).width(Length::FillPortion(1)),
        text(record.rating_count.to_string())
            .size(13)
            .width(Length::FillPortion(1)),
        row![
            button(text(hide_label).size(13)).on_press(Message::HidePhoto {
                image_id: record.id,
                hide: !record.hidden,
            }),
            button(text("Delete").size(13)).on_press(Message::DeletePhoto(record.id)),
        ]
        .spacing(6)
        .width(Length::FillPortion(2)),
    ]
    .spacing(8)
    .align_y(Alignment::Center)
    .into()
}

/// Render the backend's ISO-8601 timestamp as a plain date; fall back to the
/// raw string when it doesn't parse
pub fn upload_date(created_at: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_date_parses_iso8601() {
        assert_eq!(upload_date("2024-05-01T10:30:00.123456"), "2024-05-01");
        assert_eq!(upload_date("2024-05-01T10:30:00"), "2024-05-01");
    }

    #[test]
    fn test_upload_date_falls_back_to_raw() {
        assert_eq!(upload_date("yesterday"), "yesterday");
    }
}
