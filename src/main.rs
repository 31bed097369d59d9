use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use iced::widget::image::Handle;
use iced::widget::{button, column, row};
use iced::{keyboard, Element, Length, Subscription, Task, Theme};
use tracing::{error, info, warn};

use crate::api::models::{ImageRecord, NormalizeReport, SetRecord, SetSummary, UploadReport};
use crate::api::ApiClient;
use crate::state::gallery::{apply_top_filter, sort_images, SortBy};
use crate::state::prefs::{Prefs, RatingMode};
use crate::state::session::FullscreenSession;

mod api;
mod state;
mod ui;

/// Backend to talk to when FAMILY_RATER_URL is not set
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Pause between a successful yes/no vote and the automatic advance,
/// long enough to read the confirmation during rapid sequential review
const YESNO_ADVANCE_DELAY: Duration = Duration::from_millis(400);

/// Two clicks on the same card within this window count as a double-click
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Which surface is showing (fullscreen review overlays either)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Gallery,
    Admin,
}

/// Keyboard input inside the fullscreen session, decoded before the rating
/// mode is consulted; the update loop drops keys the current mode ignores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Next,
    Prev,
    Digit(u8),
    VoteYes,
    VoteNo,
    Exit,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ScreenSelected(Screen),

    // Identity
    NameInput(String),
    SaveName,
    UserPicked(String),
    UsersLoaded(Result<Vec<String>, String>),

    // Gallery
    SortPicked(SortBy),
    TopFilterInput(String),
    GallerySetPicked(SetRecord),
    ApplyFilters,
    GalleryLoaded(Result<Vec<ImageRecord>, String>),
    PhotoFetched(i64, Result<Vec<u8>, String>),
    CardStarClicked { image_id: i64, rating: u8 },
    CardRated { image_id: i64, rating: u8, result: Result<(), String> },
    CardMetaRefreshed(Result<ImageRecord, String>),

    // Fullscreen review
    CardPhotoClicked(usize),
    OpenFullscreen(usize),
    ExitFullscreen,
    FsKey(NavKey),
    FsNext,
    FsPrev,
    FsStarClicked(u8),
    FsRated { image_id: i64, rating: u8, result: Result<(), String> },
    FsVote(bool),
    FsVoted { image_id: i64, yes: bool, result: Result<(), String> },
    FsAdvanceTick,

    // Admin
    RatingModePicked(RatingMode),
    SetsLoaded(Result<Vec<SetRecord>, String>),
    AdminSetPicked(SetRecord),
    StatsSetPicked(SetRecord),
    NewSetNameInput(String),
    CreateSet,
    SetCreated(Result<SetSummary, String>),
    RenameSet,
    SetRenamed(Result<SetSummary, String>),
    DeleteSet,
    SetDeleted(Result<(), String>),
    RefreshStats,
    StatsLoaded(Result<Vec<ImageRecord>, String>),
    TopNInput(String),
    LoadTop,
    HidePhoto { image_id: i64, hide: bool },
    DeletePhoto(i64),
    AdminActionDone { note: &'static str, result: Result<(), String> },
    RemoveVotes,
    DeleteAllData,
    NormalizeDefault,
    Normalized(Result<NormalizeReport, String>),
    PickUpload,
    UploadDone(Result<UploadReport, String>),
    DownloadVotes,
    VotesDownloaded(Result<serde_json::Value, String>),
}

/// Main application state.
///
/// The fullscreen session lives here as `Option<FullscreenSession>`: exactly
/// one exclusive owner, created on open and dropped on close, so no other
/// component can mutate review state behind the navigator's back.
pub struct RaterApp {
    api: ApiClient,
    prefs: Prefs,
    screen: Screen,

    // Identity
    pub name_input: String,
    pub users: Vec<String>,

    // Gallery
    pub sets: Vec<SetRecord>,
    pub gallery_set: Option<SetRecord>,
    pub sort_by: SortBy,
    pub top_filter_input: String,
    pub images: Vec<ImageRecord>,
    pub photos: HashMap<i64, Handle>,
    pub status: String,
    last_card_click: Option<(usize, Instant)>,

    // Fullscreen review
    session: Option<FullscreenSession>,
    pub fs_notice: Option<String>,

    // Admin
    pub stats: Vec<ImageRecord>,
    pub admin_set: Option<SetRecord>,
    pub stats_set: Option<SetRecord>,
    pub new_set_name: String,
    pub top_n_input: String,
    pub upload_status: String,
    pub admin_status: String,
}

impl RaterApp {
    fn new() -> (Self, Task<Message>) {
        // Without the prefs database there is no rater identity to vote as
        let prefs = Prefs::open()
            .expect("Failed to initialize preferences database. Check permissions and disk space.");

        let base_url = std::env::var("FAMILY_RATER_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        info!(%base_url, "connecting to rating backend");

        let name_input = prefs.rater_name();
        let app = RaterApp {
            api: ApiClient::new(&base_url),
            prefs,
            screen: Screen::Gallery,
            name_input,
            users: Vec::new(),
            sets: Vec::new(),
            gallery_set: None,
            sort_by: SortBy::default(),
            top_filter_input: String::new(),
            images: Vec::new(),
            photos: HashMap::new(),
            status: String::new(),
            last_card_click: None,
            session: None,
            fs_notice: None,
            stats: Vec::new(),
            admin_set: None,
            stats_set: None,
            new_set_name: String::new(),
            top_n_input: "5".to_string(),
            upload_status: String::new(),
            admin_status: String::new(),
        };

        let startup = Task::batch([
            app.load_sets_task(),
            app.load_users_task(),
            app.load_gallery_task(),
        ]);
        (app, startup)
    }

    /// The rater identity as stored (trimmed; empty = not set)
    pub fn prefs_name(&self) -> String {
        self.prefs.rater_name()
    }

    /// The persisted rating mode, re-read on every render so a switch in the
    /// admin screen takes effect on the next fullscreen display
    pub fn rating_mode(&self) -> RatingMode {
        self.prefs.rating_mode()
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ScreenSelected(screen) => {
                self.screen = screen;
                if screen == Screen::Admin {
                    return Task::batch([self.load_sets_task(), self.load_stats_task()]);
                }
                Task::none()
            }

            // ========== Identity ==========
            Message::NameInput(value) => {
                self.name_input = value;
                Task::none()
            }
            Message::SaveName => {
                let name = self.name_input.trim().to_string();
                if name.is_empty() {
                    alert("Name required", "Please enter a name.");
                    return Task::none();
                }
                if let Err(e) = self.prefs.set_rater_name(&name) {
                    error!("failed to persist rater name: {e}");
                }
                Task::batch([self.load_users_task(), self.load_gallery_task()])
            }
            Message::UserPicked(name) => {
                if let Err(e) = self.prefs.set_rater_name(&name) {
                    error!("failed to persist rater name: {e}");
                }
                self.name_input = name;
                self.load_gallery_task()
            }
            Message::UsersLoaded(Ok(users)) => {
                self.users = users;
                // Keep the saved name selectable even before its first vote
                let current = self.prefs_name();
                if !current.is_empty() && !self.users.contains(&current) {
                    self.users.push(current);
                }
                Task::none()
            }
            Message::UsersLoaded(Err(e)) => {
                error!("failed to load raters: {e}");
                Task::none()
            }

            // ========== Gallery ==========
            Message::SortPicked(sort_by) => {
                self.sort_by = sort_by;
                Task::none()
            }
            Message::TopFilterInput(value) => {
                self.top_filter_input = value;
                Task::none()
            }
            Message::GallerySetPicked(set) => {
                self.gallery_set = Some(set);
                self.load_gallery_task()
            }
            Message::ApplyFilters => self.load_gallery_task(),
            Message::GalleryLoaded(Ok(mut images)) => {
                sort_images(&mut images, self.sort_by);
                let top = self.top_filter_input.trim().parse().unwrap_or(0);
                apply_top_filter(&mut images, top);

                self.status = format!("{} photos", images.len());
                let fetch = self.fetch_photos_task(&images);
                self.images = images;
                prune_photos(&mut self.photos, &self.images, &self.stats);
                fetch
            }
            Message::GalleryLoaded(Err(e)) => {
                // Read-path failure: log it, keep whatever was on screen
                error!("gallery load failed: {e}");
                Task::none()
            }
            Message::PhotoFetched(id, Ok(bytes)) => {
                self.photos.insert(id, Handle::from_bytes(bytes));
                Task::none()
            }
            Message::PhotoFetched(id, Err(e)) => {
                warn!(image_id = id, "photo fetch failed: {e}");
                Task::none()
            }
            Message::CardStarClicked { image_id, rating } => {
                let Some(user) = self.require_user() else {
                    return Task::none();
                };
                let api = self.api.clone();
                Task::perform(
                    async move { api.rate(image_id, &user, rating).await.map_err(|e| e.to_string()) },
                    move |result| Message::CardRated { image_id, rating, result },
                )
            }
            Message::CardRated { image_id, rating, result } => match result {
                Ok(()) => {
                    if let Some(record) = self.images.iter_mut().find(|r| r.id == image_id) {
                        record.user_rating = Some(rating);
                    }
                    // Refresh just this card's aggregates; no re-sort, no full reload
                    let api = self.api.clone();
                    Task::perform(
                        async move { api.image(image_id).await.map_err(|e| e.to_string()) },
                        Message::CardMetaRefreshed,
                    )
                }
                Err(e) => {
                    alert("Rating failed", &e);
                    Task::none()
                }
            },
            Message::CardMetaRefreshed(Ok(fresh)) => {
                if let Some(record) = self.images.iter_mut().find(|r| r.id == fresh.id) {
                    record.avg_rating = fresh.avg_rating;
                    record.rating_count = fresh.rating_count;
                }
                Task::none()
            }
            Message::CardMetaRefreshed(Err(e)) => {
                warn!("card refresh failed: {e}");
                Task::none()
            }

            // ========== Fullscreen review ==========
            Message::CardPhotoClicked(index) => {
                let now = Instant::now();
                if is_double_click(self.last_card_click.take(), index, now) {
                    return self.update(Message::OpenFullscreen(index));
                }
                self.last_card_click = Some((index, now));
                Task::none()
            }
            Message::OpenFullscreen(index) => {
                // Snapshot the rendered grid, not a fresh fetch: grid-view
                // votes are reflected, concurrent votes by others are not
                self.fs_notice = None;
                self.session = FullscreenSession::open(&self.images, index as i64);
                if let Some(session) = &self.session {
                    info!(cursor = session.cursor(), total = session.len(), "fullscreen session opened");
                }
                Task::none()
            }
            Message::ExitFullscreen => self.close_session(),
            Message::FsNext => {
                self.navigate(1);
                Task::none()
            }
            Message::FsPrev => {
                self.navigate(-1);
                Task::none()
            }
            Message::FsKey(key) => self.handle_nav_key(key),
            Message::FsStarClicked(rating) => self.submit_fs_star(rating),
            Message::FsRated { image_id, rating, result } => {
                match result {
                    Ok(()) => {
                        if let Some(session) = &mut self.session {
                            session.record_vote(image_id, rating);
                        }
                        self.fs_notice = Some(format!("Your rating: {} ★ (Saved!)", rating));
                    }
                    Err(e) => {
                        // Inline notice here, unlike the blocking alert in grid view
                        warn!(image_id, "fullscreen rating failed: {e}");
                        self.fs_notice = Some("Rating failed.".to_string());
                    }
                }
                Task::none()
            }
            Message::FsVote(yes) => self.submit_fs_vote(yes),
            Message::FsVoted { image_id, yes, result } => {
                if let Err(e) = &result {
                    warn!(image_id, "yes/no vote failed: {e}");
                } else if let Some(session) = &mut self.session {
                    // The backend stores Yes as 5 and No as 1
                    session.record_vote(image_id, if yes { 5 } else { 1 });
                }
                let (notice, advance_after) = yesno_followup(yes, result.is_ok());
                self.fs_notice = Some(notice);
                match advance_after {
                    Some(delay) => {
                        Task::perform(tokio::time::sleep(delay), |_| Message::FsAdvanceTick)
                    }
                    None => Task::none(),
                }
            }
            Message::FsAdvanceTick => {
                self.navigate(1);
                Task::none()
            }

            // ========== Admin ==========
            Message::RatingModePicked(mode) => {
                if let Err(e) = self.prefs.set_rating_mode(mode) {
                    error!("failed to persist rating mode: {e}");
                }
                Task::none()
            }
            Message::SetsLoaded(Ok(sets)) => {
                self.sets = sets;
                self.gallery_set = reselect(&self.sets, self.gallery_set.take());
                self.stats_set = reselect(&self.sets, self.stats_set.take());
                self.admin_set = reselect(&self.sets, self.admin_set.take())
                    .or_else(|| self.sets.first().cloned());
                Task::none()
            }
            Message::SetsLoaded(Err(e)) => {
                error!("failed to load sets: {e}");
                Task::none()
            }
            Message::AdminSetPicked(set) => {
                self.admin_set = Some(set);
                Task::none()
            }
            Message::StatsSetPicked(set) => {
                self.stats_set = Some(set);
                self.load_stats_task()
            }
            Message::NewSetNameInput(value) => {
                self.new_set_name = value;
                Task::none()
            }
            Message::CreateSet => {
                let name = self.new_set_name.trim().to_string();
                if name.is_empty() {
                    alert("Set name required", "Enter a set name.");
                    return Task::none();
                }
                let api = self.api.clone();
                Task::perform(
                    async move { api.create_set(&name).await.map_err(|e| e.to_string()) },
                    Message::SetCreated,
                )
            }
            Message::SetCreated(Ok(set)) => {
                self.admin_status = format!("Created set '{}'.", set.name);
                self.new_set_name.clear();
                self.load_sets_task()
            }
            Message::SetCreated(Err(e)) => {
                alert("Failed to create set", &e);
                Task::none()
            }
            Message::RenameSet => {
                let Some(set) = self.admin_set.clone() else {
                    return Task::none();
                };
                let name = self.new_set_name.trim().to_string();
                if name.is_empty() {
                    alert("Set name required", "Type the new name into the set name field.");
                    return Task::none();
                }
                let api = self.api.clone();
                Task::perform(
                    async move { api.rename_set(set.id, &name).await.map_err(|e| e.to_string()) },
                    Message::SetRenamed,
                )
            }
            Message::SetRenamed(Ok(set)) => {
                self.admin_status = format!("Renamed set to '{}'.", set.name);
                self.new_set_name.clear();
                Task::batch([self.load_sets_task(), self.load_stats_task()])
            }
            Message::SetRenamed(Err(e)) => {
                alert("Rename failed", &e);
                Task::none()
            }
            Message::DeleteSet => {
                // Always the currently selected set; the default set is
                // filtered out before this message can fire
                let Some(set) = self.admin_set.clone() else {
                    return Task::none();
                };
                if set.is_default() {
                    alert("Not allowed", "Cannot delete the default set.");
                    return Task::none();
                }
                let prompt = format!(
                    "Delete this set and its {} images? This cannot be undone.",
                    set.image_count
                );
                if !confirm("Delete set", &prompt) {
                    return Task::none();
                }
                let api = self.api.clone();
                Task::perform(
                    async move { api.delete_set(set.id).await.map_err(|e| e.to_string()) },
                    Message::SetDeleted,
                )
            }
            Message::SetDeleted(Ok(())) => {
                self.admin_status = "Set deleted.".to_string();
                self.admin_set = None;
                Task::batch([self.load_sets_task(), self.load_stats_task()])
            }
            Message::SetDeleted(Err(e)) => {
                alert("Delete failed", &e);
                Task::none()
            }
            Message::RefreshStats => self.load_stats_task(),
            Message::StatsLoaded(Ok(stats)) => {
                let fetch = self.fetch_photos_task(&stats);
                self.stats = stats;
                prune_photos(&mut self.photos, &self.images, &self.stats);
                fetch
            }
            Message::StatsLoaded(Err(e)) => {
                error!("stats load failed: {e}");
                Task::none()
            }
            Message::TopNInput(value) => {
                self.top_n_input = value;
                Task::none()
            }
            Message::LoadTop => {
                let limit = self.top_n_input.trim().parse().unwrap_or(5);
                let set = self.stats_set.as_ref().map(|s| s.slug.clone());
                let api = self.api.clone();
                Task::perform(
                    async move { api.top(limit, set.as_deref()).await.map_err(|e| e.to_string()) },
                    Message::StatsLoaded,
                )
            }
            Message::HidePhoto { image_id, hide } => {
                let api = self.api.clone();
                Task::perform(
                    async move { api.hide_photo(image_id, hide).await.map_err(|e| e.to_string()) },
                    |result| Message::AdminActionDone { note: "Visibility updated.", result },
                )
            }
            Message::DeletePhoto(image_id) => {
                if !confirm("Delete photo", "Delete this photo and all its votes?") {
                    return Task::none();
                }
                let api = self.api.clone();
                Task::perform(
                    async move { api.delete_photo(image_id).await.map_err(|e| e.to_string()) },
                    |result| Message::AdminActionDone { note: "Photo deleted.", result },
                )
            }
            Message::RemoveVotes => {
                if !confirm(
                    "Remove all votes",
                    "Are you sure you want to remove ALL votes? This cannot be undone.",
                ) {
                    return Task::none();
                }
                let api = self.api.clone();
                Task::perform(
                    async move { api.remove_votes().await.map_err(|e| e.to_string()) },
                    |result| Message::AdminActionDone { note: "All votes removed.", result },
                )
            }
            Message::DeleteAllData => {
                if !confirm(
                    "Delete all data",
                    "Are you sure you want to DELETE ALL DATA (images and votes)? This cannot be undone.",
                ) {
                    return Task::none();
                }
                let api = self.api.clone();
                Task::perform(
                    async move { api.delete_all_data().await.map_err(|e| e.to_string()) },
                    |result| Message::AdminActionDone { note: "All data deleted.", result },
                )
            }
            Message::AdminActionDone { note, result } => match result {
                Ok(()) => {
                    self.admin_status = note.to_string();
                    self.load_stats_task()
                }
                Err(e) => {
                    alert("Operation failed", &e);
                    Task::none()
                }
            },
            Message::NormalizeDefault => {
                if !confirm(
                    "Normalize default set",
                    "Move unassigned files into the default set and update the database?",
                ) {
                    return Task::none();
                }
                let api = self.api.clone();
                Task::perform(
                    async move { api.normalize_default().await.map_err(|e| e.to_string()) },
                    Message::Normalized,
                )
            }
            Message::Normalized(Ok(report)) => {
                self.admin_status = format!(
                    "Moved {} files, updated {} rows, missing: {}.",
                    report.moved.len(),
                    report.updated_ids.len(),
                    report.missing.len()
                );
                Task::batch([self.load_sets_task(), self.load_stats_task()])
            }
            Message::Normalized(Err(e)) => {
                alert("Normalization failed", &e);
                Task::none()
            }
            Message::PickUpload => {
                let Some(paths) = rfd::FileDialog::new()
                    .set_title("Select photos to upload")
                    .add_filter("Images", &["jpg", "jpeg", "png", "gif", "webp"])
                    .pick_files()
                else {
                    return Task::none();
                };
                self.upload_status = "Uploading…".to_string();
                let set = self.admin_set.as_ref().map(|s| s.slug.clone());
                let api = self.api.clone();
                Task::perform(
                    async move { api.upload(paths, set).await.map_err(|e| e.to_string()) },
                    Message::UploadDone,
                )
            }
            Message::UploadDone(Ok(report)) => {
                self.upload_status = format!("Uploaded {} files.", report.saved.len());
                Task::batch([self.load_sets_task(), self.load_stats_task()])
            }
            Message::UploadDone(Err(e)) => {
                error!("upload failed: {e}");
                self.upload_status = "Upload failed.".to_string();
                Task::none()
            }
            Message::DownloadVotes => {
                let api = self.api.clone();
                Task::perform(
                    async move { api.download_votes().await.map_err(|e| e.to_string()) },
                    Message::VotesDownloaded,
                )
            }
            Message::VotesDownloaded(Ok(votes)) => {
                let Some(path) = rfd::FileDialog::new()
                    .set_title("Save votes export")
                    .set_file_name("votes.json")
                    .save_file()
                else {
                    return Task::none();
                };
                let json = serde_json::to_string_pretty(&votes)
                    .unwrap_or_else(|_| votes.to_string());
                match std::fs::write(&path, json) {
                    Ok(()) => {
                        self.admin_status = format!("Votes exported to {}.", path.display());
                    }
                    Err(e) => alert("Failed to save votes", &e.to_string()),
                }
                Task::none()
            }
            Message::VotesDownloaded(Err(e)) => {
                alert("Failed to download votes", &e);
                Task::none()
            }
        }
    }

    /// Move the fullscreen cursor one step with cyclic wraparound
    fn navigate(&mut self, delta: i64) {
        if let Some(session) = &mut self.session {
            if delta >= 0 {
                session.advance();
            } else {
                session.retreat();
            }
            self.fs_notice = None;
        }
    }

    /// Tear down the session and reload the gallery to reconcile with
    /// authoritative backend state
    fn close_session(&mut self) -> Task<Message> {
        if self.session.take().is_some() {
            self.fs_notice = None;
            return self.load_gallery_task();
        }
        Task::none()
    }

    fn handle_nav_key(&mut self, key: NavKey) -> Task<Message> {
        match key {
            NavKey::Next => {
                self.navigate(1);
                Task::none()
            }
            NavKey::Prev => {
                self.navigate(-1);
                Task::none()
            }
            NavKey::Exit => self.close_session(),
            // Rating keys depend on the persisted mode at the time the key
            // lands; keys of the inactive mode are ignored
            NavKey::Digit(rating) => match self.rating_mode() {
                RatingMode::Star => self.submit_fs_star(rating),
                RatingMode::YesNo => Task::none(),
            },
            NavKey::VoteYes => match self.rating_mode() {
                RatingMode::YesNo => self.submit_fs_vote(true),
                RatingMode::Star => Task::none(),
            },
            NavKey::VoteNo => match self.rating_mode() {
                RatingMode::YesNo => self.submit_fs_vote(false),
                RatingMode::Star => Task::none(),
            },
        }
    }

    fn submit_fs_star(&mut self, rating: u8) -> Task<Message> {
        let Some(session) = &self.session else {
            return Task::none();
        };
        let image_id = session.current().id;
        let Some(user) = self.require_user() else {
            return Task::none();
        };
        let api = self.api.clone();
        Task::perform(
            async move { api.rate(image_id, &user, rating).await.map_err(|e| e.to_string()) },
            move |result| Message::FsRated { image_id, rating, result },
        )
    }

    fn submit_fs_vote(&mut self, yes: bool) -> Task<Message> {
        let Some(session) = &self.session else {
            return Task::none();
        };
        let image_id = session.current().id;
        let Some(user) = self.require_user() else {
            return Task::none();
        };
        let api = self.api.clone();
        Task::perform(
            async move { api.rate_yesno(image_id, &user, yes).await.map_err(|e| e.to_string()) },
            move |result| Message::FsVoted { image_id, yes, result },
        )
    }

    /// The saved rater name, or an alert and `None` when none is saved yet
    fn require_user(&self) -> Option<String> {
        let name = self.prefs_name();
        if name.is_empty() {
            alert(
                "Name required",
                "Please enter your name (top left) and click Save.",
            );
            return None;
        }
        Some(name)
    }

    // ========== Background tasks ==========

    fn load_gallery_task(&self) -> Task<Message> {
        let api = self.api.clone();
        let set = self.gallery_set.as_ref().map(|s| s.slug.clone());
        let user = Some(self.prefs_name()).filter(|n| !n.is_empty());
        Task::perform(
            async move {
                api.images(set.as_deref(), user.as_deref())
                    .await
                    .map_err(|e| e.to_string())
            },
            Message::GalleryLoaded,
        )
    }

    fn load_stats_task(&self) -> Task<Message> {
        let api = self.api.clone();
        let set = self.stats_set.as_ref().map(|s| s.slug.clone());
        Task::perform(
            async move { api.images(set.as_deref(), None).await.map_err(|e| e.to_string()) },
            Message::StatsLoaded,
        )
    }

    fn load_sets_task(&self) -> Task<Message> {
        let api = self.api.clone();
        Task::perform(
            async move { api.sets().await.map_err(|e| e.to_string()) },
            Message::SetsLoaded,
        )
    }

    fn load_users_task(&self) -> Task<Message> {
        let api = self.api.clone();
        Task::perform(
            async move { api.all_users().await.map_err(|e| e.to_string()) },
            Message::UsersLoaded,
        )
    }

    /// Fetch photo bytes for any record we have no handle for yet
    fn fetch_photos_task(&self, records: &[ImageRecord]) -> Task<Message> {
        let mut tasks = Vec::new();
        for record in records {
            if self.photos.contains_key(&record.id) {
                continue;
            }
            let api = self.api.clone();
            let id = record.id;
            let url = record.url.clone();
            tasks.push(Task::perform(
                async move { (id, api.fetch_photo(&url).await.map_err(|e| e.to_string())) },
                |(id, result)| Message::PhotoFetched(id, result),
            ));
        }
        Task::batch(tasks)
    }

    // ========== iced plumbing ==========

    fn view(&self) -> Element<'_, Message> {
        if let Some(session) = &self.session {
            return ui::fullscreen::view(self, session);
        }

        let tabs = row![
            button("Gallery").on_press_maybe(
                (self.screen != Screen::Gallery).then_some(Message::ScreenSelected(Screen::Gallery)),
            ),
            button("Admin").on_press_maybe(
                (self.screen != Screen::Admin).then_some(Message::ScreenSelected(Screen::Admin)),
            ),
        ]
        .spacing(10)
        .padding(10);

        let body = match self.screen {
            Screen::Gallery => ui::gallery::view(self),
            Screen::Admin => ui::admin::view(self),
        };

        column![tabs, body].height(Length::Fill).into()
    }

    fn subscription(&self) -> Subscription<Message> {
        // Keyboard navigation only exists inside a fullscreen session
        if self.session.is_some() {
            keyboard::on_key_press(handle_key)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Decode fullscreen keyboard input into navigation commands
fn handle_key(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    use keyboard::key::Named;

    match key.as_ref() {
        keyboard::Key::Named(Named::ArrowRight) => Some(Message::FsKey(NavKey::Next)),
        keyboard::Key::Named(Named::ArrowLeft) => Some(Message::FsKey(NavKey::Prev)),
        keyboard::Key::Named(Named::ArrowUp) => Some(Message::FsKey(NavKey::VoteYes)),
        keyboard::Key::Named(Named::ArrowDown) => Some(Message::FsKey(NavKey::VoteNo)),
        keyboard::Key::Named(Named::Escape) => Some(Message::FsKey(NavKey::Exit)),
        keyboard::Key::Character(c) => c
            .parse::<u8>()
            .ok()
            .filter(|digit| (1..=5).contains(digit))
            .map(|digit| Message::FsKey(NavKey::Digit(digit))),
        _ => None,
    }
}

/// Outcome of a resolved yes/no submission: the notice to show and, for an
/// accepted vote, the pause before auto-advancing to the next item. A failed
/// vote stays on the current item.
fn yesno_followup(yes: bool, accepted: bool) -> (String, Option<Duration>) {
    if accepted {
        let label = if yes { "Yes" } else { "No" };
        (
            format!("You voted: {} (Saved!)", label),
            Some(YESNO_ADVANCE_DELAY),
        )
    } else {
        ("Vote failed.".to_string(), None)
    }
}

/// A card click opens fullscreen only as the second click on the same card
/// within the double-click window
fn is_double_click(previous: Option<(usize, Instant)>, index: usize, now: Instant) -> bool {
    previous.is_some_and(|(prev, at)| prev == index && now.duration_since(at) <= DOUBLE_CLICK_WINDOW)
}

/// Drop cached photo bytes for images no longer referenced by the gallery or
/// the stats table, so deletions don't leave handles behind forever
fn prune_photos(photos: &mut HashMap<i64, Handle>, gallery: &[ImageRecord], stats: &[ImageRecord]) {
    let keep: HashSet<i64> = gallery.iter().chain(stats).map(|r| r.id).collect();
    photos.retain(|id, _| keep.contains(id));
}

/// Re-find a picked set in a freshly loaded list (image counts change, slugs
/// change on rename); drop the selection when the set is gone
fn reselect(sets: &[SetRecord], picked: Option<SetRecord>) -> Option<SetRecord> {
    picked.and_then(|old| sets.iter().find(|s| s.id == old.id).cloned())
}

/// Blocking native alert, used for write-path failures in grid and admin view
fn alert(title: &str, description: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

/// Blocking native Ok/Cancel prompt gating every destructive admin action
fn confirm(title: &str, description: &str) -> bool {
    let result = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::OkCancel)
        .show();
    matches!(result, rfd::MessageDialogResult::Ok)
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    iced::application("Family Rater", RaterApp::update, RaterApp::view)
        .subscription(RaterApp::subscription)
        .theme(RaterApp::theme)
        .centered()
        .run_with(RaterApp::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> ImageRecord {
        ImageRecord {
            id,
            url: format!("/uploads/default/{}.jpg", id),
            filename: format!("default/{}.jpg", id),
            created_at: "2024-01-01T00:00:00".to_string(),
            avg_rating: None,
            rating_count: 0,
            user_rating: None,
            set_name: None,
            set_slug: None,
            hidden: false,
        }
    }

    #[test]
    fn test_yesno_success_schedules_delayed_advance() {
        let (notice, advance) = yesno_followup(true, true);
        assert_eq!(notice, "You voted: Yes (Saved!)");
        assert_eq!(advance, Some(YESNO_ADVANCE_DELAY));
        assert_eq!(YESNO_ADVANCE_DELAY, Duration::from_millis(400));
    }

    #[test]
    fn test_yesno_no_vote_also_advances() {
        let (notice, advance) = yesno_followup(false, true);
        assert_eq!(notice, "You voted: No (Saved!)");
        assert_eq!(advance, Some(YESNO_ADVANCE_DELAY));
    }

    #[test]
    fn test_yesno_failure_does_not_advance() {
        let (notice, advance) = yesno_followup(true, false);
        assert_eq!(notice, "Vote failed.");
        assert_eq!(advance, None);
    }

    #[test]
    fn test_prune_drops_handles_for_removed_images() {
        let mut photos = HashMap::new();
        photos.insert(1, Handle::from_bytes(vec![1u8]));
        photos.insert(2, Handle::from_bytes(vec![2u8]));
        photos.insert(3, Handle::from_bytes(vec![3u8]));

        let gallery = vec![record(1)];
        let stats = vec![record(2)];
        prune_photos(&mut photos, &gallery, &stats);

        assert!(photos.contains_key(&1));
        assert!(photos.contains_key(&2));
        assert!(!photos.contains_key(&3));
    }

    #[test]
    fn test_prune_clears_everything_when_nothing_remains() {
        let mut photos = HashMap::new();
        photos.insert(1, Handle::from_bytes(vec![1u8]));
        prune_photos(&mut photos, &[], &[]);
        assert!(photos.is_empty());
    }

    #[test]
    fn test_double_click_same_card_within_window() {
        let first = Instant::now();
        let second = first + Duration::from_millis(150);
        assert!(is_double_click(Some((2, first)), 2, second));
    }

    #[test]
    fn test_first_click_does_not_open() {
        assert!(!is_double_click(None, 0, Instant::now()));
    }

    #[test]
    fn test_clicks_on_different_cards_do_not_open() {
        let first = Instant::now();
        let second = first + Duration::from_millis(100);
        assert!(!is_double_click(Some((1, first)), 2, second));
    }

    #[test]
    fn test_slow_second_click_does_not_open() {
        let first = Instant::now();
        let second = first + Duration::from_millis(900);
        assert!(!is_double_click(Some((2, first)), 2, second));
    }
}
