/// Application state modules
///
/// `prefs` is the durable store (rater identity + rating mode),
/// `gallery` holds the client-side sort/filter logic, and `session` is the
/// fullscreen review session state machine.

pub mod gallery;
pub mod prefs;
pub mod session;
