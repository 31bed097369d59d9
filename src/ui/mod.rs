/// View functions for the three surfaces: the gallery grid, the fullscreen
/// review session, and the admin console.

pub mod admin;
pub mod fullscreen;
pub mod gallery;
