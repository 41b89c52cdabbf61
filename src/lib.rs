//! Terminal world map colored by the visa requirements that apply to a
//! chosen passport.

pub mod app;
pub mod braille;
pub mod data;
pub mod error;
pub mod map;
pub mod search;
pub mod ui;
pub mod visa;
