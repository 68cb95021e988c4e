#![warn(clippy::pedantic)]

//! Scrapes the Ferdowsi University weekly-schedule page into structured
//! course records and exports them as Google Calendar links, an iCalendar
//! file, or JSON.
//!
//! The scraping heuristics live in [`schedule`] and [`parse`], aggregation
//! and the operation surface in [`extract`] and [`api`], calendar building
//! in [`calendar`].

pub mod api;
pub mod calendar;
pub mod course;
pub mod detail;
pub mod error;
pub mod extract;
pub mod parse;
pub mod schedule;
pub mod settings;
pub mod storage;

pub use error::{Error, Result};

/// All schedule times are local to the university.
pub const TZ: chrono_tz::Tz = chrono_tz::Asia::Tehran;
