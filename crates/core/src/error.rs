use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
	#[error("an extraction is already in progress")]
	Busy,

	#[error("course not found: {0}")]
	CourseNotFound(String),

	#[error("detail page timed out after {0:?}")]
	DetailTimeout(Duration),

	#[error("http error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("invalid time of day: {0:?}")]
	InvalidTime(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("URL error: {0}")]
	Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
