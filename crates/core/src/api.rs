//! The request/response surface a popup shell (or the CLI) drives. Every
//! outcome, including a failure, comes back as a structured response so the
//! caller never sees an unhandled error.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::detail::DetailFetcher;
use crate::extract::Extractor;
use crate::storage::Storage;

/// The closed set of actions a shell may request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
	ExtractCourses {
		html: String,
	},
	AutoExtractWithDetails {
		html: String,
	},
	GetCourses,
	#[serde(rename_all = "camelCase")]
	ExtractCourseDetail {
		course_id: String,
	},
	#[serde(rename_all = "camelCase")]
	GenerateCalendarLink {
		course_id: String,
	},
	Ping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl Response {
	fn ok(data: Value) -> Self {
		Self {
			success: true,
			data: Some(data),
			error: None,
		}
	}

	fn failure(error: impl ToString) -> Self {
		Self {
			success: false,
			data: None,
			error: Some(error.to_string()),
		}
	}
}

/// Runs one request against the extractor.
pub async fn dispatch<S: Storage, F: DetailFetcher>(
	extractor: &mut Extractor<S>,
	fetcher: &F,
	today: DateTime<Tz>,
	request: Request,
) -> Response {
	match request {
		Request::ExtractCourses { html } => match extractor.extract_courses(&html) {
			Ok(courses) => Response::ok(json!({ "courses": courses })),
			Err(error) => Response::failure(error),
		},
		Request::AutoExtractWithDetails { html } => {
			match extractor.auto_extract_with_details(&html, fetcher).await {
				Ok(courses) => Response::ok(json!({ "courses": courses })),
				Err(error) => Response::failure(error),
			}
		}
		Request::GetCourses => Response::ok(json!({ "courses": extractor.courses() })),
		Request::ExtractCourseDetail { course_id } => {
			match extractor.extract_course_detail(&course_id, fetcher).await {
				Ok(details) => Response::ok(json!({ "details": details })),
				Err(error) => Response::failure(error),
			}
		}
		Request::GenerateCalendarLink { course_id } => {
			match extractor.calendar_links(&course_id, today, None) {
				Ok(links) => Response::ok(json!({ "links": links })),
				Err(error) => Response::failure(error),
			}
		}
		Request::Ping => Response::ok(json!({ "pong": true })),
	}
}

/// Same as [`dispatch`], but from a raw JSON request; an unknown action is
/// a failure response, not an error.
pub async fn dispatch_json<S: Storage, F: DetailFetcher>(
	extractor: &mut Extractor<S>,
	fetcher: &F,
	today: DateTime<Tz>,
	request: &str,
) -> Response {
	match serde_json::from_str(request) {
		Ok(request) => dispatch(extractor, fetcher, today, request).await,
		Err(error) => Response::failure(format!("unknown action: {error}")),
	}
}
