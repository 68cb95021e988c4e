use serde::{Deserialize, Serialize};

/// User-tunable behavior, persisted verbatim alongside the course list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
	/// Fetch every course's syllabus page during an auto extraction.
	pub auto_detail_extract: bool,
	/// Keep the biweekly interval on odd/even-week courses when exporting.
	pub include_odd_even: bool,
	/// Jalali academic year, e.g. "1404-1405". Carried as an opaque label.
	pub academic_year: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			auto_detail_extract: true,
			include_odd_even: true,
			academic_year: String::from("1404-1405"),
		}
	}
}
