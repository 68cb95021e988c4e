use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Weekday labels exactly as the portal prints them in the first column of
/// the schedule table. The week starts on شنبه (Saturday).
pub const WEEKDAYS: [&str; 7] = [
	"شنبه",
	"یکشنبه",
	"دوشنبه",
	"سه‌شنبه",
	"چهارشنبه",
	"پنج‌شنبه",
	"جمعه",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Weekday {
	Saturday,
	Sunday,
	Monday,
	Tuesday,
	Wednesday,
	Thursday,
	Friday,
}

const ALL_DAYS: [Weekday; 7] = [
	Weekday::Saturday,
	Weekday::Sunday,
	Weekday::Monday,
	Weekday::Tuesday,
	Weekday::Wednesday,
	Weekday::Thursday,
	Weekday::Friday,
];

impl Weekday {
	#[must_use]
	pub fn name(self) -> &'static str {
		WEEKDAYS[self as usize]
	}

	/// Weekday whose Persian name appears in `text`. Longest name wins:
	/// شنبه is a suffix of most other day names and must not shadow them.
	#[must_use]
	pub fn find(text: &str) -> Option<Self> {
		ALL_DAYS
			.iter()
			.copied()
			.filter(|day| text.contains(day.name()))
			.max_by_key(|day| day.name().len())
	}

	#[must_use]
	pub fn to_chrono(self) -> chrono::Weekday {
		match self {
			Self::Saturday => chrono::Weekday::Sat,
			Self::Sunday => chrono::Weekday::Sun,
			Self::Monday => chrono::Weekday::Mon,
			Self::Tuesday => chrono::Weekday::Tue,
			Self::Wednesday => chrono::Weekday::Wed,
			Self::Thursday => chrono::Weekday::Thu,
			Self::Friday => chrono::Weekday::Fri,
		}
	}
}

fn lookup_day(s: &str) -> Option<Weekday> {
	ALL_DAYS.iter().copied().find(|day| day.name() == s)
}

impl fmt::Display for Weekday {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Weekday {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		lookup_day(s).ok_or(())
	}
}

impl From<Weekday> for String {
	fn from(day: Weekday) -> Self {
		day.name().to_string()
	}
}

impl TryFrom<String> for Weekday {
	type Error = String;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		lookup_day(&s).ok_or_else(|| format!("unknown weekday: {s}"))
	}
}

/// How often a meeting slot repeats. Odd/even-week courses use the biweekly
/// form; which half of the term they fall on is carried by the flags on the
/// record, not by the rule itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Recurrence {
	#[default]
	Weekly,
	Biweekly,
}

impl Recurrence {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Weekly => "WEEKLY",
			Self::Biweekly => "WEEKLY;INTERVAL=2",
		}
	}
}

impl fmt::Display for Recurrence {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<Recurrence> for String {
	fn from(recurrence: Recurrence) -> Self {
		recurrence.as_str().to_string()
	}
}

impl TryFrom<String> for Recurrence {
	type Error = String;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		match s.as_str() {
			"WEEKLY" => Ok(Self::Weekly),
			"WEEKLY;INTERVAL=2" => Ok(Self::Biweekly),
			_ => Err(format!("unknown recurrence: {s}")),
		}
	}
}

/// One weekly meeting occurrence of a course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Session {
	pub day: Option<Weekday>,
	pub time: String,
	pub location: String,
	pub recurrence: Recurrence,
	pub is_odd_week: bool,
	pub is_even_week: bool,
}

/// Labeled fields scraped from a course's syllabus page. Any field may be
/// empty; a partially-filled record is still a success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CourseDetail {
	pub title: String,
	pub code: String,
	pub credits: String,
	pub prerequisites: String,
	pub corequisites: String,
	pub evaluation: String,
	pub syllabus: String,
	pub resources: String,
	pub objectives: String,
	pub sessions: String,
}

impl CourseDetail {
	/// Placeholder details used when no syllabus page is reachable.
	#[must_use]
	pub fn basic(course: &Course) -> Self {
		Self {
			title: course.name.clone(),
			code: String::from("نامشخص"),
			credits: if course.credits.is_empty() {
				String::from("نامشخص")
			} else {
				course.credits.clone()
			},
			evaluation: String::from("اطلاعات دقیق در دسترس نیست"),
			syllabus: String::from("برای مشاهده سرفصل دقیق، به سایت دانشگاه مراجعه کنید"),
			prerequisites: String::from("نیاز به بررسی بیشتر"),
			resources: String::from("منابع درسی توسط استاد اعلام خواهد شد"),
			..Self::default()
		}
	}
}

/// One distinct course, keyed by (name, teacher). Every observed meeting
/// slot lives in `sessions`; the top-level day/time/location mirror the
/// first one so older exports keep working.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Course {
	pub id: String,
	/// Display name, "{original_name} - {teacher}".
	pub name: String,
	pub original_name: String,
	pub teacher: String,
	pub location: String,
	pub credits: String,
	pub day: Option<Weekday>,
	pub time: String,
	pub recurrence: Recurrence,
	pub is_odd_week: bool,
	pub is_even_week: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail_url: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub sessions: Vec<Session>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub course_details: Option<CourseDetail>,
	pub raw_text: String,
	pub needs_detail_extraction: bool,
}

impl Course {
	/// Deterministic id derived from the (name, teacher) key.
	#[must_use]
	pub fn make_id(name: &str, teacher: &str) -> String {
		let mut id = STANDARD.encode(format!("{name} - {teacher}"));
		id.truncate(8);
		id
	}

	/// All meeting slots of this course, falling back to the top-level
	/// day/time fields when no structured sessions were recorded.
	#[must_use]
	pub fn slots(&self) -> Vec<Session> {
		if self.sessions.is_empty() {
			vec![Session {
				day: self.day,
				time: self.time.clone(),
				location: self.location.clone(),
				recurrence: self.recurrence,
				is_odd_week: self.is_odd_week,
				is_even_week: self.is_even_week,
			}]
		} else {
			self.sessions.clone()
		}
	}
}
