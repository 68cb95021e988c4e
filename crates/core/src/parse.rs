//! Deciding whether a block of cell text encodes a course, and pulling the
//! name/teacher/location fields out of it.
//!
//! The portal renders a course slot as roughly `نام درس(واحد)، استاد،
//! (کلاس X)`, but real cells are messy: mixed ASCII/Persian commas,
//! quoted-printable leftovers, odd/even-week markers appended at the end.
//! Classification and parsing are both ordered first-match-wins pattern
//! lists so the policy stays testable away from any document.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::course::Recurrence;

/// Marker the portal appends to courses that meet on odd weeks only.
pub const ODD_WEEK_MARKER: &str = "شروع فرد";
/// Even-week counterpart of [`ODD_WEEK_MARKER`].
pub const EVEN_WEEK_MARKER: &str = "شروع زوج";

/// Fields recovered from one course text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCourse {
	pub name: String,
	pub teacher: String,
	pub location: String,
	pub credits: String,
	pub recurrence: Recurrence,
	pub is_odd_week: bool,
	pub is_even_week: bool,
}

/// Outcome of [`parse_course_text`]. Unparseable text is not an error,
/// the caller just discards it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
	Matched(ParsedCourse),
	NoMatch,
}

struct Matcher {
	name: &'static str,
	pattern: Regex,
}

// Most specific first; the first matcher that captures wins.
static MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
	vec![
		Matcher {
			// name(credits), teacher, (location)
			name: "name-teacher-parenthesized-location",
			pattern: Regex::new(r"^([^,،]+\([^)]*\))[\s,،]*([^,،\n(]+)[\s,،]*\(([^)]*)\)")
				.unwrap(),
		},
		Matcher {
			// name(credits), teacher, CODE-12
			name: "name-teacher-class-code",
			pattern: Regex::new(r"^([^,،]+\([^)]*\))[\s,،]*([^,،\n]+)[\s,،]*([A-Z0-9-]+)")
				.unwrap(),
		},
		Matcher {
			// last resort: three comma-separated chunks
			name: "comma-split",
			pattern: Regex::new(r"^([^,،]+)[\s,،]+([^,،]+)[\s,،]*(.+)$").unwrap(),
		},
	]
});

static CANDIDATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	vec![
		// name(credits), teacher, (location)
		Regex::new(r"\(\d+\).*[,،].*[,،].*\(.*\)").unwrap(),
		// Persian text followed by a parenthesized credit count
		Regex::new(r"[\x{0600}-\x{06FF}\s]+\(\d+\)").unwrap(),
		// embedded class code
		Regex::new(r"کلاس\s*[A-Z0-9-]+").unwrap(),
		// odd/even-week marker
		Regex::new(r"شروع\s*(فرد|زوج)").unwrap(),
	]
});

static CREDITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)\)").unwrap());
static QP_ARTIFACT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"=D[0-9A-F]{1,2}").unwrap());
static LOCATION_NOISE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[()]|کلاس\s*").unwrap());
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalizes a raw cell text for classification: strips quoted-printable
/// leftovers and collapses whitespace, keeping the commas the classifier
/// counts.
#[must_use]
pub fn clean_cell_text(text: &str) -> String {
	let text = QP_ARTIFACT.replace_all(text, "");
	SPACES.replace_all(&text, " ").trim().to_string()
}

/// Normalizes a captured field: commas and newlines become spaces, then
/// the same artifact/whitespace cleanup as [`clean_cell_text`].
#[must_use]
pub fn clean_persian_text(text: &str) -> String {
	let text: String = text
		.chars()
		.map(|c| if matches!(c, '،' | ',' | '\n' | '\r') { ' ' } else { c })
		.collect();
	clean_cell_text(&text)
}

/// True when `text` plausibly encodes a course: at least one structural
/// pattern, a plausible length, and at least one comma (either dialect).
#[must_use]
pub fn looks_like_course(text: &str) -> bool {
	let has_pattern = CANDIDATE_PATTERNS.iter().any(|pattern| pattern.is_match(text));
	let chars = text.chars().count();
	let reasonable_length = chars > 15 && chars < 300;
	let has_comma = text.contains(',') || text.contains('،');

	has_pattern && reasonable_length && has_comma
}

/// Runs the ordered matcher list over `text` and extracts course fields
/// from the first one that captures.
#[must_use]
pub fn parse_course_text(text: &str) -> ParseOutcome {
	for matcher in MATCHERS.iter() {
		let Some(caps) = matcher.pattern.captures(text) else {
			continue;
		};
		debug!(matcher = matcher.name, "course text matched");

		let name = clean_persian_text(caps.get(1).map_or("", |m| m.as_str()));
		let teacher = clean_persian_text(caps.get(2).map_or("", |m| m.as_str()));
		let location = clean_persian_text(caps.get(3).map_or("", |m| m.as_str()));

		let credits = CREDITS
			.captures(&name)
			.map(|c| c[1].to_string())
			.unwrap_or_default();
		let location = LOCATION_NOISE.replace_all(&location, "").trim().to_string();

		let (recurrence, is_odd_week, is_even_week) = if text.contains(ODD_WEEK_MARKER) {
			(Recurrence::Biweekly, true, false)
		} else if text.contains(EVEN_WEEK_MARKER) {
			(Recurrence::Biweekly, false, true)
		} else {
			(Recurrence::Weekly, false, false)
		};

		return ParseOutcome::Matched(ParsedCourse {
			name,
			teacher,
			location,
			credits,
			recurrence,
			is_odd_week,
			is_even_week,
		});
	}

	warn!(text = %text, "no matcher accepted course text");
	ParseOutcome::NoMatch
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = "ریاضیات مهندسی(3)، دکتر احمدی، (کلاس A-101)";

	fn parsed(text: &str) -> ParsedCourse {
		match parse_course_text(text) {
			ParseOutcome::Matched(course) => course,
			ParseOutcome::NoMatch => panic!("expected a match for {text:?}"),
		}
	}

	#[test]
	fn classifier_accepts_full_shape() {
		assert!(looks_like_course(SAMPLE));
	}

	#[test]
	fn classifier_rejects_text_without_commas() {
		// a parenthesized number alone is not enough
		assert!(!looks_like_course("ریاضیات مهندسی(3) دکتر احمدی کلاس A-101"));
	}

	#[test]
	fn classifier_rejects_out_of_bound_lengths() {
		assert!(!looks_like_course("ریاضی(3)،"));
		let long = format!("فیزیک(2)، {}، (کلاس B)", "ا".repeat(300));
		assert!(!looks_like_course(&long));
	}

	#[test]
	fn classifier_accepts_ascii_comma_dialect() {
		assert!(looks_like_course("ریاضیات مهندسی(3), دکتر احمدی, (کلاس A-101)"));
	}

	#[test]
	fn parses_name_teacher_location() {
		let course = parsed(SAMPLE);
		assert_eq!(course.name, "ریاضیات مهندسی(3)");
		assert_eq!(course.teacher, "دکتر احمدی");
		assert_eq!(course.location, "A-101");
		assert_eq!(course.credits, "3");
		assert_eq!(course.recurrence, Recurrence::Weekly);
	}

	#[test]
	fn odd_week_marker_sets_biweekly_rule() {
		let course = parsed("فیزیک ۲(2)، دکتر رضایی، (کلاس B-7) شروع فرد");
		assert!(course.is_odd_week);
		assert!(!course.is_even_week);
		assert_eq!(course.recurrence, Recurrence::Biweekly);
	}

	#[test]
	fn even_week_marker_sets_biweekly_rule() {
		let course = parsed("فیزیک ۲(2)، دکتر رضایی، (کلاس B-7) شروع زوج");
		assert!(course.is_even_week);
		assert!(!course.is_odd_week);
		assert_eq!(course.recurrence, Recurrence::Biweekly);
	}

	#[test]
	fn location_is_stripped_of_prefix_and_parens() {
		let course = parsed("شیمی آلی(2)، دکتر کریمی، (کلاس 12B)");
		assert_eq!(course.location, "12B");
	}

	#[test]
	fn parsing_is_idempotent() {
		let first = parsed(SAMPLE);
		let rebuilt = format!(
			"{}، {}، (کلاس {})",
			first.name, first.teacher, first.location
		);
		let second = parsed(&rebuilt);
		assert_eq!(first.name, second.name);
		assert_eq!(first.teacher, second.teacher);
		assert_eq!(first.location, second.location);
	}

	#[test]
	fn quoted_printable_artifacts_are_cleaned() {
		assert_eq!(clean_cell_text("ریاضی=D8 مهندسی"), "ریاضی مهندسی");
		assert_eq!(clean_persian_text("الف،ب,ج"), "الف ب ج");
	}
}
