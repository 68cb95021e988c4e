//! Turning course records into concrete calendar artifacts: the nearest
//! upcoming occurrence of each meeting slot, Google Calendar deep links,
//! and an iCalendar file.
//!
//! The portal only names weekdays and clock hours, so "the next شنبه at
//! 8:00" is resolved against an explicit `today` rather than any real
//! Jalali-to-Gregorian conversion.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};
use regex::Regex;
use url::Url;

use crate::course::{Course, Recurrence, Session, Weekday};
use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::TZ;

/// Length of one class meeting.
const SESSION_MINUTES: i64 = 90;

const GOOGLE_CALENDAR_BASE: &str = "https://calendar.google.com/calendar/render";

static TIME_OF_DAY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(\d{1,2}):?(\d{0,2})").unwrap());

/// Concrete start/end of the next occurrence of a meeting slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
	pub start: DateTime<Tz>,
	pub end: DateTime<Tz>,
}

fn parse_time(time: &str) -> Option<(u32, u32)> {
	let caps = TIME_OF_DAY.captures(time)?;
	let hour: u32 = caps[1].parse().ok()?;
	let minute: u32 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
	Some((hour, minute))
}

/// Next date on or after `today` falling on `day`, at the clock time given
/// by `time` ("8:00" or "8"; minutes default to 0). A same-weekday `today`
/// counts as the next occurrence.
pub fn next_occurrence(day: Weekday, time: &str, today: DateTime<Tz>) -> Result<DateTime<Tz>> {
	let target = day.to_chrono().num_days_from_monday();
	let current = today.weekday().num_days_from_monday();
	let days_ahead = (7 + target - current) % 7;

	let mut date = today + Duration::days(i64::from(days_ahead));
	if let Some((hour, minute)) = parse_time(time) {
		date = date
			.with_hour(hour)
			.and_then(|d| d.with_minute(minute))
			.ok_or_else(|| Error::InvalidTime(time.to_string()))?;
	}
	date.with_second(0)
		.and_then(|d| d.with_nanosecond(0))
		.ok_or_else(|| Error::InvalidTime(time.to_string()))
}

/// Start and end of the next occurrence; every meeting runs 90 minutes.
pub fn event_window(day: Weekday, time: &str, today: DateTime<Tz>) -> Result<EventWindow> {
	let start = next_occurrence(day, time, today)?;
	Ok(EventWindow {
		start,
		end: start + Duration::minutes(SESSION_MINUTES),
	})
}

/// Dec 31 23:59:59 of the year `today` falls in, the optional cutoff for
/// recurrence rules.
#[must_use]
pub fn end_of_year(today: DateTime<Tz>) -> DateTime<Tz> {
	// always a valid local time in this timezone
	TZ.with_ymd_and_hms(today.year(), 12, 31, 23, 59, 59).unwrap()
}

fn effective_recurrence(slot: &Session, settings: &Settings) -> Recurrence {
	if settings.include_odd_even {
		slot.recurrence
	} else {
		Recurrence::Weekly
	}
}

fn recurrence_rule(recurrence: Recurrence, until: Option<DateTime<Tz>>) -> String {
	let mut rule = rrule::RRule::new(rrule::Frequency::Weekly);
	if recurrence == Recurrence::Biweekly {
		rule = rule.interval(2);
	}
	if let Some(until) = until {
		rule = rule.until(until.with_timezone(&rrule::Tz::Tz(until.timezone())));
	}
	rule.to_string()
}

// slots recovered by the raw text sweep carry no weekday
fn slot_day(slot: &Session) -> Weekday {
	slot.day.unwrap_or(Weekday::Sunday)
}

fn event_description(course: &Course, slot: &Session) -> String {
	let mut description = format!("استاد: {}\nمکان: {}", course.teacher, slot.location);
	if !course.credits.is_empty() {
		description.push_str(&format!("\nتعداد واحد: {}", course.credits));
	}
	if slot.is_odd_week || slot.is_even_week {
		let label = if slot.is_odd_week {
			"هفته‌های فرد"
		} else {
			"هفته‌های زوج"
		};
		description.push_str(&format!("\nالگو: {label}"));
	}
	if let Some(details) = &course.course_details {
		if !details.evaluation.is_empty() {
			description.push_str(&format!("\nارزشیابی: {}", details.evaluation));
		}
		if !details.syllabus.is_empty() {
			let excerpt: String = details.syllabus.chars().take(100).collect();
			description.push_str(&format!("\nسرفصل: {excerpt}"));
		}
	}
	description
}

fn google_date(datetime: DateTime<Tz>) -> String {
	datetime
		.with_timezone(&Utc)
		.format("%Y%m%dT%H%M%SZ")
		.to_string()
}

/// One Google Calendar template link per meeting slot of `course`.
pub fn google_calendar_links(
	course: &Course,
	settings: &Settings,
	today: DateTime<Tz>,
	until: Option<DateTime<Tz>>,
) -> Result<Vec<String>> {
	let mut links = Vec::new();

	for slot in course.slots() {
		let window = event_window(slot_day(&slot), &slot.time, today)?;
		let rule = recurrence_rule(effective_recurrence(&slot, settings), until);

		let mut url = Url::parse(GOOGLE_CALENDAR_BASE)?;
		url.query_pairs_mut()
			.append_pair("action", "TEMPLATE")
			.append_pair("text", &course.name)
			.append_pair(
				"dates",
				&format!("{}/{}", google_date(window.start), google_date(window.end)),
			)
			.append_pair("details", &event_description(course, &slot))
			.append_pair("location", &slot.location)
			.append_pair("recur", &format!("RRULE:{rule}"));

		links.push(url.to_string());
	}

	Ok(links)
}

/// Assembles the full iCalendar document: one VEVENT per meeting slot of
/// every course, CRLF framing handled by the serializer.
pub fn build_calendar(
	courses: &[Course],
	settings: &Settings,
	today: DateTime<Tz>,
	until: Option<DateTime<Tz>>,
) -> Result<Calendar> {
	let mut calendar = Calendar::new();
	calendar.name(&format!("برنامه هفتگی {}", settings.academic_year));
	calendar.timezone(TZ.name());

	for course in courses {
		for (index, slot) in course.slots().iter().enumerate() {
			let window = event_window(slot_day(slot), &slot.time, today)?;
			let mut event = Event::new();
			event
				.uid(&format!("{}-{index}@fum2cal", course.id))
				.summary(&course.name)
				.description(&event_description(course, slot))
				.location(&slot.location)
				.starts(CalendarDateTime::WithTimezone {
					date_time: window.start.naive_local(),
					tzid: TZ.name().to_string(),
				})
				.ends(CalendarDateTime::WithTimezone {
					date_time: window.end.naive_local(),
					tzid: TZ.name().to_string(),
				})
				.add_property(
					"RRULE",
					recurrence_rule(effective_recurrence(slot, settings), until),
				)
				// reminder 30 minutes before
				.add_property(
					"VALARM",
					"TRIGGER:-PT30M;ACTION=DISPLAY;DESCRIPTION=Reminder",
				);
			calendar.push(event);
		}
	}

	Ok(calendar)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::course::WEEKDAYS;

	// 2025-01-04 is a Saturday (شنبه).
	fn fixed_saturday() -> DateTime<Tz> {
		TZ.with_ymd_and_hms(2025, 1, 4, 7, 0, 0).unwrap()
	}

	fn course_with_slot(day: Weekday, time: &str) -> Course {
		let name = String::from("ریاضیات مهندسی(3) - دکتر احمدی");
		Course {
			id: Course::make_id("ریاضیات مهندسی(3)", "دکتر احمدی"),
			name,
			original_name: String::from("ریاضیات مهندسی(3)"),
			teacher: String::from("دکتر احمدی"),
			location: String::from("A-101"),
			credits: String::from("3"),
			day: Some(day),
			time: time.to_string(),
			..Course::default()
		}
	}

	#[test]
	fn next_occurrence_stays_within_one_week() {
		let today = fixed_saturday();
		for name in WEEKDAYS {
			let day: Weekday = name.parse().unwrap();
			let date = next_occurrence(day, "10:00", today).unwrap();
			assert_eq!(date.weekday(), day.to_chrono());
			let offset = (date.date_naive() - today.date_naive()).num_days();
			assert!((0..=6).contains(&offset), "offset {offset} for {name}");
		}
	}

	#[test]
	fn same_weekday_resolves_to_today() {
		let today = fixed_saturday();
		let window = event_window(Weekday::Saturday, "8:00", today).unwrap();
		assert_eq!(window.start.date_naive(), today.date_naive());
		assert_eq!((window.start.hour(), window.start.minute()), (8, 0));
		assert_eq!((window.end.hour(), window.end.minute()), (9, 30));
	}

	#[test]
	fn minutes_default_to_zero() {
		let date = next_occurrence(Weekday::Monday, "14", fixed_saturday()).unwrap();
		assert_eq!((date.hour(), date.minute(), date.second()), (14, 0, 0));
	}

	#[test]
	fn out_of_range_hour_is_an_error() {
		assert!(matches!(
			next_occurrence(Weekday::Monday, "25:00", fixed_saturday()),
			Err(Error::InvalidTime(_))
		));
	}

	#[test]
	fn biweekly_rule_carries_the_interval() {
		let rule = recurrence_rule(Recurrence::Biweekly, None);
		assert!(rule.contains("FREQ=WEEKLY"), "rule was {rule}");
		assert!(rule.contains("INTERVAL=2"), "rule was {rule}");
		assert!(!recurrence_rule(Recurrence::Weekly, None).contains("INTERVAL=2"));
	}

	#[test]
	fn until_cutoff_bounds_the_rule() {
		let today = fixed_saturday();
		let rule = recurrence_rule(Recurrence::Weekly, Some(end_of_year(today)));
		assert!(rule.contains("UNTIL"), "rule was {rule}");
	}

	#[test]
	fn google_link_encodes_window_and_recurrence() {
		let mut course = course_with_slot(Weekday::Saturday, "8:00");
		course.is_odd_week = true;
		course.recurrence = Recurrence::Biweekly;

		let links =
			google_calendar_links(&course, &Settings::default(), fixed_saturday(), None).unwrap();
		assert_eq!(links.len(), 1);
		let link = &links[0];

		// Tehran is UTC+03:30, so 8:00 local is 04:30Z
		assert!(link.contains("dates=20250104T043000Z%2F20250104T060000Z"), "{link}");
		assert!(link.contains("INTERVAL%3D2"), "{link}");
		assert!(link.contains("action=TEMPLATE"), "{link}");
	}

	#[test]
	fn include_odd_even_off_downgrades_to_weekly() {
		let mut course = course_with_slot(Weekday::Saturday, "8:00");
		course.is_even_week = true;
		course.recurrence = Recurrence::Biweekly;

		let settings = Settings {
			include_odd_even: false,
			..Settings::default()
		};
		let links =
			google_calendar_links(&course, &settings, fixed_saturday(), None).unwrap();
		assert!(!links[0].contains("INTERVAL%3D2"), "{}", links[0]);
	}

	#[test]
	fn ics_wraps_every_slot_in_a_vevent() {
		let mut course = course_with_slot(Weekday::Saturday, "8:00");
		course.sessions = course.slots();
		course.sessions.push(Session {
			day: Some(Weekday::Monday),
			time: String::from("10:00"),
			location: String::from("B-7"),
			..Session::default()
		});

		let calendar = build_calendar(
			&[course],
			&Settings::default(),
			fixed_saturday(),
			None,
		)
		.unwrap();
		let ics = calendar.to_string();

		assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
		assert_eq!(
			ics.matches("BEGIN:VEVENT").count(),
			ics.matches("END:VEVENT").count()
		);
		assert!(ics.starts_with("BEGIN:VCALENDAR"));
		assert!(ics.contains("BEGIN:VEVENT\r\n"), "lines must be CRLF-terminated");
		assert!(ics.trim_end().ends_with("END:VCALENDAR"));
	}
}
