//! End-to-end pass over a saved schedule document: locate the table, parse
//! the Persian cells, aggregate, and export.

use chrono::TimeZone;
use fum2cal_core::course::{Recurrence, Weekday};
use fum2cal_core::extract::Extractor;
use fum2cal_core::storage::MemoryStore;
use fum2cal_core::{api, calendar, TZ};

const SCHEDULE_PAGE: &str = r##"<html><body>
<table class="table table-sm border cell-border">
	<tr>
		<th>ایام هفته</th>
		<th>6</th><th>7</th><th>8</th><th>9</th><th>10</th><th>11</th><th>12</th>
	</tr>
	<tr>
		<td>شنبه</td>
		<td>-</td>
		<td>-</td>
		<td bgcolor="#FFF3CD">مدارهای منطقی(3)، دکتر احمدی، (کلاس A-101)
			<span title="طرح درس" onclick="window.open('https://pooya.um.ac.ir/detail?id=7')"><i class="fa-book-open"></i></span>
		</td>
		<td>-</td>
		<td>-</td>
		<td>-</td>
		<td>-</td>
	</tr>
	<tr>
		<td>دوشنبه</td>
		<td>-</td>
		<td>-</td>
		<td>-</td>
		<td>-</td>
		<td bgcolor="#FFF3CD">مدارهای منطقی(3)، دکتر احمدی، (کلاس B-204)</td>
		<td>-</td>
		<td>-</td>
	</tr>
	<tr>
		<td>سه‌شنبه</td>
		<td>-</td>
		<td bgcolor="#FFF3CD">فیزیک ۲(2)، دکتر رضایی، (کلاس B-7) شروع زوج</td>
		<td>-</td>
		<td>-</td>
		<td>-</td>
		<td>-</td>
		<td>-</td>
	</tr>
	<tr>
		<td>ملاحظات</td>
		<td bgcolor="#FFF3CD">این ردیف روز ندارد و باید نادیده گرفته شود، بدون درس</td>
	</tr>
</table>
</body></html>"##;

fn extracted() -> Extractor<MemoryStore> {
	let mut extractor = Extractor::new(MemoryStore::default());
	extractor.extract_courses(SCHEDULE_PAGE).unwrap();
	extractor
}

fn fixed_saturday() -> chrono::DateTime<chrono_tz::Tz> {
	// 2025-01-04 is a شنبه
	TZ.with_ymd_and_hms(2025, 1, 4, 7, 0, 0).unwrap()
}

#[test]
fn repeated_course_merges_into_one_record_with_two_sessions() {
	let extractor = extracted();
	let courses = extractor.courses();
	assert_eq!(courses.len(), 2);

	let logic = &courses[0];
	assert_eq!(logic.original_name, "مدارهای منطقی(3)");
	assert_eq!(logic.teacher, "دکتر احمدی");
	assert_eq!(logic.credits, "3");
	assert_eq!(logic.sessions.len(), 2);
	assert_eq!(logic.sessions[0].day, Some(Weekday::Saturday));
	assert_eq!(logic.sessions[0].time, "8:00");
	assert_eq!(logic.sessions[0].location, "A-101");
	assert_eq!(logic.sessions[1].day, Some(Weekday::Monday));
	assert_eq!(logic.sessions[1].time, "10:00");
	assert_eq!(logic.sessions[1].location, "B-204");

	assert_eq!(
		logic.detail_url.as_deref(),
		Some("https://pooya.um.ac.ir/detail?id=7")
	);
	assert!(logic.needs_detail_extraction);
}

#[test]
fn even_week_course_carries_the_biweekly_rule() {
	let extractor = extracted();
	let physics = &extractor.courses()[1];
	assert_eq!(physics.day, Some(Weekday::Tuesday));
	assert_eq!(physics.time, "7:00");
	assert!(physics.is_even_week);
	assert!(!physics.is_odd_week);
	assert_eq!(physics.recurrence, Recurrence::Biweekly);
}

#[test]
fn dayless_rows_are_skipped() {
	let extractor = extracted();
	assert!(extractor
		.courses()
		.iter()
		.all(|course| !course.raw_text.contains("ملاحظات")));
}

#[test]
fn ics_export_emits_one_vevent_per_slot() {
	let extractor = extracted();
	let ics = extractor.export_ics(fixed_saturday(), None).unwrap();

	assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3);
	assert_eq!(ics.matches("END:VEVENT").count(), 3);
	assert!(ics.contains("RRULE:FREQ=WEEKLY"));
	assert!(ics.contains("INTERVAL=2"));
}

#[test]
fn google_links_cover_every_session() {
	let extractor = extracted();
	let id = extractor.courses()[0].id.clone();
	let links = extractor
		.calendar_links(&id, fixed_saturday(), None)
		.unwrap();
	assert_eq!(links.len(), 2);
	// شنبه at 8:00 local is the same day at 04:30Z
	assert!(links[0].contains("20250104T043000Z"), "{}", links[0]);
}

#[test]
fn json_round_trip_is_lossless() {
	let extractor = extracted();
	let json = extractor.export_json().unwrap();
	let parsed: Vec<fum2cal_core::course::Course> = serde_json::from_str(&json).unwrap();
	assert_eq!(parsed.as_slice(), extractor.courses());
}

#[test]
fn bounded_export_caps_rules_at_year_end() {
	let extractor = extracted();
	let today = fixed_saturday();
	let ics = extractor
		.export_ics(today, Some(calendar::end_of_year(today)))
		.unwrap();
	assert!(ics.contains("UNTIL"));
}

#[tokio::test]
async fn dispatch_wraps_extraction_in_a_success_envelope() {
	let mut extractor = Extractor::new(MemoryStore::default());
	let fetcher = fum2cal_core::detail::HttpFetcher::new();

	let response = api::dispatch_json(
		&mut extractor,
		&fetcher,
		fixed_saturday(),
		&serde_json::json!({ "action": "extractCourses", "html": SCHEDULE_PAGE }).to_string(),
	)
	.await;

	assert!(response.success);
	let data = response.data.unwrap();
	assert_eq!(data["courses"].as_array().unwrap().len(), 2);
}
