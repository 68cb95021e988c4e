//! The scrape pass: a context object owning the course list, settings, and
//! storage, plus the aggregation rule folding repeated observations of one
//! course into its session list.

use chrono::DateTime;
use chrono_tz::Tz;
use select::document::Document;
use tracing::{debug, info, warn};

use crate::calendar;
use crate::course::{Course, CourseDetail, Session};
use crate::detail::{self, DetailFetcher};
use crate::error::{Error, Result};
use crate::parse::{self, ParseOutcome};
use crate::schedule::{self, ScheduleCell};
use crate::settings::Settings;
use crate::storage::{Storage, Stored};

pub struct Extractor<S: Storage> {
	storage: S,
	settings: Settings,
	courses: Vec<Course>,
	// one long operation at a time; always cleared on the way out
	busy: bool,
}

impl<S: Storage> Extractor<S> {
	/// Restores the course list and settings from `storage`; a failed load
	/// logs a warning and starts from defaults.
	pub fn new(storage: S) -> Self {
		let stored = storage.load().unwrap_or_else(|error| {
			warn!(%error, "failed to load stored state, using defaults");
			Stored::default()
		});
		Self {
			storage,
			settings: stored.settings,
			courses: stored.courses,
			busy: false,
		}
	}

	#[must_use]
	pub fn courses(&self) -> &[Course] {
		&self.courses
	}

	#[must_use]
	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn set_settings(&mut self, settings: Settings) {
		self.settings = settings;
		self.persist();
	}

	// storage failures are logged, never fatal
	fn persist(&self) {
		let stored = Stored {
			courses: self.courses.clone(),
			settings: self.settings.clone(),
		};
		if let Err(error) = self.storage.save(&stored) {
			warn!(%error, "failed to persist state");
		}
	}

	fn begin(&mut self) -> Result<()> {
		if self.busy {
			return Err(Error::Busy);
		}
		self.busy = true;
		Ok(())
	}

	/// Replaces the course list with a fresh scrape of `html`.
	pub fn extract_courses(&mut self, html: &str) -> Result<&[Course]> {
		self.begin()?;
		self.scrape(html);
		self.busy = false;
		self.persist();
		Ok(&self.courses)
	}

	/// Scrapes `html`, then fills in every course's details: fetched from
	/// its syllabus page when one is linked and the setting allows it,
	/// otherwise the basic placeholder.
	pub async fn auto_extract_with_details<F: DetailFetcher>(
		&mut self,
		html: &str,
		fetcher: &F,
	) -> Result<&[Course]> {
		self.begin()?;
		self.scrape(html);

		for index in 0..self.courses.len() {
			let url = self.courses[index].detail_url.clone();
			let detail = match url {
				Some(url) if self.settings.auto_detail_extract => {
					match fetch_details(fetcher, &url).await {
						Ok(detail) => detail,
						Err(error) => {
							warn!(%error, url = %url, "detail fetch failed, using basic details");
							CourseDetail::basic(&self.courses[index])
						}
					}
				}
				_ => CourseDetail::basic(&self.courses[index]),
			};
			let course = &mut self.courses[index];
			course.course_details = Some(detail);
			course.needs_detail_extraction = false;
		}

		self.busy = false;
		self.persist();
		Ok(&self.courses)
	}

	/// Details for one course addressed by id (or list index when the id
	/// doesn't resolve). A fetch failure aborts; a course with no syllabus
	/// link gets the basic placeholder.
	pub async fn extract_course_detail<F: DetailFetcher>(
		&mut self,
		course_id: &str,
		fetcher: &F,
	) -> Result<CourseDetail> {
		self.begin()?;
		let result = self.course_detail(course_id, fetcher).await;
		self.busy = false;
		if result.is_ok() {
			self.persist();
		}
		result
	}

	async fn course_detail<F: DetailFetcher>(
		&mut self,
		course_id: &str,
		fetcher: &F,
	) -> Result<CourseDetail> {
		let index = self.find_course(course_id)?;
		let detail = match self.courses[index].detail_url.clone() {
			Some(url) => fetch_details(fetcher, &url).await?,
			None => CourseDetail::basic(&self.courses[index]),
		};

		let course = &mut self.courses[index];
		course.course_details = Some(detail.clone());
		course.needs_detail_extraction = false;
		Ok(detail)
	}

	/// Removes one course; a stale id surfaces as [`Error::CourseNotFound`].
	pub fn remove_course(&mut self, course_id: &str) -> Result<Course> {
		let index = self.find_course(course_id)?;
		let removed = self.courses.remove(index);
		self.persist();
		Ok(removed)
	}

	/// Drops the whole list and persists the empty state.
	pub fn clear(&mut self) {
		self.courses.clear();
		self.persist();
	}

	/// Google Calendar links for one course, one per meeting slot.
	pub fn calendar_links(
		&self,
		course_id: &str,
		today: DateTime<Tz>,
		until: Option<DateTime<Tz>>,
	) -> Result<Vec<String>> {
		let index = self.find_course(course_id)?;
		calendar::google_calendar_links(&self.courses[index], &self.settings, today, until)
	}

	/// The whole course list as an iCalendar document.
	pub fn export_ics(&self, today: DateTime<Tz>, until: Option<DateTime<Tz>>) -> Result<String> {
		let calendar = calendar::build_calendar(&self.courses, &self.settings, today, until)?;
		Ok(calendar.to_string())
	}

	/// The whole course list as pretty-printed JSON.
	pub fn export_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(&self.courses)?)
	}

	fn find_course(&self, course_id: &str) -> Result<usize> {
		self.courses
			.iter()
			.position(|course| course.id == course_id)
			.or_else(|| {
				course_id
					.parse::<usize>()
					.ok()
					.filter(|&index| index < self.courses.len())
			})
			.ok_or_else(|| Error::CourseNotFound(course_id.to_string()))
	}

	fn scrape(&mut self, html: &str) {
		let document = Document::from(html);
		let cells = schedule::collect_cells(&document);
		debug!(candidates = cells.len(), "collected candidate cells");

		self.courses.clear();
		for cell in cells {
			self.add_cell(cell);
		}
		info!(count = self.courses.len(), "courses extracted");
	}

	fn add_cell(&mut self, cell: ScheduleCell) {
		let text = parse::clean_cell_text(&cell.text);
		if !parse::looks_like_course(&text) {
			return;
		}
		let ParseOutcome::Matched(parsed) = parse::parse_course_text(&text) else {
			return;
		};

		self.add_course(Course {
			id: Course::make_id(&parsed.name, &parsed.teacher),
			name: format!("{} - {}", parsed.name, parsed.teacher),
			original_name: parsed.name,
			teacher: parsed.teacher,
			location: parsed.location,
			credits: parsed.credits,
			day: cell.day,
			time: cell.time,
			recurrence: parsed.recurrence,
			is_odd_week: parsed.is_odd_week,
			is_even_week: parsed.is_even_week,
			detail_url: cell.detail_url,
			sessions: Vec::new(),
			course_details: None,
			raw_text: text,
			needs_detail_extraction: true,
		});
	}

	/// Folds `course` into the list: a record with the same (name, teacher)
	/// key gains a session, anything else is appended. Every observed slot
	/// lands in `sessions`, so two observations mean two entries.
	pub fn add_course(&mut self, course: Course) {
		let slot = Session {
			day: course.day,
			time: course.time.clone(),
			location: course.location.clone(),
			recurrence: course.recurrence,
			is_odd_week: course.is_odd_week,
			is_even_week: course.is_even_week,
		};

		if let Some(existing) = self
			.courses
			.iter_mut()
			.find(|c| c.name == course.name && c.teacher == course.teacher)
		{
			existing.sessions.push(slot);
			// a syllabus link seen on a later slot still belongs to the course
			if existing.detail_url.is_none() {
				existing.detail_url = course.detail_url;
			}
		} else {
			let mut course = course;
			course.sessions.push(slot);
			self.courses.push(course);
		}
	}
}

async fn fetch_details<F: DetailFetcher>(fetcher: &F, url: &str) -> Result<CourseDetail> {
	debug!(url = %url, "fetching course detail page");
	let html = fetcher.fetch(url).await?;
	Ok(detail::scan_detail_document(&html))
}
