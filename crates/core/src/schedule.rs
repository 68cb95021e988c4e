//! Locating the weekly-schedule table in a document and walking its cells.
//!
//! Location is a cascade: the portal's exact table class signature, then any
//! table that looks like a schedule (hour headers, a weekday, a highlighted
//! cell), then highlighted cells anywhere, then a raw text sweep over every
//! element. Each matched cell is tagged with the weekday of its row and the
//! hour implied by its column.

use std::sync::LazyLock;

use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::{Any, Class, Name, Predicate};
use tracing::{debug, warn};

use crate::course::Weekday;
use crate::parse;

/// Background color the portal paints occupied slots with.
pub const HIGHLIGHT_COLOR: &str = "FFF3CD";

/// Hour of day implied by the first course column.
const FIRST_HOUR: usize = 6;
/// Number of hour columns, 6:00 through 20:00.
const HOUR_COLUMNS: usize = 15;

static WINDOW_OPEN_URL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"window\.open\s*\(\s*['"]([^'"]+)['"]"#).unwrap());

/// A candidate course cell, with the weekday and hour implied by its
/// position where they could be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCell {
	pub day: Option<Weekday>,
	pub time: String,
	pub text: String,
	pub detail_url: Option<String>,
}

/// Collects every candidate course cell in the document, trying the most
/// specific location strategy first.
#[must_use]
pub fn collect_cells(document: &Document) -> Vec<ScheduleCell> {
	if let Some(table) = find_schedule_table(document) {
		return cells_from_table(&table);
	}

	let colored = colored_cells(document);
	if !colored.is_empty() {
		return colored;
	}

	debug!("no schedule table or highlighted cells, sweeping element text");
	text_cells(document)
}

fn find_schedule_table(document: &Document) -> Option<Node<'_>> {
	let signature = Name("table")
		.and(Class("table"))
		.and(Class("table-sm"))
		.and(Class("border"))
		.and(Class("cell-border"));
	if let Some(table) = document.find(signature).next() {
		debug!("schedule table found by class signature");
		return Some(table);
	}

	let table = document.find(Name("table")).find(is_schedule_table);
	if table.is_some() {
		debug!("schedule table found by heuristic signature");
	}
	table
}

fn is_schedule_table(table: &Node) -> bool {
	let text = table.text();
	let has_hour_headers = ["6", "7", "8"].iter().all(|hour| text.contains(hour));
	let has_day = Weekday::find(&text).is_some();
	let has_highlight = table.find(Name("td")).any(|cell| is_highlighted(&cell));

	has_hour_headers && has_day && has_highlight
}

fn is_highlighted(cell: &Node) -> bool {
	let by_bgcolor = cell
		.attr("bgcolor")
		.is_some_and(|color| color.trim_start_matches('#').eq_ignore_ascii_case(HIGHLIGHT_COLOR));
	let by_style = cell
		.attr("style")
		.is_some_and(|style| style.to_ascii_uppercase().contains(HIGHLIGHT_COLOR));

	by_bgcolor || by_style
}

// Column 1 is 6:00, column 2 is 7:00, and so on.
fn hour_for_column(index: usize) -> String {
	if (1..=HOUR_COLUMNS).contains(&index) {
		format!("{}:00", FIRST_HOUR + index - 1)
	} else {
		String::new()
	}
}

fn cells_from_table(table: &Node) -> Vec<ScheduleCell> {
	let mut out = Vec::new();

	for row in table.find(Name("tr")) {
		let cells: Vec<Node> = row.find(Name("td").or(Name("th"))).collect();
		let Some(day) = cells.first().and_then(|cell| Weekday::find(&cell.text())) else {
			warn!("row without a recognizable weekday, skipping");
			continue;
		};

		for (index, cell) in cells.iter().enumerate().skip(1) {
			if !is_highlighted(cell) {
				continue;
			}
			if let Some(found) = candidate(cell, Some(day), hour_for_column(index)) {
				out.push(found);
			}
		}
	}

	out
}

fn colored_cells(document: &Document) -> Vec<ScheduleCell> {
	document
		.find(Name("td"))
		.filter(is_highlighted)
		.filter_map(|cell| {
			let (day, time) = position_of(&cell);
			candidate(&cell, day, time)
		})
		.collect()
}

// Day and hour recovered from a stray highlighted cell's enclosing row.
fn position_of(cell: &Node) -> (Option<Weekday>, String) {
	let mut ancestor = cell.parent();
	while let Some(node) = ancestor {
		if node.name() == Some("tr") {
			break;
		}
		ancestor = node.parent();
	}
	let Some(row) = ancestor else {
		return (None, String::new());
	};

	let cells: Vec<Node> = row.find(Name("td")).collect();
	let day = cells.first().and_then(|first| Weekday::find(&first.text()));
	let time = cells
		.iter()
		.position(|other| other.index() == cell.index())
		.map(hour_for_column)
		.unwrap_or_default();

	(day, time)
}

fn text_cells(document: &Document) -> Vec<ScheduleCell> {
	document
		.find(Any)
		.filter(|node| node.name().is_some())
		.filter_map(|node| {
			let text = parse::clean_cell_text(&node.text());
			if !parse::looks_like_course(&text) {
				return None;
			}
			// every ancestor repeats the text; keep the deepest element only
			let child_matches = node
				.children()
				.filter(|child| child.name().is_some())
				.any(|child| parse::looks_like_course(&parse::clean_cell_text(&child.text())));
			if child_matches {
				return None;
			}
			Some(ScheduleCell {
				day: None,
				time: String::new(),
				text,
				detail_url: detail_url(&node),
			})
		})
		.collect()
}

// Cells holding a dash or a couple of characters are empty slots.
fn candidate(cell: &Node, day: Option<Weekday>, time: String) -> Option<ScheduleCell> {
	let text = cell.text().trim().to_string();
	if text == "-" || text.chars().count() < 10 {
		return None;
	}
	Some(ScheduleCell {
		day,
		time,
		text,
		detail_url: detail_url(cell),
	})
}

/// Address of the course's syllabus page, mined from the `window.open`
/// handler of the طرح درس icon when the cell carries one.
fn detail_url(cell: &Node) -> Option<String> {
	cell.find(Name("span"))
		.filter_map(|span| span.attr("onclick"))
		.find_map(|onclick| {
			WINDOW_OPEN_URL
				.captures(onclick)
				.map(|caps| caps[1].to_string())
		})
}
