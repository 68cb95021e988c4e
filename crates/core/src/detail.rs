//! Fetching and scraping the per-course syllabus ("detail") page.

use std::time::Duration;

use async_trait::async_trait;
use select::document::Document;
use select::node::Node;
use select::predicate::Name;

use crate::course::CourseDetail;
use crate::error::{Error, Result};

/// How long a syllabus page may take before the fetch is abandoned.
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam over "open the page and hand back its markup" so tests can feed
/// canned documents instead of hitting the portal.
#[async_trait]
pub trait DetailFetcher {
	async fn fetch(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher. The whole request/body cycle races one timeout;
/// losing the race drops the in-flight request and surfaces
/// [`Error::DetailTimeout`].
pub struct HttpFetcher {
	client: reqwest::Client,
	timeout: Duration,
}

impl HttpFetcher {
	#[must_use]
	pub fn new() -> Self {
		Self::with_timeout(DETAIL_TIMEOUT)
	}

	#[must_use]
	pub fn with_timeout(timeout: Duration) -> Self {
		Self {
			client: reqwest::Client::new(),
			timeout,
		}
	}
}

impl Default for HttpFetcher {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl DetailFetcher for HttpFetcher {
	async fn fetch(&self, url: &str) -> Result<String> {
		let body = tokio::time::timeout(self.timeout, async {
			self.client.get(url).send().await?.text().await
		})
		.await
		.map_err(|_| Error::DetailTimeout(self.timeout))??;
		Ok(body)
	}
}

/// Pulls the labeled fields out of a syllabus page. Missing labels leave
/// their field empty; a partially-filled record is still a success.
#[must_use]
pub fn scan_detail_document(html: &str) -> CourseDetail {
	let document = Document::from(html);
	CourseDetail {
		title: find_field(&document, &["عنوان درس", "نام درس"]),
		code: find_field(&document, &["کد درس"]),
		credits: find_field(&document, &["تعداد واحد", "واحد"]),
		prerequisites: find_field(&document, &["پیش نیاز", "پیشنیاز"]),
		corequisites: find_field(&document, &["هم نیاز", "هم‌نیاز"]),
		evaluation: find_field(&document, &["نحوه ارزشیابی", "ارزشیابی"]),
		syllabus: find_field(&document, &["سرفصل", "محتوای درس", "سیلابس"]),
		resources: find_field(&document, &["منابع", "کتاب", "مرجع"]),
		objectives: find_field(&document, &["اهداف", "هدف"]),
		sessions: find_field(&document, &["تاریخ جلسه", "جلسات"]),
	}
}

// First keyword that hits wins: a two-column row whose label cell contains
// it, then any cell carrying a "label: value" pair.
fn find_field(document: &Document, keywords: &[&str]) -> String {
	for keyword in keywords {
		for row in document.find(Name("tr")) {
			let cells: Vec<Node> = row.find(Name("td")).collect();
			if cells.len() >= 2 && cells[0].text().contains(keyword) {
				return cells[1].text().trim().to_string();
			}
		}
		for cell in document.find(Name("td")) {
			let text = cell.text();
			if let Some((label, value)) = text.split_once(':') {
				if label.contains(keyword) && !value.trim().is_empty() {
					return value.trim().to_string();
				}
			}
		}
	}
	String::new()
}

#[cfg(test)]
mod tests {
	use super::*;

	const DETAIL_PAGE: &str = r"<html><body><table>
		<tr><td>عنوان درس</td><td>ریاضیات مهندسی</td></tr>
		<tr><td>کد درس</td><td>40-212</td></tr>
		<tr><td>تعداد واحد</td><td>3</td></tr>
		<tr><td>نحوه ارزشیابی</td><td>کویز و پروژه</td></tr>
		<tr><td>منابع: کتاب درسی و مقالات</td></tr>
	</table></body></html>";

	#[test]
	fn scans_two_column_rows() {
		let detail = scan_detail_document(DETAIL_PAGE);
		assert_eq!(detail.title, "ریاضیات مهندسی");
		assert_eq!(detail.code, "40-212");
		assert_eq!(detail.credits, "3");
		assert_eq!(detail.evaluation, "کویز و پروژه");
	}

	#[test]
	fn falls_back_to_colon_split_cells() {
		let detail = scan_detail_document(DETAIL_PAGE);
		assert_eq!(detail.resources, "کتاب درسی و مقالات");
	}

	#[test]
	fn missing_labels_leave_fields_empty() {
		let detail = scan_detail_document(DETAIL_PAGE);
		assert!(detail.prerequisites.is_empty());
		assert!(detail.objectives.is_empty());
		assert!(detail.sessions.is_empty());
	}
}
