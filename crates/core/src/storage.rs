//! Persistence seam for the course list and settings.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::course::Course;
use crate::error::Result;
use crate::settings::Settings;

/// Everything that survives between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stored {
	pub courses: Vec<Course>,
	pub settings: Settings,
}

pub trait Storage {
	fn load(&self) -> Result<Stored>;
	fn save(&self, stored: &Stored) -> Result<()>;
}

/// JSON file on disk. A missing file loads as the empty default.
pub struct FileStore {
	path: PathBuf,
}

impl FileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl Storage for FileStore {
	fn load(&self) -> Result<Stored> {
		if !self.path.exists() {
			return Ok(Stored::default());
		}
		let file = File::open(&self.path)?;
		Ok(serde_json::from_reader(BufReader::new(file))?)
	}

	fn save(&self, stored: &Stored) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				std::fs::create_dir_all(parent)?;
			}
		}
		let file = File::create(&self.path)?;
		serde_json::to_writer_pretty(BufWriter::new(file), stored)?;
		Ok(())
	}
}

/// In-memory store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore(RefCell<Stored>);

impl Storage for MemoryStore {
	fn load(&self) -> Result<Stored> {
		Ok(self.0.borrow().clone())
	}

	fn save(&self, stored: &Stored) -> Result<()> {
		*self.0.borrow_mut() = stored.clone();
		Ok(())
	}
}
