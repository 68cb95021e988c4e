#![warn(clippy::pedantic)]

use std::{
	fs,
	io::{self, Read, Write},
	path::PathBuf,
};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use fum2cal_core::{
	calendar,
	detail::HttpFetcher,
	extract::Extractor,
	storage::{FileStore, MemoryStore, Storage},
	TZ,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
	/// Saved schedule page; stdin when omitted.
	#[clap(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
	path: Option<PathBuf>,
	#[clap(short, long, value_hint = clap::ValueHint::FilePath)]
	output: Option<PathBuf>,
	#[clap(short, long, value_enum, default_value = "ics")]
	format: Format,
	/// Fetch every course's syllabus page before exporting.
	#[clap(long)]
	details: bool,
	/// Persist the course list and settings to this JSON file.
	#[clap(long, value_hint = clap::ValueHint::FilePath)]
	store: Option<PathBuf>,
	/// Cap recurrence rules at the end of the current year.
	#[clap(long)]
	bounded: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
	Ics,
	Json,
	Links,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let args = Args::parse();
	let html = match &args.path {
		Some(path) => fs::read_to_string(path)
			.with_context(|| format!("failed to read {}", path.display()))?,
		None => {
			let mut html = String::new();
			io::stdin().read_to_string(&mut html)?;
			html
		}
	};

	match args.store.clone() {
		Some(path) => run(Extractor::new(FileStore::new(path)), &args, &html).await,
		None => run(Extractor::new(MemoryStore::default()), &args, &html).await,
	}
}

async fn run<S: Storage>(
	mut extractor: Extractor<S>,
	args: &Args,
	html: &str,
) -> anyhow::Result<()> {
	let today = Utc::now().with_timezone(&TZ);

	if args.details {
		extractor
			.auto_extract_with_details(html, &HttpFetcher::new())
			.await?;
	} else {
		extractor.extract_courses(html)?;
	}
	info!(count = extractor.courses().len(), "courses extracted");

	let until = args.bounded.then(|| calendar::end_of_year(today));
	let rendered = match args.format {
		Format::Ics => extractor.export_ics(today, until)?,
		Format::Json => extractor.export_json()?,
		Format::Links => {
			let mut lines = Vec::new();
			for course in extractor.courses() {
				lines.extend(calendar::google_calendar_links(
					course,
					extractor.settings(),
					today,
					until,
				)?);
			}
			lines.join("\n")
		}
	};

	if let Some(output) = &args.output {
		let mut file = fs::File::create(output)
			.with_context(|| format!("failed to create {}", output.display()))?;
		write!(&mut file, "{rendered}")?;
	} else {
		write!(&mut io::stdout(), "{rendered}")?;
	}

	Ok(())
}
