//! PLY to `points3D.txt` conversion.
//!
//! A conversion is one sequential pass:
//!
//! ```text
//! Start -> HeaderParsed -> Decoding -> Writing -> Done
//! ```
//!
//! Structural problems (bad magic, missing coordinates, unreadable input,
//! unwritable output) abort the pass from whatever stage is running. Bad
//! records are skipped and only show up in the counters.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::colmap::{self, POINTS3D_FILE};
use crate::dedup::PointSet;
use crate::ply::{Encoding, PlyReader, RecordOutcome, DEFAULT_COLOR};
use crate::util::{ConvertError, Result};

/// Records between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 500_000;

/// Conversion stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Start,
    HeaderParsed,
    Decoding,
    Writing,
    Done,
}

impl Stage {
    /// What the converter is doing while in this stage.
    pub const fn activity(self) -> &'static str {
        match self {
            Self::Start => "opening the input and reading the header",
            Self::HeaderParsed => "preparing the record decoder",
            Self::Decoding => "decoding records",
            Self::Writing => "writing the output",
            Self::Done => "finishing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::HeaderParsed => "header parsed",
            Self::Decoding => "decoding",
            Self::Writing => "writing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Knobs for one conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// File name used next to the input when no output path is given.
    pub output_name: String,
    /// Records between progress reports, 0 disables them.
    pub progress_interval: u64,
    /// Colour of every point when the input has no colour fields.
    pub default_color: [u8; 3],
    /// Memory map binary bodies instead of reading them through a buffer.
    pub use_mmap: bool,
    /// Also emit progress as the `Progress: ...` text line.
    pub legacy_progress_lines: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_name: POINTS3D_FILE.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            default_color: DEFAULT_COLOR,
            use_mmap: true,
            legacy_progress_lines: true,
        }
    }
}

/// A progress report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub processed: u64,
    pub unique: u64,
    /// `processed / declared * 100`, 0 when nothing was declared.
    pub percent: f64,
}

impl Progress {
    pub fn new(processed: u64, unique: u64, declared: u64) -> Self {
        let percent = if declared == 0 {
            0.0
        } else {
            processed as f64 / declared as f64 * 100.0
        };
        Self { processed, unique, percent }
    }

    /// The text form existing log scrapers parse.
    pub fn legacy_line(&self) -> String {
        format!(
            "Progress: {:.1}% - Processed: {}, Unique: {}",
            self.percent,
            group_digits(self.processed),
            group_digits(self.unique)
        )
    }
}

/// Receiver of conversion telemetry. Every hook defaults to doing nothing.
pub trait ProgressSink {
    fn progress(&mut self, _progress: &Progress) {}

    fn log(&mut self, _line: &str) {}

    fn stage(&mut self, _stage: Stage) {}
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

impl<F: FnMut(&Progress)> ProgressSink for F {
    fn progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Outcome of a successful conversion.
#[derive(Clone, Debug)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub encoding: Encoding,
    /// Vertex count declared by the header.
    pub declared: u64,
    /// Records examined, valid or not.
    pub processed: u64,
    /// Points written.
    pub unique: u64,
    /// Records skipped as unparseable.
    pub malformed: u64,
    /// The binary body ended before the declared count.
    pub truncated: bool,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl ConversionReport {
    /// Share of examined records that did not make it to the output.
    pub fn reduction_percent(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            (self.processed - self.unique) as f64 / self.processed as f64 * 100.0
        }
    }

    /// Human readable summary, one line per entry.
    pub fn summary_lines(&self) -> Vec<String> {
        const MB: f64 = 1024.0 * 1024.0;
        vec![
            format!("Input file size:  {:.1} MB", self.input_bytes as f64 / MB),
            format!("Output file size: {:.1} MB", self.output_bytes as f64 / MB),
            format!("Points created:   {}", group_digits(self.unique)),
            format!("Duplicates removed: {:.1}%", self.reduction_percent()),
            format!("Output file:      {}", self.output.display()),
        ]
    }
}

/// Output path used when the caller does not pick one.
pub fn default_output_path(input: &Path, name: &str) -> PathBuf {
    input.parent().unwrap_or_else(|| Path::new("")).join(name)
}

/// Convert with default options and no progress sink.
pub fn convert(
    input: impl AsRef<Path>,
    output: Option<&Path>,
) -> std::result::Result<ConversionReport, ConvertError> {
    convert_with(input, output, &ConvertOptions::default(), &mut NoProgress)
}

/// Convert and report only success or failure.
///
/// The failure is logged and handed to the sink as a text line.
pub fn convert_ok(input: impl AsRef<Path>, output: Option<&Path>, sink: &mut dyn ProgressSink) -> bool {
    match convert_with(input, output, &ConvertOptions::default(), sink) {
        Ok(_) => true,
        Err(e) => {
            let line = format!("ERROR during conversion: {e}");
            error!("{}", line);
            sink.log(&line);
            false
        }
    }
}

/// Convert `input` into a deduplicated `points3D.txt`.
///
/// Without an explicit `output` the file is written next to the input under
/// [`ConvertOptions::output_name`].
pub fn convert_with(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    options: &ConvertOptions,
    sink: &mut dyn ProgressSink,
) -> std::result::Result<ConversionReport, ConvertError> {
    let input = input.as_ref();
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input, &options.output_name));

    let mut stage = Stage::Start;
    sink.stage(stage);
    info!("Input file: {}", input.display());
    info!("Output file: {}", output.display());

    let mut reader = PlyReader::open_opts(input, options.use_mmap).map_err(|e| ConvertError::new(stage, e))?;
    let encoding = reader.header().encoding;
    let declared = reader.header().record_count;
    let input_bytes = reader.size();

    stage = Stage::HeaderParsed;
    sink.stage(stage);
    info!(
        "{} PLY, {} declared points, colour: {}",
        encoding,
        group_digits(declared),
        if reader.layout().has_color() { "yes" } else { "default" }
    );

    let mut records = reader
        .records(options.default_color)
        .map_err(|e| ConvertError::new(stage, e))?;

    stage = Stage::Decoding;
    sink.stage(stage);
    let set = deduplicate(records.by_ref(), declared, options, sink).map_err(|e| ConvertError::new(stage, e))?;
    let truncated = records.truncated();
    drop(records);

    info!("Total unique points found: {}", group_digits(set.unique()));
    if set.malformed() > 0 {
        warn!("{} malformed records skipped", group_digits(set.malformed()));
    }

    stage = Stage::Writing;
    sink.stage(stage);
    let output_bytes =
        colmap::write_points3d_file(&output, set.points()).map_err(|e| ConvertError::new(stage, e))?;

    let report = ConversionReport {
        input: input.to_path_buf(),
        output,
        encoding,
        declared,
        processed: set.processed(),
        unique: set.unique(),
        malformed: set.malformed(),
        truncated,
        input_bytes,
        output_bytes,
    };

    for line in report.summary_lines() {
        info!("{}", line);
        sink.log(&line);
    }
    sink.stage(Stage::Done);

    Ok(report)
}

/// Feed every record into a fresh [`PointSet`], reporting progress every
/// `options.progress_interval` records.
pub fn deduplicate<I>(
    records: I,
    declared: u64,
    options: &ConvertOptions,
    sink: &mut dyn ProgressSink,
) -> Result<PointSet>
where
    I: Iterator<Item = Result<RecordOutcome>>,
{
    let mut set = PointSet::with_capacity(declared);
    let interval = options.progress_interval;

    for outcome in records {
        set.observe(outcome?);

        if interval > 0 && set.processed() % interval == 0 {
            let progress = Progress::new(set.processed(), set.unique(), declared);
            if options.legacy_progress_lines {
                let line = progress.legacy_line();
                info!("{}", line);
                sink.log(&line);
            }
            sink.progress(&progress);
        }
    }

    Ok(set)
}

/// Format a count with comma thousands separators.
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Record;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(500_000), "500,000");
        assert_eq!(group_digits(12_345_678), "12,345,678");
    }

    #[test]
    fn test_legacy_line_shape() {
        let p = Progress::new(500_000, 499_990, 1_000_000);
        assert_eq!(
            p.legacy_line(),
            "Progress: 50.0% - Processed: 500,000, Unique: 499,990"
        );
        assert_eq!(Progress::new(10, 5, 0).percent, 0.0);
    }

    #[test]
    fn test_default_output_path() {
        let p = default_output_path(Path::new("/data/scan/cloud.ply"), "points3D.txt");
        assert_eq!(p, PathBuf::from("/data/scan/points3D.txt"));
        let p = default_output_path(Path::new("cloud.ply"), "points3D.txt");
        assert_eq!(p, PathBuf::from("points3D.txt"));
    }

    #[test]
    fn test_deduplicate_progress_cadence() {
        let records = (0..25u64).map(|i| {
            Ok(RecordOutcome::Point(Record::new((i % 20) as f64, 0.0, 0.0, [0; 3])))
        });
        let options = ConvertOptions {
            progress_interval: 10,
            ..ConvertOptions::default()
        };
        let mut reports = Vec::new();
        let mut sink = |p: &Progress| reports.push(*p);
        let set = deduplicate(records, 25, &options, &mut sink).unwrap();

        assert_eq!(set.processed(), 25);
        assert_eq!(set.unique(), 20);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], Progress::new(10, 10, 25));
        assert_eq!(reports[1], Progress::new(20, 20, 25));
    }

    #[test]
    fn test_report_reduction() {
        let report = ConversionReport {
            input: "in.ply".into(),
            output: "points3D.txt".into(),
            encoding: Encoding::Ascii,
            declared: 4,
            processed: 4,
            unique: 3,
            malformed: 0,
            truncated: false,
            input_bytes: 0,
            output_bytes: 0,
        };
        assert_eq!(report.reduction_percent(), 25.0);
        assert!(report.summary_lines()[3].contains("25.0%"));
    }
}
