//! Durable output: accepted draft tables and the results log.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::schema::{CandidateScore, DraftTable, QualityMeasures, round2};

use super::SearchError;

/// Suffix of persisted draft files.
pub const DRAFT_FILE_SUFFIX: &str = ".draft.txt";

/// Name of the results log inside the results directory.
pub const RESULTS_FILE_NAME: &str = "results.txt";

/// Destination for the full draft table of every accepted candidate.
///
/// Called concurrently from all workers; writes for different ids are
/// independent of each other.
pub trait DraftSink: Send + Sync {
    fn persist(&self, id: &str, draft: &DraftTable) -> Result<(), SearchError>;
}

/// Append-only store for accepted scores. Only the pipeline consumer writes.
pub trait ResultStore: Send {
    fn append(&mut self, score: &CandidateScore) -> Result<(), SearchError>;
}

/// Writes each accepted draft to `<dir>/<id>.draft.txt`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    players: Vec<String>,
}

impl DirectorySink {
    /// Create the sink, creating `dir` if needed.
    pub fn new<P: AsRef<Path>>(dir: P, players: Vec<String>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, players })
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{DRAFT_FILE_SUFFIX}"))
    }

    /// Remove draft files left over from an earlier run. Returns how many.
    pub fn clear_stale(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_draft = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(DRAFT_FILE_SUFFIX));
            if is_draft && path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl DraftSink for DirectorySink {
    fn persist(&self, id: &str, draft: &DraftTable) -> Result<(), SearchError> {
        let path = self.path_for(id);
        // Write beside the target and rename so readers never see a partial file.
        let tmp = self.dir.join(format!(".{id}{DRAFT_FILE_SUFFIX}.tmp"));
        fs::write(&tmp, draft.serialize_text(&self.players))
            .map_err(|e| SearchError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| SearchError::io(&path, e))
    }
}

/// Tab-separated results log, flushed after every record.
pub struct TsvResultStore {
    writer: BufWriter<File>,
    path: PathBuf,
    measures: QualityMeasures,
}

impl TsvResultStore {
    /// Create `<dir>/results.txt` and write the header line.
    pub fn create<P: AsRef<Path>>(dir: P, measures: QualityMeasures) -> Result<Self, SearchError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| SearchError::io(dir, e))?;
        let path = dir.join(RESULTS_FILE_NAME);
        let file = File::create(&path).map_err(|e| SearchError::io(&path, e))?;

        let mut store = Self {
            writer: BufWriter::new(file),
            path,
            measures,
        };
        let header = store.header();
        store.write_line(&header)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header(&self) -> String {
        let mut line = String::from("ID");
        for measure in self.measures.enabled() {
            let name = measure.column_name();
            line.push_str(&format!("\t{name}Min\t{name}Max\t{name}Std"));
        }
        line
    }

    fn row(&self, score: &CandidateScore) -> String {
        let mut line = score.id.clone();
        for measure in self.measures.enabled() {
            match score.get(measure) {
                Some(s) => line.push_str(&format!(
                    "\t{}\t{}\t{}",
                    round2(s.min),
                    round2(s.max),
                    round2(s.std)
                )),
                None => line.push_str("\t\t\t"),
            }
        }
        line
    }

    fn write_line(&mut self, line: &str) -> Result<(), SearchError> {
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| SearchError::io(&self.path, e))
    }
}

impl ResultStore for TsvResultStore {
    fn append(&mut self, score: &CandidateScore) -> Result<(), SearchError> {
        let row = self.row(score);
        self.write_line(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{House, Measure, ScoreSummary};
    use tempfile::tempdir;

    fn players() -> Vec<String> {
        vec!["1".to_string(), "2".to_string()]
    }

    #[test]
    fn test_results_file_header_and_rows() {
        let dir = tempdir().unwrap();
        let measures = QualityMeasures {
            neighbor: true,
            game: true,
            proximity: false,
        };
        let mut store = TsvResultStore::create(dir.path(), measures).unwrap();
        let summary = ScoreSummary {
            min: 1.0,
            max: 3.456,
            std: 0.8165,
        };
        let score = CandidateScore::new("2-14")
            .with(Measure::Neighbor, summary)
            .with(Measure::Game, summary);
        store.append(&score).unwrap();

        // Flushed without dropping the store.
        let content = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "ID\tNeighborMin\tNeighborMax\tNeighborStd\tGamesMin\tGamesMax\tGamesStd"
        );
        assert_eq!(lines[1], "2-14\t1\t3.46\t0.82\t1\t3.46\t0.82");
    }

    #[test]
    fn test_sink_writes_draft_file() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path(), players()).unwrap();
        let draft = DraftTable::new(vec![vec![Some(House::Stark)], vec![Some(House::Arryn)]]);

        sink.persist("0-3", &draft).unwrap();

        let content = fs::read_to_string(dir.path().join("0-3.draft.txt")).unwrap();
        assert_eq!(content, "1\tStark\n2\tArryn\n");
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_clear_stale_only_removes_drafts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1-1.draft.txt"), "old").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        let sink = DirectorySink::new(dir.path(), players()).unwrap();

        assert_eq!(sink.clear_stale().unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("1-1.draft.txt").exists());
    }

    #[test]
    fn test_sink_reports_io_failure() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("gone"), players()).unwrap();
        fs::remove_dir(dir.path().join("gone")).unwrap();
        let draft = DraftTable::new(vec![vec![Some(House::Stark)]]);

        assert!(matches!(
            sink.persist("0-0", &draft),
            Err(SearchError::Io { .. })
        ));
    }
}
