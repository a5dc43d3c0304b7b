//! Queue snapshots on disk.
//!
//! Every fetch stores the raw workflow runs of one repository at
//! `<output_dir>/<owner>/<repo>/<YYYYMMDD_HHMMSSZ>.json`. The file name is
//! the only record of when the sample was taken, so [`parse_snapshot_tree`]
//! reads it back from there when rebuilding statistics from old snapshots.

use crate::error::SnapshotError;
use crate::github::{RepoQueue, RunStatus};
use crate::stats::{QueueStat, QueueStatWriter};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// strftime pattern of snapshot file stems, e.g. `20210304_050607Z`
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y%m%d_%H%M%SZ";

static SNAPSHOT_FILE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8}_\d{6}Z)\.json$").expect("valid snapshot regex"));

pub fn snapshot_file_name(timestamp: &DateTime<Utc>) -> String {
    format!("{}.json", timestamp.format(SNAPSHOT_TIME_FORMAT))
}

pub fn snapshot_path(output_dir: &Path, owner: &str, repo: &str, timestamp: &DateTime<Utc>) -> PathBuf {
    output_dir
        .join(owner)
        .join(repo)
        .join(snapshot_file_name(timestamp))
}

/// Write the runs of one fetch, creating directories as needed
pub fn write_snapshot(output_dir: &Path, queue: &RepoQueue) -> Result<PathBuf, SnapshotError> {
    let path = snapshot_path(output_dir, &queue.owner, &queue.repo, &queue.timestamp);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string(&queue.runs)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Recover the sample time from a snapshot's file name (UTC)
pub fn timestamp_from_filename(path: &Path) -> Result<DateTime<Utc>, SnapshotError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let bad_name = || SnapshotError::BadFileName(name.to_string());

    let stem = SNAPSHOT_FILE_REGEX
        .captures(name)
        .and_then(|c| c.get(1))
        .ok_or_else(bad_name)?
        .as_str();
    let naive = NaiveDateTime::parse_from_str(stem, SNAPSHOT_TIME_FORMAT).map_err(|_| bad_name())?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[derive(Debug, Deserialize)]
struct RunStatusField {
    status: Option<String>,
}

/// Queued and in-progress counts for a list of runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub queued: u64,
    pub in_progress: u64,
}

impl StatusCounts {
    fn add(&mut self, status: Option<&str>) {
        match status {
            Some(s) if s == RunStatus::Queued.as_str() => self.queued += 1,
            Some(s) if s == RunStatus::InProgress.as_str() => self.in_progress += 1,
            _ => {}
        }
    }
}

/// Count runs by their `status` field
pub fn count_statuses(runs: &[serde_json::Value]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for run in runs {
        counts.add(run.get("status").and_then(|s| s.as_str()));
    }
    counts
}

/// Read one snapshot file and count its runs
pub fn read_snapshot_counts(path: &Path) -> Result<StatusCounts, SnapshotError> {
    let content = std::fs::read_to_string(path)?;
    let runs: Vec<RunStatusField> = serde_json::from_str(&content).map_err(|e| {
        if e.is_data() {
            SnapshotError::NotAnArray {
                path: path.display().to_string(),
            }
        } else {
            SnapshotError::Json(e)
        }
    })?;

    let mut counts = StatusCounts::default();
    for run in &runs {
        counts.add(run.status.as_deref());
    }
    Ok(counts)
}

/// Outcome of re-parsing one owner's snapshot directory
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Rows written, in output order
    pub stats: Vec<QueueStat>,
    /// Files and directories that could not be read or parsed
    pub failed: Vec<PathBuf>,
}

impl ParseReport {
    pub fn written(&self) -> usize {
        self.stats.len()
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, SnapshotError> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

fn stat_from_file(owner: &str, repo: &str, path: &Path) -> Result<QueueStat, SnapshotError> {
    let counts = read_snapshot_counts(path)?;
    let timestamp = timestamp_from_filename(path)?;
    Ok(QueueStat {
        repository_owner: owner.to_string(),
        repository_name: repo.to_string(),
        queued: counts.queued,
        in_progress: counts.in_progress,
        timestamp,
    })
}

/// Turn every `<repo>/*.json` snapshot under `repos_dir` into a statistics row.
///
/// A file or directory that cannot be read or parsed is recorded in the
/// report and skipped. Only a failure to write the output is an error.
pub fn parse_owner_dir<W: Write>(
    owner: &str,
    repos_dir: &Path,
    writer: &mut QueueStatWriter<W>,
) -> Result<ParseReport, SnapshotError> {
    let mut report = ParseReport::default();

    let repo_dirs = match sorted_entries(repos_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %repos_dir.display(), "skipping owner directory: {e}");
            report.failed.push(repos_dir.to_path_buf());
            return Ok(report);
        }
    };

    for repo_dir in repo_dirs {
        if !repo_dir.is_dir() {
            continue;
        }
        let Some(repo) = repo_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let files = match sorted_entries(&repo_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %repo_dir.display(), "skipping repository directory: {e}");
                report.failed.push(repo_dir);
                continue;
            }
        };

        for file in files {
            if file.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match stat_from_file(owner, repo, &file) {
                Ok(stat) => {
                    writer.write(&stat)?;
                    report.stats.push(stat);
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), "skipping snapshot: {e}");
                    report.failed.push(file);
                }
            }
        }
    }

    Ok(report)
}

/// Where the statistics of `owner` go. A single owner uses `output` as is;
/// with several owners each gets `<output>_<owner>`.
pub fn output_path_for(output: &Path, owner: &str, owner_count: usize) -> PathBuf {
    if owner_count == 1 {
        output.to_path_buf()
    } else {
        let mut name = output.as_os_str().to_os_string();
        name.push(format!("_{owner}"));
        PathBuf::from(name)
    }
}

/// Re-parse a whole snapshot tree (`<base>/<owner>/<repo>/*.json`).
///
/// Returns the output file and report for every owner.
pub fn parse_snapshot_tree(
    base_dir: &Path,
    output: &Path,
) -> Result<Vec<(String, PathBuf, ParseReport)>, SnapshotError> {
    let owners: Vec<PathBuf> = sorted_entries(base_dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();

    let mut results = Vec::new();
    for owner_dir in &owners {
        let Some(owner) = owner_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let out_path = output_path_for(output, owner, owners.len());
        tracing::info!(owner, output = %out_path.display(), "parsing snapshots");

        let mut writer = QueueStatWriter::create(&out_path)?;
        let report = parse_owner_dir(owner, owner_dir, &mut writer)?;
        writer.flush()?;

        results.push((owner.to_string(), out_path, report));
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn test_file_name_format() {
        let name = snapshot_file_name(&ts());
        assert_eq!(name, "20210304_050607Z.json");
        assert_eq!(name.len() - ".json".len(), 16);
        assert_eq!(timestamp_from_filename(Path::new(&name)).unwrap(), ts());
    }

    #[test]
    fn test_snapshot_path_layout() {
        let path = snapshot_path(Path::new("/stats"), "apache", "airflow", &ts());
        assert_eq!(path, PathBuf::from("/stats/apache/airflow/20210304_050607Z.json"));
    }

    #[test]
    fn test_bad_file_names() {
        for name in ["2021-03-04.json", "20210304_050607Z.txt", "20211304_050607Z.json", "x20210304_050607Z.json"] {
            let err = timestamp_from_filename(Path::new(name)).unwrap_err();
            assert!(matches!(err, SnapshotError::BadFileName(_)), "{name}");
        }
    }

    #[test]
    fn test_count_statuses() {
        let runs = vec![
            json!({"status": "queued"}),
            json!({"status": "in_progress"}),
            json!({"status": "queued"}),
            json!({"status": "completed"}),
            json!({"id": 5}),
        ];
        assert_eq!(count_statuses(&runs), StatusCounts { queued: 2, in_progress: 1 });
    }

    #[test]
    fn test_write_then_parse_tree() {
        let dir = tempfile::tempdir().unwrap();
        let stats_dir = dir.path().join("stats");

        let queue = RepoQueue {
            owner: String::from("apache"),
            repo: String::from("airflow"),
            runs: vec![
                json!({"id": 1, "status": "queued"}),
                json!({"id": 2, "status": "in_progress"}),
                json!({"id": 3, "status": "in_progress"}),
            ],
            queued: 1,
            in_progress: 2,
            timestamp: ts(),
        };
        let written = write_snapshot(&stats_dir, &queue).unwrap();
        assert!(written.ends_with("apache/airflow/20210304_050607Z.json"));

        // a corrupt file and an unrelated file in the same repository
        let repo_dir = stats_dir.join("apache").join("airflow");
        std::fs::write(repo_dir.join("20210304_060000Z.json"), "{not json").unwrap();
        std::fs::write(repo_dir.join("notes.txt"), "ignored").unwrap();

        let output = dir.path().join("bq.csv");
        let results = parse_snapshot_tree(&stats_dir, &output).unwrap();
        assert_eq!(results.len(), 1);

        let (owner, path, report) = &results[0];
        assert_eq!(owner, "apache");
        assert_eq!(path, &output);
        assert_eq!(report.written(), 1);
        assert_eq!(report.stats[0].repository_name, "airflow");
        assert_eq!((report.stats[0].queued, report.stats[0].in_progress), (1, 2));
        assert_eq!(report.failed, vec![repo_dir.join("20210304_060000Z.json")]);

        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            csv,
            "repository_owner,repository_name,queued,in_progress,timestamp\n\
             apache,airflow,1,2,2021-03-04T05:06:07Z\n"
        );
    }

    #[test]
    fn test_bad_timestamp_name_fails_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let repo_dir = dir.path().join("apache").join("beam");
        std::fs::create_dir_all(&repo_dir).unwrap();
        std::fs::write(repo_dir.join("latest.json"), "[]").unwrap();
        std::fs::write(repo_dir.join("20210101_000000Z.json"), r#"[{"status": "queued"}]"#).unwrap();

        let mut writer = QueueStatWriter::new(Vec::new()).unwrap();
        let report = parse_owner_dir("apache", &dir.path().join("apache"), &mut writer).unwrap();
        assert_eq!(report.written(), 1);
        assert_eq!(report.failed, vec![repo_dir.join("latest.json")]);
    }

    #[test]
    fn test_missing_owner_dir_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nobody");

        let mut writer = QueueStatWriter::new(Vec::new()).unwrap();
        let report = parse_owner_dir("nobody", &missing, &mut writer).unwrap();
        assert_eq!(report.written(), 0);
        assert_eq!(report.failed, vec![missing]);

        let csv = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(csv, "repository_owner,repository_name,queued,in_progress,timestamp\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_repo_dir_does_not_stop_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let owner_dir = dir.path().join("apache");
        let locked = owner_dir.join("airflow");
        let open = owner_dir.join("beam");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::create_dir_all(&open).unwrap();
        std::fs::write(open.join("20210101_000000Z.json"), r#"[{"status": "queued"}]"#).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // root can still list a 0o000 directory
        let readable = std::fs::read_dir(&locked).is_ok();

        let mut writer = QueueStatWriter::new(Vec::new()).unwrap();
        let report = parse_owner_dir("apache", &owner_dir, &mut writer).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.written(), 1);
        assert_eq!(report.stats[0].repository_name, "beam");
        if !readable {
            assert_eq!(report.failed, vec![locked]);
        }
    }

    #[test]
    fn test_snapshot_must_be_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20210101_000000Z.json");
        std::fs::write(&path, r#"{"workflow_runs": []}"#).unwrap();
        let err = read_snapshot_counts(&path).unwrap_err();
        assert!(matches!(err, SnapshotError::NotAnArray { .. }));
    }

    #[test]
    fn test_multiple_owners_get_suffixed_outputs() {
        let dir = tempfile::tempdir().unwrap();
        for owner in ["apache", "kubernetes"] {
            std::fs::create_dir_all(dir.path().join("in").join(owner).join("repo")).unwrap();
        }

        let output = dir.path().join("bq.csv");
        let results = parse_snapshot_tree(&dir.path().join("in"), &output).unwrap();
        let paths: Vec<&PathBuf> = results.iter().map(|(_, p, _)| p).collect();
        assert_eq!(
            paths,
            vec![&dir.path().join("bq.csv_apache"), &dir.path().join("bq.csv_kubernetes")]
        );
        assert!(dir.path().join("bq.csv_apache").exists());
    }
}
