use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use trailsift_types::{Collection, Record, RecordExt};

use crate::error::CompileError;
use crate::paths::{enumerate_files, expand_tilde, is_backup, is_compressed};

/// Literal token for an unconverted Windows line ending, as some editors and
/// pagers render it
const CARET_M: &str = "^M";

/// Compile every log file under `root_dir` into one collection.
///
/// Each non-empty line of each file must be a `{"Records": [...]}` document.
/// Records are tagged with the path of the file they came from and appended
/// in file order, then line order. With `successful_only`, only
/// `AwsApiCall` events without an `errorCode` are kept.
pub fn compile_logs(
    root_dir: impl AsRef<Path>,
    successful_only: bool,
) -> Result<Collection, CompileError> {
    let root = expand_tilde(root_dir.as_ref());
    let files = log_files(&root)?;

    let mut collection = Collection::new();
    for path in &files {
        let records = read_log_file(path, successful_only)?;
        debug!(path = %path.display(), records = records.len(), "compiled log file");
        collection.append(records);
    }

    info!(
        root = %root.display(),
        files = files.len(),
        records = collection.len(),
        successful_only,
        "compiled CloudTrail logs"
    );
    Ok(collection)
}

/// Load a single file holding exactly one `{"Records": [...]}` document.
///
/// Unlike [`compile_logs`] the file is not split into lines and records are
/// returned untouched.
pub fn load_file(path: impl AsRef<Path>) -> Result<Collection, CompileError> {
    let path = expand_tilde(path.as_ref());
    let content = fs::read_to_string(&path).map_err(|e| CompileError::io(&path, e))?;
    let collection: Collection =
        serde_json::from_str(&content).map_err(|source| CompileError::MalformedLog {
            path: path.clone(),
            line: None,
            source,
        })?;

    info!(path = %path.display(), records = collection.len(), "loaded log file");
    Ok(collection)
}

/// Files under `root` that should be read, in enumeration order.
///
/// Fails without opening anything if a compressed archive is present.
pub(crate) fn log_files(root: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let files = enumerate_files(root)?;
    reject_compressed(&files)?;

    Ok(files
        .into_iter()
        .filter(|path| {
            let skip = is_backup(path);
            if skip {
                debug!(path = %path.display(), "skipping backup file");
            }
            !skip
        })
        .collect())
}

fn reject_compressed(files: &[PathBuf]) -> Result<(), CompileError> {
    let mut compressed = files.iter().filter(|path| is_compressed(path));
    match compressed.next() {
        Some(first) => Err(CompileError::CompressedInput {
            first: first.clone(),
            count: 1 + compressed.count(),
        }),
        None => Ok(()),
    }
}

/// Read one log file into its own collection
fn read_log_file(path: &Path, successful_only: bool) -> Result<Collection, CompileError> {
    let mut records = Collection::new();
    for_each_record(path, |record| {
        if !successful_only || record.is_successful_api_call() {
            records.push(record);
        }
        Ok(())
    })?;
    Ok(records)
}

/// Decode `path` line by line, handing every tagged record to `visit`.
///
/// The file handle is dropped before returning, whether decoding succeeded
/// or not.
pub(crate) fn for_each_record<F>(path: &Path, mut visit: F) -> Result<(), CompileError>
where
    F: FnMut(Record) -> Result<(), CompileError>,
{
    let file = File::open(path).map_err(|e| CompileError::io(path, e))?;
    let reader = BufReader::new(file);
    let source_file = path.display().to_string();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CompileError::io(path, e))?;
        if is_line_break_artifact(&line) {
            continue;
        }

        let document: Collection =
            serde_json::from_str(&line).map_err(|source| CompileError::MalformedLog {
                path: path.to_path_buf(),
                line: Some(index + 1),
                source,
            })?;

        for mut record in document {
            record.tag_source(&source_file);
            visit(record)?;
        }
    }

    Ok(())
}

/// Lines carrying no document.
///
/// `^M` is matched as a literal two-character token. A real `\r` before the
/// newline has already been stripped by the line reader.
fn is_line_break_artifact(line: &str) -> bool {
    matches!(line, "" | "\n" | "\r" | CARET_M)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn line(records: serde_json::Value) -> String {
        json!({ "Records": records }).to_string()
    }

    #[test]
    fn test_successful_only_keeps_clean_api_calls() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.json", &line(json!([{"eventType": "AwsApiCall"}])));
        write(
            &dir,
            "b.json",
            &line(json!([{"eventType": "AwsApiCall", "errorCode": "AccessDenied"}])),
        );

        let collection = compile_logs(dir.path(), true).unwrap();
        assert_eq!(collection.len(), 1);
        let record = &collection.records()[0];
        assert_eq!(record.source_file(), Some(a.display().to_string().as_str()));
        assert!(record.source_file().unwrap().ends_with("/a.json"));

        let everything = compile_logs(dir.path(), false).unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn test_records_in_file_then_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            "{}\n{}\n",
            line(json!([{"eventID": "1"}, {"eventID": "2"}])),
            line(json!([{"eventID": "3"}]))
        );
        write(&dir, "2024/01/a.json", &content);
        write(&dir, "2024/02/a.json", &line(json!([{"eventID": "4"}])));

        let collection = compile_logs(dir.path(), false).unwrap();
        let ids: Vec<_> = collection
            .iter()
            .map(|r| r.field_text("eventID").unwrap().into_owned())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_compressed_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.json", &line(json!([{"eventID": "1"}])));
        write(&dir, "b.json.gz", "\u{1f}binary");
        write(&dir, "c.json.gz", "\u{1f}binary");

        match compile_logs(dir.path(), false) {
            Err(CompileError::CompressedInput { first, count }) => {
                assert!(first.ends_with("b.json.gz"));
                assert_eq!(count, 2);
            }
            other => panic!("expected compressed input error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_line_identifies_file() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.json", &line(json!([{"eventID": "1"}])));
        let bad = write(
            &dir,
            "b.json",
            &format!("{}\n{{not json\n", line(json!([{"eventID": "2"}]))),
        );
        write(&dir, "c.json", &line(json!([{"eventID": "3"}])));

        match compile_logs(dir.path(), false) {
            Err(CompileError::MalformedLog { path, line, .. }) => {
                assert_eq!(path, bad);
                assert_eq!(line, Some(2));
            }
            other => panic!("expected malformed log error, got {other:?}"),
        }

        fs::remove_file(&bad).unwrap();
        let collection = compile_logs(dir.path(), false).unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_document_without_records_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.json", r#"{"events": []}"#);

        assert!(matches!(
            compile_logs(dir.path(), false),
            Err(CompileError::MalformedLog { line: Some(1), .. })
        ));
    }

    #[test]
    fn test_backups_and_line_artifacts_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            "\n{}\r\n^M\n\r\n{}\n",
            line(json!([{"eventID": "1"}])),
            line(json!([{"eventID": "2"}]))
        );
        write(&dir, "a.json", &content);
        write(&dir, "a.json.bak", "{this backup is never parsed");

        let collection = compile_logs(dir.path(), false).unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_stale_source_tag_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let now = write(
            &dir,
            "now.json",
            &line(json!([{"eventID": "1", "sourceFile": "/gone/old.json"}])),
        );

        let collection = compile_logs(dir.path(), false).unwrap();
        assert_eq!(
            collection.records()[0].source_file(),
            Some(now.display().to_string().as_str())
        );
    }

    #[test]
    fn test_load_file_reads_single_document() {
        let dir = tempfile::tempdir().unwrap();
        let pretty = json!({"Records": [{"eventID": "1"}, {"eventID": "2"}]});
        let path = write(
            &dir,
            "out.json",
            &serde_json::to_string_pretty(&pretty).unwrap(),
        );

        let collection = load_file(&path).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.records()[0].source_file().is_none());

        let broken = write(&dir, "broken.json", "{\"Records\": [");
        assert!(matches!(
            load_file(&broken),
            Err(CompileError::MalformedLog { line: None, .. })
        ));
    }

    #[test]
    fn test_compiled_output_can_be_loaded_again() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "logs/a.json", &line(json!([{"eventID": "1"}])));

        let compiled = compile_logs(dir.path().join("logs"), false).unwrap();
        let out = write(&dir, "out.json", &compiled.to_pretty_string(4).unwrap());

        assert_eq!(load_file(&out).unwrap(), compiled);
    }

    #[test]
    fn test_line_break_artifacts() {
        assert!(is_line_break_artifact(""));
        assert!(is_line_break_artifact("\r"));
        assert!(is_line_break_artifact("^M"));
        assert!(!is_line_break_artifact(" "));
        assert!(!is_line_break_artifact("{}"));
    }
}
