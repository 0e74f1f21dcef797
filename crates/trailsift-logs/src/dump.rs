use std::path::Path;

use tracing::{debug, info};

use trailsift_types::{Record, RecordExt};

use crate::compiler::{for_each_record, log_files};
use crate::error::CompileError;
use crate::paths::expand_tilde;

/// Stream every record under `root_dir` containing `search_term` to
/// `on_record` as soon as it is decoded.
///
/// Files are read with the same rules as [`compile_logs`](crate::compile_logs),
/// but the records are never collected. An empty `search_term` matches every
/// record. Returns how many records were emitted; a callback error stops the
/// walk with [`CompileError::Sink`].
pub fn compile_and_print<F>(
    root_dir: impl AsRef<Path>,
    search_term: &str,
    mut on_record: F,
) -> Result<usize, CompileError>
where
    F: FnMut(&Record) -> std::io::Result<()>,
{
    let root = expand_tilde(root_dir.as_ref());
    let files = log_files(&root)?;

    let mut emitted = 0;
    for path in &files {
        let before = emitted;
        for_each_record(path, |record| {
            if record.canonical_text().contains(search_term) {
                on_record(&record).map_err(CompileError::Sink)?;
                emitted += 1;
            }
            Ok(())
        })?;
        debug!(path = %path.display(), emitted = emitted - before, "dumped log file");
    }

    info!(root = %root.display(), files = files.len(), emitted, "dumped CloudTrail logs");
    Ok(emitted)
}
