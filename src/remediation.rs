//! Operator guidance printed when compiling logs fails

use std::fmt::Write as _;

use trailsift_logs::CompileError;

/// Shell steps that decompress the logs and strip Windows line endings
const CLEANUP_STEPS: &[(&str, &str)] = &[
    ("Change to the CloudTrail log root directory", "cd <dir>"),
    ("Decompress the .json.gz files", "gunzip -r ."),
    (
        "Remove Windows carriage returns (^M)",
        r"find . -type f | xargs -Ix sed -i.bak -r 's/\r//g' x",
    ),
    (
        "After checking the .json files are OK, remove the .bak files",
        "find . -type f -name '*.bak' | xargs -Ix rm x",
    ),
];

/// Guidance for errors the operator can fix by preparing the input, or
/// `None` when the error message says everything.
pub fn guidance(err: &CompileError) -> Option<String> {
    match err {
        CompileError::CompressedInput { .. } => Some(
            "You must first decompress the CloudTrail logs, e.g. with `gunzip -r <dir>`.\n"
                .to_string(),
        ),
        CompileError::MalformedLog { .. } => Some(malformed_guidance()),
        CompileError::Io { .. } | CompileError::NotADirectory(_) | CompileError::Sink(_) => None,
    }
}

fn malformed_guidance() -> String {
    let mut text = String::from(
        "If you are running into errors you may need to remove Windows ^M from the .json files.\n\
         NOTICE: take caution running the commands below, they can corrupt files\n\
         if not run from the correct directory!\n#\n",
    );
    for (step, command) in CLEANUP_STEPS {
        let _ = writeln!(text, "# {step}\n$ {command}");
    }
    text
}
