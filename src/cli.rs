use clap::Parser;
use std::path::PathBuf;

use trailsift_logs::{FilterError, Predicate, SEARCH_KEY};

/// Compile and filter AWS CloudTrail logs.
///
/// Filters are substring matches and are combined with AND. The result is
/// printed to stdout as a single `{"Records": [...]}` document.
#[derive(Parser, Debug)]
#[command(name = "trailsift")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to collect CloudTrail files from
    #[arg(long, value_name = "DIR", conflicts_with = "file")]
    pub dir: Option<PathBuf>,

    /// File to collect CloudTrail records from
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Keep only successful AWS API calls
    #[arg(long = "successful_api")]
    pub successful_api: bool,

    /// Search for a matching string anywhere in the record. Non-ASCII
    /// characters match as typed, not as \uXXXX escapes
    #[arg(long)]
    pub search: Option<String>,

    /// Print each matching record as it is found instead of one document
    #[arg(long, requires = "dir")]
    pub dump: bool,

    /// Configuration file [default: <config dir>/trailsift/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Tracing level, overrides the config file (RUST_LOG takes precedence)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Filter on an eventVersion string
    #[arg(long = "eventVersion", value_name = "TEXT")]
    pub event_version: Option<String>,

    /// Filter on an eventTime string
    #[arg(long = "eventTime", value_name = "TEXT")]
    pub event_time: Option<String>,

    /// Filter on an eventSource string
    #[arg(long = "eventSource", value_name = "TEXT")]
    pub event_source: Option<String>,

    /// Filter on an eventName string
    #[arg(long = "eventName", value_name = "TEXT")]
    pub event_name: Option<String>,

    /// Filter on an awsRegion string
    #[arg(long = "awsRegion", value_name = "TEXT")]
    pub aws_region: Option<String>,

    /// Filter on a sourceIPAddress string
    #[arg(long = "sourceIPAddress", value_name = "TEXT")]
    pub source_ip_address: Option<String>,

    /// Filter on a userAgent string
    #[arg(long = "userAgent", value_name = "TEXT")]
    pub user_agent: Option<String>,

    /// Filter on a requestID string
    #[arg(long = "requestID", value_name = "TEXT")]
    pub request_id: Option<String>,

    /// Filter on an eventID string
    #[arg(long = "eventID", value_name = "TEXT")]
    pub event_id: Option<String>,

    /// Filter on readOnly [true|false]
    #[arg(long = "readOnly", value_name = "TEXT")]
    pub read_only: Option<String>,

    /// Filter on an eventType string
    #[arg(long = "eventType", value_name = "TEXT")]
    pub event_type: Option<String>,

    /// Filter on managementEvent [true|false]
    #[arg(long = "managementEvent", value_name = "TEXT")]
    pub management_event: Option<String>,

    /// Filter on a recipientAccountId string
    #[arg(long = "recipientAccountId", value_name = "TEXT")]
    pub recipient_account_id: Option<String>,

    /// Filter on an eventCategory string
    #[arg(long = "eventCategory", value_name = "TEXT")]
    pub event_category: Option<String>,

    /// Filter on sessionCredentialFromConsole [true|false]
    #[arg(long = "sessionCredentialFromConsole", value_name = "TEXT")]
    pub session_credential_from_console: Option<String>,
}

impl Args {
    /// Record field each filter flag matches against, in application order
    fn field_filters(&self) -> [(&'static str, Option<&String>); 15] {
        [
            ("eventVersion", self.event_version.as_ref()),
            ("eventTime", self.event_time.as_ref()),
            ("eventSource", self.event_source.as_ref()),
            ("eventName", self.event_name.as_ref()),
            ("awsRegion", self.aws_region.as_ref()),
            ("sourceIPAddress", self.source_ip_address.as_ref()),
            ("userAgent", self.user_agent.as_ref()),
            ("requestID", self.request_id.as_ref()),
            ("eventID", self.event_id.as_ref()),
            ("readOnly", self.read_only.as_ref()),
            ("eventType", self.event_type.as_ref()),
            ("managementEvent", self.management_event.as_ref()),
            ("recipientAccountId", self.recipient_account_id.as_ref()),
            ("eventCategory", self.event_category.as_ref()),
            (
                "sessionCredentialFromConsole",
                self.session_credential_from_console.as_ref(),
            ),
        ]
    }

    /// Predicates for every filter flag given, `--search` first.
    ///
    /// Flags given an empty value are ignored, like flags not given at all.
    pub fn predicates(&self) -> Result<Vec<Predicate>, FilterError> {
        std::iter::once((SEARCH_KEY, self.search.as_ref()))
            .chain(self.field_filters())
            .filter_map(|(field, value)| value.filter(|v| !v.is_empty()).map(|v| (field, v)))
            .map(|(field, value)| Predicate::new(field, value))
            .collect()
    }
}
