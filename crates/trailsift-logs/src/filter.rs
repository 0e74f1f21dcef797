use trailsift_types::{Collection, Record, RecordExt};

use crate::error::FilterError;

/// Field name that selects a search across the whole record
pub const SEARCH_KEY: &str = "search";

/// A single substring predicate over records.
///
/// Matching is plain substring containment, case sensitive, with no glob or
/// regex syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// A top-level field exists and its text contains `value`
    Field { field: String, value: String },

    /// The record's pretty-printed text contains the value anywhere,
    /// nested structures included.
    ///
    /// Non-ASCII characters appear in that text as themselves, not as
    /// `\uXXXX` escapes, so search for `é` rather than `\u00e9`.
    Search(String),
}

impl Predicate {
    /// Build a predicate for `field`, treating [`SEARCH_KEY`] as a search.
    pub fn new(field: &str, value: &str) -> Result<Self, FilterError> {
        if field.is_empty() {
            return Err(FilterError::MissingField);
        }
        if value.is_empty() {
            return Err(FilterError::MissingValue);
        }

        Ok(if field == SEARCH_KEY {
            Self::Search(value.to_string())
        } else {
            Self::Field {
                field: field.to_string(),
                value: value.to_string(),
            }
        })
    }

    /// Check if a record matches this predicate
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Field { field, value } => record
                .field_text(field)
                .is_some_and(|text| text.contains(value.as_str())),
            Self::Search(value) => record.canonical_text().contains(value.as_str()),
        }
    }

    /// Copy the matching records into a new collection, keeping their order
    pub fn apply(&self, input: &Collection) -> Collection {
        input
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field { field, value } => write!(f, "{field} contains {value:?}"),
            Self::Search(value) => write!(f, "record contains {value:?}"),
        }
    }
}

/// Select the records of `input` whose `field` contains `value`.
///
/// A `field` of `"search"` matches `value` anywhere in the record instead.
/// Arguments are validated before any record is looked at: a missing
/// collection is an error, while an empty one simply yields no matches.
pub fn filter_records(
    input: Option<&Collection>,
    field: &str,
    value: &str,
) -> Result<Collection, FilterError> {
    let input = input.ok_or(FilterError::MissingInput)?;
    let predicate = Predicate::new(field, value)?;
    Ok(predicate.apply(input))
}

/// Apply each predicate in turn, feeding each output into the next.
///
/// The result holds the records matching every predicate. With no
/// predicates the input is returned unchanged.
pub fn apply_filters<'a, I>(input: Collection, predicates: I) -> Collection
where
    I: IntoIterator<Item = &'a Predicate>,
{
    predicates.into_iter().fold(input, |collection, predicate| {
        let narrowed = predicate.apply(&collection);
        tracing::debug!(
            %predicate,
            before = collection.len(),
            after = narrowed.len(),
            "applied filter"
        );
        narrowed
    })
}
