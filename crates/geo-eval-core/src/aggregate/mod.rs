//! Company citation aggregation
//!
//! Folds the raw citation records of one ranking pass into canonical groups:
//! near-duplicate names merge, counts add up, URLs are deduplicated, and the
//! groups are ranked by total citations.

mod normalize;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::stream::RawCitationRecord;

pub use normalize::{normalize_company_name, ContainmentMatcher, NameMatcher};

/// One canonical company after merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRecord {
    /// Raw name of the record that founded the group
    pub name: String,
    /// Sum of the counts of every merged record
    pub times_cited: u64,
    /// Deduplicated, in first-seen order
    pub urls: Vec<String>,
}

struct Group {
    record: CompanyRecord,
    seen_urls: HashSet<String>,
}

impl Group {
    fn found(raw: &RawCitationRecord) -> Self {
        let mut group = Group {
            record: CompanyRecord {
                name: raw.name.clone(),
                times_cited: 0,
                urls: Vec::new(),
            },
            seen_urls: HashSet::new(),
        };
        group.merge(raw);
        group
    }

    fn merge(&mut self, raw: &RawCitationRecord) {
        self.record.times_cited += raw.times_cited;
        for url in &raw.urls {
            if self.seen_urls.insert(url.clone()) {
                self.record.urls.push(url.clone());
            }
        }
    }
}

/// Stateless aggregator; every call is a full pass over its input
#[derive(Clone)]
pub struct CompanyAggregator {
    matcher: Arc<dyn NameMatcher>,
}

impl CompanyAggregator {
    pub fn new() -> Self {
        Self::with_matcher(ContainmentMatcher)
    }

    /// Use a different similarity predicate without touching the grouping
    pub fn with_matcher(matcher: impl NameMatcher + 'static) -> Self {
        Self {
            matcher: Arc::new(matcher),
        }
    }

    /// Merge raw records into a ranked list of canonical companies
    ///
    /// Records are visited by descending count (stable on ties), so the most
    /// cited spelling founds each group. Groups tied on total keep founding order.
    pub fn aggregate(&self, records: &[RawCitationRecord]) -> Vec<CompanyRecord> {
        let mut ordered: Vec<&RawCitationRecord> = records.iter().collect();
        ordered.sort_by(|a, b| b.times_cited.cmp(&a.times_cited));

        let mut groups: Vec<Group> = Vec::new();
        for raw in ordered {
            match groups
                .iter_mut()
                .find(|g| self.matcher.is_same_company(&g.record.name, &raw.name))
            {
                Some(group) => group.merge(raw),
                None => groups.push(Group::found(raw)),
            }
        }

        let mut companies: Vec<CompanyRecord> = groups.into_iter().map(|g| g.record).collect();
        companies.sort_by(|a, b| b.times_cited.cmp(&a.times_cited));

        debug!(
            "Aggregated {} citation records into {} companies",
            records.len(),
            companies.len()
        );
        companies
    }
}

impl Default for CompanyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompanyAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanyAggregator").finish_non_exhaustive()
    }
}
