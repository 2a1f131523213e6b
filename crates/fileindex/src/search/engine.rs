//! Substring search over an index snapshot.

use std::collections::HashSet;

use super::query::SearchQuery;
use crate::cancel::{SearchSessions, SessionToken};
use crate::file_type::FileKind;
use crate::index::Index;
use crate::path::{join_index_path, normalize_index_path, path_depth, relative_to_scope};
use crate::types::SearchHit;

/// Matches kept per term before the scan of that term stops.
pub const MAX_RESULTS_PER_TERM: usize = 100;

/// Runs searches and tracks which one is current for each session.
#[derive(Debug, Default)]
pub struct SearchEngine {
    sessions: SearchSessions,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &SearchSessions {
        &self.sessions
    }

    /// Searches `index` below `scope`.
    ///
    /// A search superseded by a newer one on the same `session_id` returns an
    /// empty list; callers must not read that as "no matches".
    pub fn search(
        &self,
        index: &Index,
        query: &str,
        scope: &str,
        session_id: &str,
    ) -> Vec<SearchHit> {
        let token = self.sessions.begin(session_id);
        let query = SearchQuery::parse(query);
        let hits = self.search_with_token(index, &query, scope, &token);
        self.sessions.finish(&token);

        match hits {
            Some(hits) => hits,
            None => {
                log::debug!(
                    "filesystem search superseded source={} session={}",
                    index.name(),
                    session_id
                );
                Vec::new()
            }
        }
    }

    /// Returns `None` once `token` has been superseded.
    pub(crate) fn search_with_token(
        &self,
        index: &Index,
        query: &SearchQuery,
        scope: &str,
        token: &SessionToken,
    ) -> Option<Vec<SearchHit>> {
        let scope = normalize_index_path(scope);
        let directories = index.snapshot_scope(&scope);
        let mut seen = HashSet::new();
        let mut hits = Vec::new();

        for term in &query.terms {
            self.sessions.check(token)?;
            let mut found = 0usize;

            'directories: for dir in &directories {
                self.sessions.check(token)?;

                if dir.path != scope
                    && query.matches(term, &dir.name, FileKind::Directory, dir.size)
                    && seen.insert(dir.path.clone())
                {
                    hits.push(SearchHit {
                        path: relative_to_scope(&dir.path, &scope).to_string(),
                        kind: FileKind::Directory,
                        size: dir.size,
                    });
                    found += 1;
                    if found >= MAX_RESULTS_PER_TERM {
                        break 'directories;
                    }
                }

                for file in &dir.files {
                    if !query.matches(term, &file.name, file.kind, file.size) {
                        continue;
                    }
                    let path = join_index_path(&dir.path, &file.name);
                    if !seen.insert(path.clone()) {
                        continue;
                    }
                    hits.push(SearchHit {
                        path: relative_to_scope(&path, &scope).to_string(),
                        kind: file.kind,
                        size: file.size,
                    });
                    found += 1;
                    if found >= MAX_RESULTS_PER_TERM {
                        break 'directories;
                    }
                }
            }
        }

        self.sessions.check(token)?;
        hits.sort_by_key(|hit| path_depth(&hit.path));
        Some(hits)
    }
}
