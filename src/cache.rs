use std::collections::HashMap;

use tracing::debug;

use crate::error::SqlGateError;
use crate::statement::PreparedStatement;

/// Per-connection map from raw SQL text to its prepared statement.
///
/// Keys are the exact text callers pass in; `"select 1"` and `"SELECT 1"` get independent
/// entries. The cache never evicts.
#[derive(Debug)]
pub struct StatementCache<S> {
    statements: HashMap<String, S>,
}

impl<S> Default for StatementCache<S> {
    fn default() -> Self {
        Self {
            statements: HashMap::new(),
        }
    }
}

impl<S: PreparedStatement> StatementCache<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the statement cached for `sql`, creating and building it on a miss.
    ///
    /// A statement whose build fails is not stored.
    ///
    /// # Errors
    /// Propagates the build failure of a newly created statement.
    pub fn get_or_build<F>(&mut self, sql: &str, make: F) -> Result<&mut S, SqlGateError>
    where
        F: FnOnce(&str) -> S,
    {
        if !self.statements.contains_key(sql) {
            debug!(sql, "statement cache miss");
            let mut stmt = make(sql);
            stmt.build()?;
            self.statements.insert(sql.to_string(), stmt);
        }
        self.statements.get_mut(sql).ok_or_else(|| {
            SqlGateError::prepare(sql, "statement vanished from the cache")
        })
    }

    #[must_use]
    pub fn get(&self, sql: &str) -> Option<&S> {
        self.statements.get(sql)
    }

    #[must_use]
    pub fn contains(&self, sql: &str) -> bool {
        self.statements.contains_key(sql)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Cached SQL texts, in no particular order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.statements.keys().map(String::as_str)
    }

    /// Build every cached statement again against the current native handle.
    ///
    /// # Errors
    /// Stops at, and returns, the first failed rebuild.
    pub fn rebuild_all(&mut self) -> Result<usize, SqlGateError> {
        for stmt in self.statements.values_mut() {
            stmt.build()?;
        }
        Ok(self.statements.len())
    }

    /// Finalize every cached statement.
    pub fn clear(&mut self) {
        self.statements.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::results::Row;
    use crate::statement::StatementStats;

    /// Statement double that only counts builds and executions.
    #[derive(Debug)]
    pub(crate) struct CountingStatement {
        pub(crate) sql: String,
        pub(crate) stats: StatementStats,
        pub(crate) fail_build: bool,
    }

    impl CountingStatement {
        pub(crate) fn new(sql: &str) -> Self {
            Self {
                sql: sql.to_string(),
                stats: StatementStats::default(),
                fail_build: false,
            }
        }
    }

    impl PreparedStatement for CountingStatement {
        fn source(&self) -> &str {
            &self.sql
        }

        fn is_built(&self) -> bool {
            self.stats.builds > 0
        }

        fn build(&mut self) -> Result<(), SqlGateError> {
            if self.fail_build {
                return Err(SqlGateError::prepare(&self.sql, "syntax error"));
            }
            self.stats.builds += 1;
            Ok(())
        }

        fn query(&mut self) -> Result<(), SqlGateError> {
            self.stats.executions += 1;
            Ok(())
        }

        fn query_rows(&mut self, _args: &[&str]) -> Result<Vec<Row>, SqlGateError> {
            self.stats.executions += 1;
            Ok(Vec::new())
        }

        fn query_json_with(&mut self, _args: &[&str]) -> Result<String, SqlGateError> {
            self.stats.executions += 1;
            Ok("[\n]\n".to_string())
        }

        fn stats(&self) -> StatementStats {
            self.stats
        }
    }

    #[test]
    fn identical_text_reuses_one_statement() {
        let mut cache = StatementCache::new();
        for _ in 0..3 {
            cache
                .get_or_build("select 1", CountingStatement::new)
                .unwrap()
                .query()
                .unwrap();
        }
        assert_eq!(cache.len(), 1);
        let stats = cache.get("select 1").unwrap().stats();
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.executions, 3);
    }

    #[test]
    fn keys_are_not_normalized() {
        let mut cache = StatementCache::new();
        cache.get_or_build("select 1", CountingStatement::new).unwrap();
        cache.get_or_build("SELECT 1", CountingStatement::new).unwrap();
        cache.get_or_build("select  1", CountingStatement::new).unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let mut cache = StatementCache::new();
        let err = cache
            .get_or_build("selec 1", |sql| CountingStatement {
                fail_build: true,
                ..CountingStatement::new(sql)
            })
            .unwrap_err();
        assert_eq!(err.sql(), Some("selec 1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn rebuild_all_touches_every_entry_once() {
        let mut cache = StatementCache::new();
        for sql in ["a", "b", "c"] {
            cache.get_or_build(sql, CountingStatement::new).unwrap();
        }
        assert_eq!(cache.rebuild_all().unwrap(), 3);
        for sql in ["a", "b", "c"] {
            assert_eq!(cache.get(sql).unwrap().stats().builds, 2);
        }
        let mut keys: Vec<&str> = cache.sources().collect();
        keys.sort_unstable();
        assert_eq!(keys, ["a", "b", "c"]);
    }
}
