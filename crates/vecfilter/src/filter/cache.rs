//! Caching front end for the filter parser.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::ast::Expr;
use super::error::FilterResult;
use super::parser::FilterParser;

/// Default number of distinct filter texts kept by [`FilterExpressionParser`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Parses filter text, reusing the AST of previously seen expressions.
///
/// Services tend to receive the same handful of filters over and over; the
/// cache skips re-parsing them. Only successful parses are cached, and the
/// cache is flushed when it reaches capacity. It is safe to share across
/// threads and never changes parse results.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vecfilter::filter::FilterExpressionParser;
///
/// let parser = FilterExpressionParser::new();
/// let first = parser.parse("country == 'BG'").unwrap();
/// let second = parser.parse("country == 'BG'").unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct FilterExpressionParser {
    cache: RwLock<HashMap<String, Arc<Expr>>>,
    capacity: usize,
}

impl Default for FilterExpressionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterExpressionParser {
    /// Creates a parser with [`DEFAULT_CACHE_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a parser caching up to `capacity` expressions (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Parses `input`, returning the cached AST when the same text was parsed before.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`FilterParser::parse`]; errors are not cached.
    pub fn parse(&self, input: &str) -> FilterResult<Arc<Expr>> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(expr) = cache.get(input) {
                log::trace!("filter cache hit for {input:?}");
                return Ok(Arc::clone(expr));
            }
        }

        let expr = Arc::new(FilterParser::parse(input)?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.len() >= self.capacity && !cache.contains_key(input) {
            log::debug!("filter cache full ({} entries), flushing", cache.len());
            cache.clear();
        }
        let cached = cache
            .entry(input.to_string())
            .or_insert_with(|| Arc::clone(&expr));
        Ok(Arc::clone(cached))
    }

    /// Number of cached expressions.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached expression.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
