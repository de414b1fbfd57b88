// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Span instrumentation for the repository queries

use opentelemetry_semantic_conventions::attribute::DB_QUERY_TEXT;
use tracing::Span;

/// Records a query's SQL statement as the `db.query.text` span attribute.
///
/// The repository methods declare an empty `db.query.text` field in their
/// `#[tracing::instrument]` attribute and call [`ExecuteExt::traced`] on the
/// query before executing it, so a slow expired-message listing or batch
/// delete can be traced back to the exact statement it ran.
pub trait ExecuteExt<'q, DB>: Sized {
    /// Record the statement in the current span
    #[must_use]
    fn traced(self) -> Self {
        self.record(&Span::current())
    }

    /// Record the statement in the given span
    #[must_use]
    fn record(self, span: &Span) -> Self;
}

impl<'q, DB, T> ExecuteExt<'q, DB> for T
where
    T: sqlx::Execute<'q, DB>,
    DB: sqlx::Database,
{
    fn record(self, span: &Span) -> Self {
        span.record(DB_QUERY_TEXT, self.sql());
        self
    }
}
