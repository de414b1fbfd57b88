// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Error funnelling between the backend-specific repositories and the
//! type-erased [`BoxRepository`]
//!
//! [`BoxRepository`]: crate::BoxRepository

/// Wraps a repository, mapping its error type to another one.
///
/// The PostgreSQL backend speaks `DatabaseError`; wrapping its repository in
/// a [`MapErr`] which converts into [`RepositoryError`] is what lets the
/// sweeper hold a [`BoxRepository`] without knowing which backend is behind
/// it.
///
/// [`RepositoryError`]: crate::RepositoryError
/// [`BoxRepository`]: crate::BoxRepository
pub struct MapErr<R, F> {
    pub(crate) inner: R,
    pub(crate) mapper: F,
    _private: (),
}

impl<R, F> MapErr<R, F> {
    /// Wrap the given repository, mapping its errors through `mapper`
    #[must_use]
    pub fn new(inner: R, mapper: F) -> Self {
        Self {
            inner,
            mapper,
            _private: (),
        }
    }
}

/// Implements a repository trait for [`Box<R>`] and for the [`MapErr`]
/// wrapper, forwarding every method.
///
/// Each repository trait (e.g. [`GroupMessageRepository`]) invokes this once
/// with its full method list, so that a boxed or error-mapped repository can
/// be used wherever the trait is expected.
///
/// [`GroupMessageRepository`]: crate::message::GroupMessageRepository
#[macro_export]
macro_rules! repository_impl {
    ($repo_trait:ident:
        $(
            async fn $method:ident (
                &mut self
                $(, $arg:ident: $arg_ty:ty )*
                $(,)?
            ) -> Result<$ret_ty:ty, Self::Error>;
        )*
    ) => {
        #[::async_trait::async_trait]
        impl<R: ?Sized> $repo_trait for ::std::boxed::Box<R>
        where
            R: $repo_trait,
        {
            type Error = <R as $repo_trait>::Error;

            $(
                async fn $method (&mut self $(, $arg: $arg_ty)*) -> Result<$ret_ty, Self::Error> {
                    (**self).$method ( $($arg),* ).await
                }
            )*
        }

        #[::async_trait::async_trait]
        impl<R, F, E> $repo_trait for $crate::MapErr<R, F>
        where
            R: $repo_trait,
            F: FnMut(<R as $repo_trait>::Error) -> E + ::std::marker::Send + ::std::marker::Sync,
        {
            type Error = E;

            $(
                async fn $method (&mut self $(, $arg: $arg_ty)*) -> Result<$ret_ty, Self::Error> {
                    self.inner.$method ( $($arg),* ).await.map_err(&mut self.mapper)
                }
            )*
        }
    };
}
