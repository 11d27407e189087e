//! Two-armed value used by branch-aware pipelines.

use crate::errors::TransflowError;

/// `Left` (alternate), `Right` (success) or a prior `Fail`.
#[derive(Debug, Clone)]
pub enum Either<L, R> {
    /// The alternate branch.
    Left(L),
    /// The success branch.
    Right(R),
    /// A failure that happened earlier in the pipeline.
    Fail(TransflowError),
}

impl<L, R> Either<L, R> {
    /// Returns true for `Left`.
    #[must_use]
    pub fn is_left(&self) -> bool {
        matches!(self, Self::Left(_))
    }

    /// Returns true for `Right`.
    #[must_use]
    pub fn is_right(&self) -> bool {
        matches!(self, Self::Right(_))
    }

    /// Returns true for `Fail`.
    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Transforms the left arm only.
    pub fn map_left<L2, F>(self, f: F) -> Either<L2, R>
    where
        F: FnOnce(L) -> L2,
    {
        match self {
            Self::Left(l) => Either::Left(f(l)),
            Self::Right(r) => Either::Right(r),
            Self::Fail(e) => Either::Fail(e),
        }
    }

    /// Transforms the right arm only.
    pub fn map_right<R2, F>(self, f: F) -> Either<L, R2>
    where
        F: FnOnce(R) -> R2,
    {
        match self {
            Self::Left(l) => Either::Left(l),
            Self::Right(r) => Either::Right(f(r)),
            Self::Fail(e) => Either::Fail(e),
        }
    }

    /// Transforms both arms independently.
    pub fn bimap<L2, R2, FL, FR>(self, fl: FL, fr: FR) -> Either<L2, R2>
    where
        FL: FnOnce(L) -> L2,
        FR: FnOnce(R) -> R2,
    {
        match self {
            Self::Left(l) => Either::Left(fl(l)),
            Self::Right(r) => Either::Right(fr(r)),
            Self::Fail(e) => Either::Fail(e),
        }
    }

    /// Returns the right value, if any.
    pub fn right(self) -> Option<R> {
        match self {
            Self::Right(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the left value, if any.
    pub fn left(self) -> Option<L> {
        match self {
            Self::Left(l) => Some(l),
            _ => None,
        }
    }
}

impl<L, R> From<Result<R, TransflowError>> for Either<L, R> {
    fn from(result: Result<R, TransflowError>) -> Self {
        match result {
            Ok(r) => Self::Right(r),
            Err(e) => Self::Fail(e),
        }
    }
}
