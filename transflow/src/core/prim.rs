//! The primitive result container returned by the apply entry points.

use crate::errors::TransflowError;

/// Zero, one or many success values, or a failure.
#[derive(Debug, Clone)]
pub enum Prim<A> {
    /// No value was produced.
    None,
    /// Exactly one value was produced.
    One(A),
    /// Several values, in production order.
    Many(Vec<A>),
    /// The run faulted.
    Fail(TransflowError),
}

impl<A> Default for Prim<A> {
    fn default() -> Self {
        Self::None
    }
}

impl<A> From<Vec<A>> for Prim<A> {
    fn from(mut values: Vec<A>) -> Self {
        match values.len() {
            0 => Self::None,
            1 => values.pop().map_or(Self::None, Self::One),
            _ => Self::Many(values),
        }
    }
}

impl<A> From<Option<A>> for Prim<A> {
    fn from(value: Option<A>) -> Self {
        value.map_or(Self::None, Self::One)
    }
}

impl<A> From<TransflowError> for Prim<A> {
    fn from(error: TransflowError) -> Self {
        Self::Fail(error)
    }
}

impl<A> Prim<A> {
    /// Returns true for `None`.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns true for `Fail`.
    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Returns true when at least one value is present.
    #[must_use]
    pub fn is_some(&self) -> bool {
        matches!(self, Self::One(_) | Self::Many(_))
    }

    /// Returns the number of success values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None | Self::Fail(_) => 0,
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    /// Returns true when no success value is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the error of a failed container.
    #[must_use]
    pub fn error(&self) -> Option<&TransflowError> {
        match self {
            Self::Fail(e) => Some(e),
            _ => None,
        }
    }

    /// Appends another container.
    ///
    /// Failures win; if both sides failed their errors are combined.
    #[must_use]
    pub fn append(self, other: Self) -> Self {
        match (self, other) {
            (Self::Fail(a), Self::Fail(b)) => Self::Fail(a.combine(b)),
            (Self::Fail(e), _) | (_, Self::Fail(e)) => Self::Fail(e),
            (Self::None, rhs) => rhs,
            (lhs, Self::None) => lhs,
            (lhs, rhs) => {
                let mut values = lhs.into_values();
                values.extend(rhs.into_values());
                Self::Many(values)
            }
        }
    }

    /// Maps every success value.
    pub fn map<B, F>(self, mut f: F) -> Prim<B>
    where
        F: FnMut(A) -> B,
    {
        match self {
            Self::None => Prim::None,
            Self::One(a) => Prim::One(f(a)),
            Self::Many(values) => Prim::Many(values.into_iter().map(f).collect()),
            Self::Fail(e) => Prim::Fail(e),
        }
    }

    /// Converts the container into an ordered sequence.
    pub fn into_vec(self) -> Result<Vec<A>, TransflowError> {
        match self {
            Self::Fail(e) => Err(e),
            other => Ok(other.into_values()),
        }
    }

    /// Returns the first success value, if any.
    pub fn into_first(self) -> Result<Option<A>, TransflowError> {
        Ok(self.into_vec()?.into_iter().next())
    }

    /// Flattens a sequence of containers into one ordered sequence.
    ///
    /// The whole conversion fails if any of the containers failed.
    pub fn collect<I>(prims: I) -> Result<Vec<A>, TransflowError>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut values = Vec::new();
        for prim in prims {
            values.extend(prim.into_vec()?);
        }
        Ok(values)
    }

    fn into_values(self) -> Vec<A> {
        match self {
            Self::None | Self::Fail(_) => Vec::new(),
            Self::One(a) => vec![a],
            Self::Many(values) => values,
        }
    }
}
