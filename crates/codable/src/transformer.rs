use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Failure of a value transformation in either direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Converts a wire-level `Input` into the field's `Output` on decode, and back
/// on encode.
///
/// Transformers that only make sense one way can leave `reverse` as is;
/// encoding such a field then fails with a transform error.
pub trait Transformer {
    type Input;
    type Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output, TransformError>;

    fn reverse(&self, _output: &Self::Output) -> Result<Self::Input, TransformError> {
        Err(TransformError::new("transformer cannot be reversed"))
    }

    /// Chains `next` after `self`: decode runs `self` then `next`, encode runs
    /// them backwards.
    fn compose<U>(self, next: U) -> Composed<Self, U>
    where
        Self: Sized,
        U: Transformer<Input = Self::Output>,
    {
        Composed { first: self, second: next }
    }
}

impl<T: Transformer + ?Sized> Transformer for &T {
    type Input = T::Input;
    type Output = T::Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output, TransformError> {
        (**self).transform(input)
    }

    fn reverse(&self, output: &Self::Output) -> Result<Self::Input, TransformError> {
        (**self).reverse(output)
    }
}

/// Two transformers run back to back. Built by [`Transformer::compose`].
#[derive(Debug, Clone)]
pub struct Composed<A, B> {
    first: A,
    second: B,
}

impl<A, B> Transformer for Composed<A, B>
where
    A: Transformer,
    B: Transformer<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output, TransformError> {
        self.second.transform(self.first.transform(input)?)
    }

    fn reverse(&self, output: &Self::Output) -> Result<Self::Input, TransformError> {
        self.first.reverse(&self.second.reverse(output)?)
    }
}

/// Transformer built from a pair of closures.
pub struct FnTransformer<I, O, F, R> {
    forward: F,
    backward: R,
    marker: PhantomData<fn(I) -> O>,
}

impl<I, O, F, R> fmt::Debug for FnTransformer<I, O, F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer").finish_non_exhaustive()
    }
}

impl<I, O, F, R> Transformer for FnTransformer<I, O, F, R>
where
    F: Fn(I) -> Result<O, TransformError>,
    R: Fn(&O) -> Result<I, TransformError>,
{
    type Input = I;
    type Output = O;

    fn transform(&self, input: I) -> Result<O, TransformError> {
        (self.forward)(input)
    }

    fn reverse(&self, output: &O) -> Result<I, TransformError> {
        (self.backward)(output)
    }
}

pub fn transformer<I, O, F, R>(forward: F, backward: R) -> FnTransformer<I, O, F, R>
where
    F: Fn(I) -> Result<O, TransformError>,
    R: Fn(&O) -> Result<I, TransformError>,
{
    FnTransformer {
        forward,
        backward,
        marker: PhantomData,
    }
}

fn irreversible<I, O>(_: &O) -> Result<I, TransformError> {
    Err(TransformError::new("transformer cannot be reversed"))
}

/// Decode-only transformer from a single closure.
pub fn forward_only<I, O, F>(forward: F) -> FnTransformer<I, O, F, fn(&O) -> Result<I, TransformError>>
where
    F: Fn(I) -> Result<O, TransformError>,
{
    transformer(forward, irreversible::<I, O> as fn(&O) -> Result<I, TransformError>)
}

/// Passes values through unchanged.
pub struct Identity<T>(PhantomData<fn(T) -> T>);

impl<T> Identity<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Identity<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity")
    }
}

impl<T: Clone> Transformer for Identity<T> {
    type Input = T;
    type Output = T;

    fn transform(&self, input: T) -> Result<T, TransformError> {
        Ok(input)
    }

    fn reverse(&self, output: &T) -> Result<T, TransformError> {
        Ok(output.clone())
    }
}

/// Reads a value from its string form with [`FromStr`] and writes it back
/// with [`Display`](fmt::Display).
pub struct FromStrTransformer<T>(PhantomData<fn() -> T>);

impl<T> FromStrTransformer<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromStrTransformer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FromStrTransformer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FromStrTransformer<{}>", std::any::type_name::<T>())
    }
}

impl<T> Transformer for FromStrTransformer<T>
where
    T: FromStr + fmt::Display,
    T::Err: fmt::Display,
{
    type Input = String;
    type Output = T;

    fn transform(&self, input: String) -> Result<T, TransformError> {
        input.parse().map_err(|err: T::Err| {
            TransformError::new(format!(
                "cannot parse {input:?} as {}: {err}",
                std::any::type_name::<T>()
            ))
        })
    }

    fn reverse(&self, output: &T) -> Result<String, TransformError> {
        Ok(output.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_and_prints() {
        let t = FromStrTransformer::<u16>::new();
        assert_eq!(t.transform("8080".to_string()).unwrap(), 8080);
        assert_eq!(t.reverse(&443).unwrap(), "443");
        assert!(t.transform("http".to_string()).is_err());
    }

    #[test]
    fn composed_runs_forward_then_backward() {
        let doubled = transformer(|n: u16| Ok(u32::from(n) * 2), |n: &u32| {
            u16::try_from(*n / 2).map_err(|err| TransformError::new(err.to_string()))
        });
        let t = FromStrTransformer::<u16>::new().compose(doubled);
        assert_eq!(t.transform("21".to_string()).unwrap(), 42);
        assert_eq!(t.reverse(&42).unwrap(), "21");
    }

    #[test]
    fn forward_only_refuses_to_reverse() {
        let t = forward_only(|s: String| Ok(s.len()));
        assert_eq!(t.transform("abc".to_string()).unwrap(), 3);
        assert!(t.reverse(&3).is_err());
    }

    #[test]
    fn identity_round_trips() {
        let t = Identity::<Vec<u8>>::new();
        assert_eq!(t.reverse(&t.transform(vec![1, 2]).unwrap()).unwrap(), vec![1, 2]);
    }
}
