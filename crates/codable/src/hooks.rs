use std::fmt;

use crate::coding_path::CodingPath;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::CodingError;

/// Lifecycle stages around generated decode and encode routines.
///
/// Generated code calls all four stages unconditionally. A container without
/// the `hooks` option gets an empty implementation; with it, the container's
/// `#[coding_hooks]` impl block provides one that forwards to its
/// `#[hook(..)]` methods in declaration order.
///
/// ```
/// use codable::{codable, coding_hooks};
///
/// #[codable(hooks)]
/// struct Account {
///     name: String,
/// }
///
/// #[coding_hooks]
/// impl Account {
///     #[hook(post_decode)]
///     fn did_decode(&mut self) {
///         self.name = self.name.trim().to_string();
///     }
/// }
///
/// let account: Account = codable::from_str(r#"{"name": " ada "}"#).unwrap();
/// assert_eq!(account.name, "ada");
/// ```
///
/// The option and the impl block require each other. Without the option, the
/// conventional hook names are reserved, so a look-alike method on a plain
/// impl is rejected rather than silently ignored:
///
/// ```compile_fail,E0592
/// #[codable::codable]
/// struct Account {
///     name: String,
/// }
///
/// impl Account {
///     fn did_decode(&mut self) {}
/// }
/// ```
///
/// `hooks` with no `#[coding_hooks]` impl leaves `CodingHooks` unimplemented:
///
/// ```compile_fail,E0277
/// #[codable::codable(hooks)]
/// struct Account {
///     name: String,
/// }
/// ```
///
/// and `#[coding_hooks]` without `hooks` implements it twice:
///
/// ```compile_fail,E0119
/// use codable::{codable, coding_hooks};
///
/// #[codable]
/// struct Account {
///     name: String,
/// }
///
/// #[coding_hooks]
/// impl Account {
///     #[hook(post_decode)]
///     fn tidy(&mut self) {}
/// }
/// ```
pub trait CodingHooks {
    /// Runs before the container is opened.
    fn pre_decode(_decoder: &Decoder<'_>) -> Result<(), CodingError> {
        Ok(())
    }

    /// Runs on the fully constructed value.
    fn post_decode(&mut self, _decoder: &Decoder<'_>) -> Result<(), CodingError> {
        Ok(())
    }

    fn pre_encode(&self, _encoder: &mut Encoder) -> Result<(), CodingError> {
        Ok(())
    }

    /// Runs after every local field and the supertype have been written.
    fn post_encode(&self, _encoder: &mut Encoder) -> Result<(), CodingError> {
        Ok(())
    }
}

/// Return types a hook method may have: `()` or `Result<(), E>`.
pub trait HookOutcome {
    fn into_hook_result(self, path: &CodingPath) -> Result<(), CodingError>;
}

impl HookOutcome for () {
    fn into_hook_result(self, _path: &CodingPath) -> Result<(), CodingError> {
        Ok(())
    }
}

impl<E: fmt::Display> HookOutcome for Result<(), E> {
    fn into_hook_result(self, path: &CodingPath) -> Result<(), CodingError> {
        self.map_err(|err| CodingError::hook(path.clone(), err.to_string()))
    }
}
