//! Error and warning collection for one container expansion.

use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned, ToTokens};

#[derive(Debug, Clone)]
pub struct Warning {
    pub span: Span,
    pub message: String,
}

/// Hard errors and warnings gathered while expanding one container.
///
/// Errors stop code generation for the container; warnings are emitted next to
/// the generated code.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Option<syn::Error>,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, span: Span, message: impl std::fmt::Display) {
        self.push(syn::Error::new(span, message));
    }

    pub fn error_spanned(&mut self, tokens: impl ToTokens, message: impl std::fmt::Display) {
        self.push(syn::Error::new_spanned(tokens, message));
    }

    pub fn push(&mut self, err: syn::Error) {
        match &mut self.errors {
            Some(existing) => existing.combine(err),
            None => self.errors = Some(err),
        }
    }

    pub fn warn(&mut self, span: Span, message: impl Into<String>) {
        self.warnings.push(Warning {
            span,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.errors.is_some()
    }

    #[cfg(test)]
    pub fn errors(&self) -> impl Iterator<Item = syn::Error> + '_ {
        self.errors.iter().flat_map(|err| err.clone().into_iter())
    }

    #[cfg(test)]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// `compile_error!` invocations for every hard error.
    pub fn error_tokens(&self) -> TokenStream {
        self.errors
            .as_ref()
            .map(syn::Error::to_compile_error)
            .unwrap_or_default()
    }

    /// Each warning becomes a use of a deprecated item, so rustc reports the
    /// note at the warning's span.
    pub fn warning_tokens(&self) -> TokenStream {
        self.warnings
            .iter()
            .map(|warning| {
                let message = &warning.message;
                let usage = quote_spanned!(warning.span=> codable_warning);
                quote! {
                    const _: () = {
                        #[deprecated(note = #message)]
                        #[allow(non_camel_case_types)]
                        struct codable_warning;
                        #[allow(dead_code)]
                        fn emit() {
                            let _ = #usage;
                        }
                    };
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_combine_and_warnings_stay_separate() {
        let mut diag = Diagnostics::new();
        assert!(!diag.has_errors());
        diag.warn(Span::call_site(), "lossy has no effect");
        assert!(!diag.has_errors());
        diag.error(Span::call_site(), "key conflict");
        diag.error(Span::call_site(), "missing type");
        assert_eq!(diag.errors().count(), 2);
        assert_eq!(diag.warnings().len(), 1);
        assert!(diag.error_tokens().to_string().contains("compile_error"));
        assert!(diag.warning_tokens().to_string().contains("deprecated"));
    }
}
