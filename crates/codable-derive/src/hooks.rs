//! Lifecycle hook detection and the `CodingHooks` impl built from it.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, quote_spanned};
use syn::{Generics, Ident, ItemImpl};

use crate::attrs::parse_hook_attr;
use crate::decl::{Declaration, MethodMember, Receiver};
use crate::diagnostics::Diagnostics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookStage {
    PreDecode,
    PostDecode,
    PreEncode,
    PostEncode,
}

impl HookStage {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "pre_decode" => Some(Self::PreDecode),
            "post_decode" => Some(Self::PostDecode),
            "pre_encode" => Some(Self::PreEncode),
            "post_encode" => Some(Self::PostEncode),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PreDecode => "pre_decode",
            Self::PostDecode => "post_decode",
            Self::PreEncode => "pre_encode",
            Self::PostEncode => "post_encode",
        }
    }

    /// Stage a method name conventionally implies, marked or not.
    fn from_conventional_name(name: &str) -> Option<Self> {
        match name {
            "will_decode" | "pre_decode" => Some(Self::PreDecode),
            "did_decode" | "post_decode" => Some(Self::PostDecode),
            "will_encode" | "pre_encode" => Some(Self::PreEncode),
            "did_encode" | "post_encode" => Some(Self::PostEncode),
            _ => None,
        }
    }

    fn accepts(self, receiver: Receiver) -> bool {
        match self {
            Self::PreDecode => receiver == Receiver::None,
            Self::PostDecode => matches!(receiver, Receiver::None | Receiver::RefMut),
            Self::PreEncode | Self::PostEncode => matches!(receiver, Receiver::None | Receiver::Ref),
        }
    }

    fn receiver_hint(self) -> &'static str {
        match self {
            Self::PreDecode => "an associated function without `self`",
            Self::PostDecode => "`&mut self` or no receiver",
            Self::PreEncode | Self::PostEncode => "`&self` or no receiver",
        }
    }
}

/// A method marked `#[hook(stage)]`.
#[derive(Debug, Clone)]
pub struct Hook {
    pub stage: HookStage,
    pub method: Ident,
    pub receiver: Receiver,
    /// Whether the method takes the decoder or encoder.
    pub takes_coder: bool,
    pub span: Span,
}

impl Hook {
    fn call(&self) -> TokenStream {
        let method = &self.method;
        let (target, coder) = match self.stage {
            HookStage::PreDecode | HookStage::PostDecode => (quote!(value), quote!(decoder)),
            HookStage::PreEncode | HookStage::PostEncode => (quote!(self), quote!(encoder)),
        };
        let args = if self.takes_coder { coder.clone() } else { quote!() };
        let call = match self.receiver {
            Receiver::None => quote_spanned!(self.span=> Self::#method(#args)),
            _ => quote_spanned!(self.span=> #target.#method(#args)),
        };
        quote! {
            let outcome = #call;
            ::codable::HookOutcome::into_hook_result(outcome, #coder.coding_path())?;
        }
    }
}

const CONVENTIONAL_NAMES: [&str; 8] = [
    "will_decode",
    "pre_decode",
    "did_decode",
    "post_decode",
    "will_encode",
    "pre_encode",
    "did_encode",
    "post_encode",
];

/// Inherent associated functions occupying every conventional hook name.
///
/// Emitted for containers without the `hooks` option. A method of the same
/// name in any inherent impl of the type then fails with E0592 instead of
/// compiling and never being called.
pub fn reserved_names(ident: &Ident, generics: &Generics) -> TokenStream {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let guards = CONVENTIONAL_NAMES.iter().map(|name| {
        let name = format_ident!("{name}");
        quote! {
            #[doc(hidden)]
            #[allow(dead_code)]
            fn #name() {}
        }
    });
    quote! {
        /// Hook names are reserved: opt in with `hooks` and mark methods in a
        /// `#[coding_hooks]` impl.
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#guards)*
        }
    }
}

/// Marked hook methods in source order.
pub fn detect(decl: &Declaration, diag: &mut Diagnostics) -> Vec<Hook> {
    let mut hooks = Vec::new();
    for method in decl.methods() {
        let mut stages = Vec::new();
        for attr in &method.attrs {
            match parse_hook_attr(attr) {
                Some(Ok(stage)) => stages.push(stage),
                Some(Err(err)) => diag.push(err),
                None => {}
            }
        }

        match stages.as_slice() {
            [] => unmarked(method, diag),
            [stage] => {
                if let Some(hook) = marked(method, *stage, diag) {
                    hooks.push(hook);
                }
            }
            [_, ..] => diag.error(
                method.span,
                format!("`{}` is marked with more than one #[hook]", method.ident),
            ),
        }
    }
    hooks
}

fn unmarked(method: &MethodMember, diag: &mut Diagnostics) {
    let name = method.ident.to_string();
    if let Some(stage) = HookStage::from_conventional_name(&name) {
        diag.error(
            method.span,
            format!(
                "`{name}` looks like a coding hook but is not marked; add #[hook({})]",
                stage.name()
            ),
        );
    }
}

fn marked(method: &MethodMember, stage: HookStage, diag: &mut Diagnostics) -> Option<Hook> {
    let name = &method.ident;
    let mut ok = true;
    if !stage.accepts(method.receiver) {
        diag.error(
            method.span,
            format!(
                "{} hook `{name}` must take {}",
                stage.name(),
                stage.receiver_hint()
            ),
        );
        ok = false;
    }
    if method.arguments > 1 {
        let coder = match stage {
            HookStage::PreDecode | HookStage::PostDecode => "the decoder",
            HookStage::PreEncode | HookStage::PostEncode => "the encoder",
        };
        diag.error(
            method.span,
            format!("hook `{name}` takes at most one argument: {coder}"),
        );
        ok = false;
    }
    ok.then(|| Hook {
        stage,
        method: name.clone(),
        receiver: method.receiver,
        takes_coder: method.arguments == 1,
        span: method.span,
    })
}

/// `impl CodingHooks` forwarding each stage to its hooks in order.
pub fn to_impl(item: &ItemImpl, hooks: &[Hook]) -> TokenStream {
    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    let stage_calls = |stage: HookStage| -> TokenStream {
        hooks
            .iter()
            .filter(|hook| hook.stage == stage)
            .map(Hook::call)
            .collect()
    };
    let pre_decode = stage_calls(HookStage::PreDecode);
    let post_decode = stage_calls(HookStage::PostDecode);
    let pre_encode = stage_calls(HookStage::PreEncode);
    let post_encode = stage_calls(HookStage::PostEncode);

    quote! {
        impl #impl_generics ::codable::CodingHooks for #self_ty #where_clause {
            #[allow(unused_variables)]
            fn pre_decode(decoder: &::codable::Decoder<'_>) -> ::core::result::Result<(), ::codable::CodingError> {
                #pre_decode
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn post_decode(&mut self, decoder: &::codable::Decoder<'_>) -> ::core::result::Result<(), ::codable::CodingError> {
                let value = self;
                #post_decode
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn pre_encode(&self, encoder: &mut ::codable::Encoder) -> ::core::result::Result<(), ::codable::CodingError> {
                #pre_encode
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn post_encode(&self, encoder: &mut ::codable::Encoder) -> ::core::result::Result<(), ::codable::CodingError> {
                #post_encode
                ::core::result::Result::Ok(())
            }
        }
    }
}
