mod attrs;
mod cache;
mod decl;
mod decode_gen;
mod diagnostics;
mod encode_gen;
mod enum_gen;
mod expand;
mod hooks;
mod ir;
mod key_trees;
mod namespace;
mod options;
mod property;
mod validate;

use proc_macro::TokenStream;

use attrs::MacroFamily;

/// Generates key enums plus `Decode`, `Encode` and `Codable` impls.
///
/// Fields take `#[coding_key(..)]`, `#[decoding_key(..)]`,
/// `#[encoding_key(..)]` and `#[coding_super]`. Container arguments:
/// `skip_super_coding`, `skip_protocol_conformance`, `hooks` and
/// `rename_all = ".."`.
#[proc_macro_attribute]
pub fn codable(args: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_container(MacroFamily::Codable, args.into(), item.into()).into()
}

/// Decode-only variant of [`macro@codable`].
#[proc_macro_attribute]
pub fn decodable(args: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_container(MacroFamily::Decodable, args.into(), item.into()).into()
}

/// Encode-only variant of [`macro@codable`].
#[proc_macro_attribute]
pub fn encodable(args: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_container(MacroFamily::Encodable, args.into(), item.into()).into()
}

/// Builds `CodingHooks` from the `#[hook(stage)]` methods of an inherent impl
/// block. Pair with the `hooks` container argument.
#[proc_macro_attribute]
pub fn coding_hooks(args: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand_hooks(args.into(), item.into()).into()
}
