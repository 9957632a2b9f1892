//! Synthesis steps, grouped by the item they build.
//!
//! - [`holder`] -- The holder struct and its three constructors
//! - [`recorder`] -- Per-method recorder structs and their configuration API
//! - [`method`] -- Trait impl methods that consult the recorders
//! - [`call`] -- Call-record structs and their accessors

pub mod call;
pub mod holder;
pub mod method;
pub mod recorder;

use proc_macro2::TokenStream;
use quote::quote;

use crate::model::MethodModel;

/// The `-> R` of a hook, omitted for methods without results.
fn hook_return(method: &MethodModel) -> Option<TokenStream> {
    if method.results.is_empty() {
        return None;
    }
    let output = &method.hook_output;
    Some(quote! { -> #output })
}

/// The closure bound every hook satisfies.
fn hook_bound(method: &MethodModel) -> TokenStream {
    let params = method.hook_params();
    let ret = hook_return(method);
    quote! { Fn(#(#params),*) #ret + Send + Sync }
}
