//! Rendering synthesized tokens to source text.

use std::path::Path;

use proc_macro2::TokenStream;
use quote::quote;

use crate::error::CodegenError;
use crate::imports::ident;

/// The comment every generated file starts with. `file_prefix` lines are
/// appended as further comment lines after a blank comment line.
pub fn header(file_prefix: Option<&str>) -> String {
    let mut header = format!(
        "// Code generated by mockgen {}; DO NOT EDIT.\n",
        env!("CARGO_PKG_VERSION")
    );
    if let Some(prefix) = file_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        header.push_str("//\n");
        for line in prefix.lines() {
            header.push_str("// ");
            header.push_str(line.trim_end());
            header.push('\n');
        }
    }
    header
}

/// Wraps the items of a file in `pub mod <name>`, gated on `cfg(test)` for
/// test-only output.
pub fn wrap_module(name: &str, for_test: bool, items: TokenStream) -> TokenStream {
    let name = ident(name);
    let gate = for_test.then(|| quote! { #[cfg(test)] });
    quote! {
        #gate
        pub mod #name {
            #items
        }
    }
}

/// Parses `tokens` as a file and pretty-prints it under `header`.
pub fn render(path: &Path, header: &str, tokens: TokenStream) -> Result<String, CodegenError> {
    let file: syn::File = syn::parse2(tokens).map_err(|err| CodegenError::Render {
        file: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let body = prettyplease::unparse(&file);
    tracing::debug!(file = %path.display(), bytes = body.len(), "rendered mock file");
    Ok(format!("{header}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_the_file_prefix() {
        let header = header(Some("Copyright Example\nAll rights reserved.\n"));
        let lines: Vec<_> = header.lines().collect();
        assert!(lines[0].starts_with("// Code generated by mockgen "));
        assert!(lines[0].ends_with("; DO NOT EDIT."));
        assert_eq!(&lines[1..], ["//", "// Copyright Example", "// All rights reserved."]);
    }

    #[test]
    fn renders_formatted_items() {
        let tokens = wrap_module("mocks", true, quote! { pub struct MockStore { pub get_func: u8 } });
        let text = render(Path::new("mocks.rs"), &header(None), tokens).unwrap();
        assert!(text.contains("#[cfg(test)]\npub mod mocks {"), "{text}");
        assert!(text.contains("    pub struct MockStore {\n        pub get_func: u8,\n    }"), "{text}");
    }

    #[test]
    fn invalid_tokens_are_a_render_error() {
        let err = render(Path::new("bad.rs"), "", quote! { fn }).unwrap_err();
        assert!(matches!(err, CodegenError::Render { .. }));
    }
}
