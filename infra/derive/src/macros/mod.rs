pub mod api;
pub mod error;

use fxhash::FxHashSet;
use syn::Attribute;

/// Collects the trait names already listed in `#[derive(..)]` attributes.
pub fn derived_traits(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                traits.insert(last.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}
