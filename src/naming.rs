//! Name Resolver: collision-free class names for emitted models.
//!
//! A model's resolved name is its declaring module path, one capitalized word
//! per segment, followed by its simple name: `app.models.Item` becomes
//! `AppModelsItem`. Two models with the same simple name in different modules
//! therefore never clash in the generated document.

use crate::type_resolver::ModelRef;

/// Derives the resolved name of a model.
///
/// A reference with an empty module resolves to its simple name unchanged, so
/// resolving `ModelRef::new("", resolve_name(r))` yields the same name again.
/// A simple name that already carries a module prefix is not detected: the
/// prefix is added a second time.
pub fn resolve_name(model: &ModelRef) -> String {
    let mut name: String = model
        .module
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect();
    name.push_str(&model.name);
    name
}

/// Uppercases the first character and lowercases the rest of a module segment.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
