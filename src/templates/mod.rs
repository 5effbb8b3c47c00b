//! Built-in card templates.
//!
//! Built-ins are addressed with the `@name` syntax (`@classic`, `@minimal`,
//! `@dark`) and are available without a template directory.

/// List of all available built-in template names.
const BUILTIN_NAMES: &[&str] = &["classic", "minimal", "dark"];

/// Returns a list of all available built-in template names.
pub fn list_builtins() -> Vec<&'static str> {
    BUILTIN_NAMES.to_vec()
}

/// Returns the source of a built-in template by name (without the `@`).
pub fn get_builtin(name: &str) -> Option<&'static str> {
    match name {
        "classic" => Some(include_str!("classic.hbs")),
        "minimal" => Some(include_str!("minimal.hbs")),
        "dark" => Some(include_str!("dark.hbs")),
        _ => None,
    }
}
