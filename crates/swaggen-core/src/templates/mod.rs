pub mod dir;
pub mod manager;

pub use dir::*;
pub use manager::*;

/// Name of the built-in template set, also the subdirectory looked up in
/// an override directory
pub const TEMPLATE_SET: &str = "typescript_redux";

/// Templates compiled into the binary, by name
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "model.ts.tera",
        include_str!("../../templates/typescript_redux/model.ts.tera"),
    ),
    (
        "enum.ts.tera",
        include_str!("../../templates/typescript_redux/enum.ts.tera"),
    ),
    (
        "params.ts.tera",
        include_str!("../../templates/typescript_redux/params.ts.tera"),
    ),
    (
        "service.ts.tera",
        include_str!("../../templates/typescript_redux/service.ts.tera"),
    ),
    (
        "thunk.ts.tera",
        include_str!("../../templates/typescript_redux/thunk.ts.tera"),
    ),
    (
        "slice.ts.tera",
        include_str!("../../templates/typescript_redux/slice.ts.tera"),
    ),
    (
        "tags.ts.tera",
        include_str!("../../templates/typescript_redux/tags.ts.tera"),
    ),
    (
        "hooks.ts.tera",
        include_str!("../../templates/typescript_redux/hooks.ts.tera"),
    ),
    (
        "store.ts.tera",
        include_str!("../../templates/typescript_redux/store.ts.tera"),
    ),
    (
        "redux_hooks.ts.tera",
        include_str!("../../templates/typescript_redux/redux_hooks.ts.tera"),
    ),
];
