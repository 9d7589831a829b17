//! Terminal-safe text helpers and link validation.

mod text;
mod url_validator;

pub use text::{
    display_width, format_published, html_to_text, strip_control_chars, truncate_to_width,
    wrap_to_width,
};
pub use url_validator::{validate_url_for_open, UrlValidationError};
