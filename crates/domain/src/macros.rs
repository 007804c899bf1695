//! Macro for implementing Display and FromStr for string-backed enums
//!
//! Config values such as the HTTP method and record operations travel as
//! strings. This macro gives each enum one canonical spelling for `Display`
//! and a case-insensitive `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use courier_domain::impl_enum_str_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Verb {
//!     Post,
//!     Put,
//! }
//!
//! impl_enum_str_conversions!(Verb {
//!     Post => "POST",
//!     Put => "PUT",
//! });
//!
//! assert_eq!("post".parse::<Verb>().unwrap(), Verb::Post);
//! assert_eq!(Verb::Put.to_string(), "PUT");
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their canonical string
///   representations
#[macro_export]
macro_rules! impl_enum_str_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str) {
                        return ::std::result::Result::Ok(Self::$variant);
                    }
                )+
                ::std::result::Result::Err(::std::format!("Invalid {}: {}", ::std::stringify!($enum_name), s))
            }
        }
    };
}
