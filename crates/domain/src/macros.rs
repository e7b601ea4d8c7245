//! Macro for implementing Display and FromStr for status-like enums
//!
//! Wire formats and configuration files spell the same variants in different
//! cases (`SUCCESS`, `success`, `Quorum`), so parsing is case-insensitive and
//! display is always lowercase.
//!
//! # Example
//!
//! ```rust
//! use batchline_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Queued,
//!     Sent,
//! }
//!
//! impl_status_conversions!(Phase {
//!     Queued => "queued",
//!     Sent => "sent",
//! });
//!
//! assert_eq!("SENT".parse::<Phase>().unwrap(), Phase::Sent);
//! ```

/// Implements Display and FromStr for an enum from a variant/string table.
///
/// The string on the right of each arm must be lowercase.
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}
