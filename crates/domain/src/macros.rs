//! Display and FromStr for string-backed status enums
//!
//! Status values are stored as lowercase text in SQLite and sent as text in
//! logs, so every status enum needs the same pair of conversions.
//!
//! # Example
//!
//! ```rust
//! use punchsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ReaderState {
//!     Online,
//!     Offline,
//! }
//!
//! impl_domain_status_conversions!(ReaderState {
//!     Online => "online",
//!     Offline => "offline",
//! });
//!
//! assert_eq!(ReaderState::Online.to_string(), "online");
//! assert_eq!("OFFLINE".parse::<ReaderState>(), Ok(ReaderState::Offline));
//! ```

/// Implements Display and case-insensitive FromStr for a status enum.
///
/// Each `$variant => $str` pair maps a variant to its canonical lowercase
/// representation. Parsing failures return a `String` naming the enum.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical string form.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
