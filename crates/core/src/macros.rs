// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared by the data model.

/// Generate a `Display` impl mapping enum variants to their wire names.
///
/// The strings match the `snake_case` serde representation so log lines,
/// audit entries and registry JSON all spell a variant the same way.
///
/// ```ignore
/// crate::simple_display! {
///     StallType {
///         SessionHung => "session_hung",
///         Unknown => "unknown",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}
