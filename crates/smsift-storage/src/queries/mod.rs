// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per entity.

pub mod messages;
pub mod model_versions;
pub mod predictions;
pub mod reviews;
pub mod settings;

use std::str::FromStr;

/// Parse a TEXT column into a strum-backed enum, reporting a conversion
/// failure rusqlite understands.
pub(crate) fn parse_enum<T: FromStr>(idx: usize, value: String) -> rusqlite::Result<T> {
    value.parse::<T>().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognized enum value: {value}").into(),
        )
    })
}

/// Parse an optional TEXT column into an optional enum.
pub(crate) fn parse_enum_opt<T: FromStr>(
    idx: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<T>> {
    value.map(|v| parse_enum(idx, v)).transpose()
}
