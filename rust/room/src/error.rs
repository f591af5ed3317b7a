// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for room extraction

use thiserror::Error;

/// Result type for room extraction
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop a floor from being extracted
#[derive(Error, Debug)]
pub enum Error {
    #[error("no floor has been supplied")]
    NoFloor,

    /// The outer loop is open, disconnected or has no area.
    #[error("floor {0} has no usable outer loop")]
    DegenerateFloor(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
