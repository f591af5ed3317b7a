// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, editing or serializing geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Consecutive curves at these positions share no endpoint under any orientation.
    #[error("wire is disconnected between curve {0} and curve {1}")]
    DisconnectedWire(usize, usize),

    #[error("wire has no curves")]
    EmptyWire,

    #[error("curve not found: {0}")]
    CurveNotFound(String),

    #[error("half-plane region is unbounded")]
    UnboundedRegion,

    #[error("half-plane region is empty")]
    EmptyRegion,

    #[error("curve cannot be mapped onto the carrier: {0}")]
    UnsupportedMapping(String),

    #[error("cylindrical carrier only supports rigid or uniformly scaled transforms")]
    NonUniformScale,

    #[error("matrix is not invertible")]
    SingularMatrix,

    /// A continuous surface references itself, directly or through nested faces.
    #[error("continuous surface {0} contains itself")]
    CyclicSurface(String),

    /// A face whose frame or carrier does not match the surface holding it.
    #[error("face does not fit the carrier of continuous surface {0}")]
    IncompatibleFace(String),

    #[error("unresolved surface reference: {0}")]
    UnresolvedSurface(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
