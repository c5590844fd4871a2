// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use snafu::Snafu;

pub type Result<T, E = EncodeError> = std::result::Result<T, E>;

/// Errors raised while turning a point into a protocol line.
///
/// Encoding is all-or-nothing: when any of these is returned no partial line
/// has been produced.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum EncodeError {
    /// A point must carry at least one field.
    #[snafu(display("Point for measurement '{measurement}' has no fields"))]
    EmptyFields { measurement: String },

    /// The value has no line protocol representation.
    #[snafu(display("Unknown value kind '{kind}' for field {field}"))]
    UnknownValueKind { field: String, kind: &'static str },

    #[snafu(display("Non-finite value {value} for field {field}"))]
    NonFiniteFloat { field: String, value: f64 },
}
