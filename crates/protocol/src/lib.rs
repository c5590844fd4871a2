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

//! Line protocol encoder.
//!
//! Turns a point (measurement, tags, fields, optional nanosecond timestamp)
//! into one line of the text line protocol:
//!
//! ```text
//! <measurement>[,<tag-key>=<tag-value>]* <field-key>=<field-value>[,<field-key>=<field-value>]* [<timestamp>]
//! ```
//!
//! Tags are written in ascending key order, fields in insertion order. The
//! timestamp segment, including its leading space, is omitted when absent.
//!
//! ```rust
//! use lineflux_protocol::{Fields, Integer, Tags, encode_line};
//!
//! let tags = Tags::from([("host".to_string(), "a b".to_string())]);
//! let fields = Fields::new().with("load", 0.5).with("procs", Integer::new(12));
//! let line = encode_line("cpu", &tags, &fields, Some(0)).unwrap();
//! assert_eq!(line, "cpu,host=a\\ b load=0.5,procs=12i 0");
//! ```

pub mod error;
pub mod escape;
pub mod line;
pub mod point;
pub mod value;

pub use error::{EncodeError, Result};
pub use escape::{escape_name, escape_string_value};
pub use line::{Fields, IdentityKey, Tags, encode_fields, encode_key, encode_line};
pub use point::Point;
pub use value::{FieldValue, Integer};
