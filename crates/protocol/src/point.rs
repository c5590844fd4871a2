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

use crate::{
    error::Result,
    line::{Fields, IdentityKey, Tags, encode_line},
};

/// One time-series point.
///
/// ```rust
/// use lineflux_protocol::Point;
///
/// let point = Point::builder()
///     .measurement("disk")
///     .fields([("used", 0.75)])
///     .build();
/// assert_eq!(point.encode().unwrap(), "disk used=0.75");
/// ```
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct Point {
    #[builder(into)]
    pub measurement: String,
    #[builder(default)]
    pub tags:        Tags,
    #[builder(into)]
    pub fields:      Fields,
    /// Nanoseconds since the Unix epoch. `None` leaves the timestamp to the
    /// server.
    pub timestamp:   Option<i64>,
}

impl Point {
    pub fn identity_key(&self) -> IdentityKey { IdentityKey::new(&*self.measurement, &self.tags) }

    pub fn encode(&self) -> Result<String> {
        encode_line(&self.measurement, &self.tags, &self.fields, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Integer;

    #[test]
    fn test_point_builder_defaults() {
        let point = Point::builder().measurement("m").fields(1.0).build();
        assert!(point.tags.is_empty());
        assert_eq!(point.timestamp, None);
        assert_eq!(point.encode().unwrap(), "m value=1");
    }

    #[test]
    fn test_point_encode_and_key() {
        let point = Point::builder()
            .measurement("requests")
            .tags(Tags::from([
                ("route".to_string(), "/api v1".to_string()),
                ("code".to_string(), "200".to_string()),
            ]))
            .fields([("count", Integer::new(12))])
            .timestamp(1_000)
            .build();

        assert_eq!(
            point.encode().unwrap(),
            "requests,code=200,route=/api\\ v1 count=12i 1000"
        );
        assert_eq!(point.identity_key().to_string(), "requests,code=200,route=/api\\ v1");
    }
}
