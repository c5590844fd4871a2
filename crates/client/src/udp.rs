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

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use snafu::ResultExt;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::{
    sink::Sink,
    types::{ClientResult, UdpSocketSnafu},
};

/// UDP transport: one datagram per line.
///
/// The socket is connected to the target at construction time, so the
/// address is resolved once.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    /// Resolves `server:port` and binds a local socket of the matching
    /// address family.
    pub async fn connect(server: &str, port: u16) -> ClientResult<Self> {
        let addr = format!("{server}:{port}");
        info!("Creating UDP sink for {}", addr);

        let target = tokio::net::lookup_host(&addr)
            .await
            .context(UdpSocketSnafu { addr: &addr })?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no addresses")
            })
            .context(UdpSocketSnafu { addr: &addr })?;

        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .context(UdpSocketSnafu { addr: &addr })?;
        socket
            .connect(target)
            .await
            .context(UdpSocketSnafu { addr: &addr })?;

        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr { self.target }
}

#[async_trait]
impl Sink for UdpSink {
    async fn send(&self, line: &str) {
        match self.socket.send(line.as_bytes()).await {
            Ok(n) => debug!("Sent {} bytes to {}", n, self.target),
            Err(e) => warn!("Failed to send line to {}: {}", self.target, e),
        }
    }
}
