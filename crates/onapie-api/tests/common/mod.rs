// Shared wiremock harness for the blocking client.
//
// The mock server lives on a tokio runtime owned by the harness while the
// blocking client is driven from the plain test thread.

#![allow(dead_code, clippy::unwrap_used)]

use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

use onapie_api::{Connection, TransportConfig};

pub struct Harness {
    // Declared first so it is dropped while the runtime is still alive.
    pub server: MockServer,
    rt: Runtime,
}

impl Harness {
    pub fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn received(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    pub fn connection(&self) -> Connection {
        Connection::new(&self.uri(), &quick_transport()).unwrap()
    }
}

/// Short timeouts and no retries keep failing tests fast.
pub fn quick_transport() -> TransportConfig {
    TransportConfig {
        timeout: std::time::Duration::from_secs(5),
        read_timeout: std::time::Duration::from_secs(5),
        max_retries: 0,
        ..TransportConfig::default()
    }
}
