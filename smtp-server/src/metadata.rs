use std::net::SocketAddr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelloInfo {
    pub is_ehlo: bool,
    pub hostname: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionMetadata {
    pub peer_addr: Option<SocketAddr>,
    pub hello: Option<HelloInfo>,
}

impl ConnectionMetadata {
    pub fn new(peer_addr: Option<SocketAddr>) -> ConnectionMetadata {
        ConnectionMetadata {
            peer_addr,
            hello: None,
        }
    }
}
