use anyhow::Context;
use anyhow::Result;
use std::fs;
use std::net::UdpSocket;

/// Process-lifetime identity of this node: the MAC of the chosen interface
/// with its separators stripped, plus the local IP that routes towards the
/// redis host. Detected once at startup.
pub struct NodeInfo {
    pub identity: String,
    pub address: String,
}

impl NodeInfo {
    pub fn detect(interface: &str, client: &redis::Client) -> Result<NodeInfo> {
        let path = format!("/sys/class/net/{}/address", interface);
        let mac = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read the mac address from '{}'", path))?;
        let identity = identity_from_mac(&mac);
        let address = local_address(client)?;
        Ok(NodeInfo { identity, address })
    }
}

pub fn identity_from_mac(mac: &str) -> String {
    mac.trim().replace(':', "").to_uppercase()
}

// The socket is never written to; connecting is enough to learn which local
// address the kernel would route towards the redis host.
fn local_address(client: &redis::Client) -> Result<String> {
    let target = match &client.get_connection_info().addr {
        redis::ConnectionAddr::Tcp(host, port) => format!("{}:{}", host, port),
        redis::ConnectionAddr::TcpTls { host, port, .. } => format!("{}:{}", host, port),
        // unix sockets never leave the host
        redis::ConnectionAddr::Unix(_) => return Ok(String::from("127.0.0.1")),
    };
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind probe socket")?;
    socket
        .connect(&target)
        .with_context(|| format!("Failed to route towards '{}'", target))?;
    Ok(socket.local_addr()?.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_strips_separators() {
        assert_eq!(identity_from_mac("aa:bb:cc:dd:ee:ff"), "AABBCCDDEEFF");
    }

    #[test]
    fn identity_trims_sysfs_newline() {
        assert_eq!(identity_from_mac("48:3F:DA:00:11:22\n"), "483FDA001122");
    }
}
