//! IP 地址处理工具
//!
//! 本机局域网地址探测与对端地址解析

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use tracing::debug;

use crate::errors::{LocalDropError, Result};

/// 检查 IP 是否可用于局域网通信（非回环、非链路本地、非未指定）
pub fn is_lan_candidate(ip: &Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_link_local() && !ip.is_unspecified()
}

/// 探测其他节点可达的本机 IPv4 地址
///
/// 将 UDP socket "连接" 到公网地址，再读取系统选择的本地地址。
/// UDP connect 不会真正发包。
pub fn find_lan_address() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket
        .connect((Ipv4Addr::new(8, 8, 8, 8), 80))
        .map_err(|e| LocalDropError::network(format!("No route to probe LAN address: {}", e)))?;

    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) if is_lan_candidate(&ip) => {
            debug!("Detected LAN address {}", ip);
            Ok(ip)
        }
        other => Err(LocalDropError::network(format!(
            "No suitable LAN IP found (got {})",
            other
        ))),
    }
}

/// 解析对外通告的地址
///
/// 显式配置的地址原样使用（包括回环地址）。
pub fn resolve_advertise_ip(configured: Option<&str>) -> Result<Ipv4Addr> {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(ip) => ip.parse::<Ipv4Addr>().map_err(|e| {
            LocalDropError::config(format!("Invalid peer.advertise_ip '{}': {}", ip, e))
        }),
        None => find_lan_address(),
    }
}

/// 将 `ip:port` 解析为传输目标
pub fn parse_endpoint(s: &str) -> Option<SocketAddr> {
    s.parse::<SocketAddr>().ok()
}
