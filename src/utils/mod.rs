pub mod format;
pub mod ip;

pub use format::{
    bits_per_second_to_readable_string, bytes_to_readable_string, seconds_to_readable_time,
};
pub use ip::{find_lan_address, parse_endpoint, resolve_advertise_ip};
