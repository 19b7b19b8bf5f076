pub mod cookie;
pub mod profile;

pub use cookie::{request_header, Cookie};
pub use profile::{DeviceProfile, NetworkAddresses};
