pub mod cleanup_use_case;
pub mod ports;
