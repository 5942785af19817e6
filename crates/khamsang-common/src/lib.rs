pub mod error_mapping;
pub mod protocol;

pub mod error {
    pub mod capability_error;
}

pub use error::capability_error::CapabilityError;
