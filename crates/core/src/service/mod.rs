//! Hidden-service client operations.

mod address;
mod descriptor;
mod directory;
mod rendezvous;

pub use address::OnionAddress;
pub use descriptor::{HsDescriptor, IntroPointEntry};
pub use directory::{
    descriptor_by_id, fetch_descriptor, publish_descriptor, responsible_directories,
    responsible_directories_at,
};
pub use rendezvous::send_introduce;
