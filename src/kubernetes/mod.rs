pub mod client;
pub mod discovery;
pub mod logs;

pub use client::KubeApi;
pub use discovery::ResourceKind;
