pub mod card;
pub mod knowledge;
pub mod protocol;
pub mod transport;

#[cfg(feature = "native")]
pub mod line_transport;
