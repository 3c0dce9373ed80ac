//! Terminal input: raw bytes in, [`RoutedEvent`](crate::events::RoutedEvent)s out.

pub mod decoder;
pub mod hid;
pub mod reader;

pub use decoder::{ByteSource, ChannelByteSource, InputDecoder};
pub use reader::StdinReader;
