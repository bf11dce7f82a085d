use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// Where a matrix column is routed: which analog multiplexer, and which of its input channels.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, MaxSize, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColumnChannel {
    /// Index of the multiplexer
    pub mux: u8,
    /// Input channel on that multiplexer
    pub channel: u8,
}

impl ColumnChannel {
    pub const fn new(mux: u8, channel: u8) -> Self {
        Self { mux, channel }
    }
}
