// Stream selection - picks the stream actually delivered to the chat

use super::models::StreamDescriptor;

/// Choose the highest-resolution stream on offer. Height wins; bitrate
/// breaks ties between same-height encodes.
pub fn highest_resolution(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
    streams.iter().max_by_key(|s| {
        (
            s.height.unwrap_or(0),
            s.bitrate.map(|b| (b * 100.0) as u32).unwrap_or(0),
        )
    })
}
