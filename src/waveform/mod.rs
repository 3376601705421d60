pub mod buffer;
pub mod channel;
pub mod config;
pub mod view;
pub use buffer::{append_and_trim, apply_gain, trim_window, xlim_for, ChannelWindow};
pub use channel::EgramDisplay;
pub use config::{ChannelSelection, Gain, TimeWindow};
pub use view::{Channel, ChannelView, Marker, Sample, WaveformView};
