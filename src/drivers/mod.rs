// src/drivers/mod.rs
pub mod encoder;
pub mod error;
pub mod frame;
pub mod params;
pub mod pipeline;
pub mod programmer;
pub mod serial;
pub mod source;
pub mod telemetry;
pub mod validator;
pub use encoder::{encode_command, CommandFrame, ProgrammingSnapshot, COMMAND_FRAME_LEN};
pub use error::LinkError;
pub use frame::{FrameScanner, RawFrame, TELEMETRY_FRAME_LEN, TELEMETRY_MAGIC};
pub use params::{mode_byte, ActivityThreshold, Mode, ParamKey, ParameterSet};
pub use pipeline::TelemetryPipeline;
pub use programmer::{ProgramOutcome, Programmer};
pub use serial::{list_ports, SerialTransport, DEFAULT_BAUD};
pub use source::{ByteSink, ByteSource, CaptureSink, ManualSource};
pub use telemetry::{decode_telemetry, telemetry_word, DecodedTelemetry};
pub use validator::{validate_parameters, ValidationIssue, ValidationReport};
