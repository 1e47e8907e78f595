pub mod audio_backend;
pub mod endpoint_policy;
pub mod loopback_stream;
