pub mod ring_buffer;
pub mod sink_id;
pub mod wave_format;
