//! Conversion between `WaveFormat` and the raw WAVEFORMATEX(TENSIBLE) layout.

use windows::core::GUID;
use windows::Win32::Media::Audio::{WAVEFORMATEX, WAVEFORMATEXTENSIBLE, WAVEFORMATEXTENSIBLE_0};
use windows::Win32::Media::KernelStreaming::KSDATAFORMAT_SUBTYPE_PCM;
use windows::Win32::Media::Multimedia::KSDATAFORMAT_SUBTYPE_IEEE_FLOAT;

use loopback_sink_core::processing::wave_format::{
    ExtensibleFormat, SubFormat, WaveFormat, EXTENSIBLE_EXTRA_BYTES, WAVE_FORMAT_EXTENSIBLE,
};

/// Raw record handed to the OS. Always sized as the extensible layout; the
/// tail is ignored when `cbSize` is 0.
pub fn to_raw(format: &WaveFormat) -> WAVEFORMATEXTENSIBLE {
    let ext = format.extensible;
    WAVEFORMATEXTENSIBLE {
        Format: WAVEFORMATEX {
            wFormatTag: format.format_tag,
            nChannels: format.channels,
            nSamplesPerSec: format.samples_per_sec,
            nAvgBytesPerSec: format.avg_bytes_per_sec,
            nBlockAlign: format.block_align,
            wBitsPerSample: format.bits_per_sample,
            cbSize: format.extra_size(),
        },
        Samples: WAVEFORMATEXTENSIBLE_0 {
            wValidBitsPerSample: ext.map_or(0, |e| e.valid_bits_per_sample),
        },
        dwChannelMask: ext.map_or(0, |e| e.channel_mask),
        SubFormat: ext.map_or(GUID::zeroed(), |e| sub_format_guid(e.sub_format)),
    }
}

/// Read a record the OS allocated.
///
/// # Safety
///
/// `ptr` must point to a valid WAVEFORMATEX followed by `cbSize` bytes.
pub unsafe fn from_raw(ptr: *const WAVEFORMATEX) -> WaveFormat {
    let base = ptr.read_unaligned();
    let tag = base.wFormatTag;
    let extra = base.cbSize;

    let extensible = if tag == WAVE_FORMAT_EXTENSIBLE && extra >= EXTENSIBLE_EXTRA_BYTES {
        let raw = ptr.cast::<WAVEFORMATEXTENSIBLE>().read_unaligned();
        let samples = raw.Samples;
        Some(ExtensibleFormat {
            valid_bits_per_sample: samples.wValidBitsPerSample,
            channel_mask: raw.dwChannelMask,
            sub_format: sub_format_of(raw.SubFormat),
        })
    } else {
        None
    };

    WaveFormat {
        format_tag: tag,
        channels: base.nChannels,
        samples_per_sec: base.nSamplesPerSec,
        avg_bytes_per_sec: base.nAvgBytesPerSec,
        block_align: base.nBlockAlign,
        bits_per_sample: base.wBitsPerSample,
        extensible,
    }
}

fn sub_format_guid(sub_format: SubFormat) -> GUID {
    match sub_format {
        SubFormat::Pcm => KSDATAFORMAT_SUBTYPE_PCM,
        SubFormat::IeeeFloat => KSDATAFORMAT_SUBTYPE_IEEE_FLOAT,
        SubFormat::Other(value) => GUID::from_u128(value),
    }
}

fn sub_format_of(guid: GUID) -> SubFormat {
    if guid == KSDATAFORMAT_SUBTYPE_PCM {
        SubFormat::Pcm
    } else if guid == KSDATAFORMAT_SUBTYPE_IEEE_FLOAT {
        SubFormat::IeeeFloat
    } else {
        SubFormat::Other(guid.to_u128())
    }
}
