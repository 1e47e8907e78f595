//! Event-driven WASAPI loopback stream on a render endpoint.
//!
//! The client arrives initialized from `WasapiBackend::activate_loopback`;
//! `start` binds the ready event, obtains the capture service and starts
//! the engine. DRM-protected audio reaches loopback as silence.

use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, GetLastError, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Threading::{CreateEventW, WaitForSingleObjectEx};

use loopback_sink_core::traits::loopback_stream::{LoopbackStream, Packet, WaitOutcome};
use loopback_sink_core::PlatformError;

use crate::com::{platform_error, ComGuard};

struct EventHandle(HANDLE);

impl Drop for EventHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }
}

/// `LoopbackStream` over `IAudioClient` / `IAudioCaptureClient`.
pub struct WasapiLoopbackStream {
    capture: Option<IAudioCaptureClient>,
    client: IAudioClient,
    event: Option<EventHandle>,
    channels: usize,
    running: bool,
    _com: ComGuard,
}

impl WasapiLoopbackStream {
    pub(crate) fn new(client: IAudioClient, channels: u16) -> Self {
        Self {
            capture: None,
            client,
            event: None,
            channels: channels as usize,
            running: false,
            _com: ComGuard::new(),
        }
    }

    fn capture_client(&self, context: &str) -> Result<&IAudioCaptureClient, PlatformError> {
        self.capture
            .as_ref()
            .ok_or_else(|| PlatformError::new(AUDCLNT_E_NOT_INITIALIZED.0, context))
    }
}

impl LoopbackStream for WasapiLoopbackStream {
    fn device_period(&self) -> Result<i64, PlatformError> {
        let mut period = 0i64;
        unsafe {
            self.client
                .GetDevicePeriod(Some(&mut period), None)
                .map_err(|e| platform_error(e, "GetDevicePeriod"))?;
        }
        Ok(period)
    }

    fn buffer_frame_count(&self) -> Result<u32, PlatformError> {
        unsafe { self.client.GetBufferSize().map_err(|e| platform_error(e, "GetBufferSize")) }
    }

    fn start(&mut self) -> Result<(), PlatformError> {
        unsafe {
            let event = CreateEventW(None, false, false, PCWSTR::null())
                .map_err(|e| platform_error(e, "CreateEvent"))?;
            let event = EventHandle(event);

            self.client
                .SetEventHandle(event.0)
                .map_err(|e| platform_error(e, "SetEventHandle"))?;
            self.event = Some(event);

            let capture: IAudioCaptureClient = self
                .client
                .GetService()
                .map_err(|e| platform_error(e, "GetService(IAudioCaptureClient)"))?;
            self.capture = Some(capture);

            self.client.Start().map_err(|e| platform_error(e, "Start"))?;
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        unsafe { self.client.Stop().map_err(|e| platform_error(e, "Stop")) }
    }

    fn wait_ready(&mut self, timeout_ms: u32) -> Result<WaitOutcome, PlatformError> {
        let event = self
            .event
            .as_ref()
            .ok_or_else(|| PlatformError::new(AUDCLNT_E_NOT_INITIALIZED.0, "WaitForSingleObjectEx"))?;

        let status = unsafe { WaitForSingleObjectEx(event.0, timeout_ms, false) };
        if status == WAIT_OBJECT_0 {
            Ok(WaitOutcome::Ready)
        } else if status == WAIT_TIMEOUT {
            Ok(WaitOutcome::TimedOut)
        } else {
            let code = unsafe { GetLastError() }.to_hresult().0;
            Err(PlatformError::new(code, "WaitForSingleObjectEx"))
        }
    }

    fn next_packet_frames(&mut self) -> Result<u32, PlatformError> {
        let capture = self.capture_client("GetNextPacketSize")?;
        unsafe { capture.GetNextPacketSize().map_err(|e| platform_error(e, "GetNextPacketSize")) }
    }

    fn with_next_packet(&mut self, visit: &mut dyn FnMut(&Packet<'_>)) -> Result<(), PlatformError> {
        let capture = self.capture_client("GetBuffer")?;

        let mut data: *mut u8 = std::ptr::null_mut();
        let mut frames = 0u32;
        let mut flags = 0u32;
        unsafe {
            capture
                .GetBuffer(&mut data, &mut frames, &mut flags, None, None)
                .map_err(|e| platform_error(e, "GetBuffer"))?;
        }

        let silent = flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 || data.is_null();
        let samples: &[i16] = if silent || frames == 0 {
            &[]
        } else {
            // 16-bit PCM was negotiated at activation.
            unsafe { std::slice::from_raw_parts(data as *const i16, frames as usize * self.channels) }
        };

        visit(&Packet {
            frames,
            silent,
            samples,
        });

        unsafe { capture.ReleaseBuffer(frames).map_err(|e| platform_error(e, "ReleaseBuffer")) }
    }
}

impl Drop for WasapiLoopbackStream {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Couldn't stop recording {}", e);
        }
    }
}
