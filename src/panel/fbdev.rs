//! i.MX EPDC framebuffer backend.
//!
//! Drives `/dev/fbN` through the standard fbdev ioctls plus the `MXCFB_*`
//! extensions of the EPDC driver. The backbuffer is copied into the mapped
//! framebuffer on every submit; the controller then refreshes the requested
//! region with the requested waveform.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;

use eink_pipeline::{copy_rows_strided, Canvas, ColorMode, PipelineError, PixelFormat};
use memmap2::{MmapMut, MmapOptions};

use super::protocol::{Temperature, UpdateMarker, UpdateRequest};
use super::PanelBackend;
use crate::error::PanelError;

const EPDC_ID: &str = "mxc_epdc_fb";
const PROBE_DEVICES: u32 = 3;

const FB_ACTIVATE_FORCE: u32 = 128;
const FB_ROTATE_UR: u32 = 0;
const AUTO_UPDATE_MODE_REGION: u32 = 0;
const UPDATE_SCHEME_QUEUE_AND_MERGE: u32 = 2;
const TEMP_USE_AMBIENT: i32 = 0x1000;

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbFixScreeninfo {
    id: [u8; 16],
    smem_start: std::ffi::c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: std::ffi::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

impl FbFixScreeninfo {
    fn id(&self) -> String {
        let end = self.id.iter().position(|&b| b == 0).unwrap_or(self.id.len());
        String::from_utf8_lossy(&self.id[..end]).into_owned()
    }
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct MxcfbWaveformModes {
    mode_init: i32,
    mode_du: i32,
    mode_gc4: i32,
    mode_gc8: i32,
    mode_gc16: i32,
    mode_gc32: i32,
}

/// Waveform slots as loaded by the controller, indexed by
/// [`WaveformMode::index`](crate::models::WaveformMode::index).
const WAVEFORM_MODES: MxcfbWaveformModes = MxcfbWaveformModes {
    mode_init: 0,
    mode_du: 1,
    mode_gc4: 3,
    mode_gc8: 2,
    mode_gc16: 2,
    mode_gc32: 2,
};

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct MxcfbRect {
    top: u32,
    left: u32,
    width: u32,
    height: u32,
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct MxcfbAltBufferData {
    phys_addr: u32,
    width: u32,
    height: u32,
    alt_update_region: MxcfbRect,
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct MxcfbUpdateData {
    update_region: MxcfbRect,
    waveform_mode: u32,
    update_mode: u32,
    update_marker: u32,
    temp: i32,
    flags: u32,
    dither_mode: i32,
    quant_bit: i32,
    alt_buffer_data: MxcfbAltBufferData,
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct MxcfbUpdateMarkerData {
    update_marker: u32,
    collision_test: u32,
}

nix::ioctl_read_bad!(fbioget_vscreeninfo, 0x4600, FbVarScreeninfo);
nix::ioctl_write_ptr_bad!(fbioput_vscreeninfo, 0x4601, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, 0x4602, FbFixScreeninfo);
nix::ioctl_write_ptr!(mxcfb_set_waveform_modes, b'F', 0x2B, MxcfbWaveformModes);
nix::ioctl_write_ptr!(mxcfb_set_auto_update_mode, b'F', 0x2D, u32);
nix::ioctl_write_ptr!(mxcfb_send_update, b'F', 0x2E, MxcfbUpdateData);
nix::ioctl_readwrite!(mxcfb_wait_for_update_complete, b'F', 0x2F, MxcfbUpdateMarkerData);
nix::ioctl_write_ptr!(mxcfb_set_pwrdown_delay, b'F', 0x30, i32);
nix::ioctl_write_ptr!(mxcfb_set_update_scheme, b'F', 0x32, u32);

/// An opened and configured EPDC framebuffer.
///
/// The mapping and the device are released on drop.
pub struct FbdevBackend {
    map: MmapMut,
    file: File,
    path: String,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl FbdevBackend {
    /// Find the EPDC among `/dev/fb0..2` and configure it for 8-bit
    /// greyscale region updates.
    ///
    /// Subpixel mode gets a `C8` backbuffer, monochrome a `Y8` one; the
    /// bytes on the glass are the same either way.
    pub fn open(color_mode: ColorMode) -> Result<Self, PanelError> {
        let (path, file) = probe()?;
        let fd = file.as_raw_fd();
        let ioctl_failed =
            |name: &str, e: nix::Error| PanelError::unavailable(&path, format!("{name}: {e}"));

        let mut var = FbVarScreeninfo::default();
        unsafe { fbioget_vscreeninfo(fd, &mut var) }
            .map_err(|e| ioctl_failed("FBIOGET_VSCREENINFO", e))?;
        var.rotate = FB_ROTATE_UR;
        var.bits_per_pixel = 8;
        var.grayscale = 1;
        var.yoffset = 0;
        var.activate = FB_ACTIVATE_FORCE;
        unsafe { fbioput_vscreeninfo(fd, &var) }
            .map_err(|e| ioctl_failed("FBIOPUT_VSCREENINFO", e))?;

        // the driver may adjust geometry on put
        unsafe { fbioget_vscreeninfo(fd, &mut var) }
            .map_err(|e| ioctl_failed("FBIOGET_VSCREENINFO", e))?;
        let mut fix = FbFixScreeninfo::default();
        unsafe { fbioget_fscreeninfo(fd, &mut fix) }
            .map_err(|e| ioctl_failed("FBIOGET_FSCREENINFO", e))?;

        let stride = var.xres_virtual as usize;
        let len = stride * var.yres_virtual as usize;
        if var.xres == 0 || var.yres == 0 || len == 0 {
            return Err(PanelError::unavailable(
                &path,
                format!("unusable geometry {}x{}", var.xres, var.yres),
            ));
        }
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file) }
            .map_err(|e| PanelError::unavailable(&path, format!("mmap: {e}")))?;

        unsafe { mxcfb_set_auto_update_mode(fd, &AUTO_UPDATE_MODE_REGION) }
            .map_err(|e| ioctl_failed("MXCFB_SET_AUTO_UPDATE_MODE", e))?;
        unsafe { mxcfb_set_waveform_modes(fd, &WAVEFORM_MODES) }
            .map_err(|e| ioctl_failed("MXCFB_SET_WAVEFORM_MODES", e))?;
        unsafe { mxcfb_set_update_scheme(fd, &UPDATE_SCHEME_QUEUE_AND_MERGE) }
            .map_err(|e| ioctl_failed("MXCFB_SET_UPDATE_SCHEME", e))?;
        if let Err(e) = unsafe { mxcfb_set_pwrdown_delay(fd, &0) } {
            tracing::warn!(%e, "Failed to set EPDC power-down delay");
        }

        tracing::info!(
            device = %path,
            id = %fix.id(),
            width = var.xres,
            height = var.yres,
            stride,
            "Opened EPDC framebuffer"
        );

        let format = match color_mode {
            ColorMode::Monochrome => PixelFormat::Y8,
            ColorMode::Subpixel => PixelFormat::C8,
        };
        Ok(Self {
            map,
            file,
            path,
            width: var.xres,
            height: var.yres,
            stride,
            format,
        })
    }
}

fn probe() -> Result<(String, File), PanelError> {
    for n in 0..PROBE_DEVICES {
        let path = format!("/dev/fb{n}");
        let file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(device = %path, %e, "Skipping framebuffer");
                continue;
            }
        };
        let mut fix = FbFixScreeninfo::default();
        match unsafe { fbioget_fscreeninfo(file.as_raw_fd(), &mut fix) } {
            Ok(_) if fix.id() == EPDC_ID => return Ok((path, file)),
            Ok(_) => tracing::debug!(device = %path, id = %fix.id(), "Not an EPDC"),
            Err(e) => tracing::debug!(device = %path, %e, "FBIOGET_FSCREENINFO failed"),
        }
    }
    Err(PanelError::unavailable(
        "/dev/fb0..2",
        format!("no {EPDC_ID} framebuffer found"),
    ))
}

fn update_data(request: &UpdateRequest) -> MxcfbUpdateData {
    MxcfbUpdateData {
        update_region: MxcfbRect {
            top: request.region.y,
            left: request.region.x,
            width: request.region.w,
            height: request.region.h,
        },
        waveform_mode: request.waveform.index(),
        update_mode: request.mode as u32,
        update_marker: request.marker.0,
        temp: match request.temperature {
            Temperature::Ambient => TEMP_USE_AMBIENT,
            Temperature::Celsius(c) => c,
        },
        ..Default::default()
    }
}

impl PanelBackend for FbdevBackend {
    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn backbuffer_format(&self) -> PixelFormat {
        self.format
    }

    fn submit(&mut self, backbuffer: &Canvas, request: &UpdateRequest) -> Result<(), PanelError> {
        if backbuffer.format() != self.format {
            return Err(PipelineError::FormatMismatch {
                expected: self.format,
                actual: backbuffer.format(),
            }
            .into());
        }
        if backbuffer.width() != self.width || backbuffer.height() != self.height {
            return Err(PipelineError::DimensionMismatch {
                src_width: backbuffer.width(),
                src_height: backbuffer.height(),
                dst_width: self.width,
                dst_height: self.height,
            }
            .into());
        }
        copy_rows_strided(&mut self.map, self.stride, backbuffer)?;

        let data = update_data(request);
        unsafe { mxcfb_send_update(self.file.as_raw_fd(), &data) }
            .map_err(|e| PanelError::DegradedUpdate(format!("MXCFB_SEND_UPDATE: {e}")))?;
        tracing::debug!(region = ?request.region, waveform = %request.waveform, "Sent update");
        Ok(())
    }

    fn wait_for_completion(&mut self, marker: UpdateMarker) -> Result<(), PanelError> {
        if marker.is_none() {
            return Ok(());
        }
        let mut data = MxcfbUpdateMarkerData {
            update_marker: marker.0,
            collision_test: 0,
        };
        unsafe { mxcfb_wait_for_update_complete(self.file.as_raw_fd(), &mut data) }.map_err(
            |e| PanelError::DegradedUpdate(format!("MXCFB_WAIT_FOR_UPDATE_COMPLETE: {e}")),
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} {}x{}", self.path, self.width, self.height)
    }
}
