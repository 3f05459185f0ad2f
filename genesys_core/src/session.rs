//! Scan session compiler.
//!
//! [`compute_session`] turns a [`SetupParams`] request into a fully resolved
//! [`ScanSession`]: which sensor profile and motion profile to use, how many
//! pixels and lines the ASIC produces, how many bytes come back, and how big
//! the staging buffers must be. The session is immutable and lives for one
//! scan; the register image and slope tables are derived from it.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Serialize;

use crate::error::{GenesysError, Result};
use crate::model::{AsicType, ColorOrder, Model};
use crate::motor::{
    GenesysMotorSlope, MotorId, MotorProfile, MotorSlopeTable, SlopeCurve, StepType,
    create_slope_table, create_slope_table_fastest, select_fast_profile, select_motor_profile,
};
use crate::registers::*;
use crate::registry::Registry;
use crate::sensor::{ScanMethod, Sensor, StaggerConfig};
use crate::util::{align_multiple_ceil, multiply_by_depth_ceil};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScanFlag: u32 {
        const DISABLE_SHADING = 1 << 0;
        const IGNORE_STAGGER_OFFSET = 1 << 2;
        const IGNORE_COLOR_OFFSET = 1 << 3;
        const FEEDING = 1 << 4;
        const USE_XPA = 1 << 5;
        const REVERSE = 1 << 6;
    }
}

impl Serialize for ScanFlag {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_seq(self.iter_names().map(|(name, _)| name))
    }
}

/// Channel picked for single-channel scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFilter {
    Red,
    #[default]
    Green,
    Blue,
    None,
}

impl ColorFilter {
    /// Value of the FILTER field in REG_0X04.
    fn register_bits(self) -> u8 {
        match self {
            ColorFilter::Red => 0x04,
            ColorFilter::Green => 0x08,
            ColorFilter::Blue => 0x0c,
            ColorFilter::None => 0x00,
        }
    }
}

impl FromStr for ColorFilter {
    type Err = GenesysError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(ColorFilter::Red),
            "green" => Ok(ColorFilter::Green),
            "blue" => Ok(ColorFilter::Blue),
            "none" => Ok(ColorFilter::None),
            _ => Err(GenesysError::Config(format!("unknown color filter '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanColorMode {
    Lineart,
    Gray,
    Color,
}

impl ScanColorMode {
    pub fn channels(self) -> u32 {
        match self {
            ScanColorMode::Color => 3,
            ScanColorMode::Lineart | ScanColorMode::Gray => 1,
        }
    }

    /// Lineart is always 1 bit; other modes use `depth`.
    pub fn effective_depth(self, depth: u32) -> u32 {
        match self {
            ScanColorMode::Lineart => 1,
            _ => depth,
        }
    }
}

impl fmt::Display for ScanColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanColorMode::Lineart => "lineart",
            ScanColorMode::Gray => "gray",
            ScanColorMode::Color => "color",
        })
    }
}

impl FromStr for ScanColorMode {
    type Err = GenesysError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lineart" => Ok(ScanColorMode::Lineart),
            "gray" | "grey" => Ok(ScanColorMode::Gray),
            "color" | "colour" => Ok(ScanColorMode::Color),
            _ => Err(GenesysError::Config(format!("unknown color mode '{s}'"))),
        }
    }
}

/// A scan request, in output pixels and lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SetupParams {
    pub xres: u32,
    pub yres: u32,
    /// Left edge, in output pixels.
    pub startx: u32,
    /// Lines to feed before the first scanned line.
    pub starty: u32,
    pub pixels: u32,
    pub lines: u32,
    pub depth: u32,
    pub channels: u32,
    pub scan_method: ScanMethod,
    pub color_filter: ColorFilter,
    pub flags: ScanFlag,
}

impl Default for SetupParams {
    fn default() -> Self {
        Self {
            xres: 300,
            yres: 300,
            startx: 0,
            starty: 0,
            pixels: 0,
            lines: 0,
            depth: 8,
            channels: 3,
            scan_method: ScanMethod::Flatbed,
            color_filter: ColorFilter::None,
            flags: ScanFlag::empty(),
        }
    }
}

impl SetupParams {
    pub fn validate(&self) -> Result<()> {
        if self.xres == 0 || self.yres == 0 {
            return Err(GenesysError::Config("resolution must be > 0".into()));
        }
        if self.pixels == 0 || self.lines == 0 {
            return Err(GenesysError::Config("scan area must not be empty".into()));
        }
        if !matches!(self.depth, 1 | 8 | 16) {
            return Err(GenesysError::Config(format!(
                "unsupported bit depth {}",
                self.depth
            )));
        }
        if !matches!(self.channels, 1 | 3) {
            return Err(GenesysError::Config(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        if self.depth == 1 && self.channels != 1 {
            return Err(GenesysError::Config("1-bit scans must be single channel".into()));
        }
        if self.flags.contains(ScanFlag::USE_XPA) != self.scan_method.is_transparency() {
            return Err(GenesysError::Config(format!(
                "USE_XPA flag does not match scan method {}",
                self.scan_method
            )));
        }
        Ok(())
    }
}

/// Sizes of the staging buffers of the pixel pipeline, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferSizes {
    pub requested: u32,
    pub read: u32,
    pub lines: u32,
    pub shrink: u32,
    pub out: u32,
    /// Nominal USB bulk read size.
    pub usb_read_chunk: u32,
}

/// Everything needed to program and read back one scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSession {
    pub params: SetupParams,
    pub asic_type: AsicType,
    pub motor_id: MotorId,
    pub is_cis: bool,
    pub color_order: ColorOrder,
    /// Sensor profile in effect, possibly carrying calibrated exposure.
    pub sensor: Sensor,

    pub optical_resolution: u32,
    pub output_resolution: u32,
    pub ccd_size_divisor: u32,

    pub optical_pixels: u32,
    /// Pixels clocked out including the overhang of segmented sensors.
    pub optical_pixels_raw: u32,
    pub output_pixels: u32,
    pub output_channel_bytes: u32,
    pub output_line_bytes: u32,
    pub output_line_bytes_raw: u32,
    pub output_line_bytes_requested: u32,

    pub output_line_count: u32,
    pub optical_line_count: u32,
    pub output_total_bytes: u64,
    pub output_total_bytes_raw: u64,

    pub color_shift_lines_r: u32,
    pub color_shift_lines_g: u32,
    pub color_shift_lines_b: u32,
    pub max_color_shift_lines: u32,
    pub num_staggered_lines: u32,
    pub stagger_y: StaggerConfig,

    pub segment_count: u32,
    pub conseq_pixel_dist: u32,
    pub pixel_startx: u32,
    pub pixel_endx: u32,

    pub exposure_time: u32,
    pub step_type: StepType,
    pub motor_profile: Option<MotorProfile>,

    pub buffers: BufferSizes,

    pub needs_reorder: bool,
    pub needs_ccd: bool,
    pub needs_shrink: bool,
    pub needs_desegment: bool,
}

/// The five slope tables loaded before a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlopeTables {
    pub scan: MotorSlopeTable,
    pub backtracking: MotorSlopeTable,
    pub stop: MotorSlopeTable,
    pub fast: MotorSlopeTable,
    pub home: MotorSlopeTable,
    pub fast_step_type: StepType,
}

impl SlopeTables {
    pub const SCAN: usize = 0;
    pub const BACKTRACKING: usize = 1;
    pub const STOP: usize = 2;
    pub const FAST: usize = 3;
    pub const HOME: usize = 4;

    /// Tables in slot order.
    pub fn slots(&self) -> [(usize, &MotorSlopeTable); 5] {
        [
            (Self::SCAN, &self.scan),
            (Self::BACKTRACKING, &self.backtracking),
            (Self::STOP, &self.stop),
            (Self::FAST, &self.fast),
            (Self::HOME, &self.home),
        ]
    }
}

fn step_type_for_yres(yres: u32) -> StepType {
    match yres {
        0..=150 => StepType::Full,
        151..=300 => StepType::Half,
        301..=600 => StepType::Quarter,
        _ => StepType::Eighth,
    }
}

fn too_large(what: &str) -> GenesysError {
    GenesysError::Config(format!("scan request too large: {what} overflows"))
}

fn scaled(what: &str, value: u32, mul: u32, div: u32) -> Result<u32> {
    u32::try_from(u64::from(value) * u64::from(mul) / u64::from(div.max(1)))
        .map_err(|_| too_large(what))
}

fn fit8(name: &str, value: usize) -> Result<u8> {
    u8::try_from(value)
        .map_err(|_| GenesysError::Config(format!("{name} value {value} does not fit 8 bits")))
}

fn fit16(name: &str, value: u32) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| GenesysError::Config(format!("{name} value {value} does not fit 16 bits")))
}

/// Resolve a request against a model.
///
/// `sensor_override` replaces the table lookup, typically with a calibrated
/// copy of the same profile. `exposure_override` pins the line period.
pub fn compute_session(
    registry: &Registry,
    model: &Model,
    sensor_override: Option<&Sensor>,
    params: &SetupParams,
    exposure_override: Option<u32>,
) -> Result<ScanSession> {
    params.validate()?;
    if !model.has_method(params.scan_method) {
        return Err(GenesysError::UnsupportedMethod(params.scan_method));
    }

    let sensor = match sensor_override {
        Some(s) => s.clone(),
        None => registry
            .find_sensor(model.sensor_id, params.xres, params.channels, params.scan_method)?
            .clone(),
    };
    let motor = registry.motor(model.motor_id)?;

    let ccd_size_divisor = if model.is_cis {
        1
    } else {
        sensor.ccd_size_divisor()
    };
    let optical_resolution = if sensor.register_dpihw > 0 {
        sensor.register_dpihw
    } else {
        sensor.full_resolution
    };
    let output_resolution = params.xres;
    if output_resolution > optical_resolution {
        return Err(GenesysError::Config(format!(
            "output resolution {output_resolution} exceeds optical resolution {optical_resolution}"
        )));
    }

    // pixels
    let optical_pixels = u32::try_from(
        (u64::from(params.pixels) * u64::from(optical_resolution))
            .div_ceil(u64::from(output_resolution)),
    )
    .map_err(|_| too_large("optical pixel count"))?;
    let optical_pixels = align_multiple_ceil(
        optical_pixels,
        model.asic_type.optical_pixel_alignment(optical_resolution),
    )
    .ok_or_else(|| too_large("optical pixel count"))?;
    let output_pixels = scaled(
        "output pixel count",
        optical_pixels,
        output_resolution,
        optical_resolution,
    )?;

    let segment_count = sensor.segment_count();
    let segmented = model.asic_type.is_segmented() && segment_count > 1;
    let (segment_overhang, conseq_pixel_dist) = if segmented {
        align_multiple_ceil(sensor.segment_size, 2)
            .and_then(|seg| Some((seg.checked_mul(segment_count - 1)?, seg)))
            .ok_or_else(|| too_large("segment overhang"))?
    } else {
        (0, 0)
    };
    let optical_pixels_raw = optical_pixels
        .checked_add(segment_overhang)
        .ok_or_else(|| too_large("raw pixel count"))?;

    let startx = scaled("start pixel", params.startx, optical_resolution, output_resolution)?;
    let pixel_startx = sensor
        .dummy_pixel
        .checked_add(startx)
        .and_then(|x| sensor.pixel_count_ratio.apply(x))
        .ok_or_else(|| too_large("start pixel"))?;
    let pixel_endx = sensor
        .pixel_count_ratio
        .apply(optical_pixels_raw)
        .and_then(|w| pixel_startx.checked_add(w))
        .ok_or_else(|| too_large("end pixel"))?;

    // lines
    let (shift_r, shift_g, shift_b) =
        if params.channels > 1 && !params.flags.contains(ScanFlag::IGNORE_COLOR_OFFSET) {
            (
                scaled("color shift", model.ld_shift_r, params.yres, motor.base_ydpi)?,
                scaled("color shift", model.ld_shift_g, params.yres, motor.base_ydpi)?,
                scaled("color shift", model.ld_shift_b, params.yres, motor.base_ydpi)?,
            )
        } else {
            (0, 0, 0)
        };
    let max_color_shift_lines = shift_r.max(shift_g).max(shift_b);
    let (num_staggered_lines, stagger_y) =
        if params.flags.contains(ScanFlag::IGNORE_STAGGER_OFFSET) {
            (0, StaggerConfig::default())
        } else {
            (sensor.stagger_y.max_shift(), sensor.stagger_y.clone())
        };
    let lead_lines = max_color_shift_lines + num_staggered_lines;
    let output_line_count = params
        .lines
        .checked_add(lead_lines)
        .ok_or_else(|| too_large("line count"))?;
    let optical_line_count = if model.is_cis {
        output_line_count
            .checked_mul(params.channels)
            .ok_or_else(|| too_large("line count"))?
    } else {
        output_line_count
    };

    // bytes
    let line_bytes = |pixels: u32| {
        multiply_by_depth_ceil(pixels, params.depth)
            .and_then(|b| b.checked_mul(params.channels))
            .ok_or_else(|| too_large("line size"))
    };
    let output_channel_bytes = multiply_by_depth_ceil(output_pixels, params.depth)
        .ok_or_else(|| too_large("line size"))?;
    let output_line_bytes = line_bytes(output_pixels)?;
    let output_line_bytes_requested = line_bytes(params.pixels)?;
    let output_line_bytes_raw = output_pixels
        .checked_add(segment_overhang)
        .ok_or_else(|| too_large("line size"))
        .and_then(&line_bytes)?;
    let output_total_bytes = u64::from(output_line_bytes) * u64::from(output_line_count);
    let output_total_bytes_raw = u64::from(output_line_bytes_raw) * u64::from(output_line_count);

    // exposure
    let exposure_time = match exposure_override {
        Some(e) => e,
        None if sensor.exposure_lperiod > 0 => sensor.exposure_lperiod,
        None => {
            let slope_w = motor
                .slopes
                .first()
                .map_or(0, |s| s.max_speed_w());
            let led = if model.is_cis {
                u32::from(sensor.exposure.max())
            } else {
                0
            };
            pixel_endx
                .checked_add(32)
                .ok_or_else(|| too_large("line period"))?
                .max(scaled("line period", slope_w, motor.base_ydpi, params.yres)?)
                .max(led)
        }
    };

    // motion
    let has_profiles = registry
        .motor_profiles()
        .iter()
        .any(|p| p.motor_id == motor.id);
    let (step_type, motor_profile) = if has_profiles {
        let p = select_motor_profile(registry.motor_profiles(), motor.id, exposure_time)?;
        (p.step_type, Some(*p))
    } else {
        (
            step_type_for_yres(params.yres).min(motor.max_step_type()),
            None,
        )
    };

    let buffers = {
        let sizes = || -> Option<BufferSizes> {
            let requested = output_line_bytes_requested.checked_mul(8)?;
            let read = requested
                .checked_mul(2)?
                .checked_add(lead_lines.checked_mul(output_line_bytes)?)?;
            Some(BufferSizes {
                requested,
                read,
                lines: read,
                shrink: requested,
                out: requested,
                usb_read_chunk: output_line_bytes_raw.checked_mul(64)?,
            })
        };
        sizes().ok_or_else(|| too_large("buffer size"))?
    };

    let needs_reorder = params.channels == 3
        && (model.is_cis || model.line_mode_color_order == ColorOrder::Bgr || params.depth == 16);
    let needs_ccd = max_color_shift_lines > 0 || num_staggered_lines > 0;
    let needs_shrink = output_pixels != params.pixels;

    let session = ScanSession {
        params: params.clone(),
        asic_type: model.asic_type,
        motor_id: motor.id,
        is_cis: model.is_cis,
        color_order: model.line_mode_color_order,
        sensor,
        optical_resolution,
        output_resolution,
        ccd_size_divisor,
        optical_pixels,
        optical_pixels_raw,
        output_pixels,
        output_channel_bytes,
        output_line_bytes,
        output_line_bytes_raw,
        output_line_bytes_requested,
        output_line_count,
        optical_line_count,
        output_total_bytes,
        output_total_bytes_raw,
        color_shift_lines_r: shift_r,
        color_shift_lines_g: shift_g,
        color_shift_lines_b: shift_b,
        max_color_shift_lines,
        num_staggered_lines,
        stagger_y,
        segment_count,
        conseq_pixel_dist,
        pixel_startx,
        pixel_endx,
        exposure_time,
        step_type,
        motor_profile,
        buffers,
        needs_reorder,
        needs_ccd,
        needs_shrink,
        needs_desegment: segmented,
    };
    tracing::debug!(
        model = model.name,
        xres = params.xres,
        yres = params.yres,
        optical = optical_resolution,
        exposure = exposure_time,
        step_type = ?step_type,
        bytes = output_total_bytes_raw,
        "session computed"
    );
    Ok(session)
}

impl ScanSession {
    /// Bytes of one delivered line.
    pub fn bytes_per_line(&self) -> u32 {
        self.output_line_bytes_requested
    }

    /// Bytes the device sends for the whole scan.
    pub fn total_bytes_to_read(&self) -> u64 {
        self.output_total_bytes_raw
    }

    /// Scan-speed target in ticks per full step.
    fn target_speed_w(&self, base_ydpi: u32) -> u32 {
        let w = u64::from(self.exposure_time) * u64::from(self.params.yres)
            / u64::from(base_ydpi.max(1));
        u32::try_from(w).unwrap_or(u32::MAX)
    }

    /// Slope tables for the five hardware slots.
    ///
    /// Scan, backtracking and stop share the scan curve; fast and home use
    /// the fastest profile the motor has, or the scan curve without one.
    pub fn slope_tables(&self, registry: &Registry) -> Result<SlopeTables> {
        let motor = registry.motor(self.motor_id)?;
        let scan_curve = match &self.motor_profile {
            Some(p) => GenesysMotorSlope::Physical(p.slope),
            None => *motor.get_slope(self.step_type)?,
        };
        let mult = self.step_type.multiplier() as usize;
        let scan = create_slope_table(
            &scan_curve,
            self.target_speed_w(motor.base_ydpi),
            self.step_type,
            mult,
            2 * mult,
        )?;

        let (fast_curve, fast_step_type) =
            match select_fast_profile(registry.motor_profiles(), motor.id) {
                Some(p) => (GenesysMotorSlope::Physical(p.slope), p.step_type),
                None => (scan_curve, self.step_type),
            };
        let fast_mult = fast_step_type.multiplier() as usize;
        let fast = create_slope_table_fastest(&fast_curve, fast_step_type, fast_mult, 2 * fast_mult)?;

        Ok(SlopeTables {
            backtracking: scan.clone(),
            stop: scan.clone(),
            scan,
            home: fast.clone(),
            fast,
            fast_step_type,
        })
    }

    /// Register image for this session, with the sensor's custom registers
    /// applied last.
    pub fn build_registers(&self, registry: &Registry) -> Result<RegisterSet> {
        let motor = registry.motor(self.motor_id)?;
        let tables = self.slope_tables(registry)?;
        let flags = self.params.flags;
        let mut regs = RegisterSet::new();

        let mut r01 = 0;
        if !flags.contains(ScanFlag::DISABLE_SHADING) {
            r01 |= REG_0X01_DVDSET | REG_0X01_SHDAREA;
        }
        regs.set8(REG_0X01, r01);

        let mut r02 = 0;
        if flags.contains(ScanFlag::REVERSE) {
            r02 |= REG_0X02_MTRREV;
        }
        if self.params.starty > 0 && !flags.contains(ScanFlag::FEEDING) {
            r02 |= REG_0X02_FASTFED;
        }
        regs.set8(REG_0X02, r02);

        let mut r04 = 0;
        if self.params.depth == 16 {
            r04 |= REG_0X04_BITSET;
        }
        if self.params.channels == 1 {
            r04 |= self.params.color_filter.register_bits() & REG_0X04_FILTER;
        }
        regs.set8(REG_0X04, r04);

        let dpihw = match self.optical_resolution {
            0..=600 => REG_0X05_DPIHW_600,
            601..=1200 => REG_0X05_DPIHW_1200,
            1201..=2400 => REG_0X05_DPIHW_2400,
            _ => REG_0X05_DPIHW_4800,
        };
        regs.set8_mask(REG_0X05, dpihw, REG_0X05_DPIHW);

        let dpiset = if self.sensor.register_dpiset > 0 {
            self.sensor.register_dpiset
        } else {
            self.output_resolution * self.ccd_size_divisor
        };
        regs.set16(REG_DPISET, fit16("DPISET", dpiset)?);
        regs.set16(REG_STRPIXEL, fit16("STRPIXEL", self.pixel_startx)?);
        regs.set16(REG_ENDPIXEL, fit16("ENDPIXEL", self.pixel_endx)?);
        regs.set24(REG_MAXWD, self.output_line_bytes_raw >> 1)?;
        regs.set16(REG_LPERIOD, fit16("LPERIOD", self.exposure_time)?);
        regs.set24(REG_LINCNT, self.output_line_count)?;

        let scan_steps = fit8("STEPNO", tables.scan.steps_for(self.step_type))?;
        let fast_steps = fit8("FASTNO", tables.fast.steps_for(tables.fast_step_type))?;
        regs.set8(REG_STEPNO, scan_steps);
        regs.set8(REG_FWDSTEP, scan_steps);
        regs.set8(REG_BWDSTEP, scan_steps);
        regs.set8(REG_FSHDEC, fit8("FSHDEC", tables.stop.steps_for(self.step_type))?);
        regs.set8(REG_FASTNO, fast_steps);
        regs.set8(REG_FMOVNO, fast_steps);
        regs.set8(REG_FMOVDEC, fast_steps);

        let feed = scaled("FEEDL", self.params.starty, motor.base_ydpi, self.params.yres)?;
        let feedl = u32::try_from(u64::from(feed) << self.step_type.shift())
            .map_err(|_| too_large("FEEDL"))?;
        regs.set24(REG_FEEDL, feedl)?;

        regs.set8_mask(
            REG_0X67,
            (self.step_type.shift() as u8) << REG_STEPSEL_SHIFT,
            REG_STEPSEL_MASK,
        );
        regs.set8_mask(
            REG_0X68,
            (tables.fast_step_type.shift() as u8) << REG_STEPSEL_SHIFT,
            REG_STEPSEL_MASK,
        );

        regs.merge(&self.sensor.custom_regs);
        Ok(regs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(75, StepType::Full)]
    #[case(150, StepType::Full)]
    #[case(300, StepType::Half)]
    #[case(600, StepType::Quarter)]
    #[case(1200, StepType::Eighth)]
    fn yres_bands(#[case] yres: u32, #[case] want: StepType) {
        assert_eq!(step_type_for_yres(yres), want);
    }

    #[test]
    fn params_validation() {
        let ok = SetupParams {
            pixels: 100,
            lines: 100,
            ..SetupParams::default()
        };
        ok.validate().unwrap();
        assert!(SetupParams { depth: 12, ..ok.clone() }.validate().is_err());
        assert!(SetupParams { channels: 2, ..ok.clone() }.validate().is_err());
        assert!(SetupParams { depth: 1, ..ok.clone() }.validate().is_err());
        assert!(
            SetupParams {
                scan_method: ScanMethod::Transparency,
                ..ok.clone()
            }
            .validate()
            .is_err()
        );
        assert!(SetupParams { pixels: 0, ..ok }.validate().is_err());
    }

    #[test]
    fn lide100_color_300dpi() {
        let reg = Registry::builtin();
        let model = reg.model_by_name("canon-lide-100").unwrap();
        let params = SetupParams {
            pixels: 2550,
            lines: 3508,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, None).unwrap();
        assert_eq!(s.optical_resolution, 600);
        assert_eq!(s.optical_pixels, 5100);
        assert_eq!(s.output_pixels, 2550);
        assert_eq!(s.output_line_bytes, 2550 * 3);
        assert_eq!(s.exposure_time, 2848);
        assert_eq!(s.step_type, StepType::Half);
        assert_eq!(s.optical_line_count, 3508 * 3);
        assert!(!s.needs_ccd);
        assert!(s.needs_reorder);
        assert_eq!(s.buffers.requested, 8 * 2550 * 3);
        assert_eq!(s.buffers.read, 2 * s.buffers.requested);
    }

    #[test]
    fn ccd_color_shift_and_legacy_exposure() {
        let reg = Registry::builtin();
        let model = reg.model_by_name("hp-scanjet-2300c").unwrap();
        let params = SetupParams {
            pixels: 1000,
            lines: 100,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, None).unwrap();
        // ld_shift 16/8/0 at 600 base dpi, scanning at 300
        assert_eq!(
            (s.color_shift_lines_r, s.color_shift_lines_g, s.color_shift_lines_b),
            (8, 4, 0)
        );
        assert_eq!(s.output_line_count, 108);
        assert!(s.needs_ccd);
        assert_eq!(s.exposure_time, s.pixel_endx + 32);
        assert_eq!(s.step_type, StepType::Half);
        assert!(s.motor_profile.is_none());

        let gray = SetupParams { channels: 1, ..params };
        let s = compute_session(&reg, model, None, &gray, None).unwrap();
        assert_eq!(s.max_color_shift_lines, 0);
    }

    #[test]
    fn legacy_motor_step_type_is_clamped() {
        let reg = Registry::builtin();
        let model = reg.model_by_name("hp-scanjet-2300c").unwrap();
        let params = SetupParams {
            xres: 1200,
            yres: 1200,
            pixels: 100,
            lines: 10,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, None).unwrap();
        assert_eq!(s.step_type, StepType::Half);
        s.slope_tables(&reg).unwrap();
    }

    #[test]
    fn stagger_lines_can_be_ignored() {
        let reg = Registry::builtin();
        let model = reg.model_by_name("canon-4400f").unwrap();
        let params = SetupParams {
            xres: 2400,
            yres: 2400,
            pixels: 400,
            lines: 40,
            channels: 1,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, None).unwrap();
        assert_eq!(s.num_staggered_lines, 4);
        assert_eq!(s.output_line_count, 44);
        assert_eq!(s.optical_pixels % 4, 0);

        let ignore = SetupParams {
            flags: ScanFlag::IGNORE_STAGGER_OFFSET,
            ..params
        };
        let s = compute_session(&reg, model, None, &ignore, None).unwrap();
        assert_eq!(s.num_staggered_lines, 0);
        assert_eq!(s.output_line_count, 40);
    }

    #[test]
    fn segmented_sensor_adds_overhang() {
        let reg = Registry::builtin();
        let model = reg.model_by_name("canon-lide-200").unwrap();
        let params = SetupParams {
            xres: 4800,
            yres: 4800,
            pixels: 1000,
            lines: 10,
            channels: 1,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, None).unwrap();
        assert_eq!(s.segment_count, 4);
        assert!(s.needs_desegment);
        assert_eq!(s.optical_pixels_raw, s.optical_pixels + 5136 * 3);
        assert_eq!(s.output_line_bytes_raw, 1000 + 5136 * 3);
    }

    #[test]
    fn exposure_override_wins() {
        let reg = Registry::builtin();
        let model = reg.model_by_name("canon-lide-100").unwrap();
        let params = SetupParams {
            pixels: 100,
            lines: 10,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, Some(5000)).unwrap();
        assert_eq!(s.exposure_time, 5000);
        assert_eq!(s.motor_profile.map(|p| p.exposure), Some(5280));
        assert_eq!(s.step_type, StepType::Eighth);
    }

    #[test]
    fn resolution_above_optical_is_rejected() {
        let reg = Registry::builtin();
        let mut sensor = reg
            .find_sensor(
                crate::sensor::SensorId::CisCanonLide100,
                300,
                3,
                ScanMethod::Flatbed,
            )
            .unwrap()
            .clone();
        sensor.register_dpihw = 150;
        let model = reg.model_by_name("canon-lide-100").unwrap();
        let params = SetupParams {
            pixels: 100,
            lines: 10,
            ..SetupParams::default()
        };
        assert!(matches!(
            compute_session(&reg, model, Some(&sensor), &params, None),
            Err(GenesysError::Config(_))
        ));
    }

    #[test]
    fn registers_and_tables() {
        let reg = Registry::builtin();
        let model = reg.model_by_name("canon-lide-100").unwrap();
        let params = SetupParams {
            pixels: 2550,
            lines: 100,
            starty: 30,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, None).unwrap();
        let regs = s.build_registers(&reg).unwrap();
        assert_eq!(regs.get16(REG_LPERIOD).unwrap(), 2848);
        assert_eq!(regs.get24(REG_LINCNT).unwrap(), 100);
        assert_eq!(regs.get16(REG_DPISET).unwrap(), 300);
        assert_eq!(regs.get8(REG_0X05).unwrap() & REG_0X05_DPIHW, REG_0X05_DPIHW_600);
        assert_eq!(regs.get8(REG_0X67).unwrap() >> REG_STEPSEL_SHIFT, 1);
        assert_eq!(regs.get24(REG_FEEDL).unwrap(), (30 * 1200 / 300) << 1);
        // custom sensor register
        assert_eq!(regs.get8(0x16).unwrap(), 0x15);

        let tables = s.slope_tables(&reg).unwrap();
        assert_eq!(tables.scan, tables.backtracking);
        assert_eq!(tables.fast, tables.home);
        assert_eq!(tables.scan.scan_steps % 2, 0);
        // the 712-tick target is faster than the profile allows
        assert_eq!(tables.scan.final_speed(), 1026 >> 1);
        assert_eq!(tables.fast.final_speed(), 534 >> 1);
    }

    #[rstest::rstest]
    #[case("hp-scanjet-2300c", 1000, u32::MAX - 2)]
    #[case("canon-lide-100", 3_000_000_000, 100)]
    #[case("canon-lide-100", 100, u32::MAX)]
    #[case("canon-4400f", u32::MAX / 2, 10)]
    fn oversized_requests_are_config_errors(
        #[case] name: &str,
        #[case] pixels: u32,
        #[case] lines: u32,
    ) {
        let reg = Registry::builtin();
        let model = reg.model_by_name(name).unwrap();
        let params = SetupParams {
            pixels,
            lines,
            ..SetupParams::default()
        };
        assert!(matches!(
            compute_session(&reg, model, None, &params, None),
            Err(GenesysError::Config(_))
        ));
    }

    fn lide100_session() -> (Registry, ScanSession) {
        let reg = Registry::builtin();
        let model = reg.model_by_name("canon-lide-100").unwrap();
        let params = SetupParams {
            pixels: 300,
            lines: 100,
            ..SetupParams::default()
        };
        let s = compute_session(&reg, model, None, &params, None).unwrap();
        (reg, s)
    }

    #[test]
    fn wide_register_fields_are_rejected() {
        let (reg, s) = lide100_session();

        let mut long = s.clone();
        long.output_line_count = 0x100_0000;
        assert!(matches!(long.build_registers(&reg), Err(GenesysError::Config(_))));

        let mut far = s.clone();
        far.params.starty = u32::MAX / 4;
        assert!(matches!(far.build_registers(&reg), Err(GenesysError::Config(_))));

        s.build_registers(&reg).unwrap();
    }

    #[test]
    fn step_counts_wider_than_a_byte_are_rejected() {
        let (reg, mut s) = lide100_session();
        let profile = s.motor_profile.as_mut().unwrap();
        profile.step_type = StepType::Full;
        profile.slope = crate::motor::MotorSlope::create_from_steps(62_496, 335, 2000);
        s.step_type = StepType::Full;

        let tables = s.slope_tables(&reg).unwrap();
        assert!(tables.scan.steps_for(StepType::Full) > 255);
        match s.build_registers(&reg) {
            Err(GenesysError::Config(msg)) => assert!(msg.contains("STEPNO"), "{msg}"),
            other => panic!("expected STEPNO overflow, got {other:?}"),
        }
    }
}
