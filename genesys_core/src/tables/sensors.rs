use crate::registers::RegisterSetting;
use crate::sensor::{Ratio, ResolutionFilter, ScanMethod, Sensor, SensorExposure, SensorId, StaggerConfig};

struct Entry {
    resolutions: &'static [u32],
    dpihw: u32,
    shading_resolution: u32,
    lperiod: u32,
    segment_size: u32,
    segment_order: &'static [u32],
    pixel_count_ratio: Ratio,
    stagger_y: &'static [u32],
}

fn expand(base: &Sensor, entries: &[Entry]) -> Vec<Sensor> {
    entries
        .iter()
        .map(|e| Sensor {
            resolutions: ResolutionFilter::Values(e.resolutions.to_vec()),
            register_dpihw: e.dpihw,
            shading_resolution: e.shading_resolution,
            exposure_lperiod: e.lperiod,
            segment_size: e.segment_size,
            segment_order: e.segment_order.to_vec(),
            pixel_count_ratio: e.pixel_count_ratio,
            stagger_y: StaggerConfig::new(e.stagger_y.to_vec()),
            ..base.clone()
        })
        .collect()
}

fn canon_lide_100() -> Vec<Sensor> {
    let base = Sensor {
        sensor_id: SensorId::CisCanonLide100,
        full_resolution: 1200,
        black_pixels: 87,
        dummy_pixel: 87,
        fau_gain_white_ref: 210,
        gain_white_ref: 200,
        exposure: SensorExposure::new(0x01c5, 0x0134, 0x00d9),
        custom_regs: vec![
            RegisterSetting::new(0x16, 0x15),
            RegisterSetting::new(0x17, 0x11),
            RegisterSetting::new(0x1d, 0x01),
            RegisterSetting::masked(0x5a, 0x40, 0xc0),
        ],
        ..Sensor::default()
    };
    expand(
        &base,
        &[
            Entry {
                resolutions: &[75, 100, 150, 200, 300],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 2848,
                segment_size: 5136,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[600],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 1432,
                segment_size: 5136,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[1200],
                dpihw: 1200,
                shading_resolution: 1200,
                lperiod: 2712,
                segment_size: 5136,
                segment_order: &[0, 1],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
        ],
    )
}

fn canon_lide_200() -> Vec<Sensor> {
    let base = Sensor {
        sensor_id: SensorId::CisCanonLide200,
        full_resolution: 4800,
        black_pixels: 87 * 4,
        dummy_pixel: 16 * 4,
        fau_gain_white_ref: 210,
        gain_white_ref: 200,
        exposure: SensorExposure::new(0x0190, 0x0120, 0x0100),
        custom_regs: vec![
            RegisterSetting::new(0x16, 0x10),
            RegisterSetting::new(0x17, 0x08),
            RegisterSetting::masked(0x5a, 0x40, 0xc0),
        ],
        ..Sensor::default()
    };
    expand(
        &base,
        &[
            Entry {
                resolutions: &[75, 100, 150, 200, 300, 600],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 2848,
                segment_size: 5136,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[1200],
                dpihw: 1200,
                shading_resolution: 1200,
                lperiod: 2848,
                segment_size: 5136,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[2400],
                dpihw: 2400,
                shading_resolution: 2400,
                lperiod: 5280,
                segment_size: 5136,
                segment_order: &[0, 1],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[4800],
                dpihw: 4800,
                shading_resolution: 4800,
                lperiod: 10416,
                segment_size: 5136,
                segment_order: &[0, 2, 1, 3],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
        ],
    )
}

fn canon_lide_700() -> Vec<Sensor> {
    let base = Sensor {
        sensor_id: SensorId::CisCanonLide700,
        full_resolution: 4800,
        black_pixels: 73 * 8,
        dummy_pixel: 16 * 8,
        fau_gain_white_ref: 210,
        gain_white_ref: 200,
        exposure: SensorExposure::new(0x1000, 0x1000, 0x0500),
        custom_regs: vec![
            RegisterSetting::new(0x16, 0x10),
            RegisterSetting::new(0x17, 0x0c),
        ],
        ..Sensor::default()
    };
    expand(
        &base,
        &[
            Entry {
                resolutions: &[75, 100, 150, 200],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 2696,
                segment_size: 5187,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[300, 600],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 1424,
                segment_size: 5187,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[1200],
                dpihw: 1200,
                shading_resolution: 1200,
                lperiod: 2848,
                segment_size: 5187,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[2400],
                dpihw: 2400,
                shading_resolution: 2400,
                lperiod: 10576,
                segment_size: 5187,
                segment_order: &[0, 1],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
        ],
    )
}

fn canon_lide_110() -> Vec<Sensor> {
    let base = Sensor {
        sensor_id: SensorId::CisCanonLide110,
        full_resolution: 2400,
        black_pixels: 87,
        dummy_pixel: 16,
        fau_gain_white_ref: 210,
        gain_white_ref: 200,
        exposure: SensorExposure::new(0x0000, 0x0000, 0x0000),
        custom_regs: vec![RegisterSetting::new(0x16, 0x00), RegisterSetting::new(0x17, 0x04)],
        ..Sensor::default()
    };
    expand(
        &base,
        &[
            Entry {
                resolutions: &[75, 100, 150, 300],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 2768,
                segment_size: 0,
                segment_order: &[],
                pixel_count_ratio: Ratio::new(1, 4),
                stagger_y: &[],
            },
            Entry {
                resolutions: &[600],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 5360,
                segment_size: 0,
                segment_order: &[],
                pixel_count_ratio: Ratio::new(1, 2),
                stagger_y: &[],
            },
            Entry {
                resolutions: &[1200],
                dpihw: 1200,
                shading_resolution: 1200,
                lperiod: 10528,
                segment_size: 0,
                segment_order: &[],
                pixel_count_ratio: Ratio::new(1, 2),
                stagger_y: &[],
            },
            Entry {
                resolutions: &[2400],
                dpihw: 2400,
                shading_resolution: 2400,
                lperiod: 20864,
                segment_size: 0,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
        ],
    )
}

fn hp2300() -> Vec<Sensor> {
    let base = Sensor {
        sensor_id: SensorId::CcdHp2300,
        full_resolution: 1200,
        black_pixels: 20,
        dummy_pixel: 16,
        fau_gain_white_ref: 140,
        gain_white_ref: 150,
        exposure: SensorExposure::default(),
        custom_regs: vec![RegisterSetting::new(0x08, 0x16), RegisterSetting::new(0x09, 0x00)],
        gamma: [2.1, 2.1, 2.1],
        ..Sensor::default()
    };
    expand(
        &base,
        &[
            Entry {
                resolutions: &[75, 150, 300, 600],
                dpihw: 600,
                shading_resolution: 600,
                lperiod: 0,
                segment_size: 0,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
            Entry {
                resolutions: &[1200],
                dpihw: 1200,
                shading_resolution: 1200,
                lperiod: 0,
                segment_size: 0,
                segment_order: &[],
                pixel_count_ratio: Ratio::ONE,
                stagger_y: &[],
            },
        ],
    )
}

fn canon_4400f() -> Vec<Sensor> {
    let base = Sensor {
        sensor_id: SensorId::CcdCanon4400f,
        full_resolution: 4800,
        black_pixels: 50 * 8,
        dummy_pixel: 20,
        fau_gain_white_ref: 160,
        gain_white_ref: 160,
        exposure: SensorExposure::new(0x9c40, 0x9c40, 0x9c40),
        custom_regs: vec![
            RegisterSetting::new(0x74, 0x00),
            RegisterSetting::new(0x75, 0xf8),
            RegisterSetting::new(0x76, 0x38),
        ],
        ..Sensor::default()
    };
    let flatbed = [
        Entry {
            resolutions: &[300, 600, 1200],
            dpihw: 1200,
            shading_resolution: 1200,
            lperiod: 11640,
            segment_size: 0,
            segment_order: &[],
            pixel_count_ratio: Ratio::ONE,
            stagger_y: &[],
        },
        Entry {
            resolutions: &[2400],
            dpihw: 2400,
            shading_resolution: 2400,
            lperiod: 33300,
            segment_size: 0,
            segment_order: &[],
            pixel_count_ratio: Ratio::ONE,
            stagger_y: &[0, 4],
        },
        Entry {
            resolutions: &[4800],
            dpihw: 4800,
            shading_resolution: 4800,
            lperiod: 33300,
            segment_size: 0,
            segment_order: &[],
            pixel_count_ratio: Ratio::ONE,
            stagger_y: &[0, 8],
        },
    ];
    let transparency = Sensor {
        method: ScanMethod::Transparency,
        exposure: SensorExposure::new(0x5000, 0x5000, 0x5000),
        ..base.clone()
    };
    let mut all = expand(&base, &flatbed);
    all.extend(expand(&transparency, &flatbed));
    all
}

pub(crate) fn builtin_sensors() -> Vec<Sensor> {
    [
        canon_lide_100(),
        canon_lide_200(),
        canon_lide_700(),
        canon_lide_110(),
        hp2300(),
        canon_4400f(),
    ]
    .concat()
}
