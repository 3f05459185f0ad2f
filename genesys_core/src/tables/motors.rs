use crate::motor::{GenesysMotorSlope, Motor, MotorId, MotorProfile, MotorSlope, MotorSlopeLegacy, StepType};

fn physical(initial_w: u32, max_w: u32, steps: u32) -> MotorSlope {
    MotorSlope::create_from_steps(initial_w, max_w, steps)
}

fn profile(motor_id: MotorId, exposure: u32, step_type: StepType, slope: MotorSlope) -> MotorProfile {
    MotorProfile {
        motor_id,
        exposure,
        step_type,
        slope,
    }
}

pub(crate) fn builtin_motors() -> Vec<Motor> {
    let lide = |id: MotorId, optical_ydpi: u32, slope: MotorSlope| Motor {
        id,
        base_ydpi: 1200,
        optical_ydpi,
        slopes: vec![GenesysMotorSlope::Physical(slope); 4],
    };
    vec![
        lide(MotorId::CanonLide100, 6400, physical(46_876, 534, 255)),
        lide(MotorId::CanonLide200, 6400, physical(46_876, 534, 255)),
        lide(MotorId::CanonLide700, 6400, physical(46_876, 534, 255)),
        Motor {
            id: MotorId::CanonLide110,
            base_ydpi: 4800,
            optical_ydpi: 9600,
            slopes: vec![GenesysMotorSlope::Physical(physical(62_496, 335, 254)); 4],
        },
        Motor {
            id: MotorId::Hp2300,
            base_ydpi: 600,
            optical_ydpi: 1200,
            slopes: vec![
                GenesysMotorSlope::Legacy(MotorSlopeLegacy {
                    maximum_start_speed: 8139,
                    maximum_speed: 560,
                    minimum_steps: 120,
                    g: 4.905,
                }),
                GenesysMotorSlope::Legacy(MotorSlopeLegacy {
                    maximum_start_speed: 3139,
                    maximum_speed: 280,
                    minimum_steps: 120,
                    g: 4.905,
                }),
            ],
        },
        Motor {
            id: MotorId::Canon4400f,
            base_ydpi: 2400,
            optical_ydpi: 9600,
            slopes: vec![
                GenesysMotorSlope::Physical(physical(49_152, 32_640, 32)),
                GenesysMotorSlope::Physical(physical(49_152, 16_320, 64)),
                GenesysMotorSlope::Physical(physical(49_152, 8_160, 128)),
                GenesysMotorSlope::Physical(physical(49_152, 4_080, 255)),
            ],
        },
    ]
}

pub(crate) fn builtin_motor_profiles() -> Vec<MotorProfile> {
    use MotorId::*;
    use StepType::*;
    vec![
        profile(CanonLide100, 1432, Half, physical(46_876, 534, 255)),
        profile(CanonLide100, 2712, Quarter, physical(46_876, 1026, 255)),
        profile(CanonLide100, 2848, Half, physical(46_876, 1026, 255)),
        profile(CanonLide100, 5280, Eighth, physical(31_680, 1566, 255)),
        profile(CanonLide200, 2848, Half, physical(46_876, 534, 255)),
        profile(CanonLide200, 5280, Eighth, physical(31_680, 1566, 255)),
        profile(CanonLide200, 10416, Eighth, physical(31_680, 3136, 255)),
        profile(CanonLide700, 1424, Half, physical(46_876, 534, 255)),
        profile(CanonLide700, 2696, Half, physical(46_876, 2022, 127)),
        profile(CanonLide700, 2848, Half, physical(46_876, 1026, 255)),
        profile(CanonLide700, 10576, Eighth, physical(46_876, 15_864, 2)),
        profile(CanonLide110, 2768, Full, physical(62_496, 335, 254)),
        profile(CanonLide110, 5360, Half, physical(62_496, 335, 469)),
        profile(CanonLide110, 10528, Half, physical(62_496, 2632, 3)),
        profile(CanonLide110, 20864, Quarter, physical(62_496, 2588, 3)),
        profile(CanonLide110, 0, Quarter, physical(62_496, 2588, 3)),
    ]
}
