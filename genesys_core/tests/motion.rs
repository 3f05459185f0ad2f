use genesys_core::{
    GenesysError, MotorId, MotorSlopeLegacy, Registry, StepType, create_slope_table,
    create_slope_table_fastest, select_fast_profile, select_motor_profile,
};
use rstest::rstest;

#[rstest]
#[case(MotorId::CanonLide110, 2768, 2768, StepType::Full)]
#[case(MotorId::CanonLide110, 20_000, 20_864, StepType::Quarter)]
#[case(MotorId::CanonLide110, 30_000, 0, StepType::Quarter)]
#[case(MotorId::CanonLide200, 3000, 5280, StepType::Eighth)]
#[case(MotorId::CanonLide700, 0, 1424, StepType::Half)]
fn builtin_profile_selection(
    #[case] motor: MotorId,
    #[case] exposure: u32,
    #[case] picked: u32,
    #[case] step: StepType,
) {
    let reg = Registry::builtin();
    let p = select_motor_profile(reg.motor_profiles(), motor, exposure).unwrap();
    assert_eq!((p.exposure, p.step_type), (picked, step));
}

#[test]
fn long_exposure_without_fallback_is_an_error() {
    let reg = Registry::builtin();
    assert_eq!(
        select_motor_profile(reg.motor_profiles(), MotorId::CanonLide200, 20_000),
        Err(GenesysError::MotorProfileNotFound {
            motor_id: MotorId::CanonLide200,
            exposure: 20_000
        })
    );
}

#[test]
fn motors_without_profiles_have_no_fast_profile() {
    let reg = Registry::builtin();
    assert!(select_fast_profile(reg.motor_profiles(), MotorId::Hp2300).is_none());
    let fast = select_fast_profile(reg.motor_profiles(), MotorId::CanonLide100).unwrap();
    assert_eq!(fast.slope.max_speed_w, 534);
}

#[test]
fn legacy_curve_builds_tables_for_every_slot() {
    let reg = Registry::builtin();
    let motor = reg.motor(MotorId::Hp2300).unwrap();
    for (i, step_type) in [StepType::Full, StepType::Half].into_iter().enumerate() {
        let curve = motor.get_slope(step_type).unwrap();
        let mult = step_type.multiplier() as usize;
        let scan = create_slope_table(curve, 4000, step_type, mult, 2 * mult).unwrap();
        let fast = create_slope_table_fastest(curve, step_type, mult, 2 * mult).unwrap();
        assert!(fast.scan_steps >= scan.scan_steps, "slot {i}");
        assert!(fast.final_speed() <= scan.final_speed());
    }
}

#[test]
fn legacy_curve_reaches_max_after_minimum_steps() {
    let slope = MotorSlopeLegacy {
        maximum_start_speed: 8139,
        maximum_speed: 560,
        minimum_steps: 120,
        g: 4.905,
    };
    let t = create_slope_table_fastest(&slope, StepType::Full, 1, 1).unwrap();
    assert_eq!(t.table[0], 8139);
    assert_eq!(t.final_speed(), 560);
    assert!(t.scan_steps <= 121);
}
