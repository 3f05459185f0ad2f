use crate::model::{AsicType, ColorOrder, MethodResolutions, Model, ModelFlag, UsbDeviceEntry};
use crate::motor::MotorId;
use crate::sensor::{ScanMethod, SensorId};

fn flatbed(resolutions: &[u32]) -> MethodResolutions {
    MethodResolutions {
        methods: vec![ScanMethod::Flatbed],
        resolutions_x: resolutions.to_vec(),
        resolutions_y: resolutions.to_vec(),
    }
}

fn lide(
    name: &'static str,
    model: &'static str,
    asic_type: AsicType,
    resolutions: &[u32],
    sensor_id: SensorId,
    motor_id: MotorId,
) -> Model {
    Model {
        name,
        vendor: "Canon",
        model,
        asic_type,
        resolutions: vec![flatbed(resolutions)],
        bpp_gray_values: vec![8, 16],
        bpp_color_values: vec![8, 16],
        x_offset: 1.1,
        y_offset: 8.3,
        x_size: 216.07,
        y_size: 299.0,
        ld_shift_r: 0,
        ld_shift_g: 0,
        ld_shift_b: 0,
        line_mode_color_order: ColorOrder::Rgb,
        is_cis: true,
        is_sheetfed: false,
        sensor_id,
        motor_id,
        flags: ModelFlag::DARK_CALIBRATION | ModelFlag::CUSTOM_GAMMA | ModelFlag::SIS_SENSOR,
    }
}

pub(crate) fn builtin_models() -> Vec<Model> {
    vec![
        lide(
            "canon-lide-100",
            "LiDE 100",
            AsicType::Gl847,
            &[1200, 600, 300, 200, 150, 100, 75],
            SensorId::CisCanonLide100,
            MotorId::CanonLide100,
        ),
        lide(
            "canon-lide-200",
            "LiDE 200",
            AsicType::Gl847,
            &[4800, 2400, 1200, 600, 300, 200, 150, 100, 75],
            SensorId::CisCanonLide200,
            MotorId::CanonLide200,
        ),
        Model {
            x_offset: 3.1,
            y_offset: 8.1,
            y_size: 297.0,
            ..lide(
                "canon-lide-700f",
                "LiDE 700F",
                AsicType::Gl847,
                &[2400, 1200, 600, 300, 200, 150, 100, 75],
                SensorId::CisCanonLide700,
                MotorId::CanonLide700,
            )
        },
        Model {
            x_offset: 2.2,
            y_offset: 9.0,
            flags: ModelFlag::DARK_CALIBRATION | ModelFlag::CUSTOM_GAMMA | ModelFlag::SHADING_REPARK,
            ..lide(
                "canon-lide-110",
                "LiDE 110",
                AsicType::Gl124,
                &[2400, 1200, 600, 300, 150, 100, 75],
                SensorId::CisCanonLide110,
                MotorId::CanonLide110,
            )
        },
        Model {
            name: "hp-scanjet-2300c",
            vendor: "Hewlett Packard",
            model: "ScanJet 2300c",
            asic_type: AsicType::Gl646,
            resolutions: vec![flatbed(&[1200, 600, 300, 150, 75])],
            bpp_gray_values: vec![8, 16],
            bpp_color_values: vec![8, 16],
            x_offset: 2.0,
            y_offset: 7.5,
            x_size: 215.9,
            y_size: 295.0,
            ld_shift_r: 16,
            ld_shift_g: 8,
            ld_shift_b: 0,
            line_mode_color_order: ColorOrder::Rgb,
            is_cis: false,
            is_sheetfed: false,
            sensor_id: SensorId::CcdHp2300,
            motor_id: MotorId::Hp2300,
            flags: ModelFlag::CUSTOM_GAMMA | ModelFlag::WARMUP,
        },
        Model {
            name: "canon-4400f",
            vendor: "Canon",
            model: "Canoscan 4400f",
            asic_type: AsicType::Gl843,
            resolutions: vec![MethodResolutions {
                methods: vec![ScanMethod::Flatbed, ScanMethod::Transparency],
                resolutions_x: vec![4800, 2400, 1200, 600, 300],
                resolutions_y: vec![4800, 2400, 1200, 600, 300],
            }],
            bpp_gray_values: vec![8, 16],
            bpp_color_values: vec![8, 16],
            x_offset: 6.0,
            y_offset: 10.0,
            x_size: 215.9,
            y_size: 297.0,
            ld_shift_r: 96,
            ld_shift_g: 48,
            ld_shift_b: 0,
            line_mode_color_order: ColorOrder::Rgb,
            is_cis: false,
            is_sheetfed: false,
            sensor_id: SensorId::CcdCanon4400f,
            motor_id: MotorId::Canon4400f,
            flags: ModelFlag::CUSTOM_GAMMA
                | ModelFlag::DARK_CALIBRATION
                | ModelFlag::SHADING_REPARK
                | ModelFlag::UTA_NO_SECONDARY_MOTOR,
        },
    ]
}

pub(crate) fn builtin_usb_devices() -> Vec<UsbDeviceEntry> {
    let entry = |vendor_id, product_id, model| UsbDeviceEntry {
        vendor_id,
        product_id,
        model,
    };
    vec![
        entry(0x04a9, 0x1904, "canon-lide-100"),
        entry(0x04a9, 0x1905, "canon-lide-200"),
        entry(0x04a9, 0x1907, "canon-lide-700f"),
        entry(0x04a9, 0x1909, "canon-lide-110"),
        entry(0x03f0, 0x0901, "hp-scanjet-2300c"),
        entry(0x04a9, 0x2228, "canon-4400f"),
    ]
}
