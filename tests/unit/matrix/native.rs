use super::*;

fn assert_send<T: Send>() {}

#[test]
fn native_matrix_can_move_between_threads() {
    assert_send::<NativeMatrix>();
}

#[test]
fn invalid_config_is_rejected_before_the_driver_starts() {
    let cfg = MatrixConfig {
        brightness: 0,
        ..MatrixConfig::default()
    };
    let err = NativeMatrix::new(&cfg).err().unwrap();
    assert!(matches!(err, MatrixError::Validation(_)));

    let cfg = MatrixConfig {
        rows: 0,
        ..MatrixConfig::default()
    };
    assert!(matches!(
        NativeMatrix::new(&cfg).err().unwrap(),
        MatrixError::Validation(_)
    ));
}

#[test]
fn driver_options_accept_every_valid_config() {
    let cfg = MatrixConfig {
        pwm_bits: 1,
        brightness: 1,
        scan_mode: crate::matrix::config::ScanMode::Interlaced,
        disable_hardware_pulsing: true,
        inverse_colors: true,
        hardware_mapping: "adafruit-hat".to_string(),
        ..MatrixConfig::default()
    };
    assert!(driver_options(&cfg).is_ok());
    assert!(driver_options(&MatrixConfig::default()).is_ok());
}
