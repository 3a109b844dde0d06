use super::*;

#[test]
fn simulated_backend_uses_config_geometry() {
    let cfg = MatrixConfig {
        rows: 16,
        cols: 32,
        chain_length: 2,
        ..MatrixConfig::default()
    };
    let mut m = create_matrix(&cfg).unwrap();
    assert_eq!(m.geometry().unwrap(), Geometry::new(64, 16));
}

#[cfg(not(feature = "hardware"))]
#[test]
fn native_backend_without_feature_is_a_construction_error() {
    let cfg = MatrixConfig {
        backend: BackendKind::Native,
        ..MatrixConfig::default()
    };
    let err = create_matrix(&cfg).err().unwrap();
    assert!(matches!(err, MatrixError::Construction(_)));
}

#[test]
fn unreachable_remote_is_a_construction_error() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let cfg = MatrixConfig {
        backend: BackendKind::Remote,
        remote_addr: format!("127.0.0.1:{port}"),
        ..MatrixConfig::default()
    };
    let err = create_matrix(&cfg).err().unwrap();
    assert!(matches!(err, MatrixError::Construction(_)));
}

#[test]
fn invalid_config_is_rejected_before_construction() {
    let cfg = MatrixConfig {
        brightness: 0,
        ..MatrixConfig::default()
    };
    assert!(matches!(
        create_matrix(&cfg).err().unwrap(),
        MatrixError::Validation(_)
    ));
}

#[test]
fn check_frame_len_rejects_wrong_sizes() {
    let g = Geometry::new(2, 2);
    assert!(check_frame_len(g, &[Rgb8::BLACK; 4]).is_ok());
    assert!(check_frame_len(g, &[Rgb8::BLACK; 3]).is_err());
}

#[test]
fn boxed_matrix_delegates() {
    let mut m: Box<dyn Matrix> = Box::new(simulated::SimulatedMatrix::new(2, 1));
    m.set(1, Rgb8::WHITE);
    assert_eq!(m.at(1), Rgb8::WHITE);
    m.render().unwrap();
    assert_eq!(m.at(1), Rgb8::BLACK);
}
