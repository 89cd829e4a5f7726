//! AC1027 downgrade shim behavior with a stub converter executable.

#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;

use common::builders::{build_paged_file, ObjectBuilder};
use dwgread::types::DwgVersion;

fn write_script(name: &str, body: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("dwgread-shim-{}-{name}", std::process::id()));
    fs::write(&path, body).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}

#[test]
fn downgrade_shim_round_trip() {
    // The AC1018 stream the stub converter will "produce".
    let objects = vec![(
        0x2Eu64,
        ObjectBuilder::line(
            DwgVersion::Ac1018,
            0x2E,
            0x200,
            (0.0, 0.0, 0.0),
            (10.0, 0.0, 0.0),
        ),
    )];
    let converted = build_paged_file(DwgVersion::Ac1018, &objects, 0x7400);
    let converted_path = common::builders::write_temp_file("shim-src.dwg", &converted.bytes);

    // An AC1027 input the native decoder never sees: only the magic needs
    // to be valid, the shim intercepts before parsing.
    let mut ac1027 = b"AC1027".to_vec();
    ac1027.extend_from_slice(&[0u8; 64]);
    let input_path = common::builders::write_temp_file("shim-in.dwg", &ac1027);

    let script = write_script(
        "converter.sh",
        "#!/bin/sh\ncp \"$CONVERTED_SOURCE\" \"$2/OUT.dwg\"\nexit 0\n",
    );

    std::env::set_var("CONVERTED_SOURCE", &converted_path);
    std::env::set_var(dwgread::convert::CONVERTER_ENV, &script);

    let doc = dwgread::read(&input_path).expect("shim decode");
    assert_eq!(doc.version, DwgVersion::Ac1027);
    assert_eq!(doc.decode_version, DwgVersion::Ac1018);
    assert_eq!(doc.modelspace().query("LINE").count(), 1);

    // A converter that fails leaves no usable output.
    let failing = write_script("failing.sh", "#!/bin/sh\nexit 3\n");
    std::env::set_var(dwgread::convert::CONVERTER_ENV, &failing);
    let mut other_input = b"AC1027".to_vec();
    other_input.extend_from_slice(&[1u8; 64]);
    let other_path = common::builders::write_temp_file("shim-in2.dwg", &other_input);
    let err = dwgread::read(&other_path).unwrap_err();
    assert!(matches!(err, dwgread::DwgError::ConvertFailed(_)), "{err}");

    std::env::remove_var(dwgread::convert::CONVERTER_ENV);
    std::env::remove_var("CONVERTED_SOURCE");
    for path in [converted_path, input_path, other_path, script, failing] {
        let _ = fs::remove_file(path);
    }
}
