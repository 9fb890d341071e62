//! End-to-end reads against a synthesized run file.

use lapdhdf::{ConType, File, MetaColumn, ReadOptions, Shotnum};
use lapdhdf_map::faux::FauxLapd;

fn full_faux() -> FauxLapd {
    FauxLapd::builder()
        .connections(&[(1, &[0, 1]), (3, &[2])])
        .nshot(12)
        .nt(256)
        .with_msi()
        .with_waveform()
        .with_n5700ps()
        .with_data_run_sequence()
        .build()
        .unwrap()
}

#[test]
fn map_then_read_every_device() {
    let faux = full_faux();
    let handle = File::open(faux.path()).unwrap();

    let map = handle.file_map();
    assert_eq!(map.msi().len(), 5);
    assert_eq!(map.digitizers().len(), 1);
    assert_eq!(map.controls().len(), 2);
    assert!(map.has_data_run_sequence());

    // digitizer signal: constant board * 10 + channel counts
    let data = handle.read_data(3, 2, &ReadOptions::default()).unwrap();
    assert_eq!(data.signal.dim(), (12, 256));
    assert!(data.signal.iter().all(|&s| s == 32));
    assert_eq!(data.shotnum.first(), Some(&1));
    assert_eq!(data.info.config_name, "config01");

    // MSI diagnostic, by alias
    let msi = handle.read_msi("discharge").unwrap();
    assert_eq!(msi.shotnum.len(), 12);
    match &msi.meta["peak current"] {
        MetaColumn::F32(col) => assert_eq!(col[[11]], 1200.0),
        other => panic!("expected f32 column, got {other:?}"),
    }

    // control state for a subset of shots
    let control = handle
        .read_controls("Waveform", None, &Shotnum::Range(1..4))
        .unwrap();
    assert_eq!(control.shotnum, vec![1, 2, 3]);
    assert_eq!(control.command_value, vec![40000.0, 80000.0, 120000.0]);
    assert_eq!(control.info.contype, ConType::Waveform);
}

#[test]
fn overview_reflects_the_map() {
    let faux = full_faux();
    let handle = File::open(faux.path()).unwrap();

    let mut buffer = Vec::new();
    handle.overview().report(&mut buffer).unwrap();
    let report = String::from_utf8(buffer).unwrap();

    assert!(report.contains("Generated by LaPD"));
    assert!(report.contains("Digitizers (1)"));
    assert!(report.contains("Control Devices (2)"));
    assert!(report.contains("(1, [0, 1])"));
    assert!(report.contains("(3, [2])"));
    assert!(report.contains("Motion Lists"));
}
