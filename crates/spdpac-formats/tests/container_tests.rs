#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! End-to-end decoding, validation and extraction of synthetic containers

mod common;

use binrw::BinWriterExt;
use binrw::io::Cursor;
use common::{ContainerBuilder, random_bytes, write_container};
use pretty_assertions::assert_eq;
use spdpac_formats::{
    ChecksumRegion, DecodeMode, ErrorKind, ExtractOptions, FailurePolicy, HEADER_SIZE,
    PARTITION_DESCRIPTOR_SIZE, PacError, PacFile, PacHeader, PartitionDescriptor, Utf16Field,
    decode_partition_table,
};
use std::fs;
use tempfile::TempDir;

fn firmware() -> ContainerBuilder {
    ContainerBuilder::new()
        .partition("FDL", "fdl1-sign.bin", random_bytes(1500, 1))
        .partition("FDL2", "fdl2-sign.bin", random_bytes(4097, 2))
        .partition("FLASH", "", Vec::new())
        .partition("NV", "nvitem.bin", random_bytes(300, 3))
        .partition("boot", "boot.img", random_bytes(20_000, 4))
}

#[test]
fn header_and_table_reencode_to_original_bytes() {
    let builder = firmware().table_gap(64);
    let data = builder.build();

    let pac = PacFile::from_reader(Cursor::new(&data)).expect("valid container");
    let table_offset = pac.header().partition_table_offset as usize;

    let mut cursor = Cursor::new(Vec::new());
    cursor.write_le(pac.header()).unwrap();
    assert_eq!(cursor.get_ref().as_slice(), &data[..HEADER_SIZE]);

    let mut cursor = Cursor::new(Vec::new());
    for d in pac.partitions() {
        cursor.write_le(d).unwrap();
    }
    let table_len = pac.partitions().len() * PARTITION_DESCRIPTOR_SIZE;
    assert_eq!(
        cursor.get_ref().as_slice(),
        &data[table_offset..table_offset + table_len]
    );
}

#[test]
fn declared_size_mismatch_is_format_error() {
    let builder = firmware();
    let mut data = builder.build();
    data.push(0);

    let err = PacFile::from_reader(Cursor::new(data)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(err, PacError::SizeMismatch { .. }));
}

#[test]
fn unsupported_version_is_format_error() {
    let builder = firmware();
    let (mut header, descriptors) = builder.layout();
    header.version = Utf16Field::from_text("BP_R1.0.1");
    let data = builder.build_from(&header, &descriptors);

    let err = PacFile::from_reader(Cursor::new(data)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("BP_R1.0.1"));
}

#[test]
fn bad_record_length_rejected_at_every_position() {
    let builder = firmware();
    let (header, descriptors) = builder.layout();

    for bad in 0..descriptors.len() {
        let mut tweaked = descriptors.clone();
        tweaked[bad].length = 2584;
        let data = builder.build_from(&header, &tweaked);

        let err = PacFile::from_reader(Cursor::new(&data)).unwrap_err();
        match err {
            PacError::PartitionRecordLength { index, length } => {
                assert_eq!(index, bad);
                assert_eq!(length, 2584);
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut cursor = Cursor::new(&data);
        let lenient = spdpac_formats::PartitionTable::decode(
            &mut cursor,
            u64::from(header.partition_table_offset),
            header.partition_count,
            DecodeMode::Lenient,
        )
        .unwrap();
        assert_eq!(lenient.descriptors.len(), descriptors.len() - 1);
    }
}

#[test]
fn zero_size_partition_produces_no_file() {
    let tmp = TempDir::new().unwrap();
    let data = ContainerBuilder::new()
        .partition("FLASH", "flash.bin", Vec::new())
        .partition("NV", "nv.bin", vec![7; 10])
        .build();

    let mut pac = PacFile::from_reader(Cursor::new(data)).unwrap();
    let report = pac
        .extract_all(tmp.path(), &ExtractOptions::default(), |_| {})
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.skipped, vec!["FLASH".to_string()]);
    assert!(!tmp.path().join("flash.bin").exists());
    assert!(tmp.path().join("nv.bin").exists());
}

#[test]
fn extracted_payload_matches_source_range() {
    let tmp = TempDir::new().unwrap();
    let payload = random_bytes(10_000, 0x5eed);
    let builder = ContainerBuilder::new()
        .payload_gap(777)
        .partition("system", "system.img", payload.clone());
    let data = builder.build();
    let path = write_container(tmp.path(), &data);

    let mut pac = PacFile::open(&path).unwrap();
    let offset = pac.partitions()[0].offset as usize;
    assert_eq!(&data[offset..offset + 10_000], payload.as_slice());

    let out = tmp.path().join("extracted");
    pac.extract_all(&out, &ExtractOptions::default(), |_| {})
        .unwrap();

    let written = fs::read(out.join("system.img")).unwrap();
    assert_eq!(written.len(), 10_000);
    assert_eq!(written, payload);
}

#[test]
fn checksum_detection_is_opt_in() {
    let tmp = TempDir::new().unwrap();
    let mut data = firmware().build();
    // A byte inside the boot payload
    let index = data.len() - 5;
    data[index] = data[index].wrapping_add(1);

    let mut pac = PacFile::from_reader(Cursor::new(data.clone())).unwrap();
    let err = pac.verify_checksums().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Checksum);
    assert!(matches!(
        err,
        PacError::ChecksumMismatch {
            region: ChecksumRegion::Body,
            ..
        }
    ));

    // Without verification the same container extracts fine
    let mut pac = PacFile::from_reader(Cursor::new(data)).unwrap();
    let report = pac
        .extract_all(tmp.path(), &ExtractOptions::default(), |_| {})
        .unwrap();
    assert_eq!(report.extracted.len(), 4);
}

#[test]
fn checksum_detects_table_mutation() {
    let builder = firmware();
    let mut data = builder.build();
    // Reserved words of the first descriptor are not interpreted
    let at = HEADER_SIZE + PARTITION_DESCRIPTOR_SIZE - 8;
    data[at] ^= 0x80;

    let mut pac = PacFile::from_reader(Cursor::new(data)).unwrap();
    assert!(matches!(
        pac.verify_checksums(),
        Err(PacError::ChecksumMismatch {
            region: ChecksumRegion::Body,
            ..
        })
    ));
}

#[test]
fn progress_is_monotonic_and_completes() {
    let tmp = TempDir::new().unwrap();
    let data = ContainerBuilder::new()
        .partition("a", "a.bin", random_bytes(12_345, 9))
        .partition("b", "b.bin", random_bytes(1, 10))
        .partition("c", "c.bin", random_bytes(4096 * 3, 11))
        .build();

    let mut events: Vec<(usize, u8, u64)> = Vec::new();
    let mut pac = PacFile::from_reader(Cursor::new(data)).unwrap();
    let options = ExtractOptions {
        chunk_size: 1000,
        ..ExtractOptions::default()
    };
    pac.extract_all(tmp.path(), &options, |p| {
        events.push((p.index, p.percent, p.copied));
    })
    .unwrap();

    for index in 0..3 {
        let percents: Vec<u8> = events
            .iter()
            .filter(|(i, _, _)| *i == index)
            .map(|(_, p, _)| *p)
            .collect();
        assert!(!percents.is_empty());
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));
    }
}

#[test]
fn continue_policy_reports_every_failure() {
    let tmp = TempDir::new().unwrap();
    let builder = ContainerBuilder::new()
        .partition("one", "one.bin", vec![1; 100])
        .partition("two", "two.bin", vec![2; 100])
        .partition("three", "three.bin", vec![3; 100]);
    let (header, mut descriptors) = builder.layout();
    descriptors[0].file_name = Utf16Field::from_text("../one.bin");
    descriptors[2].file_name = Utf16Field::from_text("sub/three.bin");
    let data = builder.build_from(&header, &descriptors);

    let mut pac = PacFile::from_reader(Cursor::new(data)).unwrap();
    let options = ExtractOptions {
        policy: FailurePolicy::Continue,
        ..ExtractOptions::default()
    };
    let report = pac.extract_all(tmp.path(), &options, |_| {}).unwrap();

    assert_eq!(report.extracted.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(
        report
            .failures
            .iter()
            .all(|f| f.error.kind() == ErrorKind::Path)
    );
    assert_eq!(fs::read(tmp.path().join("two.bin")).unwrap(), vec![2; 100]);
}

#[test]
fn output_directory_collision_is_path_error() {
    let tmp = TempDir::new().unwrap();
    let occupied = tmp.path().join("out");
    fs::write(&occupied, b"not a directory").unwrap();

    let mut pac = PacFile::from_reader(Cursor::new(firmware().build())).unwrap();
    let err = pac
        .extract_all(&occupied, &ExtractOptions::default(), |_| {})
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Path);
}

#[test]
fn standalone_table_decoder_matches_layout() {
    let builder = firmware().table_gap(10);
    let (header, descriptors) = builder.layout();
    let data = builder.build_from(&header, &descriptors);

    let mut cursor = Cursor::new(&data);
    let decoded = decode_partition_table(
        &mut cursor,
        u64::from(header.partition_table_offset),
        header.partition_count,
    )
    .unwrap();
    assert_eq!(decoded, descriptors);

    let header_back = PacHeader::decode(&mut cursor).unwrap();
    assert_eq!(header_back.partition_count, 5);
    assert!(decoded.iter().all(PartitionDescriptor::has_valid_length));
}
