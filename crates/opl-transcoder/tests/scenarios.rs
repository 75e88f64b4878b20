//! End-to-end transcoder scenarios mirroring the worked examples in the
//! design document's "Testable properties" section.

use opl_transcoder::ims;
use opl_transcoder::transcoder::{transcode, TranscodeOptions};

fn vgm_with_commands(body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; 0x40];
    bytes[0..4].copy_from_slice(b"Vgm ");
    bytes.extend_from_slice(body);
    bytes
}

#[test]
fn minimal_vgm_round_trips_to_an_empty_song() {
    let vgm = vgm_with_commands(&[0x66]);
    let output = transcode(&vgm, &TranscodeOptions::default()).unwrap();

    let ims = ims::read(&output.ims_bytes).unwrap();
    assert_eq!(ims.byte_size, 1);
    assert_eq!(ims.instrument_names.len(), 0);
    assert_eq!(ims.basic_tempo, 120);
    assert_eq!(ims.d_mode, 0);
    assert_eq!(output.bnk_bytes.len(), 20);
}

#[test]
fn single_note_produces_instrument_change_note_on_and_note_off() {
    let vgm = vgm_with_commands(&[
        0x5A, 0xA0, 0x72, // fnum low = 0x72
        0x5A, 0xB0, 0x2E, // key on, block 3, fnum high 2 -> fnum 0x272
        0x61, 0x44, 0xAC, // wait 44100 samples
        0x5A, 0xB0, 0x0E, // key off
        0x66,
    ]);
    let output = transcode(&vgm, &TranscodeOptions::default()).unwrap();
    assert_eq!(output.instrument_count, 1);
    assert_eq!(output.event_count, 3);

    let ims = ims::read(&output.ims_bytes).unwrap();
    let music_data: Vec<u8> = ims.pages.concat();
    let decoded = ims::reader::decode_events(&music_data);
    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[0].status, 0xC0);
    assert_eq!(decoded[0].payload, vec![0]);
    assert_eq!(decoded[1].status, 0x90);
    assert_eq!(decoded[1].payload[1], 127);
    assert_eq!(decoded[1].abs_tick, 0);
    assert_eq!(decoded[2].payload[1], 0);
    // tick = round(44100 * 4 * 120 / 44100) = 480
    assert_eq!(decoded[2].abs_tick, 480);
}

#[test]
fn identical_patch_on_two_channels_dedupes_into_one_instrument() {
    let vgm = vgm_with_commands(&[
        0x5A, 0xB0, 0x20, // channel 0 key on, default patch
        0x5A, 0xB1, 0x20, // channel 1 key on, same default patch
        0x66,
    ]);
    let output = transcode(&vgm, &TranscodeOptions::default()).unwrap();
    assert_eq!(output.instrument_count, 1);

    let ims = ims::read(&output.ims_bytes).unwrap();
    let music_data: Vec<u8> = ims.pages.concat();
    let decoded = ims::reader::decode_events(&music_data);
    let instrument_changes: Vec<_> = decoded.iter().filter(|e| e.status & 0xF0 == 0xC0).collect();
    assert_eq!(instrument_changes.len(), 2);
    assert_eq!(instrument_changes[0].payload, vec![0]);
    assert_eq!(instrument_changes[1].payload, vec![0]);
}

#[test]
fn delta_chunks_at_240_tick_boundaries() {
    assert_eq!(ims::encode_delta(490), vec![0xF8, 0xF8, 0x0A]);
}

#[test]
fn rhythm_write_is_detected_as_percussion_mode() {
    let vgm = vgm_with_commands(&[0x5A, 0xBD, 0x20, 0x66]);
    let output = transcode(&vgm, &TranscodeOptions::default()).unwrap();
    let ims = ims::read(&output.ims_bytes).unwrap();
    assert_eq!(ims.d_mode, 1);
}

#[test]
fn bnk_directory_entries_are_sorted_case_insensitively() {
    let vgm = vgm_with_commands(&[
        0x5A, 0xC0, 0x00, // connection FM on channel 0
        0x5A, 0xB0, 0x20, // note on, default op patch
        0x5A, 0xC1, 0x00,
        0x5A, 0x21, 0xFF, // change channel 1's modulator so it interns a distinct patch
        0x5A, 0xB1, 0x20, // note on channel 1, different patch
        0x66,
    ]);
    let output = transcode(&vgm, &TranscodeOptions::default()).unwrap();
    assert_eq!(output.instrument_count, 2);

    let bnk = opl_transcoder::bnk::read(&output.bnk_bytes).unwrap();
    for pair in bnk.directory.windows(2) {
        assert!(pair[0].name.to_lowercase() <= pair[1].name.to_lowercase());
    }
}
