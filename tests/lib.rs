use std::io::Cursor;

use matroska_reader::vint::{encode_unknown_size, encode_vint_minimal};
use matroska_reader::{
    DemuxError, ElementId, MatroskaReader, OpenOptions, Packet, PacketFlags, SeekMode,
    SimpleTagValue, TrackType, Unseekable,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn id_bytes(id: u32) -> Vec<u8> {
    id.to_be_bytes().into_iter().skip_while(|&b| b == 0).collect()
}

fn element(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = id_bytes(id);
    out.extend(encode_vint_minimal(payload.len() as u64).unwrap());
    out.extend_from_slice(payload);
    out
}

fn unknown_size_element(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = id_bytes(id);
    out.extend(encode_unknown_size(8).unwrap());
    out.extend_from_slice(payload);
    out
}

fn uint(id: u32, value: u64) -> Vec<u8> {
    let bytes: Vec<u8> = value
        .to_be_bytes()
        .into_iter()
        .skip_while(|&b| b == 0)
        .collect();
    if bytes.is_empty() {
        element(id, &[0])
    } else {
        element(id, &bytes)
    }
}

/// Always 8 bytes long, so positions can be patched in without changing sizes.
fn fixed_uint(id: u32, value: u64) -> Vec<u8> {
    element(id, &value.to_be_bytes())
}

fn sint(id: u32, value: i64) -> Vec<u8> {
    element(id, &value.to_be_bytes())
}

fn float(id: u32, value: f64) -> Vec<u8> {
    element(id, &value.to_be_bytes())
}

fn string(id: u32, value: &str) -> Vec<u8> {
    element(id, value.as_bytes())
}

fn ebml_header(doc_type: &str) -> Vec<u8> {
    element(
        0x1A45DFA3,
        &[
            uint(0x4286, 1),
            uint(0x42F7, 1),
            uint(0x42F2, 4),
            uint(0x42F3, 8),
            string(0x4282, doc_type),
            uint(0x4287, 4),
            uint(0x4285, 2),
        ]
        .concat(),
    )
}

fn info(timestamp_scale: u64) -> Vec<u8> {
    element(0x1549A966, &uint(0x2AD7B1, timestamp_scale))
}

fn video_track(number: u64) -> Vec<u8> {
    element(
        0xAE,
        &[
            uint(0xD7, number),
            uint(0x73C5, number),
            uint(0x83, 1),
            string(0x86, "V_TEST"),
        ]
        .concat(),
    )
}

fn tracks(entries: &[Vec<u8>]) -> Vec<u8> {
    element(0x1654AE6B, &entries.concat())
}

fn block_payload(track: u8, relative_timestamp: i16, flags: u8, data: &[u8]) -> Vec<u8> {
    let mut payload = vec![0x80 | track];
    payload.extend(relative_timestamp.to_be_bytes());
    payload.push(flags);
    payload.extend_from_slice(data);
    payload
}

fn simple_block(track: u8, relative_timestamp: i16, flags: u8, data: &[u8]) -> Vec<u8> {
    element(0xA3, &block_payload(track, relative_timestamp, flags, data))
}

fn cluster(timestamp: u64, blocks: &[Vec<u8>]) -> Vec<u8> {
    element(0x1F43B675, &[uint(0xE7, timestamp), blocks.concat()].concat())
}

fn cues(points: &[(u64, u64)]) -> Vec<u8> {
    let points: Vec<Vec<u8>> = points
        .iter()
        .map(|&(time, position)| {
            element(
                0xBB,
                &[
                    uint(0xB3, time),
                    element(0xB7, &[uint(0xF7, 1), fixed_uint(0xF1, position)].concat()),
                ]
                .concat(),
            )
        })
        .collect();
    element(0x1C53BB6B, &points.concat())
}

fn matroska_file(children: &[Vec<u8>]) -> Vec<u8> {
    [ebml_header("matroska"), element(0x18538067, &children.concat())].concat()
}

fn open(bytes: Vec<u8>) -> MatroskaReader<Cursor<Vec<u8>>> {
    init();
    MatroskaReader::open(Cursor::new(bytes)).unwrap()
}

fn next<R: std::io::Read + std::io::Seek>(reader: &mut MatroskaReader<R>) -> Packet {
    reader.read_packet().unwrap().unwrap()
}

fn find(haystack: &[u8], needle: &[u8]) -> u64 {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
        .unwrap() as u64
}

fn single_block_file() -> Vec<u8> {
    matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(0, &[simple_block(1, 0, 0x80, b"frame")]),
    ])
}

/// Three clusters at 1000, 2000 and 3000 ns with a cue for each of them.
fn indexed_file() -> Vec<u8> {
    let head = [info(1), tracks(&[video_track(1)])].concat();
    let clusters: Vec<Vec<u8>> = [1000, 2000, 3000]
        .into_iter()
        .map(|timestamp| cluster(timestamp, &[simple_block(1, 0, 0x80, b"x")]))
        .collect();

    let cues_len = cues(&[(1000, 0), (2000, 0), (3000, 0)]).len();
    let mut offset = (head.len() + cues_len) as u64;
    let mut points = Vec::new();
    for (cluster, time) in clusters.iter().zip([1000, 2000, 3000]) {
        points.push((time, offset));
        offset += cluster.len() as u64;
    }

    matroska_file(&[head, cues(&points), clusters.concat()])
}

#[test]
pub fn read_single_simple_block() {
    let bytes = single_block_file();
    let block_position = find(&bytes, &simple_block(1, 0, 0x80, b"frame"));
    let mut reader = open(bytes);

    assert_eq!(reader.ebml_header().doc_type(), "matroska");
    assert_eq!(reader.file_info().timestamp_scale(), 1_000_000);
    assert_eq!(reader.num_tracks(), 1);
    assert_eq!(reader.track(0).unwrap().codec_id(), "V_TEST");
    assert_eq!(reader.track(0).unwrap().track_type(), TrackType::Video);
    assert!(reader.track(1).is_none());

    let packet = next(&mut reader);
    assert_eq!(packet.track, 1);
    assert_eq!(packet.start_ns, 0);
    assert_eq!(packet.end_ns, 0);
    assert_eq!(packet.flags, PacketFlags::KEYFRAME);
    assert_eq!(packet.data, b"frame");
    assert_eq!(packet.reference_block, None);
    assert_eq!(packet.file_position, block_position);

    assert!(reader.read_packet().unwrap().is_none());
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn track_mask_filters_packets() {
    let mut reader = open(single_block_file());
    reader.set_track_mask(0b1);
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn track_mask_filters_buffered_frames() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(0, &[simple_block(1, 0, 0x86, &[0x01, 0x01, b'A', b'B'])]),
    ]);
    let mut reader = open(bytes);

    assert_eq!(next(&mut reader).data, b"A");
    reader.set_track_mask(0b1);
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn clusters_set_absolute_time() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(0, &[simple_block(1, 0, 0x80, b"a")]),
        cluster(5, &[simple_block(1, 0, 0x80, b"b"), simple_block(1, -2, 0x00, b"c")]),
    ]);
    let mut reader = open(bytes);

    assert_eq!(next(&mut reader).start_ns, 0);
    assert_eq!(next(&mut reader).start_ns, 5_000_000);
    let packet = next(&mut reader);
    assert_eq!(packet.start_ns, 3_000_000);
    assert!(!packet.is_keyframe());
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn block_group_with_duration() {
    let group = element(
        0xA0,
        &[element(0xA1, &block_payload(1, 0, 0x00, b"D")), uint(0x9B, 4)].concat(),
    );
    let bytes = matroska_file(&[info(1_000_000), tracks(&[video_track(1)]), cluster(0, &[group])]);
    let mut reader = open(bytes);

    let packet = next(&mut reader);
    assert_eq!(packet.start_ns, 0);
    assert_eq!(packet.end_ns, 4_000_000);
    assert!(packet.is_keyframe());
    assert_eq!(packet.data, b"D");
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn block_group_with_reference_and_padding() {
    let group = element(
        0xA0,
        &[
            element(0xA1, &block_payload(1, 1, 0x80, b"P")),
            sint(0xFB, -1),
            sint(0x75A2, 2_500),
        ]
        .concat(),
    );
    let bytes = matroska_file(&[info(1_000_000), tracks(&[video_track(1)]), cluster(0, &[group])]);
    let mut reader = open(bytes);

    let packet = next(&mut reader);
    assert_eq!(packet.start_ns, 1_000_000);
    assert_eq!(packet.end_ns, 1_000_000);
    assert!(!packet.is_keyframe());
    assert_eq!(packet.reference_block, Some(-1));
    assert_eq!(packet.discard_padding, Some(2_500));
}

#[test]
pub fn laced_block_group_splits_duration() {
    let group = element(
        0xA0,
        &[
            element(0xA1, &block_payload(1, 0, 0x06, &[0x01, 0x01, b'A', b'B'])),
            uint(0x9B, 4),
        ]
        .concat(),
    );
    let bytes = matroska_file(&[info(1_000_000), tracks(&[video_track(1)]), cluster(0, &[group])]);
    let mut reader = open(bytes);

    let first = next(&mut reader);
    let second = next(&mut reader);
    assert_eq!((first.start_ns, first.end_ns), (0, 2_000_000));
    assert_eq!((second.start_ns, second.end_ns), (0, 4_000_000));
}

#[test]
pub fn xiph_laced_simple_block() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(0, &[simple_block(1, 0, 0x86, &[0x01, 0x01, b'A', b'B'])]),
    ]);
    let mut reader = open(bytes);

    let first = next(&mut reader);
    assert_eq!(reader.lowest_queued_timestamp(), Some(0));
    let second = next(&mut reader);
    assert_eq!(reader.lowest_queued_timestamp(), None);

    assert_eq!(first.data, b"A");
    assert_eq!(second.data, b"B");
    assert_eq!(first.start_ns, second.start_ns);
    assert!(first.is_keyframe());
    assert!(second.is_keyframe());
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn simple_block_flags() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(0, &[simple_block(1, 0, 0x09, b"x"), simple_block(1, 0, 0x80, b"")]),
    ]);
    let mut reader = open(bytes);

    assert_eq!(
        next(&mut reader).flags,
        PacketFlags::INVISIBLE | PacketFlags::DISCARDABLE
    );
    assert_eq!(
        next(&mut reader).flags,
        PacketFlags::KEYFRAME | PacketFlags::GAP
    );
}

#[test]
pub fn unknown_size_segment_ends_at_eof() {
    let bytes = [
        ebml_header("matroska"),
        unknown_size_element(0x18538067, &element(0x1549A966, &string(0x7BA9, "Test"))),
    ]
    .concat();
    let mut reader = open(bytes);

    assert_eq!(reader.file_info().title(), Some("Test"));
    assert_eq!(reader.file_info().timestamp_scale(), 1_000_000);
    assert_eq!(reader.segment_end(), None);
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn unknown_size_clusters() {
    let bytes = [
        ebml_header("webm"),
        unknown_size_element(
            0x18538067,
            &[
                info(1_000_000),
                tracks(&[video_track(1)]),
                unknown_size_element(
                    0x1F43B675,
                    &[uint(0xE7, 0), simple_block(1, 0, 0x80, b"a")].concat(),
                ),
                cluster(10, &[element(0xEC, &[0; 3]), simple_block(1, 0, 0x80, b"b")]),
            ]
            .concat(),
        ),
    ]
    .concat();
    let mut reader = open(bytes);

    assert_eq!(reader.ebml_header().doc_type(), "webm");
    let first = next(&mut reader);
    let second = next(&mut reader);
    assert_eq!((first.data.as_slice(), first.start_ns), (&b"a"[..], 0));
    assert_eq!((second.data.as_slice(), second.start_ns), (&b"b"[..], 10_000_000));
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn segment_level_timestamp_and_block() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        uint(0xE7, 7),
        simple_block(1, 0, 0x80, b"s"),
    ]);
    let mut reader = open(bytes);

    assert_eq!(next(&mut reader).start_ns, 7_000_000);
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn clusters_reset_the_timestamp() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        uint(0xE7, 7),
        element(0x1F43B675, &simple_block(1, 0, 0x80, b"a")),
        cluster(5, &[simple_block(1, 0, 0x80, b"b")]),
        element(0x1F43B675, &simple_block(1, 2, 0x80, b"c")),
    ]);
    let mut reader = open(bytes);

    let starts: Vec<i64> = std::iter::from_fn(|| reader.read_packet().unwrap())
        .map(|packet| packet.start_ns)
        .collect();
    assert_eq!(starts, vec![0, 5_000_000, 2_000_000]);
}

#[test]
pub fn reading_to_the_end_consumes_every_byte() {
    let bytes = matroska_file(&[
        element(0xEC, &[0; 16]),
        info(1_000_000),
        element(0x7FFE, b"unknown"),
        tracks(&[video_track(1)]),
        cluster(0, &[element(0xEC, &[0; 2]), simple_block(1, 0, 0x80, b"a")]),
        element(0xEC, &vec![0; 70_000]),
        cluster(10, &[element(0x7FFE, &[1, 2, 3]), simple_block(1, 0, 0x80, b"b")]),
        element(0xBF, &[0; 4]),
    ]);
    let len = bytes.len() as u64;

    let mut reader = open(bytes.clone());
    let data: Vec<Vec<u8>> = std::iter::from_fn(|| reader.read_packet().unwrap())
        .map(|packet| packet.data)
        .collect();
    assert_eq!(data, vec![b"a".to_vec(), b"b".to_vec()]);
    assert_eq!(reader.into_inner().position(), len);

    let mut reader = OpenOptions::new()
        .no_seeking(true)
        .open(Unseekable(Cursor::new(bytes)))
        .unwrap();
    while reader.read_packet().unwrap().is_some() {}
    assert_eq!(reader.into_inner().0.position(), len);
}

#[test]
pub fn unknown_size_segment_is_consumed_completely() {
    let bytes = [
        ebml_header("matroska"),
        unknown_size_element(
            0x18538067,
            &[
                info(1_000_000),
                element(0x7FFE, b"unknown"),
                tracks(&[video_track(1)]),
                unknown_size_element(
                    0x1F43B675,
                    &[uint(0xE7, 0), simple_block(1, 0, 0x80, b"a")].concat(),
                ),
                cluster(10, &[simple_block(1, 0, 0x80, b"b")]),
                element(0xEC, &[0; 8]),
            ]
            .concat(),
        ),
    ]
    .concat();
    let len = bytes.len() as u64;
    let mut reader = open(bytes);

    let mut count = 0;
    while reader.read_packet().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
    assert_eq!(reader.into_inner().position(), len);
}

#[test]
pub fn unknown_elements_are_skipped() {
    let bytes = matroska_file(&[
        element(0x7FFE, b"unknown"),
        element(0xEC, &[0; 4]),
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(0, &[element(0x7FFE, &[1, 2, 3]), simple_block(1, 0, 0x80, b"frame")]),
    ]);
    let mut reader = open(bytes);

    assert_eq!(next(&mut reader).data, b"frame");
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn ebml_header_values() {
    let reader = open(single_block_file());
    let header = reader.ebml_header();

    assert_eq!(header.version(), Some(1));
    assert_eq!(header.read_version(), Some(1));
    assert_eq!(header.max_id_length(), 4);
    assert_eq!(header.max_size_length(), 8);
    assert_eq!(header.doc_type_version(), 4);
    assert_eq!(header.doc_type_read_version(), 2);
}

#[test]
pub fn track_defaults_and_audio() {
    let audio = element(
        0xAE,
        &[
            uint(0xD7, 2),
            uint(0x83, 2),
            string(0x86, "A_OPUS"),
            string(0x22B59C, "ger"),
            uint(0x56AA, 6_500_000),
            element(0xE1, &[float(0xB5, 48_000.0), uint(0x9F, 2)].concat()),
        ]
        .concat(),
    );
    let nameless = element(0xAE, &string(0x86, "S_TEXT/UTF8"));
    let video = element(
        0xAE,
        &[
            uint(0xD7, 1),
            uint(0x83, 1),
            element(0xE0, &[uint(0xB0, 1920), uint(0xBA, 1080)].concat()),
        ]
        .concat(),
    );
    let bytes = matroska_file(&[info(1_000_000), tracks(&[video, nameless, audio])]);
    let reader = open(bytes);

    assert_eq!(reader.num_tracks(), 2);

    let video = reader.track(0).unwrap();
    assert_eq!(video.language(), "und");
    assert!(video.flag_enabled());
    assert!(video.flag_default());
    assert!(video.flag_lacing());
    let settings = video.video().unwrap();
    assert_eq!(settings.display_width(), 1920);
    assert_eq!(settings.display_height(), 1080);

    let audio = reader.track(1).unwrap();
    assert_eq!(audio.track_type(), TrackType::Audio);
    assert_eq!(audio.language(), "ger");
    assert_eq!(audio.codec_delay(), 6_500_000);
    let settings = audio.audio().unwrap();
    assert_eq!(settings.sampling_frequency(), 48_000.0);
    assert_eq!(settings.output_sampling_frequency(), 48_000.0);
    assert_eq!(settings.channels(), 2);
}

#[test]
pub fn chapters_tags_and_attachments() {
    let chapters = element(
        0x1043A770,
        &element(
            0x45B9,
            &[
                uint(0x45BC, 9),
                element(
                    0xB6,
                    &[
                        uint(0x73C4, 1),
                        uint(0x91, 0),
                        uint(0x92, 1_000_000_000),
                        element(0x8F, &uint(0x89, 1)),
                        element(0x80, &[string(0x85, "Intro"), string(0x437E, "de")].concat()),
                    ]
                    .concat(),
                ),
            ]
            .concat(),
        ),
    );
    let tags = element(
        0x1254C367,
        &element(
            0x7373,
            &[
                element(0x63C0, &[uint(0x68CA, 30), uint(0x63C5, 1)].concat()),
                element(
                    0x67C8,
                    &[
                        string(0x45A3, "TITLE"),
                        string(0x4487, "Hello"),
                        element(0x67C8, &[string(0x45A3, "SORT_WITH"), string(0x4487, "H")].concat()),
                    ]
                    .concat(),
                ),
                element(0x67C8, &[string(0x45A3, "COVER"), element(0x4485, &[1, 2])].concat()),
            ]
            .concat(),
        ),
    );
    let attachments = element(
        0x1941A469,
        &element(
            0x61A7,
            &[
                string(0x466E, "cover.jpg"),
                string(0x4660, "image/jpeg"),
                element(0x465C, b"JPEGDATA"),
                uint(0x46AE, 42),
            ]
            .concat(),
        ),
    );
    let bytes = matroska_file(&[info(1_000_000), chapters, tags, attachments]);
    let data_position = find(&bytes, b"JPEGDATA");
    let reader = open(bytes);

    let edition = &reader.chapters()[0];
    assert_eq!(edition.uid(), Some(9));
    assert!(!edition.flag_hidden());
    let chapter = &edition.chapter_atoms()[0];
    assert_eq!(chapter.uid(), 1);
    assert_eq!(chapter.time_start(), 0);
    assert_eq!(chapter.time_end(), Some(1_000_000_000));
    assert_eq!(chapter.tracks(), &[1]);
    assert!(chapter.flag_enabled());
    assert_eq!(chapter.displays()[0].string(), "Intro");
    assert_eq!(chapter.displays()[0].language(), "eng");
    assert_eq!(chapter.displays()[0].country(), "de");

    let tag = &reader.tags()[0];
    assert_eq!(tag.targets().target_type_value(), 30);
    assert_eq!(tag.targets().track_uids(), &[1]);
    let title = &tag.simple_tags()[0];
    assert_eq!(title.name(), "TITLE");
    assert_eq!(title.string(), Some("Hello"));
    assert_eq!(title.children()[0].name(), "SORT_WITH");
    assert_eq!(
        tag.simple_tags()[1].value(),
        Some(&SimpleTagValue::Binary(vec![1, 2]))
    );

    let attachment = &reader.attachments()[0];
    assert_eq!(attachment.name(), "cover.jpg");
    assert_eq!(attachment.mime_type(), "image/jpeg");
    assert_eq!(attachment.uid(), 42);
    assert_eq!(attachment.data(), b"JPEGDATA");
    assert_eq!(attachment.position(), data_position);
    assert_eq!(attachment.length(), 8);
}

#[test]
pub fn elements_filter() {
    let bytes = matroska_file(&[
        element(0x1549A966, &[uint(0x2AD7B1, 1000), string(0x7BA9, "Skipped")].concat()),
        tracks(&[video_track(1)]),
        cluster(2, &[simple_block(1, 0, 0x80, b"x")]),
    ]);
    init();
    let mut reader = OpenOptions::new()
        .elements(&[ElementId::Tracks])
        .open(Cursor::new(bytes))
        .unwrap();

    assert_eq!(reader.file_info().title(), None);
    assert_eq!(reader.num_tracks(), 1);
    assert_eq!(next(&mut reader).start_ns, 2_000_000);
}

#[test]
pub fn seek_with_cues() {
    let mut reader = open(indexed_file());

    let times: Vec<u64> = reader.cues().iter().map(|cue| cue.time()).collect();
    assert_eq!(times, vec![1000, 2000, 3000]);
    assert_eq!(
        reader.first_cluster_position(),
        Some(reader.segment_payload_start() + reader.cues()[0].cluster_position())
    );
    assert!(reader.cues_position().unwrap() < reader.first_cluster_position().unwrap());

    let mut seek = |target, mode| {
        reader.seek(target, mode).unwrap();
        next(&mut reader).start_ns
    };

    assert_eq!(seek(2000, SeekMode::PrevKeyframe), 2000);
    assert_eq!(seek(2500, SeekMode::PrevKeyframe), 2000);
    assert_eq!(seek(5000, SeekMode::PrevKeyframe), 3000);
    assert_eq!(seek(500, SeekMode::PrevKeyframe), 1000);
    assert_eq!(seek(1500, SeekMode::NextKeyframe), 2000);
    assert_eq!(seek(9000, SeekMode::NextKeyframe), 3000);
    assert_eq!(seek(2600, SeekMode::Closest), 3000);
    assert_eq!(seek(1500, SeekMode::Closest), 1000);
}

#[test]
pub fn seek_after_end_of_stream() {
    let mut reader = open(indexed_file());
    while reader.read_packet().unwrap().is_some() {}

    reader.seek(1000, SeekMode::PrevKeyframe).unwrap();
    assert_eq!(next(&mut reader).start_ns, 1000);
    assert_eq!(next(&mut reader).start_ns, 2000);
}

#[test]
pub fn seek_without_cues() {
    let mut reader = open(single_block_file());
    assert!(matches!(
        reader.seek(0, SeekMode::PrevKeyframe),
        Err(DemuxError::NoCues { .. })
    ));
}

#[test]
pub fn no_seeking() {
    init();
    let mut reader = OpenOptions::new()
        .no_seeking(true)
        .open(Unseekable(Cursor::new(indexed_file())))
        .unwrap();

    assert_eq!(reader.cues().len(), 3);
    assert!(matches!(
        reader.seek(2000, SeekMode::PrevKeyframe),
        Err(DemuxError::SeekNotSupported { .. })
    ));

    reader.skip_to_keyframe().unwrap();
    let times: Vec<i64> = std::iter::from_fn(|| reader.read_packet().unwrap())
        .map(|packet| packet.start_ns)
        .collect();
    assert_eq!(times, vec![1000, 2000, 3000]);
}

/// A SeekHead with a single entry. The position is always 8 bytes long.
fn seek_head(id: u32, position: u64) -> Vec<u8> {
    element(
        0x114D9B74,
        &element(
            0x4DBB,
            &[element(0x53AB, &id_bytes(id)), fixed_uint(0x53AC, position)].concat(),
        ),
    )
}

/// A SeekHead in front pointing to Cues behind the only cluster.
fn file_with_trailing_cues() -> Vec<u8> {
    let head = [info(1_000_000), tracks(&[video_track(1)])].concat();
    let cluster = cluster(0, &[simple_block(1, 0, 0x80, b"x")]);

    let cluster_position = (seek_head(0x1C53BB6B, 0).len() + head.len()) as u64;
    let cues_position = cluster_position + cluster.len() as u64;

    matroska_file(&[
        seek_head(0x1C53BB6B, cues_position),
        head,
        cluster,
        cues(&[(0, cluster_position)]),
    ])
}

/// A SeekHead in front pointing to a second SeekHead behind the cluster, which points to the Cues.
fn file_with_trailing_seek_head() -> Vec<u8> {
    let head = [info(1_000_000), tracks(&[video_track(1)])].concat();
    let cluster = cluster(0, &[simple_block(1, 0, 0x80, b"x")]);

    let cluster_position = (seek_head(0x114D9B74, 0).len() + head.len()) as u64;
    let seek_head_position = cluster_position + cluster.len() as u64;
    let cues_position = seek_head_position + seek_head(0x1C53BB6B, 0).len() as u64;

    matroska_file(&[
        seek_head(0x114D9B74, seek_head_position),
        head,
        cluster,
        seek_head(0x1C53BB6B, cues_position),
        cues(&[(0, cluster_position)]),
    ])
}

#[test]
pub fn seek_head_loads_trailing_cues() {
    let mut reader = open(file_with_trailing_cues());

    assert_eq!(reader.seek_head()[0].element_id(), ElementId::Cues);
    assert_eq!(reader.cues().len(), 1);
    assert!(reader.cues_position().unwrap() > reader.first_cluster_position().unwrap());

    assert_eq!(next(&mut reader).data, b"x");
    assert!(reader.read_packet().unwrap().is_none());

    reader.seek(0, SeekMode::PrevKeyframe).unwrap();
    assert_eq!(next(&mut reader).data, b"x");
}

#[test]
pub fn trailing_seek_head_is_followed() {
    let bytes = file_with_trailing_seek_head();
    let len = bytes.len() as u64;
    let mut reader = open(bytes);

    let entries: Vec<ElementId> = reader
        .seek_head()
        .iter()
        .map(|entry| entry.element_id())
        .collect();
    assert_eq!(entries, vec![ElementId::SeekHead, ElementId::Cues]);
    assert_eq!(reader.cues().len(), 1);

    assert_eq!(next(&mut reader).data, b"x");
    assert!(reader.read_packet().unwrap().is_none());
    assert_eq!(reader.seek_head().len(), 2);

    reader.seek(0, SeekMode::PrevKeyframe).unwrap();
    assert_eq!(next(&mut reader).data, b"x");
    assert!(reader.read_packet().unwrap().is_none());
    assert_eq!(reader.into_inner().position(), len);
}

#[test]
pub fn trailing_cues_are_parsed_late_without_seeking() {
    init();
    let mut reader = OpenOptions::new()
        .no_seeking(true)
        .open(Unseekable(Cursor::new(file_with_trailing_cues())))
        .unwrap();

    assert!(reader.cues().is_empty());
    assert_eq!(next(&mut reader).data, b"x");
    assert!(reader.read_packet().unwrap().is_none());
    assert_eq!(reader.cues().len(), 1);
}

#[test]
pub fn skip_to_keyframe() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(
            0,
            &[
                simple_block(1, 0, 0x00, b"a"),
                simple_block(1, 1, 0x00, b"b"),
                simple_block(1, 2, 0x80, b"K"),
                simple_block(1, 3, 0x00, b"c"),
            ],
        ),
    ]);
    let mut reader = open(bytes);

    reader.skip_to_keyframe().unwrap();
    assert_eq!(next(&mut reader).data, b"K");
    assert_eq!(next(&mut reader).data, b"c");
    assert!(reader.read_packet().unwrap().is_none());
}

#[test]
pub fn invalid_ebml_header() {
    init();
    assert!(matches!(
        MatroskaReader::open(Cursor::new(b"not a matroska file".to_vec())),
        Err(DemuxError::InvalidEbmlHeader { .. })
    ));
    assert!(matches!(
        MatroskaReader::open(Cursor::new(Vec::new())),
        Err(DemuxError::InvalidEbmlHeader { .. })
    ));
}

#[test]
pub fn unsupported_doc_type() {
    init();
    let bytes = [ebml_header("avi"), element(0x18538067, &info(1_000_000))].concat();
    match MatroskaReader::open(Cursor::new(bytes)) {
        Err(DemuxError::UnsupportedDocType { doc_type, .. }) => assert_eq!(doc_type, "avi"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
pub fn truncated_segment_fails() {
    let mut bytes = single_block_file();
    bytes.truncate(bytes.len() - 2);
    let mut reader = open(bytes);

    let err = reader.read_packet().unwrap_err();
    assert!(matches!(err, DemuxError::ShortRead { .. }));
    assert_eq!(err.element_id(), Some(0xA3));

    assert!(reader.read_packet().unwrap().is_none());
    assert!(matches!(
        reader.seek(0, SeekMode::PrevKeyframe),
        Err(DemuxError::ReaderFailed { .. })
    ));
}

#[test]
pub fn malformed_block_fails() {
    let bytes = matroska_file(&[
        info(1_000_000),
        tracks(&[video_track(1)]),
        cluster(0, &[element(0xA3, &[0x81, 0x00])]),
    ]);
    let mut reader = open(bytes);

    assert!(matches!(
        reader.read_packet(),
        Err(DemuxError::MalformedBlock { .. })
    ));
    assert!(reader.read_packet().unwrap().is_none());
}
