use std::collections::BTreeSet;

use proptest::prelude::*;
use tok_codec::{decode, encode_piece};
use tok_model::{Bar, Event, Piece, Track, TrackType};
use tok_vocab::build_default_representation;

proptest! {
    /// §8 property 2 (single-note case): a non-drum track's one onset/offset
    /// pair round-trips with the same pitch, onset time, and duration.
    #[test]
    fn single_note_round_trips(pitch in 0u8..128, onset_time in 0u32..48, duration in 1u32..48) {
        let rep = build_default_representation().expect("default representation builds");
        let offset_time = onset_time + duration;
        prop_assume!(offset_time <= 48);

        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event { internal_duration: duration, ..Event::new(onset_time, pitch, 100, 0) });
        let offset = piece.push_event(Event::new(offset_time, pitch, 0, 0));
        bar.events.extend([onset, offset]);
        track.bars.push(bar);
        piece.tracks.push(track);

        let seq = encode_piece(&piece, &rep, &BTreeSet::new()).expect("encodes");
        let decoded = decode(&seq, &rep, 12, 120.0).expect("decodes");

        let events: Vec<_> = decoded.tracks[0].bars[0].events.iter().map(|&i| decoded.events[i]).collect();
        prop_assert_eq!(events.len(), 2);
        prop_assert_eq!(events[0].time, onset_time);
        prop_assert_eq!(events[0].pitch, pitch);
        prop_assert_eq!(events[1].time, offset_time);
        prop_assert_eq!(events[1].pitch, pitch);
    }

    /// §8 property 2, drum case: a drum onset with no explicit duration
    /// synthesizes its offset at `time + 1` regardless of onset time.
    #[test]
    fn drum_onset_round_trips_with_synthesized_offset(pitch in 0u8..128, onset_time in 0u32..47) {
        let rep = build_default_representation().expect("default representation builds");

        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::StandardDrum, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event { internal_duration: 1, ..Event::new(onset_time, pitch, 100, 0) });
        bar.events.push(onset);
        track.bars.push(bar);
        piece.tracks.push(track);

        let seq = encode_piece(&piece, &rep, &BTreeSet::new()).expect("encodes");
        let decoded = decode(&seq, &rep, 12, 120.0).expect("decodes");

        let events: Vec<_> = decoded.tracks[0].bars[0].events.iter().map(|&i| decoded.events[i]).collect();
        prop_assert_eq!(events.len(), 2);
        prop_assert_eq!(events[0].time, onset_time);
        prop_assert_eq!(events[1].time, onset_time + 1);
        prop_assert_eq!(events[1].velocity, 0);
    }
}
