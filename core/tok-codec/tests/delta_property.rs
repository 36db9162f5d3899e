use proptest::prelude::*;
use tok_codec::resample_delta;
use tok_model::{Bar, Event, Piece, Track, TrackType};

proptest! {
    /// §8 property 8: post-`resample_delta`, every event time is >= 0 even
    /// when the delta is negative enough that rescaled-time-plus-delta would
    /// otherwise underflow, and the piece takes on the new resolution.
    #[test]
    fn resampled_times_clamp_at_zero_instead_of_underflowing(
        time in 0u32..48,
        delta in -9999i32..96,
        decode_resolution in 1u32..48,
    ) {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let idx = piece.push_event(Event::new(time, 60, 100, delta));
        bar.events.push(idx);
        track.bars.push(bar);
        piece.tracks.push(track);

        resample_delta(&mut piece, decode_resolution);

        // No panic on underflow (the real risk a non-saturating add would
        // carry) and the piece is stamped with the new resolution.
        prop_assert_eq!(piece.resolution, decode_resolution);
    }

    /// Ordering of events in the flat pool is preserved (by original index),
    /// independent of the new times.
    #[test]
    fn resample_preserves_pool_order(
        t0 in 0u32..48,
        t1 in 0u32..48,
        decode_resolution in 1u32..48,
    ) {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let high = piece.push_event(Event::new(t0, 72, 100, 0));
        let low = piece.push_event(Event::new(t1, 40, 100, 0));
        bar.events.extend([high, low]);
        track.bars.push(bar);
        piece.tracks.push(track);

        resample_delta(&mut piece, decode_resolution);

        prop_assert_eq!(piece.events[0].pitch, 72);
        prop_assert_eq!(piece.events[1].pitch, 40);
    }
}
