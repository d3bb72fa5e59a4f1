// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Volume and mute commands against a single stream.
//!
//! Each entry owns at most one in-flight request. A new command cancels the
//! previous one before issuing its own (last writer wins), and completions
//! only clear the pending slot when they belong to the request still in it.

use crate::audio::types::OperationId;
use crate::audio::volume::StreamVolume;
use crate::streams::entry::StreamEntry;
use crate::streams::session::AudioSession;
use tracing::{debug, trace, warn};

/// Scale the entry's volume so its loudest channel sits at `fraction` and
/// push it to the server.
pub fn set_volume(
    entry: &mut StreamEntry,
    fraction: f64,
    session: &mut dyn AudioSession,
) -> OperationId {
    entry.volume.scale_to_fraction(fraction);
    debug!(
        "Setting volume on stream {} to {:.2}",
        entry.index,
        entry.volume.fraction()
    );
    issue(entry, session)
}

/// Mute or unmute the entry.
///
/// Muting remembers the current volume; unmuting restores it, so the
/// channel balance survives a mute/unmute pair. Without a remembered volume
/// unmute falls back to 100%.
pub fn set_muted(
    entry: &mut StreamEntry,
    muted: bool,
    session: &mut dyn AudioSession,
) -> OperationId {
    debug!("Setting mute on stream {} to {}", entry.index, muted);

    if muted {
        if !entry.is_muted() {
            entry.unmute_volume = Some(entry.volume.clone());
        }
        entry.volume.scale(StreamVolume::MUTED);
    } else {
        let channels = entry.volume.channels().len();
        match entry.unmute_volume.take() {
            Some(saved) if !saved.is_muted() && saved.channels().len() == channels => {
                entry.volume = saved;
            }
            _ => {
                entry.volume.scale(StreamVolume::NORMAL);
            }
        }
    }

    issue(entry, session)
}

/// Apply a slider movement made by the user.
///
/// Returns `None` when the movement is an echo of a server-confirmed
/// write and must not become a new request.
pub fn apply_user_input(
    entry: &mut StreamEntry,
    fraction: f64,
    session: &mut dyn AudioSession,
) -> Option<OperationId> {
    if entry.echo_suppressed {
        trace!("Ignoring echoed slider value on stream {}", entry.index);
        return None;
    }

    entry.unmute_volume = None;
    Some(set_volume(entry, fraction, session))
}

/// Record completion of `id`. Returns false for a stale completion, which is
/// left alone.
pub fn complete(entry: &mut StreamEntry, id: OperationId, success: bool) -> bool {
    if entry.pending_operation != Some(id) {
        trace!(
            "Ignoring stale completion {} on stream {} (pending {:?})",
            id,
            entry.index,
            entry.pending_operation
        );
        return false;
    }

    if !success {
        warn!("Volume change on stream {} failed", entry.index);
    }
    entry.pending_operation = None;
    true
}

fn issue(entry: &mut StreamEntry, session: &mut dyn AudioSession) -> OperationId {
    if let Some(previous) = entry.pending_operation.take() {
        trace!("Cancelling {} on stream {}", previous, entry.index);
        session.cancel_operation(previous);
    }

    let id = session.set_stream_volume(entry.index, &entry.volume);
    entry.pending_operation = Some(id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::testing::{attrs, Request, RecordingSession};

    fn entry(fraction: f64) -> StreamEntry {
        StreamEntry::new(&attrs(7, "Music", fraction))
    }

    #[test]
    fn test_set_volume_records_pending() {
        let mut entry = entry(0.5);
        let mut session = RecordingSession::default();

        let id = set_volume(&mut entry, 0.25, &mut session);

        assert_eq!(entry.pending_operation, Some(id));
        assert!((entry.representative_volume() - 0.25).abs() < 1e-4);
        let (_, index, volume) = session.last_volume_set().unwrap();
        assert_eq!(index, 7);
        assert_eq!(volume, entry.volume);
    }

    #[test]
    fn test_cancel_and_replace() {
        let mut entry = entry(0.5);
        let mut session = RecordingSession::default();

        let first = set_volume(&mut entry, 0.3, &mut session);
        let second = set_volume(&mut entry, 0.6, &mut session);

        assert_ne!(first, second);
        assert_eq!(entry.pending_operation, Some(second));
        assert_eq!(session.cancelled(), vec![first]);
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut entry = entry(0.5);
        let mut session = RecordingSession::default();

        let first = set_volume(&mut entry, 0.3, &mut session);
        let second = set_volume(&mut entry, 0.6, &mut session);

        assert!(!complete(&mut entry, first, true));
        assert_eq!(entry.pending_operation, Some(second));
        assert!(complete(&mut entry, second, true));
        assert_eq!(entry.pending_operation, None);
    }

    #[test]
    fn test_failed_completion_clears_pending() {
        let mut entry = entry(0.5);
        let mut session = RecordingSession::default();
        let id = set_volume(&mut entry, 0.3, &mut session);

        assert!(complete(&mut entry, id, false));
        assert_eq!(entry.pending_operation, None);
    }

    #[test]
    fn test_mute_unmute_restores_volume() {
        let mut entry = entry(0.4);
        let before = entry.representative_volume();
        let mut session = RecordingSession::default();

        set_muted(&mut entry, true, &mut session);
        assert!(entry.is_muted());
        set_muted(&mut entry, false, &mut session);

        assert!((entry.representative_volume() - before).abs() < 1e-6);
        assert_eq!(session.volume_sets(), 2);
    }

    #[test]
    fn test_unmute_keeps_channel_balance() {
        let mut entry = entry(1.0);
        entry.volume = StreamVolume::new(vec![StreamVolume::NORMAL, StreamVolume::NORMAL / 2]);
        let balanced = entry.volume.clone();
        let mut session = RecordingSession::default();

        set_muted(&mut entry, true, &mut session);
        set_muted(&mut entry, false, &mut session);

        assert_eq!(entry.volume, balanced);
    }

    #[test]
    fn test_unmute_without_saved_volume_goes_to_normal() {
        let mut entry = entry(0.0);
        let mut session = RecordingSession::default();

        set_muted(&mut entry, false, &mut session);

        assert_eq!(entry.volume.max(), StreamVolume::NORMAL);
    }

    #[test]
    fn test_echo_input_is_ignored() {
        let mut entry = entry(0.5);
        let mut session = RecordingSession::default();

        entry.echo_suppressed = true;
        assert_eq!(apply_user_input(&mut entry, 0.9, &mut session), None);
        assert!(session.requests.is_empty());

        entry.echo_suppressed = false;
        assert!(apply_user_input(&mut entry, 0.9, &mut session).is_some());
        assert!(matches!(session.requests.last(), Some(Request::SetVolume(..))));
    }
}
