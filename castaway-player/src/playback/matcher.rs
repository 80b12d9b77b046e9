//! Active-track to catalog episode lookup

use castaway_common::Episode;

/// Find the episode whose id equals the engine's active media id
///
/// Returns `None` for an empty catalog, an empty id, or an unmatched id.
pub fn match_episode<'a>(episodes: &'a [Episode], track_id: &str) -> Option<&'a Episode> {
    if track_id.is_empty() {
        return None;
    }
    episodes.iter().find(|episode| episode.id == track_id)
}
