//! Release name derivation.
//!
//! Produces the filesystem-safe names handed to download-client
//! integrations. TV names always carry a zero-padded `SxxEyy` token; movie
//! names never do.

use crate::metadata::MediaKind;
use crate::search::Synonym;

const TV_SUFFIX: &str = "720p.WEBRip.x264-GRAB";
const MOVIE_SUFFIX: &str = "1080p.WEBRip.x264-GRAB";

/// Replace anything that is not a word character with dots and collapse
/// the result.
fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dot = true;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dot = false;
        } else if !last_dot {
            out.push('.');
            last_dot = true;
        }
    }
    while out.ends_with('.') {
        out.pop();
    }
    out
}

/// Derive a release name.
///
/// A synonym's `filename_override` replaces the title outright; otherwise a
/// matched synonym contributes its `target` as the title.
pub fn release_name(
    title: &str,
    kind: MediaKind,
    series: Option<u32>,
    episode: Option<u32>,
    episode_title: Option<&str>,
    synonym: Option<&Synonym>,
) -> String {
    let effective_title = match synonym {
        Some(s) => s.filename_override.as_deref().unwrap_or(&s.target),
        None => title,
    };

    let mut parts = vec![sanitize(effective_title)];

    match kind {
        MediaKind::Tv => {
            // Specials are rendered as S00E00; padding never truncates
            // larger numbers.
            parts.push(format!(
                "S{:02}E{:02}",
                series.unwrap_or(0),
                episode.unwrap_or(0)
            ));
            if let Some(episode_title) = episode_title {
                let cleaned = sanitize(episode_title);
                if !cleaned.is_empty() {
                    parts.push(cleaned);
                }
            }
            parts.push(TV_SUFFIX.to_string());
        }
        MediaKind::Movie => {
            parts.push(MOVIE_SUFFIX.to_string());
        }
    }

    parts.retain(|p| !p.is_empty());
    parts.join(".")
}
