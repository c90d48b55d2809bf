//! Episode identity resolution.
//!
//! Derives normalized episode/series/category fields from the catalog's
//! loosely-structured programme metadata. Pure functions of the raw
//! metadata; every heuristic here is covered by tests.

use crate::catalog::{ProgrammeKind, ProgrammeMeta};

use super::{EpisodeDetails, MediaKind};

const CANONICAL_URL_BASE: &str = "https://catalog.example.org/programmes";
const IMAGE_URL_BASE: &str = "https://images.catalog.example.org";

/// Resolved identity of a programme item.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeIdentity {
    pub kind: MediaKind,
    /// Show title (outermost container) for TV, own title for movies.
    pub title: String,
    pub episode_title: Option<String>,
    pub series: Option<u32>,
    pub episode: Option<u32>,
}

/// Parse an uppercase roman numeral ("IV") to its integer value.
///
/// Rejects empty strings, foreign characters and malformed subtractive
/// forms that would not round-trip (e.g. "IIII", "IXI").
pub fn parse_roman(s: &str) -> Option<u32> {
    fn digit(c: char) -> Option<u32> {
        match c {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        }
    }

    fn render(mut n: u32) -> String {
        const TABLE: [(u32, &str); 13] = [
            (1000, "M"),
            (900, "CM"),
            (500, "D"),
            (400, "CD"),
            (100, "C"),
            (90, "XC"),
            (50, "L"),
            (40, "XL"),
            (10, "X"),
            (9, "IX"),
            (5, "V"),
            (4, "IV"),
            (1, "I"),
        ];
        let mut out = String::new();
        for (value, token) in TABLE {
            while n >= value {
                out.push_str(token);
                n -= value;
            }
        }
        out
    }

    if s.is_empty() {
        return None;
    }

    let mut total = 0u32;
    let mut prev = 0u32;
    for c in s.chars() {
        let value = digit(c)?;
        total += value;
        if prev < value {
            // Subtractive pair: the previous digit was counted additively.
            total -= 2 * prev;
        }
        prev = value;
    }

    if render(total) == s {
        Some(total)
    } else {
        None
    }
}

/// Resolve the episode/series identity of a programme.
///
/// `year_threshold` is the boundary distinguishing ordinal series numbers
/// from calendar years: a parent series position greater than the threshold
/// is a year.
pub fn resolve_identity(meta: &ProgrammeMeta, year_threshold: u32) -> EpisodeIdentity {
    let Some(parent) = meta.parent() else {
        // No series container at all: a movie.
        return EpisodeIdentity {
            kind: MediaKind::Movie,
            title: meta.title.clone(),
            episode_title: None,
            series: None,
            episode: None,
        };
    };

    let show_title = meta
        .ancestors
        .last()
        .map(|a| a.title.clone())
        .unwrap_or_else(|| meta.title.clone());

    match parent.kind {
        ProgrammeKind::Series => {
            // A roman-numeral series title wins over an absent or
            // disagreeing position field.
            let roman = parse_roman(&parent.title);
            let series_number = match (roman, parent.position) {
                (Some(r), None) => Some(r),
                (Some(r), Some(p)) if r != p => Some(r),
                (_, p) => p,
            };

            match series_number {
                Some(n) if n <= year_threshold || parent.ordinal_position => {
                    // Standard ordinal series.
                    EpisodeIdentity {
                        kind: MediaKind::Tv,
                        title: show_title,
                        episode_title: Some(meta.title.clone()),
                        series: Some(n),
                        episode: meta.position,
                    }
                }
                Some(year) => {
                    match meta.position {
                        // Ordinal episode within a yearly series.
                        Some(position) => EpisodeIdentity {
                            kind: MediaKind::Tv,
                            title: show_title,
                            episode_title: Some(meta.title.clone()),
                            series: Some(year),
                            episode: Some(position),
                        },
                        // No usable position: a special inside the year.
                        None => EpisodeIdentity {
                            kind: MediaKind::Tv,
                            title: show_title,
                            episode_title: Some(meta.title.clone()),
                            series: Some(0),
                            episode: Some(0),
                        },
                    }
                }
                // Series container with neither position nor parseable
                // title: nothing ordinal to latch onto, so a special.
                None => EpisodeIdentity {
                    kind: MediaKind::Tv,
                    title: show_title,
                    episode_title: Some(meta.title.clone()),
                    series: Some(0),
                    episode: Some(0),
                },
            }
        }
        // Parented directly to a brand (or another leaf): a special with
        // no series container.
        ProgrammeKind::Brand | ProgrammeKind::Episode => EpisodeIdentity {
            kind: MediaKind::Tv,
            title: show_title,
            episode_title: Some(meta.title.clone()),
            series: Some(0),
            episode: Some(0),
        },
    }
}

/// Derive the full normalized details for a programme.
pub fn derive_details(meta: &ProgrammeMeta, year_threshold: u32) -> EpisodeDetails {
    let identity = resolve_identity(meta, year_threshold);

    let runtime = meta
        .canonical_version()
        .and_then(|v| v.duration_secs)
        .map(|secs| (f64::from(secs) / 60.0).round() as u32);

    let image_pid = meta
        .image_pid
        .clone()
        .or_else(|| meta.ancestors.iter().find_map(|a| a.image_pid.clone()));

    EpisodeDetails {
        pid: meta.pid.clone(),
        title: identity.title,
        episode_title: identity.episode_title,
        episode: identity.episode,
        series: identity.series,
        channel: meta.channel.clone(),
        category: meta.categories.first().cloned(),
        description: meta.description.clone(),
        runtime,
        first_broadcast: meta.first_broadcast.clone(),
        link: format!("{}/{}", CANONICAL_URL_BASE, meta.pid),
        thumbnail: image_pid.map(|pid| format!("{}/{}/640x360.jpg", IMAGE_URL_BASE, pid)),
        kind: identity.kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use crate::testing::ProgrammeMetaExt;

    const THRESHOLD: u32 = 1900;

    #[test]
    fn test_roman_numerals_parse() {
        assert_eq!(parse_roman("I"), Some(1));
        assert_eq!(parse_roman("IV"), Some(4));
        assert_eq!(parse_roman("IX"), Some(9));
        assert_eq!(parse_roman("XIV"), Some(14));
        assert_eq!(parse_roman("MMXXIV"), Some(2024));
    }

    #[test]
    fn test_roman_numerals_reject_malformed() {
        assert_eq!(parse_roman(""), None);
        assert_eq!(parse_roman("IIII"), None);
        assert_eq!(parse_roman("IXI"), None);
        assert_eq!(parse_roman("Series 2"), None);
        assert_eq!(parse_roman("iv"), None);
    }

    #[test]
    fn test_movie_has_no_identity_fields() {
        let meta = fixtures::movie_meta("m0001", "A Film");

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.kind, MediaKind::Movie);
        assert!(identity.series.is_none());
        assert!(identity.episode.is_none());
        assert!(identity.episode_title.is_none());
    }

    #[test]
    fn test_standard_ordinal_series() {
        let meta = fixtures::episode_meta("p1", "The One With the Test", Some(4))
            .in_series("Series 3", Some(3))
            .in_brand("The Show");

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.kind, MediaKind::Tv);
        assert_eq!(identity.title, "The Show");
        assert_eq!(identity.series, Some(3));
        assert_eq!(identity.episode, Some(4));
        assert_eq!(
            identity.episode_title.as_deref(),
            Some("The One With the Test")
        );
    }

    #[test]
    fn test_yearly_series_with_own_position() {
        let meta = fixtures::episode_meta("p1", "Episode 5", Some(5))
            .in_series("2024", Some(2024))
            .in_brand("Yearly Show");

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.series, Some(2024));
        // The item's own position, not 0.
        assert_eq!(identity.episode, Some(5));
    }

    #[test]
    fn test_yearly_series_without_position_is_special() {
        let meta = fixtures::episode_meta("p1", "New Year Special", None)
            .in_series("2024", Some(2024))
            .in_brand("Yearly Show");

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.series, Some(0));
        assert_eq!(identity.episode, Some(0));
        assert_eq!(identity.episode_title.as_deref(), Some("New Year Special"));
    }

    #[test]
    fn test_brand_parent_is_special() {
        let meta = fixtures::episode_meta("p1", "Christmas Special", None).in_brand("The Show");

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.series, Some(0));
        assert_eq!(identity.episode, Some(0));
        assert_eq!(identity.title, "The Show");
        assert_eq!(identity.episode_title.as_deref(), Some("Christmas Special"));
    }

    #[test]
    fn test_roman_numeral_series_title_wins_when_position_absent() {
        let meta = fixtures::episode_meta("p1", "Finale", Some(6))
            .in_series("IV", None)
            .in_brand("The Saga");

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.series, Some(4));
        assert_eq!(identity.episode, Some(6));
    }

    #[test]
    fn test_roman_numeral_series_title_wins_when_position_disagrees() {
        let meta = fixtures::episode_meta("p1", "Opener", Some(1))
            .in_series("IX", Some(3))
            .in_brand("The Saga");

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.series, Some(9));
    }

    #[test]
    fn test_ordinal_tag_overrides_year_threshold() {
        // A position that looks like a year but is explicitly tagged
        // ordinal stays an ordinal series number.
        let mut meta = fixtures::episode_meta("p1", "Episode 1", Some(1))
            .in_series("Series 2024", Some(2024))
            .in_brand("Edge Show");
        meta.ancestors[0].ordinal_position = true;

        let identity = resolve_identity(&meta, THRESHOLD);

        assert_eq!(identity.series, Some(2024));
        assert_eq!(identity.episode, Some(1));
    }

    #[test]
    fn test_details_runtime_rounds_to_minutes() {
        let mut meta = fixtures::movie_meta("m1", "A Film");
        meta.versions = vec![
            fixtures::version("v1", Some(5425), false),
            fixtures::version("v2", Some(5400), true),
        ];

        let details = derive_details(&meta, THRESHOLD);

        // Canonical version (90 min) wins over the first listed one.
        assert_eq!(details.runtime, Some(90));
    }

    #[test]
    fn test_details_runtime_rounds_half_up() {
        let mut meta = fixtures::movie_meta("m1", "A Film");
        meta.versions = vec![fixtures::version("v1", Some(5430), false)];

        let details = derive_details(&meta, THRESHOLD);

        assert_eq!(details.runtime, Some(91));
    }

    #[test]
    fn test_details_thumbnail_falls_back_to_ancestor_image() {
        let mut meta = fixtures::episode_meta("p1", "Ep", Some(1))
            .in_series("Series 1", Some(1))
            .in_brand("Show");
        meta.image_pid = None;
        meta.ancestors[1].image_pid = Some("brand-img".to_string());

        let details = derive_details(&meta, THRESHOLD);

        assert_eq!(
            details.thumbnail.as_deref(),
            Some("https://images.catalog.example.org/brand-img/640x360.jpg")
        );
    }

    #[test]
    fn test_details_link_and_category() {
        let mut meta = fixtures::movie_meta("m0001", "A Film");
        meta.categories = vec!["Film".to_string(), "Drama".to_string()];

        let details = derive_details(&meta, THRESHOLD);

        assert_eq!(details.link, "https://catalog.example.org/programmes/m0001");
        assert_eq!(details.category.as_deref(), Some("Film"));
    }
}
