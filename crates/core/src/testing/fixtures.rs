//! Shared programme and search fixtures.

use crate::catalog::{Ancestor, ProgrammeKind, ProgrammeMeta, SearchHit, Version};

/// A movie-shaped programme: no parent container at all.
pub fn movie_meta(pid: &str, title: &str) -> ProgrammeMeta {
    ProgrammeMeta {
        pid: pid.to_string(),
        kind: ProgrammeKind::Episode,
        title: title.to_string(),
        position: None,
        description: Some(format!("{} synopsis", title)),
        channel: Some("Channel One".to_string()),
        first_broadcast: None,
        image_pid: Some(format!("{}-img", pid)),
        categories: vec!["Film".to_string()],
        versions: vec![version("v1", Some(5400), true)],
        ancestors: Vec::new(),
    }
}

/// An episode-shaped programme with no ancestors yet; chain containers on
/// with [`ProgrammeMetaExt`].
pub fn episode_meta(pid: &str, title: &str, position: Option<u32>) -> ProgrammeMeta {
    ProgrammeMeta {
        pid: pid.to_string(),
        kind: ProgrammeKind::Episode,
        title: title.to_string(),
        position,
        description: None,
        channel: Some("Channel One".to_string()),
        first_broadcast: Some("2024-01-01T20:00:00Z".to_string()),
        image_pid: Some(format!("{}-img", pid)),
        categories: vec!["Drama".to_string()],
        versions: vec![version("v1", Some(3600), true)],
        ancestors: Vec::new(),
    }
}

pub fn version(pid: &str, duration_secs: Option<u32>, canonical: bool) -> Version {
    Version {
        pid: pid.to_string(),
        duration_secs,
        canonical,
    }
}

/// A TV search hit with series and episode numbers.
pub fn tv_hit(pid: &str, title: &str, series: u32, episode: u32) -> SearchHit {
    SearchHit {
        pid: pid.to_string(),
        title: title.to_string(),
        episode_title: Some(format!("Episode {}", episode)),
        series: Some(series),
        episode: Some(episode),
        channel: Some("Channel One".to_string()),
        first_broadcast: Some("2024-01-01T20:00:00Z".to_string()),
    }
}

/// A movie search hit: no series or episode fields.
pub fn movie_hit(pid: &str, title: &str) -> SearchHit {
    SearchHit {
        pid: pid.to_string(),
        title: title.to_string(),
        episode_title: None,
        series: None,
        episode: None,
        channel: Some("Channel Two".to_string()),
        first_broadcast: None,
    }
}

/// Builder-style helpers for chaining ancestor containers onto a fixture.
pub trait ProgrammeMetaExt {
    /// Append a series container as the innermost remaining ancestor.
    fn in_series(self, title: &str, position: Option<u32>) -> Self;
    /// Append a brand container as the outermost ancestor.
    fn in_brand(self, title: &str) -> Self;
}

impl ProgrammeMetaExt for ProgrammeMeta {
    fn in_series(mut self, title: &str, position: Option<u32>) -> Self {
        self.ancestors.push(Ancestor {
            pid: format!("{}-series", self.pid),
            kind: ProgrammeKind::Series,
            title: title.to_string(),
            position,
            ordinal_position: false,
            image_pid: None,
        });
        self
    }

    fn in_brand(mut self, title: &str) -> Self {
        self.ancestors.push(Ancestor {
            pid: format!("{}-brand", self.pid),
            kind: ProgrammeKind::Brand,
            title: title.to_string(),
            position: None,
            ordinal_position: false,
            image_pid: None,
        });
        self
    }
}
