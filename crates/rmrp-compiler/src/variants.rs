//! Variant splitting of annotated scene source.
//!
//! A marker character delimits regions in pairs: `M ... M`. From one source
//! the splitter derives two texts:
//!
//! - *keep* mode drops only the marker characters,
//! - *strip* mode drops the markers and everything between each pair.
//!
//! Scanning is a two-state machine (outside / inside a region). Comments and
//! string literals get no special treatment: a marker is a marker wherever
//! it appears.

use crate::error::CompileError;

/// Marker for host-preview-only regions. Resolved first, in strip mode.
pub const HOST_MARKER: char = '#';

/// Marker for material-only statements inside the shared scene body.
pub const MATERIAL_MARKER: char = '@';

/// Both derived texts of one annotated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSplit {
    /// Source with marker characters removed, region contents kept.
    pub keep: String,
    /// Source with marker characters and region contents removed.
    pub strip: String,
}

// ── Region state ──────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Region {
    Outside,
    Inside,
}

impl Region {
    fn toggled(self) -> Self {
        match self {
            Region::Outside => Region::Inside,
            Region::Inside => Region::Outside,
        }
    }
}

// ── Splitter ──────────────────────────────────────────────────────────────

struct Splitter<'s> {
    src: &'s str,
    pos: usize,
    marker: char,
    region: Region,
}

impl<'s> Splitter<'s> {
    fn new(src: &'s str, marker: char) -> Self {
        Self { src, pos: 0, marker, region: Region::Outside }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn run(mut self) -> Result<VariantSplit, CompileError> {
        let mut keep = String::with_capacity(self.src.len());
        let mut strip = String::with_capacity(self.src.len());

        while let Some(ch) = self.advance() {
            if ch == self.marker {
                self.region = self.region.toggled();
                continue;
            }
            keep.push(ch);
            if self.region == Region::Outside {
                strip.push(ch);
            }
        }

        // An unclosed region at EOF means an odd marker count.
        if self.region == Region::Inside {
            return Err(CompileError::MalformedVariantMarkers(self.marker));
        }

        Ok(VariantSplit { keep, strip })
    }
}

/// Splits `source` into its keep-mode and strip-mode texts.
///
/// Fails with [`CompileError::MalformedVariantMarkers`] when `marker` occurs
/// an odd number of times.
pub fn split(source: &str, marker: char) -> Result<VariantSplit, CompileError> {
    Splitter::new(source, marker).run()
}

/// The bodies derived from one scene source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneBodies {
    /// Distance-only body: host regions and material regions removed.
    pub distance: String,
    /// Material body: host regions removed, material statements kept.
    pub material: String,
    /// Host body: host regions kept (markers dropped), material markers
    /// still in place. Input of the host-side target.
    pub host: String,
}

/// Resolves both markers in their fixed order.
///
/// The host marker goes first because material markers may only be valid
/// inside text the host pass preserves.
pub fn split_scene(source: &str) -> Result<SceneBodies, CompileError> {
    let VariantSplit { keep: host, strip: device } = split(source, HOST_MARKER)?;
    let VariantSplit { keep, strip } = split(&device, MATERIAL_MARKER)?;
    Ok(SceneBodies { distance: strip, material: keep, host })
}
